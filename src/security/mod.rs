//! Authentication and authorization

pub mod acl;
pub mod permissions;
pub mod user;

// Re-export commonly used types
pub use acl::{AccessControlList, AccessEntry, AccessMode, ObjectRef};
pub use permissions::Permission;
pub use user::{User, UserRegistry};
