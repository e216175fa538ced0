//! Identifier types shared by the catalog, security and API layers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Primary key of a document type
    DocumentTypeId
);
id_type!(
    /// Primary key of a document
    DocumentId
);
id_type!(
    /// Primary key of an uploaded document file
    DocumentFileId
);
id_type!(
    /// Primary key of a page of a document file
    DocumentFilePageId
);
id_type!(
    /// Primary key of a user
    UserId
);

/// Monotonic id allocator, starting at 1
#[derive(Debug)]
pub struct IdSequence(AtomicU64);

impl IdSequence {
    /// Create a sequence whose first value is 1
    pub fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    /// Take the next value
    pub fn next<T: From<u64>>(&self) -> T {
        T::from(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdSequence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let seq = IdSequence::new();
        let a: DocumentId = seq.next();
        let b: DocumentId = seq.next();
        assert_eq!(a, DocumentId(1));
        assert!(b > a);
    }

    #[test]
    fn test_ids_serialize_as_numbers() {
        let json = serde_json::to_string(&DocumentFileId(7)).unwrap();
        assert_eq!(json, "7");
    }
}
