//! System utilities and monitoring
//!
//! Prometheus metrics, health checks and service information.

pub mod health;
pub mod metrics;

pub use health::{HealthChecker, HealthStatus, ServiceInfo, ServiceStatus};
