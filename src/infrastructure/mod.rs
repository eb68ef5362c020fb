//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Storage implementations (sharded maps)

pub mod clock;
pub mod storage;

/// Mock implementations for testing.
///
/// Available unconditionally so downstream crates can drive the governor
/// with a controlled clock in their own test suites.
pub mod mocks;
