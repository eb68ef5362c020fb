//! Domain layer - pure business logic with no external state.
//!
//! This layer contains the core concepts and invariants of the
//! request-governance system:
//! - Rate limit configuration and the named policy table
//! - Fixed-window accounting per bucket key
//! - Sanitization primitives
//! - Field validators and the schema runner
//!
//! All types in this layer are pure and easily testable: the window logic is
//! a function over an explicit `Instant`, and validators are functions over
//! a dynamic JSON value.

pub mod config;
pub mod sanitize;
pub mod schema;
pub mod validate;
pub mod window;
