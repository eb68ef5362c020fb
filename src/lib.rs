//! # reqguard
//!
//! Request governance for client-facing applications: keyed rate limiting
//! and schema-driven input validation, designed to run in front of a shared
//! backend.
//!
//! ## Quick Start
//!
//! ```rust
//! use reqguard::{rate_limit_key, RateGovernor};
//!
//! let governor = RateGovernor::new();
//! let key = rate_limit_key("auth:signIn", Some("user@example.com"));
//!
//! let decision = governor.check(&key, "auth:signIn");
//! if decision.allowed {
//!     // proceed with the sign-in attempt
//! } else {
//!     // surface decision.error / decision.retry_after to the user
//! }
//! ```
//!
//! Validation runs over `serde_json::Value` payloads against an allow-list
//! schema:
//!
//! ```rust
//! use reqguard::{sign_up_schema, validate_schema};
//! use serde_json::json;
//!
//! let outcome = validate_schema(
//!     &json!({
//!         "email": "User@Example.com",
//!         "password": "correct horse battery staple 1A",
//!         "username": "miniature_painter",
//!     }),
//!     &sign_up_schema(),
//! );
//! assert!(outcome.is_valid);
//! assert_eq!(outcome.sanitized["email"], json!("user@example.com"));
//! ```
//!
//! ## Features
//!
//! - **Fixed-window rate limiting** with per-operation quotas and an
//!   optional minimum-interval throttle; denials never consume quota
//! - **Guarded execution**: [`RateGovernor::execute`] runs an async
//!   operation only when the check passes
//! - **Validation engine**: sanitizers plus named field validators composed
//!   into schemas, with unexpected-field rejection as a mass-assignment
//!   defense
//! - **Debounce/throttle utilities** for chatty call sites
//! - **Deterministic tests**: the clock and storage are ports, with mocks
//!   provided
//!
//! ## Architecture
//!
//! The crate follows hexagonal architecture:
//! - `domain`: pure logic (window accounting, configs, sanitizers,
//!   validators, schemas)
//! - `application`: orchestration (governor, metrics, debounce) and ports
//! - `infrastructure`: adapters (system clock, sharded storage) and mocks

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::debounce::{Debouncer, Throttler};
pub use application::governor::{ExecuteError, RateGovernor, RateLimitError};
pub use application::metrics::{Metrics, MetricsSnapshot};
pub use application::ports::{Clock, Storage};
pub use domain::config::{rate_limit_key, ConfigTable, RateLimitConfig, FALLBACK_CONFIG};
pub use domain::sanitize::{escape_html, sanitize_multiline, sanitize_number, sanitize_string};
pub use domain::schema::{
    collection_schema, comment_schema, item_schema, profile_schema, sign_in_schema,
    sign_up_schema, validate_schema, validate_schema_with, FieldRule, FieldValidator, Schema,
    SchemaBuilder, SchemaOutcome, ROOT_ERRORS, UNEXPECTED_FIELDS,
};
pub use domain::validate::{
    validate_bio, validate_collection_description, validate_collection_name, validate_comment,
    validate_email, validate_game_system, validate_item_faction, validate_item_name,
    validate_item_notes, validate_item_quantity, validate_item_status, validate_location,
    validate_password, validate_search_query, validate_username, validate_uuid,
    validate_website_url, ValidationResult, GAME_SYSTEMS, ITEM_STATUSES,
};
pub use domain::window::{DenialReason, RateLimitResult, WindowEntry};
pub use infrastructure::clock::SystemClock;
pub use infrastructure::storage::ShardedStorage;
