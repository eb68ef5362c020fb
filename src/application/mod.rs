//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages runtime behavior:
//! - Rate governor (per-key decisions, guarded execution, state resets)
//! - Metrics (decision counters)
//! - Debounce/throttle utilities for chatty call sites
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod debounce;
pub mod governor;
pub mod metrics;
pub mod ports;
