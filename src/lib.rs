#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

//! # Integration Hub
//!
//! The hub sits between the application and the external services it depends on
//! (email, SMS, calendar, payment, analytics providers). Every call to such a
//! collaborator goes through a [`Dispatcher`], which decides whether the call should
//! be attempted at all, runs it, and keeps per-endpoint health bookkeeping.
//!
//! Each registered endpoint owns a circuit breaker with three states:
//!
//! - `Closed`: calls flow normally, consecutive failures are counted.
//! - `Open`: calls are rejected without running until the open timeout elapses.
//! - `HalfOpen`: a single trial call is in flight; its result decides between `Closed` and `Open`.
//!
//! Optionally, an endpoint also caps the number of simultaneous in-flight calls.
//! Excess calls are either rejected or queued in FIFO order, depending on the
//! configured `OverloadPolicy`.
//!
//! ## Add Dependency
//!
//! ```toml
//! [dependencies]
//! integration-hub = { version = "0.1.0" }
//! ```
//!
//! Optional features lists:
//! - async: Run guarded calls on tokio's blocking pool with `Dispatcher::invoke_async` (enabled by default).
//! - logger_env: Use `env_logger` to initialize logging.
//! - logger_log4rs: Use `log4rs` to initialize logging.
//!
//! ## Initialization
//!
//! The `api` module builds a dispatcher from configuration:
//!
//! - `init_default()`: Load configurations from environment variable. For undefined configurations, use default values.
//! - `init_with_config_file(config_path: &str)`: Load configurations from a YAML file.
//! - `init_with_config(config_entity: ConfigEntity)`: Use hand-crafted `ConfigEntity`.
//!
//! Endpoints may also be registered by hand:
//!
//! ```rust
//! use integration_hub::{base::ServiceEndpoint, Dispatcher};
//! use std::time::Duration;
//!
//! let dispatcher = Dispatcher::new();
//! dispatcher
//!     .register(ServiceEndpoint::new("email-provider", 3, Duration::from_secs(60)))
//!     .expect("endpoint names are unique");
//! ```
//!
//! ## Guarding a Call
//!
//! ```rust
//! let outcome = dispatcher.invoke("email-provider", || mailer.send(&message))?;
//! match outcome {
//!     CallOutcome::Success(receipt) => { /* delivered */ }
//!     CallOutcome::Failure(err) => { /* the provider failed, `err` is its own error */ }
//!     CallOutcome::Rejected(reason) => { /* not attempted, degrade gracefully */ }
//! }
//! ```
//!
//! The dispatcher never retries. Retry policy, if any, belongs to the caller.
//!
// This module is not intended to be part of the public API. In general, any
// `doc(hidden)` code is not part of the hub's public and stable API.
#[macro_use]
#[doc(hidden)]
pub mod macros;

/// Initialization APIs building a `Dispatcher` from configuration.
pub mod api;
/// Core implementations of the hub: the circuit breaker state machine,
/// concurrency isolation, call statistics, the dispatcher and its configuration.
pub mod core;
/// Adapters for different logging crates.
pub mod logging;
/// Prometheus metrics on call outcomes and circuit state changes.
pub mod metrics;
// Utility functions for the hub.
pub mod utils;

// re-export precludes
pub use crate::core::*;
pub use api::*;
pub use crate::core::base::{
    CallOutcome, DispatchError, DispatchResult, RejectReason, ServiceEndpoint,
};
pub use crate::core::dispatcher::{Dispatcher, DispatcherBuilder};

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
