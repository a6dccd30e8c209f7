//!  Circuit Breaker State Machine:
//!
//!                        `failure_threshold` consecutive failures
//!
//!             +-----------------------------------------------------------------------+
//!             |                                                                       |
//!             |                                                                       v
//!     +----------------+                   +----------------+   first call    +----------------+
//!     |                |                   |                |  after timeout  |                |
//!     |                |   Trial succeed   |                |<----------------|                |
//!     |     Closed     |<------------------|    HalfOpen    |                 |      Open      |
//!     |                |                   |                |   Trial failed  |                |
//!     |                |                   |                +---------------->|                |
//!     +----------------+                   +----------------+                 +----------------+
//!
//! The Open -> HalfOpen transition is lazy: it happens on the first invocation observed
//! after `open_timeout_ms` has elapsed, there is no timer behind it.

/// Consecutive-failure breaker
pub mod breaker;
pub mod listener;
pub mod state;

pub use breaker::*;
pub use listener::*;
pub use state::*;
