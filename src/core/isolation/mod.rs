//! Isolation caps the number of simultaneous in-flight calls of an endpoint.
//!
//! Excess calls are handled according to the `OverloadPolicy` of the dispatcher:
//!  1. `Reject`: the call returns `Rejected("overloaded")` immediately.
//!  2. `Queue`: the call waits for a permit, callers are served in FIFO order.

mod limiter;

pub use limiter::*;
