//! Throttling for outbound ledger calls
//!
//! One `RateLimitedCaller` is shared by every call the process makes:
//! calls are spaced by a minimum interval, throttled calls are retried with
//! exponential backoff, and each attempt runs under a deadline.

mod adaptive;
mod caller;

pub use adaptive::RetryPolicy;
pub use caller::RateLimitedCaller;
