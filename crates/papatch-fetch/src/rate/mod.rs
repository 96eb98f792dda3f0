//! Bandwidth limiting for response bodies.

mod bandwidth;
mod throttled;

pub use bandwidth::TokenBucket;
pub use throttled::ThrottledStream;
