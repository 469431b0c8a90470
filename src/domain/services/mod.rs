//! Pure policies consulted by the application layer.

mod backoff_policy;

pub use backoff_policy::*;
