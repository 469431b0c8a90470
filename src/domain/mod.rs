//! # Domain Layer
//!
//! Connection settings, backoff policies and the errors raised while
//! bootstrapping a store connection.

pub mod error;
pub mod models;
pub mod services;

pub use error::*;
pub use models::*;
pub use services::*;
