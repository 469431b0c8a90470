//! # Application Layer
//!
//! Store capability interfaces and the connection bootstrap that drives them.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
