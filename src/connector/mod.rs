//! # Connector Layer
//!
//! Store implementations of the application interfaces:
//! - Redis over a multiplexed async connection
//! - An in-memory store with the same semantics, for tests and offline use

pub mod adapter;

pub use adapter::*;
