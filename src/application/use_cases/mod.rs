mod connect_store;

pub use connect_store::*;
