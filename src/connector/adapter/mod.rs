mod in_memory_store;
mod redis_store;

pub use in_memory_store::*;
pub use redis_store::*;
