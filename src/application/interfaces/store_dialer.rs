use async_trait::async_trait;
use redis::RedisResult;

use super::KeyValueStore;
use crate::domain::ConnectionConfig;

/// Opens a single session to a store. Retrying is left to the caller.
#[async_trait]
pub trait StoreDialer: Send + Sync {
    type Store: KeyValueStore;

    async fn dial(&self, config: &ConnectionConfig) -> RedisResult<Self::Store>;
}
