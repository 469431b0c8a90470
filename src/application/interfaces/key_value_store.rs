use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::RedisResult;

/// The fixed set of store operations available on a live session.
///
/// Implementations forward each call to the underlying client and return its
/// result unchanged. Nothing here retries, and errors are the store client's
/// own.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Remove `keys`, returning how many existed.
    async fn delete(&self, keys: &[String]) -> RedisResult<i64>;

    /// All field/value pairs of a hash; empty when the key is absent.
    async fn hgetall(&self, key: &str) -> RedisResult<HashMap<String, String>>;

    async fn hmset(
        &self,
        key: &str,
        field: &str,
        value: &str,
        pairs: &[(String, String)],
    ) -> RedisResult<String>;

    /// Prepend `values` to a list, returning its new length.
    async fn lpush(&self, key: &str, values: &[String]) -> RedisResult<i64>;

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> RedisResult<Vec<String>>;

    /// Remove up to `count` elements equal to `value` (all of them when zero,
    /// from the tail when negative).
    async fn lrem(&self, key: &str, count: i64, value: &str) -> RedisResult<i64>;

    /// Liveness probe.
    async fn ping(&self) -> RedisResult<String>;

    /// Set a string value. A zero `expiration` keeps the key forever.
    async fn set(&self, key: &str, value: &str, expiration: Duration) -> RedisResult<String>;
}
