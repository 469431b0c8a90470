use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, ConnectionInfo, ErrorKind, IntoConnectionInfo, RedisResult};
use tracing::debug;

use crate::application::{KeyValueStore, StoreConnector, StoreDialer};
use crate::domain::{ConnectError, ConnectionConfig};

const DEFAULT_PORT: u16 = 6379;

/// A live session to a Redis server.
///
/// Cloning is cheap and every clone shares the same multiplexed connection,
/// so one handle can serve many concurrent callers.
#[derive(Clone)]
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    pub fn new(connection: MultiplexedConnection) -> Self {
        Self { connection }
    }

    /// Connect with the standard jittered backoff policy.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, ConnectError> {
        StoreConnector::new(RedisDialer::new()).connect(config).await
    }
}

/// Connect to the Redis server at `address` with the default credential,
/// database and backoff policy (`TablePolicy::default()`).
pub async fn connect(address: &str) -> Result<RedisStore, ConnectError> {
    RedisStore::connect(&ConnectionConfig::new(address)).await
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn delete(&self, keys: &[String]) -> RedisResult<i64> {
        let mut conn = self.connection.clone();
        conn.del(keys).await
    }

    async fn hgetall(&self, key: &str) -> RedisResult<HashMap<String, String>> {
        let mut conn = self.connection.clone();
        conn.hgetall(key).await
    }

    async fn hmset(
        &self,
        key: &str,
        field: &str,
        value: &str,
        pairs: &[(String, String)],
    ) -> RedisResult<String> {
        let mut items: Vec<(&str, &str)> = Vec::with_capacity(pairs.len() + 1);
        items.push((field, value));
        items.extend(pairs.iter().map(|(f, v)| (f.as_str(), v.as_str())));

        let mut conn = self.connection.clone();
        conn.hset_multiple(key, &items).await
    }

    async fn lpush(&self, key: &str, values: &[String]) -> RedisResult<i64> {
        let mut conn = self.connection.clone();
        conn.lpush(key, values).await
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> RedisResult<Vec<String>> {
        let mut conn = self.connection.clone();
        conn.lrange(key, start as isize, stop as isize).await
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> RedisResult<i64> {
        let mut conn = self.connection.clone();
        conn.lrem(key, count as isize, value).await
    }

    async fn ping(&self) -> RedisResult<String> {
        let mut conn = self.connection.clone();
        redis::cmd("PING").query_async(&mut conn).await
    }

    async fn set(&self, key: &str, value: &str, expiration: Duration) -> RedisResult<String> {
        let mut conn = self.connection.clone();
        set_command(key, value, expiration)
            .query_async(&mut conn)
            .await
    }
}

/// Build `SET key value [EX s | PX ms]`.
///
/// Whole seconds go out as `EX`; anything finer as `PX`.
fn set_command(key: &str, value: &str, expiration: Duration) -> redis::Cmd {
    let mut cmd = redis::cmd("SET");
    cmd.arg(key).arg(value);

    if !expiration.is_zero() {
        if expiration.subsec_nanos() == 0 {
            cmd.arg("EX").arg(expiration.as_secs());
        } else {
            cmd.arg("PX").arg(expiration.as_millis() as u64);
        }
    }

    cmd
}

/// Opens multiplexed connections to a Redis server.
#[derive(Debug, Clone, Default)]
pub struct RedisDialer;

impl RedisDialer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StoreDialer for RedisDialer {
    type Store = RedisStore;

    async fn dial(&self, config: &ConnectionConfig) -> RedisResult<RedisStore> {
        let info = connection_info(config)?;
        let client = redis::Client::open(info)?;
        let connection = client.get_multiplexed_async_connection().await?;

        debug!("Opened connection to {}", config.address());

        Ok(RedisStore::new(connection))
    }
}

/// Accepts either a `redis://` style URL or a bare `host[:port]`.
///
/// A configured password or non-zero database overrides whatever the URL
/// carries.
pub fn connection_info(config: &ConnectionConfig) -> RedisResult<ConnectionInfo> {
    let address = config.address();

    let mut info = if address.contains("://") {
        address.into_connection_info()?
    } else {
        split_host_port(address)?.into_connection_info()?
    };

    if let Some(password) = config.password() {
        info.redis.password = Some(password.to_string());
    }
    if config.db() != 0 {
        info.redis.db = config.db();
    }

    Ok(info)
}

fn split_host_port(address: &str) -> RedisResult<(String, u16)> {
    let invalid = || {
        redis::RedisError::from((
            ErrorKind::InvalidClientConfig,
            "Invalid store address",
            address.to_string(),
        ))
    };

    let (host, port) = match address.rsplit_once(':') {
        _ if address.ends_with(']') => (address, DEFAULT_PORT),
        // A bare IPv6 literal has colons but no brackets and no port
        Some((host, _)) if host.contains(':') && !host.starts_with('[') => {
            (address, DEFAULT_PORT)
        }
        Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
        None => (address, DEFAULT_PORT),
    };

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid());
    }

    Ok((host.to_string(), port))
}
