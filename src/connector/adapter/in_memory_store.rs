use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{ErrorKind, RedisError, RedisResult};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::application::{KeyValueStore, StoreDialer};
use crate::domain::ConnectionConfig;

#[derive(Debug, Clone)]
enum Entry {
    Str {
        value: String,
        expires_at: Option<Instant>,
    },
    Hash(HashMap<String, String>),
    List(VecDeque<String>),
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self, Entry::Str { expires_at: Some(at), .. } if *at <= now)
    }
}

/// A process-local store that answers like a Redis server would.
///
/// Clones share the same data. Expired strings are dropped lazily when their
/// key is next touched.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Current value of a string key, for inspecting what `set` stored.
    pub async fn get(&self, key: &str) -> RedisResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries, key);

        match entries.get(key) {
            None => Ok(None),
            Some(Entry::Str { value, .. }) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type()),
        }
    }
}

fn purge_expired(entries: &mut HashMap<String, Entry>, key: &str) {
    let expired = entries
        .get(key)
        .is_some_and(|entry| entry.is_expired(Instant::now()));
    if expired {
        entries.remove(key);
    }
}

/// Build the error a server would send for `-<reply>\r\n`, so callers
/// see the same kind and code as they would from a real connection.
fn server_error(reply: &str) -> RedisError {
    let wire = format!("-{}\r\n", reply);
    match redis::parse_redis_value(wire.as_bytes()).and_then(|value| value.extract_error()) {
        Err(err) => err,
        Ok(_) => RedisError::from((
            ErrorKind::ResponseError,
            "Unparsable error reply",
            reply.to_string(),
        )),
    }
}

fn wrong_type() -> RedisError {
    server_error("WRONGTYPE Operation against a key holding the wrong kind of value")
}

fn wrong_arity(command: &str) -> RedisError {
    server_error(&format!(
        "ERR wrong number of arguments for '{}' command",
        command
    ))
}

fn invalid_expire(command: &str) -> RedisError {
    server_error(&format!("ERR invalid expire time in '{}' command", command))
}

/// Resolve LRANGE bounds against a list of `len` elements.
fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn delete(&self, keys: &[String]) -> RedisResult<i64> {
        if keys.is_empty() {
            return Err(wrong_arity("del"));
        }

        let mut entries = self.entries.lock().await;
        let mut removed = 0;
        for key in keys {
            purge_expired(&mut entries, key);
            if entries.remove(key).is_some() {
                removed += 1;
            }
        }

        debug!("Deleted {} of {} keys", removed, keys.len());
        Ok(removed)
    }

    async fn hgetall(&self, key: &str) -> RedisResult<HashMap<String, String>> {
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries, key);

        match entries.get(key) {
            None => Ok(HashMap::new()),
            Some(Entry::Hash(hash)) => Ok(hash.clone()),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn hmset(
        &self,
        key: &str,
        field: &str,
        value: &str,
        pairs: &[(String, String)],
    ) -> RedisResult<String> {
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries, key);

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(HashMap::new()));
        let Entry::Hash(hash) = entry else {
            return Err(wrong_type());
        };

        hash.insert(field.to_string(), value.to_string());
        for (f, v) in pairs {
            hash.insert(f.clone(), v.clone());
        }

        Ok("OK".to_string())
    }

    async fn lpush(&self, key: &str, values: &[String]) -> RedisResult<i64> {
        if values.is_empty() {
            return Err(wrong_arity("lpush"));
        }

        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries, key);

        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(VecDeque::new()));
        let Entry::List(list) = entry else {
            return Err(wrong_type());
        };

        for value in values {
            list.push_front(value.clone());
        }

        Ok(list.len() as i64)
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> RedisResult<Vec<String>> {
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries, key);

        match entries.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::List(list)) => Ok(match normalize_range(list.len(), start, stop) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            }),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> RedisResult<i64> {
        let mut entries = self.entries.lock().await;
        purge_expired(&mut entries, key);

        let Some(entry) = entries.get_mut(key) else {
            return Ok(0);
        };
        let Entry::List(list) = entry else {
            return Err(wrong_type());
        };

        let limit = if count == 0 {
            usize::MAX
        } else {
            count.unsigned_abs() as usize
        };
        let mut removed = 0;

        if count >= 0 {
            let mut i = 0;
            while i < list.len() && removed < limit {
                if list[i] == value {
                    list.remove(i);
                    removed += 1;
                } else {
                    i += 1;
                }
            }
        } else {
            let mut i = list.len();
            while i > 0 && removed < limit {
                i -= 1;
                if list[i] == value {
                    list.remove(i);
                    removed += 1;
                }
            }
        }

        let now_empty = list.is_empty();
        if now_empty {
            entries.remove(key);
        }

        Ok(removed as i64)
    }

    async fn ping(&self) -> RedisResult<String> {
        Ok("PONG".to_string())
    }

    async fn set(&self, key: &str, value: &str, expiration: Duration) -> RedisResult<String> {
        // Sub-millisecond expiries go out as `PX 0`, which the server refuses
        if !expiration.is_zero() && expiration.as_millis() == 0 {
            return Err(invalid_expire("set"));
        }

        let expires_at = if expiration.is_zero() {
            None
        } else {
            Some(Instant::now() + expiration)
        };

        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry::Str {
                value: value.to_string(),
                expires_at,
            },
        );

        Ok("OK".to_string())
    }
}

/// Hands out sessions that all share one [`InMemoryStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryDialer {
    store: InMemoryStore,
}

impl InMemoryDialer {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }
}

#[async_trait]
impl StoreDialer for InMemoryDialer {
    type Store = InMemoryStore;

    async fn dial(&self, config: &ConnectionConfig) -> RedisResult<InMemoryStore> {
        debug!("Opened in-memory session for {}", config.address());
        Ok(self.store.clone())
    }
}
