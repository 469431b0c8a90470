use std::sync::Arc;

use redis::RedisResult;
use tracing::{debug, info, warn};

use crate::application::{KeyValueStore, StoreDialer};
use crate::domain::{BackoffPolicy, ConnectError, ConnectionConfig, TablePolicy};

/// Establishes a store session, backing off while the store is unreachable.
pub struct StoreConnector<D: StoreDialer> {
    dialer: D,
    policy: Arc<dyn BackoffPolicy>,
}

impl<D: StoreDialer> StoreConnector<D> {
    /// Uses the standard jittered schedule, `TablePolicy::default()`.
    pub fn new(dialer: D) -> Self {
        Self {
            dialer,
            policy: Arc::new(TablePolicy::default()),
        }
    }

    pub fn with_policy(mut self, policy: Arc<dyn BackoffPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Blocks the calling task until a session answers a ping or the policy
    /// gives up.
    ///
    /// The policy is consulted before every attempt, including the first, and
    /// the returned delay is slept in full before dialing. A session that
    /// passed its probe is pinged once more before being handed out; that
    /// final ping is not retried.
    pub async fn connect(&self, config: &ConnectionConfig) -> Result<D::Store, ConnectError> {
        let address = config.address();
        let mut attempt: u32 = 0;

        let store = loop {
            let delay = self
                .policy
                .duration(attempt)
                .map_err(|source| ConnectError::PolicyExhausted {
                    attempts: attempt,
                    source,
                })?;

            tokio::time::sleep(delay).await;

            info!("Connecting to store at {}", address);
            match self.probe(config).await {
                Ok(store) => break store,
                Err(e) => {
                    attempt = attempt.saturating_add(1);
                    warn!(
                        "Backing off because store at {} didn't respond to ping: {}",
                        address, e
                    );
                }
            }
        };

        store
            .ping()
            .await
            .map_err(|source| ConnectError::VerificationFailed {
                address: address.to_string(),
                source,
            })?;

        debug!("Store at {} is live after {} retries", address, attempt);

        Ok(store)
    }

    async fn probe(&self, config: &ConnectionConfig) -> RedisResult<D::Store> {
        let store = self.dialer.dial(config).await?;
        store.ping().await?;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::connector::{InMemoryDialer, InMemoryStore};
    use crate::domain::BackoffError;

    #[tokio::test]
    async fn test_connect_to_healthy_store() {
        let store = InMemoryStore::new();
        let connector = StoreConnector::new(InMemoryDialer::new(store.clone()));

        let session = connector
            .connect(&ConnectionConfig::new("memory"))
            .await
            .unwrap();

        session.set("k", "v", Duration::ZERO).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_exhausted_policy_never_dials() {
        let connector = StoreConnector::new(InMemoryDialer::new(InMemoryStore::new()))
            .with_policy(Arc::new(|attempt: u32| -> Result<Duration, BackoffError> {
                Err(BackoffError::exhausted(attempt))
            }));

        let err = connector
            .connect(&ConnectionConfig::new("memory"))
            .await
            .err()
            .unwrap();

        match err {
            ConnectError::PolicyExhausted { attempts, source } => {
                assert_eq!(attempts, 0);
                assert_eq!(source, BackoffError::exhausted(0));
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
