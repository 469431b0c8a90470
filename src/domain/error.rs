use thiserror::Error;

/// Reported by a backoff policy that has no further attempts to offer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackoffError {
    #[error("Backoff exhausted at attempt {attempt}")]
    Exhausted { attempt: u32 },
}

impl BackoffError {
    pub fn exhausted(attempt: u32) -> Self {
        Self::Exhausted { attempt }
    }
}

/// Failures raised while bootstrapping a store connection.
///
/// Errors from individual store operations are not wrapped here; they reach
/// the caller as the store client's own `redis::RedisError`.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Connection policy exhausted after {attempts} failed attempts: {source}")]
    PolicyExhausted {
        attempts: u32,
        #[source]
        source: BackoffError,
    },

    #[error("Unable to ping store at {address}: {source}")]
    VerificationFailed {
        address: String,
        #[source]
        source: redis::RedisError,
    },
}

impl ConnectError {
    pub fn is_policy_exhausted(&self) -> bool {
        matches!(self, Self::PolicyExhausted { .. })
    }

    pub fn is_verification_failed(&self) -> bool {
        matches!(self, Self::VerificationFailed { .. })
    }
}
