use std::time::Duration;

use rand::Rng;

use crate::domain::BackoffError;

/// Delays, in milliseconds, for successive connection attempts.
pub const DEFAULT_BACKOFF_MILLIS: [u64; 10] = [0, 10, 10, 100, 100, 500, 500, 3000, 3000, 5000];

/// Maps an attempt number to the time to wait before making that attempt.
///
/// Policies are stateless: the same attempt always yields the same answer
/// (modulo jitter), so one policy can be shared by any number of connectors.
pub trait BackoffPolicy: Send + Sync {
    fn duration(&self, attempt: u32) -> Result<Duration, BackoffError>;
}

impl<F> BackoffPolicy for F
where
    F: Fn(u32) -> Result<Duration, BackoffError> + Send + Sync,
{
    fn duration(&self, attempt: u32) -> Result<Duration, BackoffError> {
        self(attempt)
    }
}

/// Looks the delay up in a fixed table and gives up once the table runs out.
#[derive(Debug, Clone)]
pub struct TablePolicy {
    millis: Vec<u64>,
    jitter: bool,
}

impl TablePolicy {
    pub fn new(millis: Vec<u64>) -> Self {
        Self {
            millis,
            jitter: false,
        }
    }

    /// Spread each delay uniformly over `[d/2, 3d/2)`.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn millis(&self) -> &[u64] {
        &self.millis
    }

    pub fn jitter(&self) -> bool {
        self.jitter
    }

    pub fn max_attempts(&self) -> u32 {
        self.millis.len() as u32
    }

    fn jittered(millis: u64) -> u64 {
        if millis == 0 {
            return 0;
        }
        let half = millis / 2;
        rand::thread_rng().gen_range(half..half + millis)
    }
}

/// The standard schedule, jittered.
impl Default for TablePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BACKOFF_MILLIS.to_vec()).with_jitter(true)
    }
}

impl BackoffPolicy for TablePolicy {
    fn duration(&self, attempt: u32) -> Result<Duration, BackoffError> {
        let millis = *self
            .millis
            .get(attempt as usize)
            .ok_or_else(|| BackoffError::exhausted(attempt))?;

        let millis = if self.jitter {
            Self::jittered(millis)
        } else {
            millis
        };

        Ok(Duration::from_millis(millis))
    }
}

/// Doubles (or multiplies by `factor`) the delay on every retry.
///
/// The first attempt is made immediately; attempt `n >= 1` waits
/// `initial * factor^(n-1)`, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct ExponentialPolicy {
    initial: Duration,
    factor: u32,
    max_delay: Duration,
    max_attempts: u32,
}

impl ExponentialPolicy {
    pub fn new(initial: Duration, max_attempts: u32) -> Self {
        Self {
            initial,
            factor: 2,
            max_delay: Duration::from_secs(30),
            max_attempts,
        }
    }

    pub fn with_factor(mut self, factor: u32) -> Self {
        self.factor = factor.max(1);
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl BackoffPolicy for ExponentialPolicy {
    fn duration(&self, attempt: u32) -> Result<Duration, BackoffError> {
        if attempt >= self.max_attempts {
            return Err(BackoffError::exhausted(attempt));
        }
        if attempt == 0 {
            return Ok(Duration::ZERO);
        }

        let multiplier = self.factor.saturating_pow(attempt - 1);
        Ok(self.initial.saturating_mul(multiplier).min(self.max_delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unjittered_table_policy_follows_table() {
        let policy = TablePolicy::new(DEFAULT_BACKOFF_MILLIS.to_vec());

        for (attempt, millis) in DEFAULT_BACKOFF_MILLIS.iter().enumerate() {
            assert_eq!(
                policy.duration(attempt as u32).unwrap(),
                Duration::from_millis(*millis)
            );
        }
        assert_eq!(policy.max_attempts(), 10);
    }

    #[test]
    fn test_default_policy_is_jittered_standard_schedule() {
        let policy = TablePolicy::default();

        assert!(policy.jitter());
        assert_eq!(policy.millis(), &DEFAULT_BACKOFF_MILLIS[..]);
        assert_eq!(policy.duration(0).unwrap(), Duration::ZERO);
        for (attempt, millis) in DEFAULT_BACKOFF_MILLIS.iter().enumerate().skip(1) {
            let d = policy.duration(attempt as u32).unwrap();
            assert!(d >= Duration::from_millis(millis / 2));
            assert!(d < Duration::from_millis(millis / 2 + millis));
        }
        assert_eq!(policy.duration(10), Err(BackoffError::exhausted(10)));
    }

    #[test]
    fn test_new_table_policy_starts_without_jitter() {
        assert!(!TablePolicy::new(vec![1]).jitter());
    }

    #[test]
    fn test_table_policy_exhausts_past_end() {
        let policy = TablePolicy::new(vec![1, 2]);

        assert!(policy.duration(1).is_ok());
        assert_eq!(policy.duration(2), Err(BackoffError::exhausted(2)));
        assert_eq!(policy.duration(100), Err(BackoffError::exhausted(100)));
    }

    #[test]
    fn test_empty_table_is_exhausted_immediately() {
        let policy = TablePolicy::new(Vec::new());

        assert_eq!(policy.duration(0), Err(BackoffError::exhausted(0)));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = TablePolicy::new(vec![0, 100]).with_jitter(true);

        assert_eq!(policy.duration(0).unwrap(), Duration::ZERO);
        for _ in 0..200 {
            let d = policy.duration(1).unwrap();
            assert!(d >= Duration::from_millis(50), "{:?} below range", d);
            assert!(d < Duration::from_millis(150), "{:?} above range", d);
        }
    }

    #[test]
    fn test_exponential_policy_grows_and_caps() {
        let policy = ExponentialPolicy::new(Duration::from_millis(100), 6)
            .with_max_delay(Duration::from_millis(500));

        let delays: Vec<u128> = (0..6)
            .map(|n| policy.duration(n).unwrap().as_millis())
            .collect();

        assert_eq!(delays, vec![0, 100, 200, 400, 500, 500]);
        assert_eq!(policy.duration(6), Err(BackoffError::exhausted(6)));
    }

    #[test]
    fn test_exponential_policy_custom_factor() {
        let policy = ExponentialPolicy::new(Duration::from_millis(10), 4).with_factor(3);

        assert_eq!(policy.duration(3).unwrap(), Duration::from_millis(90));
    }

    #[test]
    fn test_closure_is_a_policy() {
        let policy = |attempt: u32| -> Result<Duration, BackoffError> {
            if attempt < 2 {
                Ok(Duration::from_secs(attempt as u64))
            } else {
                Err(BackoffError::exhausted(attempt))
            }
        };

        assert_eq!(policy.duration(1).unwrap(), Duration::from_secs(1));
        assert!(BackoffPolicy::duration(&policy, 2).is_err());
    }
}
