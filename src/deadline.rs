use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::{AnalysisError, Result};

/// A cancellation token paired with a hard expiry.
///
/// Cloned into every stage of one analysis; checking it is cheap.
#[derive(Debug, Clone)]
pub struct Deadline {
    token: CancellationToken,
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn new(limit: Duration) -> Self {
        Self::with_token(limit, CancellationToken::new())
    }

    pub fn with_token(limit: Duration, token: CancellationToken) -> Self {
        Self {
            token,
            started: Instant::now(),
            limit,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }

    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.started.elapsed())
    }

    pub fn is_expired(&self) -> bool {
        self.started.elapsed() >= self.limit
    }

    /// Fails if the caller cancelled or the limit has passed.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        if self.is_expired() {
            return Err(AnalysisError::Timeout(self.limit));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_fresh_deadline_passes() {
        let deadline = Deadline::new(Duration::from_secs(60));
        assert!(deadline.check().is_ok());
        assert!(deadline.remaining() > Duration::from_secs(59));
    }

    #[test]
    fn test_zero_limit_times_out() {
        let deadline = Deadline::new(Duration::ZERO);
        let err = deadline.check().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[test]
    fn test_cancel_is_observed() {
        let token = CancellationToken::new();
        let deadline = Deadline::with_token(Duration::from_secs(60), token.clone());
        token.cancel();
        assert!(matches!(deadline.check(), Err(AnalysisError::Cancelled)));
    }
}
