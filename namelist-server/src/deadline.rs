//! Per-request deadlines
//!
//! A request may carry its own deadline. The listing never runs longer than
//! [`QUERY_CEILING`]; whichever of the two comes first governs the whole
//! operation.

use std::time::Duration;

use tokio::time::Instant;

/// Upper bound on one listing request, connection acquisition included.
pub const QUERY_CEILING: Duration = Duration::from_secs(5);

/// What the caller hands to the listing: at most a deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    caller_deadline: Option<Instant>,
}

impl RequestContext {
    /// Context with no caller deadline; only the ceiling applies.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            caller_deadline: Some(deadline),
        }
    }

    /// Deadline `timeout` from now. A timeout too large to represent is
    /// treated as no deadline at all.
    pub fn with_timeout(timeout: Duration) -> Self {
        Instant::now()
            .checked_add(timeout)
            .map_or_else(Self::new, Self::with_deadline)
    }

    pub fn caller_deadline(&self) -> Option<Instant> {
        self.caller_deadline
    }

    /// min(caller deadline, now + [`QUERY_CEILING`]).
    pub fn effective_deadline(&self) -> Instant {
        self.effective_deadline_with(QUERY_CEILING)
    }

    pub fn effective_deadline_with(&self, ceiling: Duration) -> Instant {
        let ceiling = Instant::now() + ceiling;
        match self.caller_deadline {
            Some(deadline) => deadline.min(ceiling),
            None => ceiling,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn ceiling_applies_without_caller_deadline() {
        let start = Instant::now();
        let deadline = RequestContext::new().effective_deadline();
        assert_eq!(deadline, start + QUERY_CEILING);
    }

    #[tokio::test(start_paused = true)]
    async fn shorter_caller_deadline_honored() {
        let start = Instant::now();
        let ctx = RequestContext::with_timeout(Duration::from_millis(750));
        assert_eq!(ctx.effective_deadline(), start + Duration::from_millis(750));
    }

    #[tokio::test(start_paused = true)]
    async fn longer_caller_deadline_capped() {
        let start = Instant::now();
        let ctx = RequestContext::with_timeout(Duration::from_secs(60));
        assert_eq!(ctx.effective_deadline(), start + QUERY_CEILING);
    }

    #[tokio::test(start_paused = true)]
    async fn ceiling_counts_from_when_it_is_taken() {
        let ctx = RequestContext::new();
        tokio::time::advance(Duration::from_secs(2)).await;
        let now = Instant::now();
        assert_eq!(ctx.effective_deadline(), now + QUERY_CEILING);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_caller_deadline_stays_expired() {
        let ctx = RequestContext::with_timeout(Duration::ZERO);
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(ctx.effective_deadline() < Instant::now());
    }

    #[test]
    fn absurd_timeout_means_no_deadline() {
        let ctx = RequestContext::with_timeout(Duration::MAX);
        assert!(ctx.caller_deadline().is_none());
    }
}
