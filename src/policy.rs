//! Acknowledgement policy for optimistic submissions.
//!
//! A submission is applied to the local state before the server has seen it.
//! By default nothing happens if the server never answers. Hosts that want a
//! deadline plug in a [`SubmissionPolicy`] through
//! [`SessionConfig::with_submission_policy`](crate::client::SessionConfig::with_submission_policy).

use std::fmt::Debug;
use std::time::Duration;

use crate::protocol::MessageKind;

/// What to do once a pending submission's deadline expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutAction {
    /// Send the same frame again and re-arm the deadline.
    Resend,
    /// Clear the optimistic `local_submission` and report
    /// [`SessionError::SubmissionTimedOut`](crate::SessionError::SubmissionTimedOut).
    Rollback,
    /// Keep the optimistic state but still report the timeout.
    Keep,
}

/// Decides how long an optimistic submission may stay unacknowledged.
pub trait SubmissionPolicy: Debug + Send + Sync + 'static {
    /// Deadline after the `attempt`-th send (1-based), or `None` to wait forever.
    fn ack_timeout(&self, attempt: u32) -> Option<Duration>;

    /// Action once the deadline after the `attempt`-th send has expired.
    fn on_timeout(&self, attempt: u32) -> TimeoutAction;
}

/// Never time out. This is the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAckTimeout;

impl SubmissionPolicy for NoAckTimeout {
    fn ack_timeout(&self, _attempt: u32) -> Option<Duration> {
        None
    }

    fn on_timeout(&self, _attempt: u32) -> TimeoutAction {
        TimeoutAction::Keep
    }
}

/// Resend up to `max_attempts` times, then roll the submission back.
#[derive(Debug, Clone, Copy)]
pub struct RetryThenRollback {
    /// Deadline after each send.
    pub timeout: Duration,
    /// Total sends, the first included, before rolling back.
    pub max_attempts: u32,
}

impl RetryThenRollback {
    /// `max_attempts` counts the first send and is clamped to at least 1.
    pub fn new(timeout: Duration, max_attempts: u32) -> Self {
        Self {
            timeout,
            max_attempts: max_attempts.max(1),
        }
    }
}

impl SubmissionPolicy for RetryThenRollback {
    fn ack_timeout(&self, _attempt: u32) -> Option<Duration> {
        Some(self.timeout)
    }

    fn on_timeout(&self, attempt: u32) -> TimeoutAction {
        if attempt < self.max_attempts {
            TimeoutAction::Resend
        } else {
            TimeoutAction::Rollback
        }
    }
}

/// Returns `true` if an inbound message of this kind answers a pending
/// submission.
///
/// Timer ticks and chat are background noise and do not count.
pub fn acknowledges_submission(kind: MessageKind) -> bool {
    matches!(
        kind,
        MessageKind::Info
            | MessageKind::ModalInfo
            | MessageKind::Game
            | MessageKind::Result
            | MessageKind::Replay
            | MessageKind::Reset
            | MessageKind::OpponentLeft
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_never_expires() {
        assert_eq!(NoAckTimeout.ack_timeout(1), None);
    }

    #[test]
    fn retry_policy_rolls_back_after_last_attempt() {
        let policy = RetryThenRollback::new(Duration::from_millis(200), 3);
        assert_eq!(policy.ack_timeout(1), Some(Duration::from_millis(200)));
        assert_eq!(policy.on_timeout(1), TimeoutAction::Resend);
        assert_eq!(policy.on_timeout(2), TimeoutAction::Resend);
        assert_eq!(policy.on_timeout(3), TimeoutAction::Rollback);
    }

    #[test]
    fn retry_policy_needs_one_attempt() {
        let policy = RetryThenRollback::new(Duration::from_secs(1), 0);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.on_timeout(1), TimeoutAction::Rollback);
    }

    #[test]
    fn timer_ticks_do_not_acknowledge() {
        assert!(!acknowledges_submission(MessageKind::Timer));
        assert!(!acknowledges_submission(MessageKind::Chat));
        assert!(!acknowledges_submission(MessageKind::Unknown));
        assert!(acknowledges_submission(MessageKind::Result));
        assert!(acknowledges_submission(MessageKind::Info));
    }
}
