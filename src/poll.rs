use std::time::Duration;

pub(crate) const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub(crate) const DEFAULT_PENDING_WAIT: Duration = Duration::from_secs(10);
pub(crate) const DEFAULT_RETRY_WAIT: Duration = Duration::from_secs(60);

/// Waits and bounds applied while polling one order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PollPolicy {
    /// Bounded budget for transient production failures (HTTP 500).
    pub(crate) max_attempts: u32,
    /// Wait after "still processing" (HTTP 204).
    pub(crate) pending_wait: Duration,
    /// Wait after a transient production failure.
    pub(crate) retry_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            pending_wait: DEFAULT_PENDING_WAIT,
            retry_wait: DEFAULT_RETRY_WAIT,
        }
    }
}

/// Per-order poll bookkeeping.
///
/// The two counters are independent: "still processing" is not a failure and
/// never consumes the bounded retry budget.
#[derive(Debug, Default)]
pub(crate) struct PollState {
    pub(crate) failed_attempts: u32,
    pub(crate) pending_polls: u32,
}

/// What the loop should do after one poll response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollStep {
    /// 201: the body is the artifact.
    Deliver,
    /// Non-terminal signal; sleep and poll again.
    Wait { delay: Duration, reason: WaitReason },
    /// Transient-failure budget exhausted.
    GiveUp { attempts: u32 },
    /// Terminal non-success status; retrying cannot help.
    Terminal(TerminalKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitReason {
    /// 204: order still processing.
    Pending,
    /// 500: production failed, presumed transient; `attempt` is 1-based.
    TransientFailure { attempt: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TerminalKind {
    /// 404: order id unknown server-side.
    NotFound,
    /// 410: artifact already produced and retrieved.
    AlreadyDelivered,
    /// 507: server refused to produce the artifact.
    ProductionRejected,
    /// Any status outside the documented set.
    Unexpected,
}

impl PollPolicy {
    /// Advance the state machine by one observed status code.
    pub(crate) fn on_status(&self, state: &mut PollState, status: u16) -> PollStep {
        match status {
            201 => PollStep::Deliver,
            204 => {
                state.pending_polls += 1;
                PollStep::Wait {
                    delay: self.pending_wait,
                    reason: WaitReason::Pending,
                }
            }
            500 => {
                state.failed_attempts += 1;
                if state.failed_attempts >= self.max_attempts {
                    PollStep::GiveUp {
                        attempts: state.failed_attempts,
                    }
                } else {
                    PollStep::Wait {
                        delay: self.retry_wait,
                        reason: WaitReason::TransientFailure {
                            attempt: state.failed_attempts,
                        },
                    }
                }
            }
            404 => PollStep::Terminal(TerminalKind::NotFound),
            410 => PollStep::Terminal(TerminalKind::AlreadyDelivered),
            507 => PollStep::Terminal(TerminalKind::ProductionRejected),
            _ => PollStep::Terminal(TerminalKind::Unexpected),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PollPolicy {
        PollPolicy {
            max_attempts: 10,
            pending_wait: Duration::from_secs(10),
            retry_wait: Duration::from_secs(60),
        }
    }

    #[test]
    fn ready_delivers_immediately() {
        let mut state = PollState::default();
        assert_eq!(policy().on_status(&mut state, 201), PollStep::Deliver);
        assert_eq!(state.failed_attempts, 0);
    }

    #[test]
    fn pending_waits_without_touching_retry_budget() {
        let policy = policy();
        let mut state = PollState::default();
        for n in 1..=50u32 {
            assert_eq!(
                policy.on_status(&mut state, 204),
                PollStep::Wait {
                    delay: Duration::from_secs(10),
                    reason: WaitReason::Pending,
                }
            );
            assert_eq!(state.pending_polls, n);
        }
        assert_eq!(state.failed_attempts, 0);
    }

    #[test]
    fn transient_failures_wait_then_give_up_at_the_bound() {
        let policy = policy();
        let mut state = PollState::default();
        for attempt in 1..10u32 {
            assert_eq!(
                policy.on_status(&mut state, 500),
                PollStep::Wait {
                    delay: Duration::from_secs(60),
                    reason: WaitReason::TransientFailure { attempt },
                }
            );
        }
        assert_eq!(
            policy.on_status(&mut state, 500),
            PollStep::GiveUp { attempts: 10 }
        );
    }

    #[test]
    fn mixed_204_500_sequence_keeps_counters_independent() {
        let policy = policy();
        let mut state = PollState::default();
        policy.on_status(&mut state, 204);
        policy.on_status(&mut state, 500);
        policy.on_status(&mut state, 204);
        policy.on_status(&mut state, 500);
        assert_eq!(state.pending_polls, 2);
        assert_eq!(state.failed_attempts, 2);
    }

    #[test]
    fn terminal_statuses_map_to_their_kind() {
        let policy = policy();
        let mut state = PollState::default();
        assert_eq!(
            policy.on_status(&mut state, 404),
            PollStep::Terminal(TerminalKind::NotFound)
        );
        assert_eq!(
            policy.on_status(&mut state, 410),
            PollStep::Terminal(TerminalKind::AlreadyDelivered)
        );
        assert_eq!(
            policy.on_status(&mut state, 507),
            PollStep::Terminal(TerminalKind::ProductionRejected)
        );
        assert_eq!(
            policy.on_status(&mut state, 418),
            PollStep::Terminal(TerminalKind::Unexpected)
        );
        // Terminal classification does not consume the retry budget.
        assert_eq!(state.failed_attempts, 0);
    }

    #[test]
    fn terminal_wins_regardless_of_prior_history() {
        let policy = policy();
        let mut state = PollState::default();
        policy.on_status(&mut state, 204);
        policy.on_status(&mut state, 500);
        assert_eq!(
            policy.on_status(&mut state, 410),
            PollStep::Terminal(TerminalKind::AlreadyDelivered)
        );
    }
}
