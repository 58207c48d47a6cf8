// =============================================================================
// Typed engine errors
// =============================================================================
//
// Five kinds, matching the propagation policy: adapters swallow their own
// transient failures and return semantically meaningful empty values rather
// than bubbling `TransientUpstream`/`ProtocolViolation` up; strategies and the
// controller swallow per-symbol/per-strategy failures and log them. Only
// `Fatal` is allowed to reach `main` and flip the exit code.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Market-data HTTP failure or broker RPC timeout, recoverable by retry.
    #[error("transient upstream failure: {0}")]
    TransientUpstream(String),

    /// Malformed upstream payload (missing OHLC columns, non-monotonic
    /// timestamps). The affected symbol is skipped for the cycle.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// An order was rejected by an internal gate. Never retried within the
    /// same cycle.
    #[error("business reject: {0}")]
    BusinessReject(String),

    /// Broker unreachable at cycle start; the controller continues in
    /// simulation mode.
    #[error("degraded mode: {0}")]
    Degraded(String),

    /// Controller loop invariant violated. Propagates to process exit.
    #[error("fatal: {0}")]
    Fatal(String),
}

impl EngineError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::Fatal(_))
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fatal_is_fatal() {
        assert!(EngineError::Fatal("x".into()).is_fatal());
        assert!(!EngineError::Degraded("x".into()).is_fatal());
        assert!(!EngineError::BusinessReject("x".into()).is_fatal());
        assert!(!EngineError::ProtocolViolation("x".into()).is_fatal());
        assert!(!EngineError::TransientUpstream("x".into()).is_fatal());
    }

    #[test]
    fn display_carries_message() {
        let e = EngineError::BusinessReject("signal cooldown".to_string());
        assert_eq!(e.to_string(), "business reject: signal cooldown");
    }
}
