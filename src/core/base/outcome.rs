use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

/// `RejectReason` explains why an invocation was not attempted.
/// A rejection is an admission-control decision, not a collaborator fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ThisError)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    /// the circuit of the endpoint is open, or its half-open trial is in flight
    #[error("circuit-open")]
    CircuitOpen,
    /// the concurrency cap of the endpoint is reached
    #[error("overloaded")]
    Overloaded,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::CircuitOpen => "circuit-open",
            RejectReason::Overloaded => "overloaded",
        }
    }
}

/// `CallOutcome` is the result of one guarded invocation. It is owned by the caller.
#[derive(Debug)]
pub enum CallOutcome<T> {
    /// the collaborator call completed, carrying its result
    Success(T),
    /// the collaborator call failed, carrying its own error unchanged
    Failure(Error),
    /// the call was never attempted
    Rejected(RejectReason),
}

impl<T> CallOutcome<T> {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, CallOutcome::Failure(_))
    }

    #[inline]
    pub fn is_rejected(&self) -> bool {
        matches!(self, CallOutcome::Rejected(_))
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            CallOutcome::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            CallOutcome::Failure(err) => Some(err),
            _ => None,
        }
    }

    pub fn success(self) -> Option<T> {
        match self {
            CallOutcome::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> CallOutcome<U> {
        match self {
            CallOutcome::Success(value) => CallOutcome::Success(f(value)),
            CallOutcome::Failure(err) => CallOutcome::Failure(err),
            CallOutcome::Rejected(reason) => CallOutcome::Rejected(reason),
        }
    }

    /// `into_result` folds rejections into errors, for callers that handle both the same way.
    /// A rejection can be told apart with `err.downcast_ref::<RejectReason>()`.
    pub fn into_result(self) -> Result<T> {
        match self {
            CallOutcome::Success(value) => Ok(value),
            CallOutcome::Failure(err) => Err(err),
            CallOutcome::Rejected(reason) => Err(Error::new(reason)),
        }
    }

    /// label used by logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            CallOutcome::Success(_) => "success",
            CallOutcome::Failure(_) => "failure",
            CallOutcome::Rejected(_) => "rejected",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reason_strings() {
        assert_eq!(RejectReason::CircuitOpen.to_string(), "circuit-open");
        assert_eq!(RejectReason::Overloaded.to_string(), "overloaded");
        assert_eq!(RejectReason::CircuitOpen.as_str(), "circuit-open");
        assert_eq!(
            serde_json::to_string(&RejectReason::CircuitOpen).unwrap(),
            "\"circuit-open\""
        );
    }

    #[test]
    fn accessors() {
        let ok: CallOutcome<u32> = CallOutcome::Success(7);
        assert!(ok.is_success());
        assert_eq!(ok.label(), "success");
        assert_eq!(ok.map(|v| v * 2).success(), Some(14));

        let failed: CallOutcome<u32> = CallOutcome::Failure(Error::msg("smtp down"));
        assert!(failed.is_failure());
        assert_eq!(failed.error().unwrap().to_string(), "smtp down");
        assert!(failed.reject_reason().is_none());

        let rejected: CallOutcome<u32> = CallOutcome::Rejected(RejectReason::Overloaded);
        assert!(rejected.is_rejected());
        assert_eq!(rejected.reject_reason(), Some(RejectReason::Overloaded));
        assert!(rejected.success().is_none());
    }

    #[test]
    fn into_result_keeps_the_cause() {
        let failed: CallOutcome<()> = CallOutcome::Failure(Error::msg("card declined"));
        assert_eq!(failed.into_result().unwrap_err().to_string(), "card declined");

        let rejected: CallOutcome<()> = CallOutcome::Rejected(RejectReason::CircuitOpen);
        let err = rejected.into_result().unwrap_err();
        assert_eq!(
            err.downcast_ref::<RejectReason>(),
            Some(&RejectReason::CircuitOpen)
        );
    }
}
