use serde::Serialize;

use crate::redeem::{RedeemOutcome, CODE_APPLIED};

const APPLIED_MARKER: &str = "successfully";
const LIMIT_MARKER: &str = "maximum redemption limit";

/// How the worker reads one redemption outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Status 1022 with a "successfully" message
    Applied,
    /// The code exists but is used up; still worth reporting
    LimitReached,
    /// Any other parsed response
    Rejected,
    /// Transport, decode or credential failure
    Failed,
}

impl Verdict {
    pub fn classify(outcome: &RedeemOutcome) -> Self {
        let Some(response) = outcome.response() else {
            return Self::Failed;
        };

        let message = response.message.to_lowercase();
        if response.code == CODE_APPLIED && message.contains(APPLIED_MARKER) {
            Self::Applied
        } else if message.contains(LIMIT_MARKER) {
            Self::LimitReached
        } else {
            Self::Rejected
        }
    }

    /// Whether the operator should hear about it
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Applied | Self::LimitReached)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::LimitReached => "limit_reached",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redeem::{RedeemError, RedeemResponse};

    fn response(code: u32, message: &str) -> RedeemOutcome {
        RedeemOutcome::Response(RedeemResponse::new(code, message, "X"))
    }

    #[test]
    fn test_applied_needs_code_and_message() {
        assert_eq!(Verdict::classify(&response(1022, "Coupon applied SUCCESSFULLY")), Verdict::Applied);
        assert_eq!(Verdict::classify(&response(1022, "Coupon pending")), Verdict::Rejected);
        assert_eq!(Verdict::classify(&response(200, "applied successfully")), Verdict::Rejected);
    }

    #[test]
    fn test_limit_reached_by_substring() {
        let outcome = response(1023, "Maximum redemption limit reached for this coupon");
        assert_eq!(Verdict::classify(&outcome), Verdict::LimitReached);
        assert!(Verdict::LimitReached.is_hit());
    }

    #[test]
    fn test_errors_are_failures() {
        let outcome = RedeemOutcome::Recoverable(RedeemError::ServerError(500));
        assert_eq!(Verdict::classify(&outcome), Verdict::Failed);
        assert!(!Verdict::Failed.is_hit());
        assert!(!Verdict::Rejected.is_hit());
    }
}
