//! Covered call status machine.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle status of a covered call.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
pub enum CallStatus {
    /// Written but not yet live. Every new call starts here.
    Pending,
    /// Live obligation; counts toward shares covered.
    Active,
    /// Expired worthless.
    Expired,
    /// Exercised; shares called away.
    Assigned,
    /// Closed early by buying the contracts back.
    BoughtBack,
}

/// A status change the transition table does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot move a covered call from {from} to {to}")]
pub struct InvalidTransition {
    /// Current status.
    pub from: CallStatus,
    /// Requested status.
    pub to: CallStatus,
}

impl CallStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [CallStatus; 5] = [
        CallStatus::Pending,
        CallStatus::Active,
        CallStatus::Expired,
        CallStatus::Assigned,
        CallStatus::BoughtBack,
    ];

    /// Wire and storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Assigned => "assigned",
            Self::BoughtBack => "bought_back",
        }
    }

    /// Whether the transition table allows moving from `self` to `next`.
    ///
    /// ```text
    /// pending -> active
    /// active  -> expired | assigned | bought_back
    /// ```
    ///
    /// Expired, assigned and bought back are terminal.
    #[must_use]
    pub fn can_transition_to(self, next: CallStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Active)
                | (Self::Active, Self::Expired)
                | (Self::Active, Self::Assigned)
                | (Self::Active, Self::BoughtBack)
        )
    }

    /// Moves to `next` if the transition table allows it.
    ///
    /// # Errors
    /// Returns [`InvalidTransition`] for any pair outside the table,
    /// including `active -> active`.
    pub fn transition(self, next: CallStatus) -> Result<CallStatus, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Whether the status has no outgoing transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::Assigned | Self::BoughtBack)
    }
}

impl std::fmt::Display for CallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_to_active_allowed() {
        assert_eq!(
            CallStatus::Pending.transition(CallStatus::Active),
            Ok(CallStatus::Active)
        );
    }

    #[test]
    fn test_active_exits() {
        for next in [
            CallStatus::Expired,
            CallStatus::Assigned,
            CallStatus::BoughtBack,
        ] {
            assert!(CallStatus::Active.can_transition_to(next), "{}", next);
        }
    }

    #[test]
    fn test_active_to_active_rejected() {
        let err = CallStatus::Active
            .transition(CallStatus::Active)
            .unwrap_err();
        assert_eq!(err.from, CallStatus::Active);
        assert_eq!(err.to, CallStatus::Active);
    }

    #[test]
    fn test_pending_cannot_skip_activation() {
        assert!(!CallStatus::Pending.can_transition_to(CallStatus::Assigned));
        assert!(!CallStatus::Pending.can_transition_to(CallStatus::Expired));
        assert!(!CallStatus::Pending.can_transition_to(CallStatus::BoughtBack));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in CallStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in CallStatus::ALL {
                assert!(!from.can_transition_to(to), "{} -> {}", from, to);
            }
        }
    }

    #[test]
    fn test_nothing_returns_to_pending() {
        for from in CallStatus::ALL {
            assert!(!from.can_transition_to(CallStatus::Pending));
        }
    }

    #[test]
    fn test_display_matches_serde_name() {
        for status in CallStatus::ALL {
            assert_eq!(
                serde_json::to_string(&status).unwrap(),
                format!("\"{}\"", status)
            );
        }
    }

    #[test]
    fn test_stored_as_text_column() {
        use sqlx::{Postgres, Type};

        let text = <String as Type<Postgres>>::type_info();
        assert!(<CallStatus as Type<Postgres>>::compatible(&text));
    }

    #[test]
    fn test_serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&CallStatus::BoughtBack).unwrap(),
            "\"bought_back\""
        );
        let status: CallStatus = serde_json::from_str("\"assigned\"").unwrap();
        assert_eq!(status, CallStatus::Assigned);
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = InvalidTransition {
            from: CallStatus::Expired,
            to: CallStatus::Active,
        };
        assert_eq!(
            err.to_string(),
            "cannot move a covered call from expired to active"
        );
    }
}
