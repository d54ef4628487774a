//! Return request types.
//!
//! At most one return per order; the row is created by the order owner and
//! never deleted, so a rejected return is terminal for that order.

use serde::{Deserialize, Serialize};

/// `Pending → {Approved, Rejected}`, `Approved → Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnReason {
    Damaged,
    WrongItem,
    WrongSize,
    NotAsDescribed,
    ChangedMind,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnResolution {
    Refund,
    Exchange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub order_id: String,
    pub user_id: String,
    pub reason: ReturnReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    pub resolution: ReturnResolution,
    pub status: ReturnStatus,
    /// Set once the operator restock action has run; guards against
    /// double-incrementing stock.
    pub restocked: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ReturnStatus {
    /// Valid transitions for the workflow.
    pub fn can_transition_to(&self, next: ReturnStatus) -> bool {
        matches!(
            (self, next),
            (ReturnStatus::Pending, ReturnStatus::Approved)
                | (ReturnStatus::Pending, ReturnStatus::Rejected)
                | (ReturnStatus::Approved, ReturnStatus::Completed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(ReturnStatus::Pending.can_transition_to(ReturnStatus::Approved));
        assert!(ReturnStatus::Pending.can_transition_to(ReturnStatus::Rejected));
        assert!(ReturnStatus::Approved.can_transition_to(ReturnStatus::Completed));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!ReturnStatus::Rejected.can_transition_to(ReturnStatus::Approved));
        assert!(!ReturnStatus::Completed.can_transition_to(ReturnStatus::Completed));
        assert!(!ReturnStatus::Pending.can_transition_to(ReturnStatus::Completed));
        assert!(!ReturnStatus::Approved.can_transition_to(ReturnStatus::Rejected));
    }
}
