//! Loyalty ledger: a single per-user balance, mutated in place.
//!
//! Three events touch it — order paid, redemption at checkout, return
//! completed — and each runs inside the transaction of the order/return
//! mutation that triggers it, so a failed pipeline can never strand a
//! redemption. History is a read-time projection over orders and returns
//! (both immutable once written), not a stored event log.

use redb::WriteTransaction;
use serde::Serialize;

use shared::ReturnStatus;
use shared::money::Points;

use super::{StoreEngine, StoreError, StoreResult};

/// Projected point history entry.
#[derive(Debug, Clone, Serialize)]
pub struct PointEvent {
    pub order_id: String,
    pub kind: PointEventKind,
    /// Signed delta applied to the balance.
    pub points: Points,
    pub at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointEventKind {
    Earned,
    Redeemed,
    ReturnReversal,
}

impl StoreEngine {
    /// Spend points. Fails closed: an insufficient balance aborts the
    /// caller's whole transaction, and the decrement itself is only
    /// visible if that transaction commits.
    pub(crate) fn redeem_points_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
        points: Points,
    ) -> StoreResult<()> {
        let balance = self.storage().points_balance_txn(txn, user_id)?;
        if balance < points {
            return Err(StoreError::InsufficientPoints {
                requested: points,
                balance,
            });
        }
        self.storage()
            .set_points_balance_txn(txn, user_id, balance - points)?;
        Ok(())
    }

    /// Credit points earned on a paid order. Computed once at creation,
    /// never recomputed.
    pub(crate) fn earn_points_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
        points: Points,
    ) -> StoreResult<()> {
        if points <= 0 {
            return Ok(());
        }
        let balance = self.storage().points_balance_txn(txn, user_id)?;
        self.storage()
            .set_points_balance_txn(txn, user_id, balance + points)?;
        Ok(())
    }

    /// Return-completion reversal: give back what the customer redeemed,
    /// claw back what they earned, clamped at zero. Inputs come from the
    /// order's own recorded fields, never from recomputation.
    pub(crate) fn reverse_points_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
        points_to_return: Points,
        points_to_claw: Points,
    ) -> StoreResult<()> {
        let balance = self.storage().points_balance_txn(txn, user_id)?;
        let updated = (balance + points_to_return - points_to_claw).max(0);
        self.storage()
            .set_points_balance_txn(txn, user_id, updated)?;
        Ok(())
    }

    pub fn points_balance(&self, user_id: &str) -> StoreResult<Points> {
        Ok(self.storage().points_balance(user_id)?)
    }

    /// Point history, reconstructed by projecting the user's orders and
    /// completed returns. Stable because orders are immutable.
    pub fn points_history(&self, user_id: &str) -> StoreResult<Vec<PointEvent>> {
        let mut events = Vec::new();
        for order in self.storage().orders_for_user(user_id)? {
            if order.points_redeemed > 0 {
                events.push(PointEvent {
                    order_id: order.id.clone(),
                    kind: PointEventKind::Redeemed,
                    points: -order.points_redeemed,
                    at: order.created_at,
                });
            }
            if order.points_earned > 0 {
                events.push(PointEvent {
                    order_id: order.id.clone(),
                    kind: PointEventKind::Earned,
                    points: order.points_earned,
                    at: order.created_at,
                });
            }
            if let Some(ret) = self.storage().get_return(&order.id)? {
                if ret.status == ReturnStatus::Completed {
                    events.push(PointEvent {
                        order_id: order.id.clone(),
                        kind: PointEventKind::ReturnReversal,
                        points: order.points_redeemed - order.points_earned,
                        at: ret.updated_at,
                    });
                }
            }
        }
        events.sort_by_key(|e| e.at);
        Ok(events)
    }
}
