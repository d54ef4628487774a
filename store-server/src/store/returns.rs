//! Return/refund workflow.
//!
//! One return per order, created by the owner against a delivered order.
//! Operators drive it to `approved`/`rejected` and then `completed`; the
//! loyalty reversal runs inside the completion transaction, computed from
//! the order's own recorded fields. Restock is deliberately a second,
//! explicit operator action because goods arrive after the paperwork.

use shared::util::now_millis;
use shared::{
    OrderStatus, ReturnReason, ReturnRequest, ReturnResolution, ReturnStatus,
};

use crate::notify::Notification;

use super::{StoreEngine, StoreError, StoreResult};

impl StoreEngine {
    /// Owner files a return against their delivered order.
    pub async fn request_return(
        &self,
        user_id: &str,
        order_id: &str,
        reason: ReturnReason,
        comments: Option<String>,
        resolution: ReturnResolution,
    ) -> StoreResult<ReturnRequest> {
        let txn = self.storage().begin_write()?;
        let mut order = self
            .storage()
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))?;
        if order.user_id != user_id {
            return Err(StoreError::NotOwner);
        }
        if order.status != OrderStatus::Delivered {
            return Err(StoreError::InvalidTransition(format!(
                "returns require a delivered order, found {:?}",
                order.status
            )));
        }
        if self.storage().get_return_txn(&txn, order_id)?.is_some() {
            return Err(StoreError::DuplicateReturn(order_id.to_string()));
        }

        let now = now_millis();
        let request = ReturnRequest {
            order_id: order_id.to_string(),
            user_id: user_id.to_string(),
            reason,
            comments,
            resolution,
            status: ReturnStatus::Pending,
            restocked: false,
            created_at: now,
            updated_at: now,
        };
        self.storage().put_return_txn(&txn, &request)?;
        order.status = OrderStatus::ReturnRequested;
        order.updated_at = now;
        self.storage().put_order_txn(&txn, &order)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        tracing::info!(order_id = %order_id, reason = ?reason, "Return requested");
        self.notify_best_effort(
            user_id,
            Notification::ReturnStatusChanged {
                order_id: order_id.to_string(),
                status: ReturnStatus::Pending,
            },
        )
        .await;
        Ok(request)
    }

    /// Operator approves a pending return.
    pub async fn approve_return(&self, order_id: &str) -> StoreResult<ReturnRequest> {
        self.transition_return(order_id, ReturnStatus::Approved, OrderStatus::ReturnApproved)
            .await
    }

    /// Operator rejects a pending return; the order goes back to
    /// delivered. The return row stays, so the order can never be
    /// returned again.
    pub async fn reject_return(&self, order_id: &str) -> StoreResult<ReturnRequest> {
        self.transition_return(order_id, ReturnStatus::Rejected, OrderStatus::Delivered)
            .await
    }

    /// Operator completes an approved return. The loyalty reversal
    /// (give back redeemed, claw back earned) commits with the status
    /// change; the one-way approved-to-completed transition is what
    /// makes it run at most once per order.
    pub async fn complete_return(&self, order_id: &str) -> StoreResult<ReturnRequest> {
        let txn = self.storage().begin_write()?;
        let mut request = self
            .storage()
            .get_return_txn(&txn, order_id)?
            .ok_or_else(|| StoreError::ReturnNotFound(order_id.to_string()))?;
        if !request.status.can_transition_to(ReturnStatus::Completed) {
            return Err(StoreError::InvalidTransition(format!(
                "return is {:?}, not approved",
                request.status
            )));
        }
        let mut order = self
            .storage()
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))?;

        self.reverse_points_txn(&txn, &order.user_id, order.points_redeemed, order.points_earned)?;

        let now = now_millis();
        request.status = ReturnStatus::Completed;
        request.updated_at = now;
        self.storage().put_return_txn(&txn, &request)?;
        order.status = OrderStatus::Returned;
        order.updated_at = now;
        self.storage().put_order_txn(&txn, &order)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        tracing::info!(order_id = %order_id, "Return completed");
        self.notify_best_effort(
            &request.user_id,
            Notification::ReturnStatusChanged {
                order_id: order_id.to_string(),
                status: request.status,
            },
        )
        .await;
        Ok(request)
    }

    /// Operator puts the physically received goods back into stock.
    /// Idempotent: the `restocked` flag is checked and set in the same
    /// transaction, so a double invocation increments nothing twice.
    pub async fn restock_return(&self, order_id: &str) -> StoreResult<ReturnRequest> {
        let txn = self.storage().begin_write()?;
        let mut request = self
            .storage()
            .get_return_txn(&txn, order_id)?
            .ok_or_else(|| StoreError::ReturnNotFound(order_id.to_string()))?;
        if request.status != ReturnStatus::Completed {
            return Err(StoreError::InvalidTransition(format!(
                "restock requires a completed return, found {:?}",
                request.status
            )));
        }
        if request.restocked {
            tracing::info!(order_id = %order_id, "Restock already applied");
            drop(txn);
            return Ok(request);
        }
        let order = self
            .storage()
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))?;

        let mut restocked_products = Vec::new();
        for item in &order.items {
            if let Some(mut product) = self.storage().get_product_txn(&txn, &item.product_id)? {
                super::checkout::increment_stock(&mut product, item.size.as_deref(), item.quantity);
                self.storage().put_product_txn(&txn, &product)?;
                restocked_products.push((product.id.clone(), product.name.clone()));
            }
        }
        request.restocked = true;
        request.updated_at = now_millis();
        self.storage().put_return_txn(&txn, &request)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        tracing::info!(order_id = %order_id, "Return restocked");
        for (product_id, product_name) in restocked_products {
            let interested = self.storage().interests_for(&product_id)?;
            for user in interested {
                self.notify_best_effort(
                    &user,
                    Notification::BackInStock {
                        product_id: product_id.clone(),
                        product_name: product_name.clone(),
                    },
                )
                .await;
            }
        }
        Ok(request)
    }

    pub fn get_return(&self, order_id: &str) -> StoreResult<ReturnRequest> {
        self.storage()
            .get_return(order_id)?
            .ok_or_else(|| StoreError::ReturnNotFound(order_id.to_string()))
    }

    pub fn list_returns(&self) -> StoreResult<Vec<ReturnRequest>> {
        Ok(self.storage().list_returns()?)
    }

    /// Customer asks to hear when a product comes back.
    pub fn register_restock_interest(&self, product_id: &str, user_id: &str) -> StoreResult<()> {
        if self.storage().get_product(product_id)?.is_none() {
            return Err(StoreError::ProductNotFound(product_id.to_string()));
        }
        Ok(self.storage().register_interest(product_id, user_id)?)
    }

    async fn transition_return(
        &self,
        order_id: &str,
        to: ReturnStatus,
        order_status: OrderStatus,
    ) -> StoreResult<ReturnRequest> {
        let txn = self.storage().begin_write()?;
        let mut request = self
            .storage()
            .get_return_txn(&txn, order_id)?
            .ok_or_else(|| StoreError::ReturnNotFound(order_id.to_string()))?;
        if !request.status.can_transition_to(to) {
            return Err(StoreError::InvalidTransition(format!(
                "return cannot go from {:?} to {to:?}",
                request.status
            )));
        }
        let mut order = self
            .storage()
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))?;

        let now = now_millis();
        request.status = to;
        request.updated_at = now;
        self.storage().put_return_txn(&txn, &request)?;
        order.status = order_status;
        order.updated_at = now;
        self.storage().put_order_txn(&txn, &order)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        self.notify_best_effort(
            &request.user_id,
            Notification::ReturnStatusChanged {
                order_id: order_id.to_string(),
                status: request.status,
            },
        )
        .await;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::notify::testing::{FailingNotifier, RecordingNotifier};
    use crate::store::PaymentSource;
    use crate::store::testing::{
        create_test_engine, create_test_engine_with, seed_points, seed_product,
    };
    use shared::ShippingAddress;

    async fn delivered_order(engine: &StoreEngine, user: &str, reference: &str) -> String {
        engine.add_to_cart(user, "p1", None, 2).unwrap();
        let order = engine
            .place_order(
                user,
                PaymentSource::ClientConfirmed,
                reference,
                10_000,
                0,
                ShippingAddress::default(),
            )
            .await
            .unwrap();
        engine.ship_order(&order.id).await.unwrap();
        engine.deliver_order(&order.id).await.unwrap();
        order.id
    }

    #[tokio::test]
    async fn test_request_requires_delivered_order() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 10);
        engine.add_to_cart("u1", "p1", None, 1).unwrap();
        let order = engine
            .place_order(
                "u1",
                PaymentSource::ClientConfirmed,
                "ref-1",
                5_000,
                0,
                ShippingAddress::default(),
            )
            .await
            .unwrap();

        let err = engine
            .request_return("u1", &order.id, ReturnReason::Damaged, None, ReturnResolution::Refund)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_request_rejects_non_owner() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 10);
        let order_id = delivered_order(&engine, "u1", "ref-1").await;

        let err = engine
            .request_return("u2", &order_id, ReturnReason::Damaged, None, ReturnResolution::Refund)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotOwner));
    }

    #[tokio::test]
    async fn test_one_return_per_order() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 10);
        let order_id = delivered_order(&engine, "u1", "ref-1").await;

        engine
            .request_return("u1", &order_id, ReturnReason::WrongSize, None, ReturnResolution::Exchange)
            .await
            .unwrap();
        let err = engine
            .request_return("u1", &order_id, ReturnReason::WrongSize, None, ReturnResolution::Exchange)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateReturn(_)));
    }

    #[tokio::test]
    async fn test_rejected_return_is_terminal() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 10);
        let order_id = delivered_order(&engine, "u1", "ref-1").await;

        engine
            .request_return("u1", &order_id, ReturnReason::ChangedMind, None, ReturnResolution::Refund)
            .await
            .unwrap();
        engine.reject_return(&order_id).await.unwrap();

        // Order back to delivered, but no second attempt is possible
        assert_eq!(engine.get_order(&order_id).unwrap().status, OrderStatus::Delivered);
        let err = engine
            .request_return("u1", &order_id, ReturnReason::ChangedMind, None, ReturnResolution::Refund)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateReturn(_)));
        let err = engine.approve_return(&order_id).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn test_complete_reverses_points_from_order_fields() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 10);
        seed_points(&engine, "u1", 30);

        engine.add_to_cart("u1", "p1", None, 2).unwrap();
        let order = engine
            .place_order(
                "u1",
                PaymentSource::ClientConfirmed,
                "ref-1",
                10_000,
                30,
                ShippingAddress::default(),
            )
            .await
            .unwrap();
        assert_eq!(order.points_redeemed, 30);
        assert_eq!(order.points_earned, 1);
        // 30 - 30 + 1
        assert_eq!(engine.points_balance("u1").unwrap(), 1);

        engine.ship_order(&order.id).await.unwrap();
        engine.deliver_order(&order.id).await.unwrap();
        engine
            .request_return("u1", &order.id, ReturnReason::Damaged, None, ReturnResolution::Refund)
            .await
            .unwrap();
        engine.approve_return(&order.id).await.unwrap();
        engine.complete_return(&order.id).await.unwrap();

        // net +29 against a balance of 1
        assert_eq!(engine.points_balance("u1").unwrap(), 30);
        assert_eq!(engine.get_order(&order.id).unwrap().status, OrderStatus::Returned);
    }

    #[tokio::test]
    async fn test_double_complete_rejected() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 10);
        let order_id = delivered_order(&engine, "u1", "ref-1").await;

        engine
            .request_return("u1", &order_id, ReturnReason::Damaged, None, ReturnResolution::Refund)
            .await
            .unwrap();
        engine.approve_return(&order_id).await.unwrap();
        engine.complete_return(&order_id).await.unwrap();

        let balance = engine.points_balance("u1").unwrap();
        let err = engine.complete_return(&order_id).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));
        assert_eq!(engine.points_balance("u1").unwrap(), balance);
    }

    #[tokio::test]
    async fn test_restock_is_idempotent() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 10);
        let order_id = delivered_order(&engine, "u1", "ref-1").await;
        assert_eq!(engine.storage().get_product("p1").unwrap().unwrap().stock_quantity, 8);

        engine
            .request_return("u1", &order_id, ReturnReason::Damaged, None, ReturnResolution::Refund)
            .await
            .unwrap();
        engine.approve_return(&order_id).await.unwrap();

        // Not yet completed: restock refused
        let err = engine.restock_return(&order_id).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition(_)));

        engine.complete_return(&order_id).await.unwrap();
        engine.restock_return(&order_id).await.unwrap();
        assert_eq!(engine.storage().get_product("p1").unwrap().unwrap().stock_quantity, 10);

        let again = engine.restock_return(&order_id).await.unwrap();
        assert!(again.restocked);
        assert_eq!(engine.storage().get_product("p1").unwrap().unwrap().stock_quantity, 10);
    }

    #[tokio::test]
    async fn test_restock_notifies_registered_interest() {
        let notifier = Arc::new(RecordingNotifier::default());
        let engine = create_test_engine_with(notifier.clone());
        seed_product(&engine, "p1", 5_000, 2);
        let order_id = delivered_order(&engine, "u1", "ref-1").await;
        engine.register_restock_interest("p1", "u2").unwrap();

        engine
            .request_return("u1", &order_id, ReturnReason::Damaged, None, ReturnResolution::Refund)
            .await
            .unwrap();
        engine.approve_return(&order_id).await.unwrap();
        engine.complete_return(&order_id).await.unwrap();
        engine.restock_return(&order_id).await.unwrap();

        let sent = notifier.sent.lock().unwrap();
        assert!(sent.iter().any(|(user, n)| {
            user == "u2" && matches!(n, Notification::BackInStock { product_id, .. } if product_id == "p1")
        }));
    }

    #[tokio::test]
    async fn test_notifier_failure_never_blocks_workflow() {
        let engine = create_test_engine_with(Arc::new(FailingNotifier));
        seed_product(&engine, "p1", 5_000, 10);
        let order_id = delivered_order(&engine, "u1", "ref-1").await;

        engine
            .request_return("u1", &order_id, ReturnReason::Damaged, None, ReturnResolution::Refund)
            .await
            .unwrap();
        engine.approve_return(&order_id).await.unwrap();
        engine.complete_return(&order_id).await.unwrap();
        let request = engine.restock_return(&order_id).await.unwrap();
        assert!(request.restocked);
    }
}
