//! Order creation pipeline and the order status machine.
//!
//! Two callers feed [`StoreEngine::place_order`] with the same payment
//! reference: the client confirm endpoint and the provider webhook. The
//! reference index is read and written inside the same write transaction
//! as the order insert, so whichever caller commits first wins and the
//! other observes the index entry and returns the existing order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::money::{self, Amount, Points};
use shared::util::now_millis;
use shared::{Order, OrderItem, OrderStatus, Product, ShippingAddress};

use crate::notify::Notification;

use super::{StoreEngine, StoreError, StoreResult};

/// Which path confirmed the payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentSource {
    /// Path A: the client reporting provider confirmation.
    ClientConfirmed,
    /// Path B: the provider's own signed webhook.
    ProviderWebhook,
}

impl StoreEngine {
    /// Create (or recognize) the order for a confirmed payment.
    ///
    /// Everything runs in one write transaction: idempotency check,
    /// point redemption, order insert, stock decrement, cart clear,
    /// earned-point credit and the reference index write. Any error
    /// drops the transaction and leaves no partial state.
    ///
    /// Returns the order, whether freshly created or pre-existing.
    pub async fn place_order(
        &self,
        user_id: &str,
        source: PaymentSource,
        reference: &str,
        amount: Amount,
        points_to_redeem: Points,
        shipping: ShippingAddress,
    ) -> StoreResult<Order> {
        let txn = self.storage().begin_write()?;

        // Idempotency anchor. A hit means the other path already won;
        // promote pending to paid but never re-run items or stock.
        if let Some(existing_id) = self.storage().order_id_by_reference_txn(&txn, reference)? {
            let mut order = self
                .storage()
                .get_order_txn(&txn, &existing_id)?
                .ok_or_else(|| StoreError::OrderNotFound(existing_id.clone()))?;
            if order.status == OrderStatus::Pending {
                order.status = OrderStatus::Paid;
                order.updated_at = now_millis();
                self.storage().put_order_txn(&txn, &order)?;
                txn.commit().map_err(super::storage::StorageError::from)?;
                self.notify_best_effort(
                    &order.user_id,
                    Notification::OrderStatusChanged {
                        order_id: order.id.clone(),
                        status: order.status,
                    },
                )
                .await;
            } else {
                drop(txn);
            }
            tracing::info!(
                reference = %reference,
                order_id = %order.id,
                source = ?source,
                "Payment reference already satisfied"
            );
            return Ok(order);
        }

        let lines = self.storage().cart_lines_txn(&txn, user_id)?;
        if lines.is_empty() && source == PaymentSource::ClientConfirmed {
            return Err(StoreError::EmptyCart);
        }

        if points_to_redeem < 0 {
            return Err(StoreError::InvalidQuantity(points_to_redeem));
        }
        if points_to_redeem > 0 {
            self.redeem_points_txn(&txn, user_id, points_to_redeem)?;
        }

        // Snapshot items at the current effective price and take the
        // stock in the same pass. The webhook path tolerates a vanished
        // cart: the payment is real even if the items are not.
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let mut product = self
                .storage()
                .get_product_txn(&txn, &line.product_id)?
                .ok_or_else(|| StoreError::ProductNotFound(line.product_id.clone()))?;
            items.push(OrderItem {
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                size: line.size.clone(),
                quantity: line.quantity,
                unit_price: product.effective_price(),
            });
            decrement_stock(&mut product, line.size.as_deref(), line.quantity);
            self.storage().put_product_txn(&txn, &product)?;
        }

        let now = now_millis();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            status: OrderStatus::Paid,
            amount,
            shipping,
            items,
            points_redeemed: points_to_redeem,
            points_earned: money::points_earned(amount),
            payment_reference: Some(reference.to_string()),
            created_at: now,
            updated_at: now,
        };

        self.storage().put_order_txn(&txn, &order)?;
        self.storage().clear_cart_txn(&txn, user_id)?;
        self.earn_points_txn(&txn, user_id, order.points_earned)?;
        self.storage().put_reference_txn(&txn, reference, &order.id)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        tracing::info!(
            order_id = %order.id,
            reference = %reference,
            amount = amount,
            source = ?source,
            "Order created"
        );
        self.notify_best_effort(
            user_id,
            Notification::OrderStatusChanged {
                order_id: order.id.clone(),
                status: order.status,
            },
        )
        .await;
        Ok(order)
    }

    /// Reference lookup without side effects, for the client's bounded
    /// polling fallback while its confirm call is in flight.
    pub fn find_order_by_reference(&self, reference: &str) -> StoreResult<Option<Order>> {
        Ok(self.storage().order_by_reference(reference)?)
    }

    pub fn get_order(&self, order_id: &str) -> StoreResult<Order> {
        self.storage()
            .get_order(order_id)?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))
    }

    /// User's orders, newest first.
    pub fn list_orders(&self, user_id: &str) -> StoreResult<Vec<Order>> {
        Ok(self.storage().orders_for_user(user_id)?)
    }

    pub async fn ship_order(&self, order_id: &str) -> StoreResult<Order> {
        self.transition_order(order_id, OrderStatus::Paid, OrderStatus::Shipped)
            .await
    }

    pub async fn deliver_order(&self, order_id: &str) -> StoreResult<Order> {
        self.transition_order(order_id, OrderStatus::Shipped, OrderStatus::Delivered)
            .await
    }

    /// Cancel an order not yet shipped. Stock and points taken at
    /// creation are restored in the same transaction.
    pub async fn cancel_order(&self, order_id: &str) -> StoreResult<Order> {
        let txn = self.storage().begin_write()?;
        let mut order = self
            .storage()
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))?;
        if !matches!(order.status, OrderStatus::Pending | OrderStatus::Paid) {
            return Err(StoreError::InvalidTransition(format!(
                "cannot cancel order in status {:?}",
                order.status
            )));
        }
        for item in &order.items {
            if let Some(mut product) = self.storage().get_product_txn(&txn, &item.product_id)? {
                increment_stock(&mut product, item.size.as_deref(), item.quantity);
                self.storage().put_product_txn(&txn, &product)?;
            }
        }
        self.reverse_points_txn(&txn, &order.user_id, order.points_redeemed, order.points_earned)?;
        order.status = OrderStatus::Cancelled;
        order.updated_at = now_millis();
        self.storage().put_order_txn(&txn, &order)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        self.notify_best_effort(
            &order.user_id,
            Notification::OrderStatusChanged {
                order_id: order.id.clone(),
                status: order.status,
            },
        )
        .await;
        Ok(order)
    }

    pub(crate) async fn transition_order(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> StoreResult<Order> {
        let txn = self.storage().begin_write()?;
        let mut order = self
            .storage()
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| StoreError::OrderNotFound(order_id.to_string()))?;
        if order.status != from {
            return Err(StoreError::InvalidTransition(format!(
                "expected {from:?}, found {:?}",
                order.status
            )));
        }
        order.status = to;
        order.updated_at = now_millis();
        self.storage().put_order_txn(&txn, &order)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        self.notify_best_effort(
            &order.user_id,
            Notification::OrderStatusChanged {
                order_id: order.id.clone(),
                status: order.status,
            },
        )
        .await;
        Ok(order)
    }
}

/// Take stock for one purchased line, aggregate and matching size
/// together. The payment is already confirmed, so a shortfall clamps at
/// zero instead of failing the order; the cart layer keeps this rare.
fn decrement_stock(product: &mut Product, size: Option<&str>, quantity: i64) {
    if product.stock_quantity < quantity {
        tracing::warn!(
            product_id = %product.id,
            stock = product.stock_quantity,
            quantity,
            "Stock shortfall at order creation, clamping to zero"
        );
    }
    product.stock_quantity = (product.stock_quantity - quantity).max(0);
    if let Some(size) = size {
        if let Some(entry) = product.sizes.iter_mut().find(|s| s.size == size) {
            entry.quantity = (entry.quantity - quantity).max(0);
        }
    }
}

pub(crate) fn increment_stock(product: &mut Product, size: Option<&str>, quantity: i64) {
    product.stock_quantity += quantity;
    if let Some(size) = size {
        if let Some(entry) = product.sizes.iter_mut().find(|s| s.size == size) {
            entry.quantity += quantity;
        }
    }
}
