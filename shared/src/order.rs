//! Order, order item and cart line types.
//!
//! An order is immutable once created: status transitions are the only
//! permitted mutation afterwards. Items are price-at-purchase snapshots
//! written atomically with their parent order, so later catalog changes
//! never alter history.

use serde::{Deserialize, Serialize};

use crate::money::{Amount, Points};

/// Order lifecycle.
///
/// `Pending → Paid → Shipped → Delivered`, with the return branch
/// `ReturnRequested → ReturnApproved → Returned` entered from `Delivered`,
/// and a terminal `Cancelled`. Provider confirmation (either path) is
/// treated as proof of payment, so orders are normally inserted as `Paid`;
/// `Pending` exists for the promote-on-second-writer case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    ReturnRequested,
    ReturnApproved,
    Returned,
    Cancelled,
}

/// Shipping address captured at order time.
///
/// Structured copy, not a reference: later address-book edits must not
/// retroactively alter order history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient: String,
    pub line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Immutable snapshot of one purchased line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub quantity: i64,
    /// Effective price at time of purchase, minor units.
    pub unit_price: Amount,
}

impl OrderItem {
    pub fn line_total(&self) -> Amount {
        self.unit_price * self.quantity
    }
}

/// A durable order. `payment_reference` is the idempotency anchor: unique
/// when present, at most one order per reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    /// Total charged, minor units.
    pub amount: Amount,
    pub shipping: ShippingAddress,
    pub items: Vec<OrderItem>,
    /// Points spent at checkout; fixed at creation.
    pub points_redeemed: Points,
    /// Points credited on payment; fixed at creation.
    pub points_earned: Points,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One mutable cart line, unique per (user, product, size).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub quantity: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_line_total() {
        let item = OrderItem {
            product_id: "p1".into(),
            product_name: "Tee".into(),
            size: None,
            quantity: 3,
            unit_price: 2_500,
        };
        assert_eq!(item.line_total(), 7_500);
    }
}
