//! Permission names.
//!
//! Customers act on their own carts, orders and returns with no explicit
//! permission; these cover operator and back-office actions.

/// Catalog and stock maintenance, restock included.
pub const STORE_MANAGE: &str = "store:manage";

/// Return workflow transitions (approve, reject, complete).
pub const RETURNS_MANAGE: &str = "returns:manage";

/// Operator order transitions (ship, deliver, cancel).
pub const ORDERS_MANAGE: &str = "orders:manage";

/// Promotion upsert.
pub const PROMOTIONS_MANAGE: &str = "promotions:manage";
