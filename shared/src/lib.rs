//! Shared types for the storefront server
//!
//! Domain and wire types used by the server and its clients: catalog,
//! cart, order, promotion, loyalty and return types plus the money/point
//! conversion rules.

pub mod catalog;
pub mod money;
pub mod order;
pub mod promo;
pub mod returns;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use catalog::{Product, SizeStock};
pub use money::{Amount, Points};
pub use order::{CartLine, Order, OrderItem, OrderStatus, ShippingAddress};
pub use promo::{PromoKind, PromoRule};
pub use returns::{ReturnReason, ReturnRequest, ReturnResolution, ReturnStatus};
