//! The storefront engine.
//!
//! One struct, [`StoreEngine`], implements the five core components as
//! impl blocks split across this module's files:
//!
//! - [`cart`] — per-user mutable cart store
//! - [`promo`] — stateless promotion validator
//! - [`loyalty`] — point balance mutations and the history projection
//! - [`checkout`] — the order creation pipeline and status machine
//! - [`returns`] — return/refund workflow and operator restock
//!
//! Every mutation runs inside a single redb write transaction obtained
//! from [`storage::StoreStorage`]; an error path simply drops the
//! transaction, so no partial order, stock, cart or point state is ever
//! visible. Notifications fire after commit and never roll anything back.

pub mod cart;
pub mod checkout;
pub mod loyalty;
pub mod promo;
pub mod returns;
pub mod storage;

use std::sync::Arc;

use thiserror::Error;

use crate::notify::Notifier;
use storage::{StorageError, StoreStorage};

pub use checkout::PaymentSource;

/// Domain errors surfaced to callers. Anything not in this taxonomy is a
/// `Storage` error: opaque, fatal to the request, transaction aborted.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Out of stock: {product_id}")]
    OutOfStock {
        product_id: String,
        size: Option<String>,
    },

    #[error("Insufficient points: requested {requested}, balance {balance}")]
    InsufficientPoints { requested: i64, balance: i64 },

    #[error("Promotion not found: {0}")]
    PromoNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Return not found for order: {0}")]
    ReturnNotFound(String),

    #[error("Cart line not found: {0}")]
    CartLineNotFound(String),

    #[error("Order already has a return: {0}")]
    DuplicateReturn(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Not the order owner")]
    NotOwner,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The engine: storage plus the notification collaborator.
///
/// Cheap to clone; handlers hold it through [`crate::core::StoreState`].
#[derive(Clone)]
pub struct StoreEngine {
    storage: StoreStorage,
    notifier: Arc<dyn Notifier>,
}

impl StoreEngine {
    pub fn new(storage: StoreStorage, notifier: Arc<dyn Notifier>) -> Self {
        Self { storage, notifier }
    }

    pub fn storage(&self) -> &StoreStorage {
        &self.storage
    }

    pub fn get_product(&self, product_id: &str) -> StoreResult<shared::Product> {
        self.storage
            .get_product(product_id)?
            .ok_or_else(|| StoreError::ProductNotFound(product_id.to_string()))
    }

    pub fn list_products(&self) -> StoreResult<Vec<shared::Product>> {
        Ok(self.storage.list_products()?)
    }

    pub fn upsert_product(&self, product: &shared::Product) -> StoreResult<()> {
        let txn = self.storage.begin_write()?;
        self.storage.put_product_txn(&txn, product)?;
        txn.commit().map_err(storage::StorageError::from)?;
        Ok(())
    }

    /// Fire-and-forget notification; failures are logged, never returned.
    pub(crate) async fn notify_best_effort(
        &self,
        user_id: &str,
        notification: crate::notify::Notification,
    ) {
        if let Err(e) = self.notifier.send(user_id, notification).await {
            tracing::warn!(user_id = %user_id, error = %e, "Notification delivery failed");
        }
    }
}

impl std::fmt::Debug for StoreEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::notify::TracingNotifier;
    use shared::{Product, SizeStock};

    /// Engine over an in-memory database.
    pub fn create_test_engine() -> StoreEngine {
        let storage = StoreStorage::open_in_memory().unwrap();
        StoreEngine::new(storage, Arc::new(TracingNotifier))
    }

    /// Engine with a caller-supplied notifier.
    pub fn create_test_engine_with(notifier: Arc<dyn Notifier>) -> StoreEngine {
        let storage = StoreStorage::open_in_memory().unwrap();
        StoreEngine::new(storage, notifier)
    }

    /// Seed a product with aggregate stock only.
    pub fn seed_product(engine: &StoreEngine, id: &str, price: i64, stock: i64) {
        let product = Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            price,
            sale_price: None,
            stock_quantity: stock,
            sizes: vec![],
        };
        let txn = engine.storage().begin_write().unwrap();
        engine.storage().put_product_txn(&txn, &product).unwrap();
        txn.commit().unwrap();
    }

    /// Seed a product with per-size stock records.
    pub fn seed_sized_product(
        engine: &StoreEngine,
        id: &str,
        price: i64,
        sizes: &[(&str, i64)],
    ) {
        let product = Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            price,
            sale_price: None,
            stock_quantity: sizes.iter().map(|(_, q)| q).sum(),
            sizes: sizes
                .iter()
                .map(|(s, q)| SizeStock {
                    size: s.to_string(),
                    quantity: *q,
                })
                .collect(),
        };
        let txn = engine.storage().begin_write().unwrap();
        engine.storage().put_product_txn(&txn, &product).unwrap();
        txn.commit().unwrap();
    }

    /// Set a user's point balance directly.
    pub fn seed_points(engine: &StoreEngine, user_id: &str, balance: i64) {
        let txn = engine.storage().begin_write().unwrap();
        engine
            .storage()
            .set_points_balance_txn(&txn, user_id, balance)
            .unwrap();
        txn.commit().unwrap();
    }
}
