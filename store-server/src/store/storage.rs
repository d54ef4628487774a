//! redb-based storage for the storefront engine.
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `products` | product_id | `Product` | Price + stock counts |
//! | `cart_lines` | (user_id, line_id) | `CartLine` | Per-user mutable cart |
//! | `orders` | order_id | `Order` | Durable orders |
//! | `orders_by_reference` | payment_reference | order_id | Idempotency anchor |
//! | `returns` | order_id | `ReturnRequest` | One return per order |
//! | `loyalty_balances` | user_id | i64 | Point balance, mutated in place |
//! | `promotions` | code | `PromoRule` | Promotion lookup |
//! | `restock_interests` | (product_id, user_id) | `()` | Back-in-stock interest |
//!
//! # Durability and atomicity
//!
//! redb commits are persistent as soon as `commit()` returns and the file
//! is always in a consistent state; every engine state transition runs
//! inside one write transaction, so a crash mid-pipeline leaves no partial
//! order, stock or point state. redb serializes write transactions, which
//! is what closes the check-then-insert window on `payment_reference`.

use std::path::Path;
use std::sync::Arc;

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use thiserror::Error;

use shared::{CartLine, Order, Product, PromoRule, ReturnRequest};

const PRODUCTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("products");
const CART_TABLE: TableDefinition<(&str, &str), &[u8]> = TableDefinition::new("cart_lines");
const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");
const ORDER_REFS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("orders_by_reference");
const RETURNS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("returns");
const LOYALTY_TABLE: TableDefinition<&str, i64> = TableDefinition::new("loyalty_balances");
const PROMOS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("promotions");
const INTERESTS_TABLE: TableDefinition<(&str, &str), ()> =
    TableDefinition::new("restock_interests");

/// Upper bound for ranging over a composite string key prefix.
const KEY_MAX: &str = "\u{10FFFF}";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Storefront storage backed by redb.
#[derive(Clone)]
pub struct StoreStorage {
    db: Arc<Database>,
}

impl StoreStorage {
    /// Open or create the database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    /// Open an in-memory database (for testing).
    #[cfg(test)]
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        let storage = Self { db: Arc::new(db) };
        storage.init_tables()?;
        Ok(storage)
    }

    fn init_tables(&self) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let _ = txn.open_table(PRODUCTS_TABLE)?;
            let _ = txn.open_table(CART_TABLE)?;
            let _ = txn.open_table(ORDERS_TABLE)?;
            let _ = txn.open_table(ORDER_REFS_TABLE)?;
            let _ = txn.open_table(RETURNS_TABLE)?;
            let _ = txn.open_table(LOYALTY_TABLE)?;
            let _ = txn.open_table(PROMOS_TABLE)?;
            let _ = txn.open_table(INTERESTS_TABLE)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction. Dropping it without `commit()` aborts.
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Products ==========

    pub fn get_product(&self, product_id: &str) -> StorageResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_product_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StorageResult<Option<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_product_txn(&self, txn: &WriteTransaction, product: &Product) -> StorageResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let value = serde_json::to_vec(product)?;
        table.insert(product.id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn list_products(&self) -> StorageResult<Vec<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice(value.value())?);
        }
        Ok(products)
    }

    // ========== Cart lines ==========

    pub fn cart_lines(&self, user_id: &str) -> StorageResult<Vec<CartLine>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CART_TABLE)?;
        let mut lines = Vec::new();
        for result in table.range((user_id, "")..=(user_id, KEY_MAX))? {
            let (_key, value) = result?;
            lines.push(serde_json::from_slice(value.value())?);
        }
        Ok(lines)
    }

    pub fn cart_lines_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
    ) -> StorageResult<Vec<CartLine>> {
        let table = txn.open_table(CART_TABLE)?;
        let mut lines = Vec::new();
        for result in table.range((user_id, "")..=(user_id, KEY_MAX))? {
            let (_key, value) = result?;
            lines.push(serde_json::from_slice(value.value())?);
        }
        Ok(lines)
    }

    pub fn get_cart_line_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
        line_id: &str,
    ) -> StorageResult<Option<CartLine>> {
        let table = txn.open_table(CART_TABLE)?;
        match table.get((user_id, line_id))? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_cart_line_txn(&self, txn: &WriteTransaction, line: &CartLine) -> StorageResult<()> {
        let mut table = txn.open_table(CART_TABLE)?;
        let value = serde_json::to_vec(line)?;
        table.insert((line.user_id.as_str(), line.id.as_str()), value.as_slice())?;
        Ok(())
    }

    pub fn remove_cart_line_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
        line_id: &str,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(CART_TABLE)?;
        Ok(table.remove((user_id, line_id))?.is_some())
    }

    /// Remove every cart line for a user (bulk clear at checkout).
    pub fn clear_cart_txn(&self, txn: &WriteTransaction, user_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(CART_TABLE)?;
        let keys: Vec<String> = table
            .range((user_id, "")..=(user_id, KEY_MAX))?
            .filter_map(|r| r.ok())
            .map(|(key, _)| key.value().1.to_string())
            .collect();
        for line_id in &keys {
            table.remove((user_id, line_id.as_str()))?;
        }
        Ok(())
    }

    // ========== Orders ==========

    pub fn get_order(&self, order_id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_order_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Look up the order id for a payment reference (within transaction).
    pub fn order_id_by_reference_txn(
        &self,
        txn: &WriteTransaction,
        reference: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(ORDER_REFS_TABLE)?;
        Ok(table.get(reference)?.map(|v| v.value().to_string()))
    }

    /// Record the reference → order mapping. One order per reference, ever.
    pub fn put_reference_txn(
        &self,
        txn: &WriteTransaction,
        reference: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(ORDER_REFS_TABLE)?;
        table.insert(reference, order_id)?;
        Ok(())
    }

    /// Read-only reference lookup (the polling reader).
    pub fn order_by_reference(&self, reference: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let refs = read_txn.open_table(ORDER_REFS_TABLE)?;
        let order_id = match refs.get(reference)? {
            Some(v) => v.value().to_string(),
            None => return Ok(None),
        };
        let orders = read_txn.open_table(ORDERS_TABLE)?;
        match orders.get(order_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn orders_for_user(&self, user_id: &str) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.user_id == user_id {
                orders.push(order);
            }
        }
        orders.sort_by_key(|o| std::cmp::Reverse(o.created_at));
        Ok(orders)
    }

    // ========== Returns ==========

    pub fn get_return(&self, order_id: &str) -> StorageResult<Option<ReturnRequest>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RETURNS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_return_txn(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
    ) -> StorageResult<Option<ReturnRequest>> {
        let table = txn.open_table(RETURNS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_return_txn(
        &self,
        txn: &WriteTransaction,
        request: &ReturnRequest,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(RETURNS_TABLE)?;
        let value = serde_json::to_vec(request)?;
        table.insert(request.order_id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn list_returns(&self) -> StorageResult<Vec<ReturnRequest>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RETURNS_TABLE)?;
        let mut returns = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            returns.push(serde_json::from_slice(value.value())?);
        }
        Ok(returns)
    }

    // ========== Loyalty balances ==========

    pub fn points_balance(&self, user_id: &str) -> StorageResult<i64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(LOYALTY_TABLE)?;
        Ok(table.get(user_id)?.map(|v| v.value()).unwrap_or(0))
    }

    pub fn points_balance_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
    ) -> StorageResult<i64> {
        let table = txn.open_table(LOYALTY_TABLE)?;
        Ok(table.get(user_id)?.map(|v| v.value()).unwrap_or(0))
    }

    /// Overwrite a balance. Callers are responsible for the clamp-at-zero
    /// invariant; this never stores a negative value.
    pub fn set_points_balance_txn(
        &self,
        txn: &WriteTransaction,
        user_id: &str,
        balance: i64,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(LOYALTY_TABLE)?;
        table.insert(user_id, balance.max(0))?;
        Ok(())
    }

    // ========== Promotions ==========

    pub fn get_promo(&self, code: &str) -> StorageResult<Option<PromoRule>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PROMOS_TABLE)?;
        match table.get(code)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_promo(&self, rule: &PromoRule) -> StorageResult<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(PROMOS_TABLE)?;
            let value = serde_json::to_vec(rule)?;
            table.insert(rule.code.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    // ========== Restock interests ==========

    pub fn register_interest(&self, product_id: &str, user_id: &str) -> StorageResult<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(INTERESTS_TABLE)?;
            table.insert((product_id, user_id), ())?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Users who asked to be told when a product is back in stock.
    pub fn interests_for(&self, product_id: &str) -> StorageResult<Vec<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(INTERESTS_TABLE)?;
        let mut users = Vec::new();
        for result in table.range((product_id, "")..=(product_id, KEY_MAX))? {
            let (key, _value) = result?;
            users.push(key.value().1.to_string());
        }
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{OrderStatus, PromoKind, ShippingAddress};

    fn test_product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            price: 5_000,
            sale_price: None,
            stock_quantity: 10,
            sizes: vec![],
        }
    }

    fn test_order(id: &str, reference: &str) -> Order {
        Order {
            id: id.to_string(),
            user_id: "u1".into(),
            status: OrderStatus::Paid,
            amount: 10_000,
            shipping: ShippingAddress::default(),
            items: vec![],
            points_redeemed: 0,
            points_earned: 1,
            payment_reference: Some(reference.to_string()),
            created_at: shared::util::now_millis(),
            updated_at: shared::util::now_millis(),
        }
    }

    #[test]
    fn test_product_roundtrip() {
        let storage = StoreStorage::open_in_memory().unwrap();
        assert!(storage.get_product("p1").unwrap().is_none());

        let txn = storage.begin_write().unwrap();
        storage.put_product_txn(&txn, &test_product("p1")).unwrap();
        txn.commit().unwrap();

        let found = storage.get_product("p1").unwrap().unwrap();
        assert_eq!(found.price, 5_000);
        assert_eq!(storage.list_products().unwrap().len(), 1);
    }

    #[test]
    fn test_cart_lines_scoped_per_user() {
        let storage = StoreStorage::open_in_memory().unwrap();
        let txn = storage.begin_write().unwrap();
        for (user, line) in [("u1", "l1"), ("u1", "l2"), ("u2", "l3")] {
            let cart_line = CartLine {
                id: line.into(),
                user_id: user.into(),
                product_id: "p1".into(),
                size: None,
                quantity: 1,
            };
            storage.put_cart_line_txn(&txn, &cart_line).unwrap();
        }
        txn.commit().unwrap();

        assert_eq!(storage.cart_lines("u1").unwrap().len(), 2);
        assert_eq!(storage.cart_lines("u2").unwrap().len(), 1);

        let txn = storage.begin_write().unwrap();
        storage.clear_cart_txn(&txn, "u1").unwrap();
        txn.commit().unwrap();

        assert!(storage.cart_lines("u1").unwrap().is_empty());
        assert_eq!(storage.cart_lines("u2").unwrap().len(), 1);
    }

    #[test]
    fn test_order_reference_index() {
        let storage = StoreStorage::open_in_memory().unwrap();
        let order = test_order("o1", "ref-1");

        let txn = storage.begin_write().unwrap();
        assert!(storage.order_id_by_reference_txn(&txn, "ref-1").unwrap().is_none());
        storage.put_order_txn(&txn, &order).unwrap();
        storage.put_reference_txn(&txn, "ref-1", "o1").unwrap();
        txn.commit().unwrap();

        let found = storage.order_by_reference("ref-1").unwrap().unwrap();
        assert_eq!(found.id, "o1");
        assert!(storage.order_by_reference("ref-2").unwrap().is_none());
    }

    #[test]
    fn test_loyalty_balance_never_stored_negative() {
        let storage = StoreStorage::open_in_memory().unwrap();
        assert_eq!(storage.points_balance("u1").unwrap(), 0);

        let txn = storage.begin_write().unwrap();
        storage.set_points_balance_txn(&txn, "u1", -5).unwrap();
        txn.commit().unwrap();

        assert_eq!(storage.points_balance("u1").unwrap(), 0);
    }

    #[test]
    fn test_promo_roundtrip() {
        let storage = StoreStorage::open_in_memory().unwrap();
        let rule = PromoRule {
            code: "SAVE10".into(),
            kind: PromoKind::Percentage,
            value: 10,
            active: true,
        };
        storage.put_promo(&rule).unwrap();
        assert_eq!(storage.get_promo("SAVE10").unwrap().unwrap(), rule);
    }

    #[test]
    fn test_restock_interests() {
        let storage = StoreStorage::open_in_memory().unwrap();
        storage.register_interest("p1", "u1").unwrap();
        storage.register_interest("p1", "u2").unwrap();
        storage.register_interest("p2", "u3").unwrap();
        // Registering twice is a no-op
        storage.register_interest("p1", "u1").unwrap();

        let users = storage.interests_for("p1").unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.contains(&"u1".to_string()));
    }

    #[test]
    fn test_dropped_transaction_aborts() {
        let storage = StoreStorage::open_in_memory().unwrap();
        {
            let txn = storage.begin_write().unwrap();
            storage.put_product_txn(&txn, &test_product("p1")).unwrap();
            // dropped without commit
        }
        assert!(storage.get_product("p1").unwrap().is_none());
    }
}
