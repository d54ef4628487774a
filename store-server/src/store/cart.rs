//! Cart store: the per-user mutable line collection consumed at checkout.
//!
//! Lines are unique per (user, product, size); adding an existing
//! combination merges by summing quantities. Every mutation is
//! stock-checked against the product's current counts.

use shared::CartLine;
use shared::util::now_millis;

use super::{StoreEngine, StoreError, StoreResult};

/// A guest-held cart line replayed into the server cart on login.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct GuestLine {
    pub product_id: String,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: i64,
}

impl StoreEngine {
    /// Add a product to the cart, merging with an existing (product, size)
    /// line if present.
    pub fn add_to_cart(
        &self,
        user_id: &str,
        product_id: &str,
        size: Option<String>,
        quantity: i64,
    ) -> StoreResult<CartLine> {
        if quantity < 1 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        let txn = self.storage().begin_write()?;

        let product = self
            .storage()
            .get_product_txn(&txn, product_id)?
            .ok_or_else(|| StoreError::ProductNotFound(product_id.to_string()))?;

        let existing = self
            .storage()
            .cart_lines_txn(&txn, user_id)?
            .into_iter()
            .find(|line| line.product_id == product_id && line.size == size);

        let line = match existing {
            Some(mut line) => {
                line.quantity = line.quantity.checked_add(quantity).ok_or_else(|| {
                    StoreError::OutOfStock {
                        product_id: product_id.to_string(),
                        size: size.clone(),
                    }
                })?;
                line
            }
            None => CartLine {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: user_id.to_string(),
                product_id: product_id.to_string(),
                size: size.clone(),
                quantity,
            },
        };

        if line.quantity > product.available_stock(line.size.as_deref()) {
            return Err(StoreError::OutOfStock {
                product_id: product_id.to_string(),
                size: line.size,
            });
        }

        self.storage().put_cart_line_txn(&txn, &line)?;
        txn.commit().map_err(super::storage::StorageError::from)?;

        tracing::debug!(user_id = %user_id, product_id = %product_id, quantity = line.quantity, "Cart line upserted");
        Ok(line)
    }

    /// Change a line's quantity. Rejects quantities below one and
    /// quantities exceeding current stock.
    pub fn update_cart_line(
        &self,
        user_id: &str,
        line_id: &str,
        quantity: i64,
    ) -> StoreResult<CartLine> {
        if quantity < 1 {
            return Err(StoreError::InvalidQuantity(quantity));
        }

        let txn = self.storage().begin_write()?;

        let mut line = self
            .storage()
            .get_cart_line_txn(&txn, user_id, line_id)?
            .ok_or_else(|| StoreError::CartLineNotFound(line_id.to_string()))?;

        let product = self
            .storage()
            .get_product_txn(&txn, &line.product_id)?
            .ok_or_else(|| StoreError::ProductNotFound(line.product_id.clone()))?;

        if quantity > product.available_stock(line.size.as_deref()) {
            return Err(StoreError::OutOfStock {
                product_id: line.product_id,
                size: line.size,
            });
        }

        line.quantity = quantity;
        self.storage().put_cart_line_txn(&txn, &line)?;
        txn.commit().map_err(super::storage::StorageError::from)?;
        Ok(line)
    }

    pub fn remove_cart_line(&self, user_id: &str, line_id: &str) -> StoreResult<()> {
        let txn = self.storage().begin_write()?;
        let removed = self.storage().remove_cart_line_txn(&txn, user_id, line_id)?;
        if !removed {
            return Err(StoreError::CartLineNotFound(line_id.to_string()));
        }
        txn.commit().map_err(super::storage::StorageError::from)?;
        Ok(())
    }

    pub fn list_cart(&self, user_id: &str) -> StoreResult<Vec<CartLine>> {
        Ok(self.storage().cart_lines(user_id)?)
    }

    pub fn clear_cart(&self, user_id: &str) -> StoreResult<()> {
        let txn = self.storage().begin_write()?;
        self.storage().clear_cart_txn(&txn, user_id)?;
        txn.commit().map_err(super::storage::StorageError::from)?;
        Ok(())
    }

    /// Merge a guest (client-held) cart into the server cart after login.
    ///
    /// Best-effort: each line goes through `add_to_cart`, partial failures
    /// are logged and skipped, never fatal. Returns the merged line count.
    pub fn merge_guest_cart(&self, user_id: &str, lines: &[GuestLine]) -> usize {
        let started = now_millis();
        let mut merged = 0;
        for line in lines {
            match self.add_to_cart(user_id, &line.product_id, line.size.clone(), line.quantity) {
                Ok(_) => merged += 1,
                Err(e) => {
                    tracing::warn!(
                        user_id = %user_id,
                        product_id = %line.product_id,
                        error = %e,
                        "Skipping guest cart line"
                    );
                }
            }
        }
        tracing::info!(
            user_id = %user_id,
            merged,
            total = lines.len(),
            elapsed_ms = now_millis() - started,
            "Guest cart merged"
        );
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{create_test_engine, seed_product, seed_sized_product};

    #[test]
    fn test_add_and_list() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 10);

        let line = engine.add_to_cart("u1", "p1", None, 2).unwrap();
        assert_eq!(line.quantity, 2);

        let cart = engine.list_cart("u1").unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].product_id, "p1");
    }

    #[test]
    fn test_add_merges_same_product_and_size() {
        let engine = create_test_engine();
        seed_sized_product(&engine, "p1", 5_000, &[("M", 5), ("L", 5)]);

        engine.add_to_cart("u1", "p1", Some("M".into()), 1).unwrap();
        let merged = engine.add_to_cart("u1", "p1", Some("M".into()), 2).unwrap();
        assert_eq!(merged.quantity, 3);

        // Different size is a separate line
        engine.add_to_cart("u1", "p1", Some("L".into()), 1).unwrap();
        assert_eq!(engine.list_cart("u1").unwrap().len(), 2);
    }

    #[test]
    fn test_add_rejects_over_stock() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 3);

        engine.add_to_cart("u1", "p1", None, 2).unwrap();
        let err = engine.add_to_cart("u1", "p1", None, 2).unwrap_err();
        assert!(matches!(err, StoreError::OutOfStock { .. }));

        // Failed merge must not have altered the existing line
        assert_eq!(engine.list_cart("u1").unwrap()[0].quantity, 2);
    }

    #[test]
    fn test_add_merge_never_overflows() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 10);

        engine.add_to_cart("u1", "p1", None, 2).unwrap();
        let err = engine.add_to_cart("u1", "p1", None, i64::MAX).unwrap_err();
        assert!(matches!(err, StoreError::OutOfStock { .. }));

        assert_eq!(engine.list_cart("u1").unwrap()[0].quantity, 2);
    }

    #[test]
    fn test_add_checks_size_stock_not_aggregate() {
        let engine = create_test_engine();
        seed_sized_product(&engine, "p1", 5_000, &[("M", 1), ("L", 9)]);

        let err = engine.add_to_cart("u1", "p1", Some("M".into()), 2).unwrap_err();
        assert!(matches!(err, StoreError::OutOfStock { .. }));
    }

    #[test]
    fn test_add_unknown_product() {
        let engine = create_test_engine();
        let err = engine.add_to_cart("u1", "ghost", None, 1).unwrap_err();
        assert!(matches!(err, StoreError::ProductNotFound(_)));
    }

    #[test]
    fn test_update_quantity_bounds() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 5);
        let line = engine.add_to_cart("u1", "p1", None, 1).unwrap();

        let err = engine.update_cart_line("u1", &line.id, 0).unwrap_err();
        assert!(matches!(err, StoreError::InvalidQuantity(0)));

        let err = engine.update_cart_line("u1", &line.id, 6).unwrap_err();
        assert!(matches!(err, StoreError::OutOfStock { .. }));

        let updated = engine.update_cart_line("u1", &line.id, 5).unwrap();
        assert_eq!(updated.quantity, 5);
    }

    #[test]
    fn test_remove_and_clear() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 10);
        seed_product(&engine, "p2", 2_000, 10);

        let line = engine.add_to_cart("u1", "p1", None, 1).unwrap();
        engine.add_to_cart("u1", "p2", None, 1).unwrap();

        engine.remove_cart_line("u1", &line.id).unwrap();
        assert_eq!(engine.list_cart("u1").unwrap().len(), 1);

        let err = engine.remove_cart_line("u1", &line.id).unwrap_err();
        assert!(matches!(err, StoreError::CartLineNotFound(_)));

        engine.clear_cart("u1").unwrap();
        assert!(engine.list_cart("u1").unwrap().is_empty());
    }

    #[test]
    fn test_merge_guest_cart_is_best_effort() {
        let engine = create_test_engine();
        seed_product(&engine, "p1", 5_000, 10);

        let lines = vec![
            GuestLine { product_id: "p1".into(), size: None, quantity: 2 },
            GuestLine { product_id: "ghost".into(), size: None, quantity: 1 },
            GuestLine { product_id: "p1".into(), size: None, quantity: 1 },
        ];
        let merged = engine.merge_guest_cart("u1", &lines);
        assert_eq!(merged, 2);

        let cart = engine.list_cart("u1").unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 3);
    }
}
