//! Catalog collaborator types.
//!
//! The catalog itself (CRUD, browsing) is an external concern; the engine
//! only reads price/stock and mutates stock counts. The aggregate
//! `stock_quantity` and the matching size entry are always updated
//! together — divergence between them is an invariant violation.

use serde::{Deserialize, Serialize};

use crate::money::Amount;

/// Per-size stock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeStock {
    pub size: String,
    pub quantity: i64,
}

/// Product as seen by the order engine: identity, pricing, stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// List price in minor units.
    pub price: Amount,
    /// Sale price in minor units; takes precedence over `price` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<Amount>,
    /// Aggregate stock across all sizes.
    pub stock_quantity: i64,
    /// Per-size stock; empty for unsized products.
    #[serde(default)]
    pub sizes: Vec<SizeStock>,
}

impl Product {
    /// Price charged right now: sale price if present, else list price.
    pub fn effective_price(&self) -> Amount {
        self.sale_price.unwrap_or(self.price)
    }

    /// Stock available for the given size, or the aggregate when no size
    /// is requested.
    pub fn available_stock(&self, size: Option<&str>) -> i64 {
        match size {
            Some(s) => self
                .sizes
                .iter()
                .find(|entry| entry.size == s)
                .map(|entry| entry.quantity)
                .unwrap_or(0),
            None => self.stock_quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_sizes() -> Product {
        Product {
            id: "p1".into(),
            name: "Tee".into(),
            price: 5_000,
            sale_price: None,
            stock_quantity: 10,
            sizes: vec![
                SizeStock { size: "M".into(), quantity: 4 },
                SizeStock { size: "L".into(), quantity: 6 },
            ],
        }
    }

    #[test]
    fn test_effective_price_prefers_sale() {
        let mut p = product_with_sizes();
        assert_eq!(p.effective_price(), 5_000);
        p.sale_price = Some(3_500);
        assert_eq!(p.effective_price(), 3_500);
    }

    #[test]
    fn test_available_stock_by_size() {
        let p = product_with_sizes();
        assert_eq!(p.available_stock(None), 10);
        assert_eq!(p.available_stock(Some("M")), 4);
        assert_eq!(p.available_stock(Some("XL")), 0);
    }
}
