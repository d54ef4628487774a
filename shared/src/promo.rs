//! Promotion rule types.
//!
//! A rule is a pure lookup result: validating a code has no side effects
//! and no "applied" state, so re-validation is always safe.

use serde::{Deserialize, Serialize};

use crate::money::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoKind {
    Percentage,
    Fixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromoRule {
    pub code: String,
    pub kind: PromoKind,
    /// Percentage (0–100) or a fixed amount in minor units, per `kind`.
    pub value: Amount,
    pub active: bool,
}

impl PromoRule {
    /// Discount this rule grants on a total, never exceeding the total.
    pub fn discount_on(&self, total: Amount) -> Amount {
        let discount = match self.kind {
            PromoKind::Percentage => total * self.value / 100,
            PromoKind::Fixed => self.value,
        };
        discount.clamp(0, total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(kind: PromoKind, value: Amount) -> PromoRule {
        PromoRule {
            code: "SAVE".into(),
            kind,
            value,
            active: true,
        }
    }

    #[test]
    fn test_percentage_discount() {
        assert_eq!(rule(PromoKind::Percentage, 10).discount_on(10_000), 1_000);
        assert_eq!(rule(PromoKind::Percentage, 100).discount_on(10_000), 10_000);
    }

    #[test]
    fn test_fixed_discount_capped_at_total() {
        assert_eq!(rule(PromoKind::Fixed, 1_500).discount_on(10_000), 1_500);
        assert_eq!(rule(PromoKind::Fixed, 20_000).discount_on(10_000), 10_000);
    }
}
