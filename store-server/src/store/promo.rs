//! Promotion validator: pure code → rule lookup, no applied state.

use shared::PromoRule;

use super::{StoreEngine, StoreError, StoreResult};

impl StoreEngine {
    /// Resolve a promotion code. Missing and inactive codes are
    /// indistinguishable to the caller. Re-validation is side-effect-free.
    pub fn validate_promo(&self, code: &str) -> StoreResult<PromoRule> {
        match self.storage().get_promo(code)? {
            Some(rule) if rule.active => Ok(rule),
            _ => Err(StoreError::PromoNotFound(code.to_string())),
        }
    }

    /// Operator upsert for the promotion store collaborator.
    pub fn upsert_promo(&self, rule: &PromoRule) -> StoreResult<()> {
        self.storage().put_promo(rule)?;
        tracing::info!(code = %rule.code, active = rule.active, "Promotion upserted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::create_test_engine;
    use shared::PromoKind;

    #[test]
    fn test_validate_active_code() {
        let engine = create_test_engine();
        engine
            .upsert_promo(&PromoRule {
                code: "SAVE10".into(),
                kind: PromoKind::Percentage,
                value: 10,
                active: true,
            })
            .unwrap();

        let rule = engine.validate_promo("SAVE10").unwrap();
        assert_eq!(rule.discount_on(10_000), 1_000);

        // Idempotent: validating twice changes nothing
        let again = engine.validate_promo("SAVE10").unwrap();
        assert_eq!(rule, again);
    }

    #[test]
    fn test_missing_and_inactive_codes_fail_alike() {
        let engine = create_test_engine();
        engine
            .upsert_promo(&PromoRule {
                code: "EXPIRED".into(),
                kind: PromoKind::Fixed,
                value: 500,
                active: false,
            })
            .unwrap();

        assert!(matches!(
            engine.validate_promo("NOPE").unwrap_err(),
            StoreError::PromoNotFound(_)
        ));
        assert!(matches!(
            engine.validate_promo("EXPIRED").unwrap_err(),
            StoreError::PromoNotFound(_)
        ));
    }
}
