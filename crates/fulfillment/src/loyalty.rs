//! Loyalty accrual engine.

use common::{AccountId, Money};
use domain::{AccrualOutcome, LoyaltyAccount, LoyaltyTier};
use storage::LoyaltyStore;

/// Computes points for a purchase and applies them to an account.
#[derive(Debug, Clone)]
pub struct LoyaltyAccrualEngine<S> {
    store: S,
}

impl<S: LoyaltyStore> LoyaltyAccrualEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// One point per whole currency unit of the order total.
    pub fn points_for_total(total: Money) -> i64 {
        total.floor_units().max(0)
    }

    /// Adds points to an account and moves it to the tier its new total reaches.
    ///
    /// Returns `None` without touching the store when `points` is not
    /// positive. The store applies the increment and the tier resolution as
    /// one atomic step.
    #[tracing::instrument(skip(self), fields(account_id = %account_id))]
    pub async fn accrue(
        &self,
        account_id: AccountId,
        points: i64,
    ) -> storage::Result<Option<AccrualOutcome>> {
        if points <= 0 {
            return Ok(None);
        }

        let outcome = self.store.accrue_points(account_id, points).await?;

        metrics::counter!("loyalty_accruals_total").increment(1);
        if outcome.promoted() {
            metrics::counter!("loyalty_promotions_total").increment(1);
            tracing::info!(
                previous_tier = ?outcome.previous_tier,
                tier = ?outcome.account.tier,
                points = outcome.account.points,
                "loyalty tier changed"
            );
        }

        Ok(Some(outcome))
    }

    /// Reads an account's balance.
    pub async fn account(&self, account_id: AccountId) -> storage::Result<Option<LoyaltyAccount>> {
        self.store.get_account(account_id).await
    }

    /// Lists the tier ladder ordered by threshold.
    pub async fn tiers(&self) -> storage::Result<Vec<LoyaltyTier>> {
        self.store.list_tiers().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use storage::InMemoryStore;

    async fn engine_with_tiers() -> LoyaltyAccrualEngine<InMemoryStore> {
        let store = InMemoryStore::new();
        for tier in [
            LoyaltyTier::new("Bronze", 0, 0),
            LoyaltyTier::new("Silver", 100, 5),
            LoyaltyTier::new("Gold", 500, 10),
        ] {
            store.upsert_tier(&tier).await.unwrap();
        }
        LoyaltyAccrualEngine::new(store)
    }

    #[test]
    fn test_points_floor_the_total() {
        assert_eq!(
            LoyaltyAccrualEngine::<InMemoryStore>::points_for_total(Money::from_cents(15_099)),
            150
        );
        assert_eq!(
            LoyaltyAccrualEngine::<InMemoryStore>::points_for_total(Money::from_cents(99)),
            0
        );
        assert_eq!(
            LoyaltyAccrualEngine::<InMemoryStore>::points_for_total(Money::zero()),
            0
        );
    }

    #[tokio::test]
    async fn test_accrue_then_promote() {
        let engine = engine_with_tiers().await;
        let account = AccountId::new();

        let first = engine.accrue(account, 150).await.unwrap().unwrap();
        assert_eq!(first.account.points, 150);
        assert_eq!(first.account.tier.as_deref(), Some("Silver"));

        let second = engine.accrue(account, 370).await.unwrap().unwrap();
        assert_eq!(second.account.points, 520);
        assert_eq!(second.account.tier.as_deref(), Some("Gold"));
        assert_eq!(second.previous_tier.as_deref(), Some("Silver"));
        assert!(second.promoted());
    }

    #[tokio::test]
    async fn test_non_positive_points_are_a_no_op() {
        let engine = engine_with_tiers().await;
        let account = AccountId::new();

        assert!(engine.accrue(account, 0).await.unwrap().is_none());
        assert!(engine.accrue(account, -5).await.unwrap().is_none());
        assert!(engine.account(account).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_matching_tier_leaves_tier_empty() {
        let store = InMemoryStore::new();
        store
            .upsert_tier(&LoyaltyTier::new("Silver", 100, 5))
            .await
            .unwrap();
        let engine = LoyaltyAccrualEngine::new(store);

        let outcome = engine.accrue(AccountId::new(), 40).await.unwrap().unwrap();
        assert_eq!(outcome.account.points, 40);
        assert_eq!(outcome.account.tier, None);
        assert!(!outcome.promoted());
    }

    #[tokio::test]
    async fn test_concurrent_accruals_lose_nothing() {
        let engine = std::sync::Arc::new(engine_with_tiers().await);
        let account = AccountId::new();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move { engine.accrue(account, 25).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = engine.account(account).await.unwrap().unwrap();
        assert_eq!(stored.points, 500);
        assert_eq!(stored.tier.as_deref(), Some("Gold"));
    }

    proptest! {
        #[test]
        fn points_never_exceed_whole_units(cents in 0i64..10_000_000) {
            let points = LoyaltyAccrualEngine::<InMemoryStore>::points_for_total(Money::from_cents(cents));
            prop_assert!(points >= 0);
            prop_assert!(points * 100 <= cents);
            prop_assert!(cents - points * 100 < 100);
        }
    }
}
