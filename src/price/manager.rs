use std::sync::{Arc, OnceLock};

use crate::catalog::Catalog;
use crate::identity::{Directory, Role};
use crate::notify::{Event, NotificationSink};
use crate::price::error::PriceError;
use crate::price::types::{OverrideInfo, PriceOverride};
use crate::store::{now_ms, EvictHook, RecordStore, StoreConfig};

/// Optional cross-subsystem collaborator, typically a bridge that posts a
/// system message into the product's chat thread. Invoked by the price
/// manager after its own state change; price logic never reaches into chat
/// internals directly.
pub trait ChatNotice: Send + Sync {
    fn price_changed(&self, product_id: u64, new_price: u64);
    fn price_reset(&self, product_id: u64, restored_price: u64);
}

/// Shared with the eviction hook, which outlives `new()`.
struct HookCtx {
    catalog: Arc<Catalog>,
    sink: Arc<dyn NotificationSink>,
    notice: OnceLock<Arc<dyn ChatNotice>>,
}

impl HookCtx {
    /// Expiry side effect: restore the pre-override price into the catalog.
    /// The store has already removed the record, so this runs exactly once
    /// per override lifetime regardless of whether the timer or a sweep
    /// detected the expiry.
    fn restore_original(&self, ov: PriceOverride) {
        if let Err(e) = self.catalog.set_price(ov.product_id, ov.original_price) {
            tracing::warn!(product_id = ov.product_id, error = %e, "could not restore price, product missing from catalog");
        }
        tracing::info!(
            product_id = ov.product_id,
            restored_price = ov.original_price,
            "price override expired, original price restored"
        );
        self.sink.notify(Event::PriceReset {
            product_id: ov.product_id,
            restored_price: ov.original_price,
        });
        if let Some(notice) = self.notice.get() {
            notice.price_reset(ov.product_id, ov.original_price);
        }
    }
}

/// Temporary price overrides keyed by product id. An override shadows the
/// catalog price until the seller's inactivity window elapses, at which point
/// the catalog price is restored.
pub struct PriceManager {
    store: Arc<RecordStore<PriceOverride>>,
    catalog: Arc<Catalog>,
    directory: Arc<Directory>,
    ctx: Arc<HookCtx>,
}

impl PriceManager {
    pub fn new(
        config: StoreConfig,
        catalog: Arc<Catalog>,
        directory: Arc<Directory>,
        sink: Arc<dyn NotificationSink>,
    ) -> Arc<Self> {
        let ctx = Arc::new(HookCtx {
            catalog: catalog.clone(),
            sink,
            notice: OnceLock::new(),
        });
        let hook_ctx = ctx.clone();
        let on_evict: EvictHook<PriceOverride> =
            Arc::new(move |_key, ov: PriceOverride| hook_ctx.restore_original(ov));
        let store = RecordStore::new(config, on_evict);
        Arc::new(Self {
            store,
            catalog,
            directory,
            ctx,
        })
    }

    /// Installs the chat-notice collaborator. Can only be set once; later
    /// calls are ignored.
    pub fn set_chat_notice(&self, notice: Arc<dyn ChatNotice>) {
        let _ = self.ctx.notice.set(notice);
    }

    /// Reconciles persisted overrides against the wall clock (restoring the
    /// catalog for any that expired while the process was down) and
    /// reschedules timers; must run once at startup.
    pub fn restore(&self) -> usize {
        self.store.restore_from_persistence()
    }

    pub fn start_sweeper(&self) {
        self.store.spawn_sweeper();
    }

    /// One immediate reconciliation pass; returns the eviction count.
    pub fn sweep_now(&self) -> usize {
        self.store.sweep(now_ms())
    }

    pub fn shutdown(&self) {
        self.store.shutdown();
    }

    pub fn set_price(
        &self,
        product_id: u64,
        seller_id: &str,
        new_price: u64,
    ) -> Result<PriceOverride, PriceError> {
        if self.directory.role_of(seller_id) != Some(Role::Seller) {
            return Err(PriceError::NotSeller(seller_id.to_string()));
        }
        if new_price == 0 {
            return Err(PriceError::Validation(
                "price must be a positive amount".to_string(),
            ));
        }
        // evicts a stale override first, so the effective price compared
        // against is post-reconciliation
        let effective = self.effective_price(product_id)?;
        if new_price == effective {
            return Err(PriceError::Validation(
                "new price equals the current effective price".to_string(),
            ));
        }

        // existence check only; the authoritative base-price read happens
        // inside the upsert closure, after the store has settled liveness
        let base_fallback = self
            .catalog
            .get(product_id)
            .map(|p| p.price)
            .ok_or(PriceError::ProductNotFound(product_id))?;

        let record = self.store.upsert(&product_id.to_string(), |existing| {
            match existing {
                Some(mut ov) => {
                    // same-window override: original_price is preserved, the
                    // chain must not compound
                    ov.current_price = new_price;
                    ov.modified_by = seller_id.to_string();
                    ov.modified_at = now_ms();
                    ov
                }
                None => {
                    // a leftover override that expired between the checks
                    // above and here has already had its hook restore the
                    // catalog, so this read always sees the true base price
                    let base_price = self
                        .catalog
                        .get(product_id)
                        .map(|p| p.price)
                        .unwrap_or(base_fallback);
                    PriceOverride {
                        product_id,
                        original_price: base_price,
                        current_price: new_price,
                        modified_by: seller_id.to_string(),
                        modified_at: now_ms(),
                    }
                }
            }
        });

        self.catalog.set_price(product_id, new_price)?;
        tracing::info!(product_id, new_price, seller_id = %seller_id, "price override set");

        self.ctx.sink.notify(Event::PriceChanged {
            product_id,
            new_price,
            seller_id: seller_id.to_string(),
        });
        if let Some(notice) = self.ctx.notice.get() {
            notice.price_changed(product_id, new_price);
        }
        Ok(record.payload)
    }

    /// The price a buyer currently sees: the live override's price if any,
    /// else the catalog base price. An expired-but-unswept override is
    /// evicted (and the catalog restored) before this answers.
    pub fn effective_price(&self, product_id: u64) -> Result<u64, PriceError> {
        if let Some(record) = self.store.get(&product_id.to_string()) {
            return Ok(record.payload.current_price);
        }
        self.catalog
            .get(product_id)
            .map(|p| p.price)
            .ok_or(PriceError::ProductNotFound(product_id))
    }

    pub fn is_overridden(&self, product_id: u64) -> bool {
        self.store.get(&product_id.to_string()).is_some()
    }

    pub fn override_info(&self, product_id: u64) -> Option<OverrideInfo> {
        let record = self.store.get(&product_id.to_string())?;
        let now = now_ms();
        let expires_at = record.expires_at(self.store.ttl_ms());
        let remaining = (expires_at - now).max(0);
        let ov = record.payload;
        let difference = ov.current_price as i64 - ov.original_price as i64;
        Some(OverrideInfo {
            product_id: ov.product_id,
            original_price: ov.original_price,
            current_price: ov.current_price,
            modified_by: ov.modified_by,
            modified_at: ov.modified_at,
            expires_at,
            time_remaining_ms: remaining,
            minutes_remaining: (remaining + 59_999) / 60_000,
            seconds_remaining: (remaining % 60_000 + 999) / 1_000,
            price_difference: difference,
            percent_change: difference as f64 / ov.original_price as f64 * 100.0,
        })
    }

    /// Eager admin reset for one product: restores the catalog price and
    /// removes the override without the expiry side effect firing again.
    pub fn clear_override(&self, product_id: u64) -> bool {
        let key = product_id.to_string();
        let Some(record) = self.store.get(&key) else {
            return false;
        };
        let removed = self.store.delete(&key);
        if removed {
            let original = record.payload.original_price;
            if let Err(e) = self.catalog.set_price(product_id, original) {
                tracing::warn!(product_id, error = %e, "could not restore price on clear");
            }
            tracing::info!(product_id, restored_price = original, "price override cleared");
            self.ctx.sink.notify(Event::PriceReset {
                product_id,
                restored_price: original,
            });
            if let Some(notice) = self.ctx.notice.get() {
                notice.price_reset(product_id, original);
            }
        }
        removed
    }

    /// Eager admin reset for every product.
    pub fn clear_all(&self) -> usize {
        let product_ids: Vec<u64> = self
            .store
            .live_entries()
            .into_iter()
            .map(|record| record.payload.product_id)
            .collect();
        let mut cleared = 0;
        for product_id in product_ids {
            if self.clear_override(product_id) {
                cleared += 1;
            }
        }
        cleared
    }

    pub fn live_overrides(&self) -> Vec<PriceOverride> {
        self.store
            .live_entries()
            .into_iter()
            .map(|record| record.payload)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::sleep;

    use crate::catalog::bootstrap::seed_demo_catalog;
    use crate::catalog::Product;
    use crate::notify::NullSink;

    fn fixture(dir: &TempDir, ttl_ms: i64) -> (Arc<PriceManager>, Arc<Catalog>) {
        let catalog = Arc::new(Catalog::new());
        seed_demo_catalog(&catalog);
        catalog.insert(Product {
            id: 7,
            name: "Test Widget".to_string(),
            category: "Test".to_string(),
            price: 100,
            description: "fixture".to_string(),
            rating: 4.0,
            reviews: 1,
        });
        let directory = Arc::new(Directory::new());
        directory.register("s1", "Sari", "sari@seller.com").unwrap();
        directory.register("b1", "Budi", "budi@user.com").unwrap();
        let config = StoreConfig::new("price_overrides", dir.path()).with_ttl_ms(ttl_ms);
        let manager = PriceManager::new(config, catalog.clone(), directory, Arc::new(NullSink));
        (manager, catalog)
    }

    #[tokio::test]
    async fn test_non_seller_cannot_set_price() {
        let dir = TempDir::new().unwrap();
        let (prices, _) = fixture(&dir, 60_000);

        assert!(matches!(
            prices.set_price(7, "b1", 80).unwrap_err(),
            PriceError::NotSeller(_)
        ));
        assert!(matches!(
            prices.set_price(7, "ghost", 80).unwrap_err(),
            PriceError::NotSeller(_)
        ));
    }

    #[tokio::test]
    async fn test_set_price_validation() {
        let dir = TempDir::new().unwrap();
        let (prices, _) = fixture(&dir, 60_000);

        assert!(matches!(
            prices.set_price(7, "s1", 0).unwrap_err(),
            PriceError::Validation(_)
        ));
        // no-change override is rejected, not silently accepted
        assert!(matches!(
            prices.set_price(7, "s1", 100).unwrap_err(),
            PriceError::Validation(_)
        ));
        assert!(matches!(
            prices.set_price(404, "s1", 80).unwrap_err(),
            PriceError::ProductNotFound(404)
        ));
    }

    #[tokio::test]
    async fn test_override_shadows_catalog_price() {
        let dir = TempDir::new().unwrap();
        let (prices, catalog) = fixture(&dir, 60_000);

        let ov = prices.set_price(7, "s1", 80).unwrap();
        assert_eq!(ov.original_price, 100);
        assert_eq!(ov.current_price, 80);
        assert_eq!(prices.effective_price(7).unwrap(), 80);
        assert_eq!(catalog.get(7).unwrap().price, 80);
    }

    #[tokio::test]
    async fn test_second_override_preserves_original_price() {
        let dir = TempDir::new().unwrap();
        let (prices, _) = fixture(&dir, 60_000);

        prices.set_price(7, "s1", 80).unwrap();
        let second = prices.set_price(7, "s1", 60).unwrap();

        // not 80: the chain must not compound
        assert_eq!(second.original_price, 100);
        assert_eq!(second.current_price, 60);

        let info = prices.override_info(7).unwrap();
        assert_eq!(info.original_price, 100);
        assert_eq!(info.price_difference, -40);
    }

    #[tokio::test]
    async fn test_no_change_rejection_ignores_stale_catalog_price() {
        let dir = TempDir::new().unwrap();
        let (prices, _) = fixture(&dir, 60_000);

        prices.set_price(7, "s1", 80).unwrap();
        let before = prices.override_info(7).unwrap();

        // 80 is now the effective price, overriding to it again is a no-op
        assert!(matches!(
            prices.set_price(7, "s1", 80).unwrap_err(),
            PriceError::Validation(_)
        ));

        // the rejected call left the override untouched: same price, same
        // modification stamp, and no refreshed expiry window
        let after = prices.override_info(7).unwrap();
        assert_eq!(after.current_price, 80);
        assert_eq!(after.modified_at, before.modified_at);
        assert_eq!(after.expires_at, before.expires_at);
    }

    #[tokio::test]
    async fn test_override_after_expiry_does_not_compound() {
        let dir = TempDir::new().unwrap();
        let (prices, catalog) = fixture(&dir, 100);

        prices.set_price(7, "s1", 80).unwrap();
        prices.shutdown(); // the new override must reconcile the leftover itself
        sleep(Duration::from_millis(150)).await;

        // the first override expired unswept; the second must capture the
        // restored base, not the stale 80
        let second = prices.set_price(7, "s1", 70).unwrap();
        assert_eq!(second.original_price, 100);
        assert_eq!(second.current_price, 70);
        assert_eq!(catalog.get(7).unwrap().price, 70);
    }

    #[tokio::test]
    async fn test_expiry_restores_catalog_price() {
        let dir = TempDir::new().unwrap();
        let (prices, catalog) = fixture(&dir, 100);

        prices.set_price(7, "s1", 80).unwrap();
        assert_eq!(prices.effective_price(7).unwrap(), 80);

        sleep(Duration::from_millis(250)).await;
        assert_eq!(prices.effective_price(7).unwrap(), 100);
        assert_eq!(catalog.get(7).unwrap().price, 100);
        assert!(prices.override_info(7).is_none());
    }

    #[tokio::test]
    async fn test_eviction_on_read_restores_catalog() {
        let dir = TempDir::new().unwrap();
        let (prices, catalog) = fixture(&dir, 100);

        prices.set_price(7, "s1", 80).unwrap();
        prices.shutdown(); // timer cancelled: the read itself must reconcile

        sleep(Duration::from_millis(150)).await;
        assert_eq!(prices.effective_price(7).unwrap(), 100);
        assert_eq!(catalog.get(7).unwrap().price, 100);
    }

    #[tokio::test]
    async fn test_clear_override_restores_eagerly() {
        let dir = TempDir::new().unwrap();
        let (prices, catalog) = fixture(&dir, 60_000);

        prices.set_price(7, "s1", 80).unwrap();
        assert!(prices.clear_override(7));
        assert_eq!(catalog.get(7).unwrap().price, 100);
        assert!(!prices.clear_override(7));
    }

    #[tokio::test]
    async fn test_override_info_reports_remaining_time() {
        let dir = TempDir::new().unwrap();
        let (prices, _) = fixture(&dir, 60_000);

        prices.set_price(7, "s1", 80).unwrap();
        let info = prices.override_info(7).unwrap();
        assert!(info.time_remaining_ms > 0 && info.time_remaining_ms <= 60_000);
        assert_eq!(info.minutes_remaining, 1);
        assert!((info.percent_change - -20.0).abs() < f64::EPSILON);
    }
}
