use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::sleep;

use nexus_retail::catalog::{bootstrap::seed_demo_catalog, Catalog, Product};
use nexus_retail::chat::ChatManager;
use nexus_retail::identity::{Directory, Role};
use nexus_retail::notify::NullSink;
use nexus_retail::price::{ChatNotice, PriceManager};
use nexus_retail::store::StoreConfig;

struct Fixture {
    chat: Arc<ChatManager>,
    prices: Arc<PriceManager>,
    catalog: Arc<Catalog>,
}

fn build(dir: &TempDir, chat_ttl_ms: i64, price_ttl_ms: i64) -> Fixture {
    let catalog = Arc::new(Catalog::new());
    seed_demo_catalog(&catalog);
    catalog.insert(Product {
        id: 7,
        name: "Test Widget".to_string(),
        category: "Test".to_string(),
        price: 100,
        description: "integration fixture".to_string(),
        rating: 4.0,
        reviews: 1,
    });

    let directory = Arc::new(Directory::new());
    directory.register("b1", "Budi", "budi@user.com").unwrap();
    directory.register("s1", "Sari", "sari@seller.com").unwrap();

    let chat = ChatManager::new(
        StoreConfig::new("chat_sessions", dir.path()).with_ttl_ms(chat_ttl_ms),
        Arc::new(NullSink),
    );
    let prices = PriceManager::new(
        StoreConfig::new("price_overrides", dir.path()).with_ttl_ms(price_ttl_ms),
        catalog.clone(),
        directory,
        Arc::new(NullSink),
    );

    Fixture {
        chat,
        prices,
        catalog,
    }
}

#[tokio::test]
async fn test_chat_survives_restart_within_window() {
    let dir = TempDir::new().unwrap();

    let fx = build(&dir, 60_000, 60_000);
    fx.chat.restore();
    fx.chat.send(42, "b1", Role::Buyer, "Hello").unwrap();
    fx.chat.shutdown();
    drop(fx);

    // simulated reload: a fresh process picks the thread back up
    let fx = build(&dir, 60_000, 60_000);
    assert_eq!(fx.chat.restore(), 1);
    let messages = fx.chat.list_messages(42);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "Hello");
    assert!(!messages[0].read);
}

#[tokio::test]
async fn test_restart_reconciles_expired_chat() {
    let dir = TempDir::new().unwrap();

    let fx = build(&dir, 100, 100);
    fx.chat.restore();
    fx.chat.send(42, "b1", Role::Buyer, "Hello").unwrap();
    fx.chat.shutdown();
    drop(fx);

    sleep(Duration::from_millis(150)).await;

    // expired while "down": restoration must evict, not leave it live
    let fx = build(&dir, 100, 100);
    assert_eq!(fx.chat.restore(), 0);
    assert!(fx.chat.list_messages(42).is_empty());
}

#[tokio::test]
async fn test_restart_reconciles_expired_override() {
    let dir = TempDir::new().unwrap();

    let fx = build(&dir, 100, 100);
    fx.prices.restore();
    fx.prices.set_price(7, "s1", 80).unwrap();
    fx.prices.shutdown();
    drop(fx);

    sleep(Duration::from_millis(150)).await;

    // the fresh catalog starts at the base price; restoration must drop the
    // stale override instead of resurrecting the 80
    let fx = build(&dir, 100, 100);
    assert_eq!(fx.prices.restore(), 0);
    assert_eq!(fx.prices.effective_price(7).unwrap(), 100);
    assert_eq!(fx.catalog.get(7).unwrap().price, 100);
}

#[tokio::test]
async fn test_override_restored_across_restart_keeps_original() {
    let dir = TempDir::new().unwrap();

    let fx = build(&dir, 60_000, 60_000);
    fx.prices.restore();
    fx.prices.set_price(7, "s1", 80).unwrap();
    fx.prices.shutdown();
    drop(fx);

    let fx = build(&dir, 60_000, 60_000);
    assert_eq!(fx.prices.restore(), 1);
    let info = fx.prices.override_info(7).unwrap();
    assert_eq!(info.original_price, 100);
    assert_eq!(info.current_price, 80);
    assert_eq!(fx.prices.effective_price(7).unwrap(), 80);
}

#[tokio::test]
async fn test_price_reset_posts_chat_notice() {
    let dir = TempDir::new().unwrap();
    let fx = build(&dir, 60_000, 150);
    fx.chat.restore();
    fx.prices.restore();

    struct Bridge {
        chat: Arc<ChatManager>,
    }
    impl ChatNotice for Bridge {
        fn price_changed(&self, _product_id: u64, _new_price: u64) {}
        fn price_reset(&self, product_id: u64, restored_price: u64) {
            let text = format!("Harga kembali normal ke {}", restored_price);
            let _ = self.chat.send(product_id, "system", Role::Seller, &text);
        }
    }
    fx.prices.set_chat_notice(Arc::new(Bridge {
        chat: fx.chat.clone(),
    }));

    // the buyer has an open thread on the product, then the override expires
    fx.chat.send(7, "b1", Role::Buyer, "is this on sale?").unwrap();
    fx.prices.set_price(7, "s1", 80).unwrap();

    sleep(Duration::from_millis(300)).await;
    assert_eq!(fx.prices.effective_price(7).unwrap(), 100);

    let messages = fx.chat.list_messages(7);
    let notice = messages.last().expect("reset notice should be in the thread");
    assert_eq!(notice.sender_id, "system");
    assert!(notice.text.contains("100"));
}

#[tokio::test]
async fn test_full_storefront_flow() {
    let dir = TempDir::new().unwrap();
    let fx = build(&dir, 60_000, 60_000);
    fx.chat.restore();
    fx.prices.restore();

    // buyer asks, seller discounts, buyer reads
    fx.chat.send(7, "b1", Role::Buyer, "any discount?").unwrap();
    fx.prices.set_price(7, "s1", 90).unwrap();
    fx.chat.send(7, "s1", Role::Seller, "set to 90 for you").unwrap();
    fx.chat.mark_read(7, "b1");

    assert_eq!(fx.prices.effective_price(7).unwrap(), 90);
    let messages = fx.chat.list_messages(7);
    assert_eq!(messages.len(), 2);
    assert!(messages[1].read); // seller's message, read by the buyer
    assert!(!messages[0].read); // buyer's own message untouched

    // seller walks the price again inside the same window
    fx.prices.set_price(7, "s1", 85).unwrap();
    let info = fx.prices.override_info(7).unwrap();
    assert_eq!(info.original_price, 100);

    // eager cleanup from the admin side
    assert!(fx.prices.clear_override(7));
    assert_eq!(fx.catalog.get(7).unwrap().price, 100);
    assert!(fx.chat.delete_history(7));
    assert!(fx.chat.list_messages(7).is_empty());
}
