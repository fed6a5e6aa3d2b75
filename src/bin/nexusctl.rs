use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use nexus_retail::catalog::{bootstrap, Catalog};
use nexus_retail::chat::ChatManager;
use nexus_retail::config::AppConfig;
use nexus_retail::identity::{Directory, Role};
use nexus_retail::notify::TracingSink;
use nexus_retail::price::{ChatNotice, PriceManager};

#[derive(Parser)]
#[command(
    name = "nexusctl",
    about = "Inspect and drive the Nexus Retail chat and price-override stores"
)]
struct Cli {
    /// Path to a TOML config file; falls back to the bundled defaults.
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the catalog with effective prices
    Catalog,
    /// Send a chat message on a product thread
    Send {
        #[arg(long)]
        product: u64,
        #[arg(long)]
        user: String,
        #[arg(long)]
        text: String,
    },
    /// Print a product's chat thread
    Log {
        #[arg(long)]
        product: u64,
    },
    /// Mark messages from the other side as read
    MarkRead {
        #[arg(long)]
        product: u64,
        #[arg(long)]
        reader: String,
    },
    /// Delete a product's chat history
    DeleteChat {
        #[arg(long)]
        product: u64,
    },
    /// Set a temporary price override (sellers only)
    SetPrice {
        #[arg(long)]
        product: u64,
        #[arg(long)]
        seller: String,
        #[arg(long)]
        price: u64,
    },
    /// Print a product's effective price
    Price {
        #[arg(long)]
        product: u64,
    },
    /// Print override details for a product
    Info {
        #[arg(long)]
        product: u64,
    },
    /// Wipe every chat thread
    ClearChats,
    /// Eagerly restore every overridden price
    ResetPrices,
    /// Evict everything that has expired, right now
    Sweep,
    /// Keep running with timers and periodic sweeps active
    Watch,
}

/// Posts system messages into the product's chat thread when its price
/// changes or resets, mirroring what the storefront shows buyers.
struct ChatNoticeBridge {
    chat: Arc<ChatManager>,
    catalog: Arc<Catalog>,
}

impl ChatNoticeBridge {
    fn post(&self, product_id: u64, text: String) {
        // only threads that are already live get a notice
        if self.chat.session_info(product_id).is_none() {
            return;
        }
        if let Err(e) = self.chat.send(product_id, "system", Role::Seller, &text) {
            tracing::warn!(product_id, error = %e, "could not post price notice");
        }
    }

    fn product_name(&self, product_id: u64) -> String {
        self.catalog
            .get(product_id)
            .map(|p| p.name)
            .unwrap_or_else(|| format!("produk {}", product_id))
    }
}

impl ChatNotice for ChatNoticeBridge {
    fn price_changed(&self, product_id: u64, new_price: u64) {
        let name = self.product_name(product_id);
        self.post(
            product_id,
            format!(
                "Harga {} telah diubah menjadi {}. Perubahan ini berlaku selama 5 menit.",
                name,
                format_idr(new_price)
            ),
        );
    }

    fn price_reset(&self, product_id: u64, restored_price: u64) {
        let name = self.product_name(product_id);
        self.post(
            product_id,
            format!(
                "Harga {} telah kembali normal ke {}.",
                name,
                format_idr(restored_price)
            ),
        );
    }
}

fn format_idr(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("IDR {}", grouped)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config)
        .unwrap_or_else(|_| include_str!("../../default_config.toml").to_string());
    let config: AppConfig = toml::from_str(&config_str)?;

    // catalog and accounts are demo state seeded on every start; only the
    // chat and price slots persist across runs
    let catalog = Arc::new(Catalog::new());
    bootstrap::seed_demo_catalog(&catalog);

    let directory = Arc::new(Directory::new());
    directory.register("b1", "Budi", "budi@user.com")?;
    directory.register("s1", "Sari", "sari@seller.com")?;

    let sink = Arc::new(TracingSink);
    let chat = ChatManager::new(config.chat_store(), sink.clone());
    let prices = PriceManager::new(
        config.price_store(),
        catalog.clone(),
        directory.clone(),
        sink,
    );
    prices.set_chat_notice(Arc::new(ChatNoticeBridge {
        chat: chat.clone(),
        catalog: catalog.clone(),
    }));

    // startup reconciliation: evict whatever expired while we were not
    // running, then rearm timers for the survivors
    let live_chats = chat.restore();
    let live_overrides = prices.restore();
    info!(live_chats, live_overrides, "state restored");

    match cli.command {
        Command::Catalog => {
            for product in catalog.list() {
                let effective = prices.effective_price(product.id)?;
                let marker = if prices.is_overridden(product.id) {
                    " (override active)"
                } else {
                    ""
                };
                println!(
                    "#{:<3} {:<28} {:<12} {}{}",
                    product.id,
                    product.name,
                    product.category,
                    format_idr(effective),
                    marker
                );
            }
        }
        Command::Send {
            product,
            user,
            text,
        } => {
            let account = directory
                .get(&user)
                .ok_or_else(|| format!("unknown user: {}", user))?;
            let message = chat.send(product, &user, account.role, &text)?;
            println!(
                "sent message #{} on product {} as {} ({})",
                message.id, product, account.name, account.role
            );
        }
        Command::Log { product } => {
            let messages = chat.list_messages(product);
            if messages.is_empty() {
                println!("no live chat for product {}", product);
            }
            for m in messages {
                let read = if m.read { "read" } else { "unread" };
                println!("[#{}] {} ({}, {}): {}", m.id, m.sender_id, m.sender_role, read, m.text);
            }
        }
        Command::MarkRead { product, reader } => {
            if chat.mark_read(product, &reader) {
                println!("marked messages as read for product {}", product);
            } else {
                println!("no live chat for product {}", product);
            }
        }
        Command::DeleteChat { product } => {
            if chat.delete_history(product) {
                println!("chat history deleted for product {}", product);
            } else {
                println!("no live chat for product {}", product);
            }
        }
        Command::SetPrice {
            product,
            seller,
            price,
        } => {
            let ov = prices.set_price(product, &seller, price)?;
            println!(
                "price override set: {} -> {} (original {})",
                product,
                format_idr(ov.current_price),
                format_idr(ov.original_price)
            );
        }
        Command::Price { product } => {
            println!("{}", format_idr(prices.effective_price(product)?));
        }
        Command::Info { product } => match prices.override_info(product) {
            Some(info) => {
                println!("product:        {}", info.product_id);
                println!("original price: {}", format_idr(info.original_price));
                println!("current price:  {}", format_idr(info.current_price));
                println!("modified by:    {}", info.modified_by);
                println!(
                    "resets in:      {}m {}s",
                    info.minutes_remaining, info.seconds_remaining
                );
            }
            None => println!("no live override for product {}", product),
        },
        Command::ClearChats => {
            println!("cleared {} chat session(s)", chat.clear_all());
        }
        Command::ResetPrices => {
            println!("reset {} price override(s)", prices.clear_all());
        }
        Command::Sweep => {
            let evicted = chat.sweep_now() + prices.sweep_now();
            println!(
                "evicted {}, live chats: {}, live overrides: {}",
                evicted,
                chat.live_sessions().len(),
                prices.live_overrides().len()
            );
        }
        Command::Watch => {
            chat.start_sweeper();
            prices.start_sweeper();
            info!("watching; Ctrl-C to exit");
            tokio::signal::ctrl_c().await?;
            chat.shutdown();
            prices.shutdown();
        }
    }

    Ok(())
}
