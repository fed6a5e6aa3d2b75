use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::store::StoreConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub chat: SubsystemConfig,
    pub price: SubsystemConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubsystemConfig {
    /// Name of the persisted slot under `data_dir`.
    pub slot: String,
    /// Inactivity window after which records auto-expire.
    pub ttl_secs: u64,
    /// Interval of the periodic reconciliation sweep.
    pub sweep_interval_secs: u64,
}

impl AppConfig {
    pub fn chat_store(&self) -> StoreConfig {
        self.store_config(&self.chat)
    }

    pub fn price_store(&self) -> StoreConfig {
        self.store_config(&self.price)
    }

    fn store_config(&self, sub: &SubsystemConfig) -> StoreConfig {
        StoreConfig::new(sub.slot.clone(), self.data_dir.clone())
            .with_ttl_ms(sub.ttl_secs as i64 * 1000)
            .with_sweep_interval(Duration::from_secs(sub.sweep_interval_secs))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            chat: SubsystemConfig {
                slot: "chat_sessions".to_string(),
                ttl_secs: 300,
                sweep_interval_secs: 60,
            },
            price: SubsystemConfig {
                slot: "price_overrides".to_string(),
                ttl_secs: 300,
                sweep_interval_secs: 60,
            },
        }
    }
}
