pub mod engine;
pub mod error;
pub mod persist;
pub mod types;

pub use engine::{EvictHook, RecordStore};
pub use error::StoreError;
pub use types::{now_ms, ExpiringRecord, StoreConfig};
