pub mod error;
pub mod manager;
pub mod types;

pub use error::PriceError;
pub use manager::{ChatNotice, PriceManager};
pub use types::{OverrideInfo, PriceOverride};
