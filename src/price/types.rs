use serde::{Deserialize, Serialize};

/// A temporary, seller-issued price override for one product.
///
/// `original_price` is captured once, from the catalog, when the first
/// override in a window is issued; later overrides in the same window keep
/// it. The chain must not compound: expiry always restores the price that was
/// in the catalog before any override was active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceOverride {
    pub product_id: u64,
    pub original_price: u64,
    pub current_price: u64,
    pub modified_by: String,
    pub modified_at: i64, // ms epoch
}

/// Read-only override inspection. Remaining-time fields are computed from
/// `expires_at - now` at call time, never cached.
#[derive(Debug, Clone)]
pub struct OverrideInfo {
    pub product_id: u64,
    pub original_price: u64,
    pub current_price: u64,
    pub modified_by: String,
    pub modified_at: i64,
    pub expires_at: i64,
    pub time_remaining_ms: i64,
    pub minutes_remaining: i64,
    pub seconds_remaining: i64,
    pub price_difference: i64,
    pub percent_change: f64,
}
