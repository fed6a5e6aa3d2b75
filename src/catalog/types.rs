use serde::{Deserialize, Serialize};

/// A catalog entry. The `price` field is the one resource shared with the
/// price override subsystem; everything else is read-only snapshot data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub price: u64,
    pub description: String,
    pub rating: f32,
    pub reviews: u32,
}
