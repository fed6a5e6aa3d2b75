use serde::{Deserialize, Serialize};

use crate::identity::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Monotonically increasing per session, in creation order.
    pub id: u64,
    pub sender_id: String,
    pub sender_role: Role,
    pub text: String,
    pub sent_at: i64, // ms epoch
    pub read: bool,
}

/// Message thread for one product. Participants are filled in as they become
/// known: `open` records both sides up front, a first `send` records the
/// sender's side only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub product_id: u64,
    pub buyer_id: Option<String>,
    pub seller_id: Option<String>,
    pub messages: Vec<ChatMessage>, // append-only, never reordered
}

impl ChatSession {
    pub fn new(product_id: u64) -> Self {
        Self {
            product_id,
            buyer_id: None,
            seller_id: None,
            messages: Vec::new(),
        }
    }

    pub fn next_message_id(&self) -> u64 {
        self.messages.last().map(|m| m.id + 1).unwrap_or(1)
    }

    /// Records `user_id` on the side matching `role`, if not yet known.
    pub fn note_participant(&mut self, user_id: &str, role: Role) {
        let slot = match role {
            Role::Buyer => &mut self.buyer_id,
            Role::Seller => &mut self.seller_id,
        };
        if slot.is_none() {
            *slot = Some(user_id.to_string());
        }
    }
}

/// Read-only session inspection, remaining-time fields computed at call time.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub product_id: u64,
    pub buyer_id: Option<String>,
    pub seller_id: Option<String>,
    pub message_count: usize,
    pub last_message: Option<ChatMessage>,
    pub inactivity_ms: i64,
    pub resets_in_ms: i64,
}
