use std::sync::Arc;

use crate::chat::error::ChatError;
use crate::chat::types::{ChatMessage, ChatSession, SessionInfo};
use crate::identity::Role;
use crate::notify::{Event, NotificationSink};
use crate::store::{now_ms, EvictHook, ExpiringRecord, RecordStore, StoreConfig};

/// Buyer-seller chat threads keyed by product id, expiring after the
/// configured inactivity window. Sending keeps a session alive; reading
/// does not.
pub struct ChatManager {
    store: Arc<RecordStore<ChatSession>>,
    sink: Arc<dyn NotificationSink>,
}

impl ChatManager {
    pub fn new(config: StoreConfig, sink: Arc<dyn NotificationSink>) -> Arc<Self> {
        let hook_sink = sink.clone();
        let on_evict: EvictHook<ChatSession> = Arc::new(move |key, session: ChatSession| {
            // log-only side effect; no catalog interaction
            tracing::info!(
                product_id = %key,
                messages = session.messages.len(),
                "chat session expired after inactivity"
            );
            hook_sink.notify(Event::SessionExpired {
                product_id: session.product_id,
                message_count: session.messages.len(),
            });
        });
        let store = RecordStore::new(config, on_evict);
        Arc::new(Self { store, sink })
    }

    /// Reconciles the persisted sessions against the wall clock and
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

    /// Explicit chat-open: creates (or refreshes) the session with both
    /// participants recorded.
    pub fn open(
        &self,
        product_id: u64,
        buyer_id: &str,
        seller_id: &str,
    ) -> ExpiringRecord<ChatSession> {
        self.store.upsert(&product_id.to_string(), |existing| {
            let mut session = existing.unwrap_or_else(|| ChatSession::new(product_id));
            session.note_participant(buyer_id, Role::Buyer);
            session.note_participant(seller_id, Role::Seller);
            session
        })
    }

    pub fn send(
        &self,
        product_id: u64,
        sender_id: &str,
        sender_role: Role,
        text: &str,
    ) -> Result<ChatMessage, ChatError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatError::Validation(
                "message must not be empty".to_string(),
            ));
        }

        let mut sent: Option<ChatMessage> = None;
        self.store.upsert(&product_id.to_string(), |existing| {
            let mut session = existing.unwrap_or_else(|| ChatSession::new(product_id));
            session.note_participant(sender_id, sender_role);
            let message = ChatMessage {
                id: session.next_message_id(),
                sender_id: sender_id.to_string(),
                sender_role,
                text: trimmed.to_string(),
                sent_at: now_ms(),
                read: false,
            };
            sent = Some(message.clone());
            session.messages.push(message);
            session
        });
        let message = sent.expect("upsert always applies the update closure");

        self.sink.notify(Event::MessageSent {
            product_id,
            message_id: message.id,
            sender_id: sender_id.to_string(),
        });
        Ok(message)
    }

    /// Messages of the live session, oldest first. Absence is an empty
    /// sequence, not an error. Triggers eviction-on-read.
    pub fn list_messages(&self, product_id: u64) -> Vec<ChatMessage> {
        self.store
            .get(&product_id.to_string())
            .map(|record| record.payload.messages)
            .unwrap_or_default()
    }

    /// Flags every message not sent by `reader_id` as read. Deliberately does
    /// not refresh `last_activity_at`: reading must not keep a chat alive.
    pub fn mark_read(&self, product_id: u64, reader_id: &str) -> bool {
        self.store.amend(&product_id.to_string(), |session| {
            for message in &mut session.messages {
                if message.sender_id != reader_id {
                    message.read = true;
                }
            }
        })
    }

    /// Eager delete of the whole thread. Idempotent; deleting an absent
    /// session is a no-op.
    pub fn delete_history(&self, product_id: u64) -> bool {
        let removed = self.store.delete(&product_id.to_string());
        if removed {
            tracing::info!(product_id, "chat history deleted");
        }
        removed
    }

    pub fn session_info(&self, product_id: u64) -> Option<SessionInfo> {
        let record = self.store.get(&product_id.to_string())?;
        let now = now_ms();
        let session = record.payload;
        Some(SessionInfo {
            product_id: session.product_id,
            buyer_id: session.buyer_id.clone(),
            seller_id: session.seller_id.clone(),
            message_count: session.messages.len(),
            last_message: session.messages.last().cloned(),
            inactivity_ms: now - record.last_activity_at,
            resets_in_ms: (record.last_activity_at + self.store.ttl_ms() - now).max(0),
        })
    }

    pub fn live_sessions(&self) -> Vec<ChatSession> {
        self.store
            .live_entries()
            .into_iter()
            .map(|record| record.payload)
            .collect()
    }

    /// Wipes every session eagerly, without expiry side effects.
    pub fn clear_all(&self) -> usize {
        let removed = self.store.clear_all().len();
        if removed > 0 {
            tracing::info!(removed, "all chat sessions cleared");
        }
        removed
    }
}
