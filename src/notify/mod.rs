/// Events emitted after successful mutations and evictions so a UI layer can
/// re-render. Fire-and-forget: the core never waits on a sink and treats sink
/// failure as non-fatal (sinks handle their own errors internally).
#[derive(Debug, Clone)]
pub enum Event {
    MessageSent {
        product_id: u64,
        message_id: u64,
        sender_id: String,
    },
    SessionExpired {
        product_id: u64,
        message_count: usize,
    },
    PriceChanged {
        product_id: u64,
        new_price: u64,
        seller_id: String,
    },
    PriceReset {
        product_id: u64,
        restored_price: u64,
    },
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, event: Event);
}

/// Sink that drops everything.
pub struct NullSink;

impl NotificationSink for NullSink {
    fn notify(&self, _event: Event) {}
}

/// Sink that logs each event through `tracing`.
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, event: Event) {
        match event {
            Event::MessageSent {
                product_id,
                message_id,
                sender_id,
            } => {
                tracing::info!(product_id, message_id, sender_id = %sender_id, "message sent");
            }
            Event::SessionExpired {
                product_id,
                message_count,
            } => {
                tracing::info!(product_id, message_count, "chat session expired");
            }
            Event::PriceChanged {
                product_id,
                new_price,
                seller_id,
            } => {
                tracing::info!(product_id, new_price, seller_id = %seller_id, "price changed");
            }
            Event::PriceReset {
                product_id,
                restored_price,
            } => {
                tracing::info!(product_id, restored_price, "price reset to original");
            }
        }
    }
}
