pub mod error;
pub mod manager;
pub mod types;

pub use error::ChatError;
pub use manager::ChatManager;
pub use types::{ChatMessage, ChatSession, SessionInfo};
