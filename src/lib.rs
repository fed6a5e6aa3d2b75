pub mod catalog;
pub mod chat;
pub mod config;
pub mod identity;
pub mod notify;
pub mod price;
pub mod store;
