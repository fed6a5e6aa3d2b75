pub mod bootstrap;
pub mod error;
pub mod manager;
pub mod types;

pub use error::CatalogError;
pub use manager::Catalog;
pub use types::Product;
