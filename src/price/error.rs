use thiserror::Error;

#[derive(Error, Debug)]
pub enum PriceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Only sellers may change prices: {0}")]
    NotSeller(String),

    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    #[error("Catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),
}
