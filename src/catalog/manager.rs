use std::collections::HashMap;

use parking_lot::RwLock;

use crate::catalog::error::CatalogError;
use crate::catalog::types::Product;

/// In-memory product catalog. Read-mostly; the only external writer is the
/// price override manager, through `set_price`.
#[derive(Default)]
pub struct Catalog {
    products: RwLock<HashMap<u64, Product>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) {
        self.products.write().insert(product.id, product);
    }

    pub fn get(&self, id: u64) -> Option<Product> {
        self.products.read().get(&id).cloned()
    }

    pub fn set_price(&self, id: u64, price: u64) -> Result<(), CatalogError> {
        let mut products = self.products.write();
        match products.get_mut(&id) {
            Some(product) => {
                product.price = price;
                Ok(())
            }
            None => Err(CatalogError::NotFound(id)),
        }
    }

    pub fn list(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.products.read().values().cloned().collect();
        products.sort_by_key(|p| p.id);
        products
    }

    pub fn len(&self) -> usize {
        self.products.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::bootstrap::seed_demo_catalog;

    #[test]
    fn test_seed_and_set_price() {
        let catalog = Catalog::new();
        seed_demo_catalog(&catalog);
        assert!(!catalog.is_empty());

        let first = catalog.list().remove(0);
        catalog.set_price(first.id, 999).unwrap();
        assert_eq!(catalog.get(first.id).unwrap().price, 999);
    }

    #[test]
    fn test_set_price_unknown_product() {
        let catalog = Catalog::new();
        assert!(matches!(
            catalog.set_price(404, 1).unwrap_err(),
            CatalogError::NotFound(404)
        ));
    }
}
