use crate::catalog::manager::Catalog;
use crate::catalog::types::Product;

/// Seeds the demo product set the storefront ships with. Prices in IDR.
pub fn seed_demo_catalog(catalog: &Catalog) {
    let products = [
        Product {
            id: 1,
            name: "Nexus Phantom Sneaker".to_string(),
            category: "Sepatu".to_string(),
            price: 1_850_000,
            description: "Sepatu sneaker berkualitas tinggi dengan desain modern".to_string(),
            rating: 4.5,
            reviews: 128,
        },
        Product {
            id: 2,
            name: "MacBook Pro M3 14-inch".to_string(),
            category: "Laptop".to_string(),
            price: 28_500_000,
            description: "Laptop profesional dengan performa tinggi".to_string(),
            rating: 5.0,
            reviews: 342,
        },
        Product {
            id: 3,
            name: "Horizon Smart Watch v2".to_string(),
            category: "Jam Tangan".to_string(),
            price: 4_200_000,
            description: "Jam tangan pintar dengan teknologi terkini".to_string(),
            rating: 4.7,
            reviews: 256,
        },
        Product {
            id: 4,
            name: "Nomad Leather Backpack".to_string(),
            category: "Tas".to_string(),
            price: 2_100_000,
            description: "Tas punggung kulit asli berkualitas premium".to_string(),
            rating: 4.6,
            reviews: 198,
        },
        Product {
            id: 5,
            name: "iPhone 15 Pro Titanium".to_string(),
            category: "Handphone".to_string(),
            price: 19_500_000,
            description: "Smartphone flagship dengan material titanium".to_string(),
            rating: 4.9,
            reviews: 411,
        },
    ];

    for product in products {
        catalog.insert(product);
    }

    tracing::info!(count = catalog.len(), "demo catalog seeded");
}
