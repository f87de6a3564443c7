//! In-memory SurrealDB catalog, for development and tests.

use std::sync::Arc;

use async_trait::async_trait;
use surrealdb::{
    Surreal,
    engine::local::{Db, Mem},
};
use tracing::{info, instrument};

use crate::base::types::{Product, Res};

use super::{CatalogClient, CatalogError, GenericCatalogClient, seed_inventory};

// Extra methods on `CatalogClient` applied by the memory implementation.

impl CatalogClient {
    /// Creates an in-memory catalog seeded with the shop inventory.
    pub async fn memory() -> Res<Self> {
        Self::memory_with(seed_inventory()).await
    }

    /// Creates an in-memory catalog holding exactly `products`.
    pub async fn memory_with(products: Vec<Product>) -> Res<Self> {
        let client = MemoryCatalogClient::new(products).await?;
        Ok(Self { inner: Arc::new(client) })
    }
}

/// SurrealDB-backed catalog living entirely in memory.
///
/// Records are keyed by the upper-cased SKU, so SKU lookups ignore case.
#[derive(Clone)]
pub struct MemoryCatalogClient {
    db: Surreal<Db>,
}

impl MemoryCatalogClient {
    #[instrument(name = "MemoryCatalogClient::new", skip_all)]
    pub async fn new(products: Vec<Product>) -> Res<Self> {
        let db = Surreal::new::<Mem>(()).await?;
        db.use_ns("phil_elect").use_db("catalog").await?;

        let count = products.len();

        for product in products {
            let key = product.sku.to_uppercase();
            let _: Option<Product> = db.create(("product", key)).content(product).await?;
        }

        info!("In-memory catalog seeded with {count} products.");

        Ok(Self { db })
    }

    async fn query_by_name(&self, name: &str) -> Res<Vec<Product>> {
        let mut response = self
            .db
            .query("SELECT * FROM product WHERE string::lowercase(name) CONTAINS string::lowercase($name) ORDER BY price ASC, sku ASC")
            .bind(("name", name.to_string()))
            .await
            .map_err(CatalogError::unavailable)?;

        let products: Vec<Product> = response.take(0).map_err(CatalogError::unavailable)?;

        Ok(products)
    }
}

#[async_trait]
impl GenericCatalogClient for MemoryCatalogClient {
    #[instrument(skip(self))]
    async fn get_item_by_sku(&self, sku: &str) -> Res<Option<Product>> {
        let product: Option<Product> = self.db.select(("product", sku.to_uppercase())).await.map_err(CatalogError::unavailable)?;

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_item_by_name(&self, name: &str) -> Res<Option<Product>> {
        Ok(self.query_by_name(name).await?.into_iter().next())
    }

    #[instrument(skip(self))]
    async fn search_items(&self, term: &str) -> Res<Vec<Product>> {
        self.query_by_name(term).await
    }

    #[instrument(skip(self))]
    async fn get_all_items(&self) -> Res<Vec<Product>> {
        let mut products: Vec<Product> = self.db.select("product").await.map_err(CatalogError::unavailable)?;
        products.sort_by(|a, b| (a.price, &a.sku).cmp(&(b.price, &b.sku)));

        Ok(products)
    }
}

// Tests.
