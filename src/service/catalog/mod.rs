//! Product catalog lookups.
//!
//! The catalog is read-only from the bot's point of view: products are
//! maintained elsewhere and the bot only looks them up by SKU or name.

pub mod memory;
pub mod supabase;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::base::types::{Product, Res};

// Errors.

/// Catalog failures, worded for the customer.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("System maintenance: Database not configured")]
    NotConfigured,
    #[error("System maintenance: Database unavailable")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl CatalogError {
    pub fn unavailable(err: impl Into<anyhow::Error>) -> Self {
        Self::Unavailable(err.into().into())
    }
}

// Traits.

/// Generic catalog client trait that backends must implement.
#[async_trait]
pub trait GenericCatalogClient: Send + Sync + 'static {
    /// Get a product by its SKU.
    async fn get_item_by_sku(&self, sku: &str) -> Res<Option<Product>>;

    /// Get the first product whose name contains `name`, ignoring case.
    async fn get_item_by_name(&self, name: &str) -> Res<Option<Product>>;

    /// Get every product whose name contains `term`, ignoring case.
    async fn search_items(&self, term: &str) -> Res<Vec<Product>>;

    /// Get all products in inventory.
    async fn get_all_items(&self) -> Res<Vec<Product>>;

    /// Check that `sku` exists and has at least `quantity` units in stock.
    async fn verify_stock(&self, sku: &str, quantity: u32) -> Res<bool> {
        Ok(self.get_item_by_sku(sku).await?.is_some_and(|product| product.has_stock(quantity)))
    }
}

// Structs.

/// Catalog client for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<dyn GenericCatalogClient>,
}

impl Deref for CatalogClient {
    type Target = dyn GenericCatalogClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl CatalogClient {
    pub fn new(inner: Arc<dyn GenericCatalogClient>) -> Self {
        Self { inner }
    }
}

/// The Phil-Elect shop inventory, used to seed the in-memory catalog.
pub fn seed_inventory() -> Vec<Product> {
    [
        ("RMT-2DR-SLV", "Ramtons 2-Door Fridge (Silver)", 35000, 5),
        ("VP-32-SMART", "Vision Plus 32\" Smart TV", 14000, 8),
        ("VON-HP-DBL", "Von Hotplate (Double)", 3500, 12),
        ("MIKA-MW-20L", "Mika Microwave (20L)", 8000, 10),
        ("SONY-SB-S20R", "Sony Soundbar (S20R)", 28000, 4),
    ]
    .into_iter()
    .map(|(sku, name, price, stock)| Product {
        sku: sku.to_string(),
        name: name.to_string(),
        price,
        stock,
        image_url: None,
    })
    .collect()
}
