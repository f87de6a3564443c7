//! Supabase catalog, queried through its PostgREST endpoint.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tracing::{error, info, instrument};

use crate::base::{
    config::Config,
    types::{Product, Res},
};

use super::{CatalogClient, CatalogError, GenericCatalogClient};

const PRODUCTS_PATH: &str = "/rest/v1/products";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Listing order shared with the in-memory catalog: cheapest first, then by SKU.
const LISTING_ORDER: &str = "price.asc,sku.asc";

// Extra methods on `CatalogClient` applied by the supabase implementation.

impl CatalogClient {
    /// Creates a Supabase-backed catalog.
    ///
    /// Missing credentials are not an error here: every lookup reports
    /// [`CatalogError::NotConfigured`] instead.
    pub fn supabase(config: &Config) -> Res<Self> {
        let client = SupabaseCatalogClient::new(config)?;
        Ok(Self { inner: Arc::new(client) })
    }
}

/// Supabase project coordinates.
#[derive(Clone)]
struct SupabaseProject {
    url: String,
    key: String,
}

/// Catalog client reading the Supabase `products` table.
#[derive(Clone)]
pub struct SupabaseCatalogClient {
    http: reqwest::Client,
    project: Option<SupabaseProject>,
}

impl SupabaseCatalogClient {
    #[instrument(name = "SupabaseCatalogClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let project = match (config.supabase_url.as_deref(), config.supabase_key.as_deref()) {
            (Some(url), Some(key)) if !url.is_empty() && !key.is_empty() => Some(SupabaseProject {
                url: url.trim_end_matches('/').to_string(),
                key: key.to_string(),
            }),
            _ => {
                error!("Supabase credentials not configured. Set SUPABASE_URL and SUPABASE_KEY environment variables.");
                None
            }
        };

        Ok(Self { http, project })
    }

    /// Run a PostgREST select against `products` with the given filters.
    async fn fetch(&self, filters: &[(&str, String)]) -> Res<Vec<Product>> {
        let project = self.project.as_ref().ok_or(CatalogError::NotConfigured)?;

        let mut query = vec![("select", "*".to_string())];
        query.extend(filters.iter().cloned());

        let response = self
            .http
            .get(format!("{}{PRODUCTS_PATH}", project.url))
            .header("apikey", &project.key)
            .bearer_auth(&project.key)
            .query(&query)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                error!("Database query failed: {e}");
                CatalogError::unavailable(e)
            })?;

        let products: Vec<Product> = response.json().await.map_err(CatalogError::unavailable)?;

        Ok(products)
    }
}

#[async_trait]
impl GenericCatalogClient for SupabaseCatalogClient {
    #[instrument(skip(self))]
    async fn get_item_by_sku(&self, sku: &str) -> Res<Option<Product>> {
        let product = self.fetch(&[("sku", format!("eq.{sku}")), ("limit", "1".to_string())]).await?.into_iter().next();

        match &product {
            Some(p) => info!("Found product by SKU `{sku}`: {}", p.name),
            None => info!("No product found with SKU: {sku}"),
        }

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn get_item_by_name(&self, name: &str) -> Res<Option<Product>> {
        let filters = [("name", format!("ilike.*{name}*")), ("order", LISTING_ORDER.to_string()), ("limit", "1".to_string())];
        let product = self.fetch(&filters).await?.into_iter().next();

        match &product {
            Some(p) => info!("Found product by name `{name}`: {} (SKU: {})", p.name, p.sku),
            None => info!("No product found matching name: {name}"),
        }

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn search_items(&self, term: &str) -> Res<Vec<Product>> {
        let products = self.fetch(&[("name", format!("ilike.*{term}*")), ("order", LISTING_ORDER.to_string())]).await?;

        info!("Found {} products matching `{term}`", products.len());

        Ok(products)
    }

    #[instrument(skip(self))]
    async fn get_all_items(&self) -> Res<Vec<Product>> {
        let products = self.fetch(&[("order", LISTING_ORDER.to_string())]).await?;

        info!("Retrieved {} products from database", products.len());

        Ok(products)
    }
}

// Tests.
