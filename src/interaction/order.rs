//! Matching requested items against the catalog.

use tracing::{info, instrument, warn};

use crate::{
    base::types::{Analysis, Intent, MatchedItem, RequestedItem, Res},
    service::catalog::CatalogClient,
};

/// Result of matching an order against the catalog.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrderMatch {
    /// Items found in the catalog.
    pub matched: Vec<MatchedItem>,
    /// Items that could not be found.
    pub partial: Vec<RequestedItem>,
}

/// Match the items of an `order` analysis to catalog products.
///
/// Each item is looked up by SKU first, then by name: the item's own `name`,
/// or else the analysis message.  Other intents match nothing.  Catalog
/// errors propagate.
#[instrument(skip_all)]
pub async fn match_items(catalog: &CatalogClient, analysis: &Analysis) -> Res<OrderMatch> {
    let mut result = OrderMatch::default();

    if analysis.intent != Intent::Order {
        return Ok(result);
    }

    for item in &analysis.items {
        let mut catalog_item = None;

        if let Some(sku) = item.sku.as_deref().filter(|s| !s.is_empty()) {
            catalog_item = catalog.get_item_by_sku(sku).await?;
        }

        if catalog_item.is_none() {
            let search_term = item.name.as_deref().unwrap_or(&analysis.message);

            if !search_term.is_empty() {
                catalog_item = catalog.get_item_by_name(search_term).await?;
            }
        }

        match catalog_item {
            Some(product) => {
                info!(
                    "Matched item: {} (SKU: {}) - Price: {} KES, Stock: {}",
                    product.name, product.sku, product.price, product.stock
                );

                result.matched.push(MatchedItem {
                    requested: item.clone(),
                    catalog_match: product,
                    qty: item.qty,
                });
            }
            None => {
                warn!("Product mismatch: Could not find catalog item for `{}`", item.name.as_deref().or(item.sku.as_deref()).unwrap_or_default());
                result.partial.push(item.clone());
            }
        }
    }

    Ok(result)
}

// Tests.
