//! Stock resolution.

use anyhow::Result;
use restock_gateway::InventoryApi;

/// Sellable-available quantity of one product at one store.
///
/// A missing stock row means the product never moved through that store and
/// yields 0 — out of stock, not an error. Otherwise `stock - reserve`
/// clamped at zero; in-transit stock never counts. Read fresh on every call:
/// stock changes externally at any time, so nothing here may cache.
pub async fn available_quantity(
    gateway: &dyn InventoryApi,
    assortment_id: &str,
    store_id: &str,
) -> Result<f64> {
    let row = gateway.product_stock(assortment_id, store_id).await?;
    Ok(row.map(|r| r.available()).unwrap_or(0.0))
}
