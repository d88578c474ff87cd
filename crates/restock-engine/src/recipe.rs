//! Recipe resolution.
//!
//! A product is linked to its processing plan through a named custom
//! attribute. The attribute descriptor comes from the product metadata
//! schema (a small list, linear-scanned); the product's value under that
//! descriptor is either a direct entity reference to a plan or a plan name
//! to look up. Absence at any step is a terminal "no recipe configured"
//! skip, never an error.

use anyhow::Result;
use restock_gateway::InventoryApi;
use restock_schemas::{AttributeDescriptor, ProcessingPlan, Product};
use tracing::debug;

/// Exact-name match over the product custom-attribute schema.
pub async fn resolve_recipe_attribute(
    gateway: &dyn InventoryApi,
    name: &str,
) -> Result<Option<AttributeDescriptor>> {
    let descriptors = gateway.attribute_metadata().await?;
    Ok(descriptors.into_iter().find(|d| d.name == name))
}

/// The processing plan configured on a product, with material and product
/// lines expanded. `None` when the product carries no usable recipe value.
pub async fn resolve_plan_for_product(
    gateway: &dyn InventoryApi,
    product: &Product,
    descriptor: &AttributeDescriptor,
) -> Result<Option<ProcessingPlan>> {
    let Some(attribute) = product.attribute_for(descriptor) else {
        debug!(product = %product.name, "no recipe attribute on product");
        return Ok(None);
    };

    // Entity-valued attribute: the reference must actually be a plan.
    if let Some(entity) = attribute.as_entity() {
        if !entity.meta.is_type("processingplan") {
            debug!(product = %product.name, "recipe attribute references a non-plan entity");
            return Ok(None);
        }
        let Some(plan_id) = entity.id() else {
            return Ok(None);
        };
        return Ok(Some(gateway.plan_expanded(plan_id).await?));
    }

    // Text-valued attribute: treat it as a plan name.
    let Some(plan_name) = attribute.as_text().filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    let Some(found) = gateway.find_plan_by_name(plan_name.trim()).await? else {
        debug!(plan = %plan_name, "named plan does not exist");
        return Ok(None);
    };
    // Name-filter results come back unexpanded; fetch the full plan.
    Ok(Some(gateway.plan_expanded(&found.id).await?))
}
