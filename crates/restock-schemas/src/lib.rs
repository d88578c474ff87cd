//! restock-schemas
//!
//! Serde data model for the remote inventory platform's JSON API, shared by
//! the gateway, the engine, and the daemon. No business logic lives here —
//! only wire shapes and small accessors on them.
//!
//! Field names follow the remote camelCase contract; everything the service
//! does not read is left to serde's unknown-field tolerance rather than
//! modelled speculatively.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Meta / EntityRef — addressing
// ---------------------------------------------------------------------------

/// Addressing metadata attached to every remote entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_href: Option<String>,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
}

impl Meta {
    /// Entity id, extracted as the trailing `href` path segment.
    ///
    /// The remote API does not always inline an `id` field on references;
    /// the href is the authoritative address.
    pub fn id(&self) -> Option<&str> {
        let tail = self.href.rsplit('/').next()?;
        // Expansion hrefs can carry a query suffix.
        let tail = tail.split('?').next().unwrap_or(tail);
        if tail.is_empty() {
            None
        } else {
            Some(tail)
        }
    }

    /// True when the reference points at the given entity family
    /// (e.g. `"processingplan"`).
    pub fn is_type(&self, entity_type: &str) -> bool {
        self.entity_type.as_deref() == Some(entity_type)
    }
}

/// Opaque reference to a remote entity. Immutable once fetched; used purely
/// for addressing calls back to the remote system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRef {
    pub meta: Meta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl EntityRef {
    /// Inline id if present, otherwise the id encoded in the href.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().or_else(|| self.meta.id())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unknown")
    }
}

/// Meta-only reference used in mutation request bodies; the remote system
/// accepts (and expects) nothing but the `meta` block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaOnlyRef {
    pub meta: Meta,
}

impl From<&EntityRef> for MetaOnlyRef {
    fn from(r: &EntityRef) -> Self {
        Self {
            meta: r.meta.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// List envelope
// ---------------------------------------------------------------------------

/// Paginated list envelope returned by every collection endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct ListResponse<T> {
    #[serde(default)]
    pub rows: Option<Vec<T>>,
}

impl<T> ListResponse<T> {
    /// First row, if any. Name-filter lookups take the first match.
    pub fn into_first_row(self) -> Option<T> {
        self.rows.and_then(|rows| rows.into_iter().next())
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Stock report
// ---------------------------------------------------------------------------

/// One row of the stock report (`/report/stock/all`), per product/variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRow {
    pub assortment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserve: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_transit: Option<f64>,
}

impl StockRow {
    /// Sellable-available quantity: `stock - reserve`, clamped at zero.
    ///
    /// A reserve larger than stock means the remote system reported an
    /// inconsistent reservation; for production-sizing decisions that is
    /// "nothing available", never a negative quantity. `in_transit` is
    /// deliberately not part of availability — in-transit stock is not
    /// usable for trigger decisions.
    pub fn available(&self) -> f64 {
        let stock = self.stock.unwrap_or(0.0);
        let reserve = self.reserve.unwrap_or(0.0);
        (stock - reserve).max(0.0)
    }
}

// ---------------------------------------------------------------------------
// Custom attributes
// ---------------------------------------------------------------------------

/// One entry of the product custom-attribute schema
/// (`/entity/product/metadata/attributes`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr_type: Option<String>,
}

/// A custom attribute as carried on a product record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attr_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<AttributeValue>,
}

/// Attribute values are dynamically typed on the wire; model them as a
/// tagged variant and convert explicitly at the point of use.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Boolean(bool),
    Number(f64),
    Text(String),
    Entity(EntityRef),
}

impl Attribute {
    /// The value folded to text: numbers and booleans are formatted, an
    /// entity reference folds to its display name. `None` when unset.
    pub fn as_text(&self) -> Option<String> {
        match &self.value {
            Some(AttributeValue::Text(s)) => Some(s.clone()),
            Some(AttributeValue::Number(n)) => Some(n.to_string()),
            Some(AttributeValue::Boolean(b)) => Some(b.to_string()),
            Some(AttributeValue::Entity(e)) => e.name.clone(),
            None => None,
        }
    }

    /// The value as an entity reference, if it is one.
    pub fn as_entity(&self) -> Option<&EntityRef> {
        match &self.value {
            Some(AttributeValue::Entity(e)) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A product (or assortment entry) fetched with `expand=attributes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub meta: Meta,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Attribute>>,
}

impl Product {
    /// The attribute matching the given descriptor, by id first and by
    /// exact name as a fallback.
    pub fn attribute_for(&self, descriptor: &AttributeDescriptor) -> Option<&Attribute> {
        let attrs = self.attributes.as_deref()?;
        attrs
            .iter()
            .find(|a| a.id == descriptor.id)
            .or_else(|| attrs.iter().find(|a| a.name == descriptor.name))
    }
}

// ---------------------------------------------------------------------------
// Processing plan (recipe)
// ---------------------------------------------------------------------------

/// A processing plan: the fixed recipe linking materials consumed to output
/// product produced. Line quantities are per-one-batch ratios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingPlan {
    pub meta: Meta,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<PlanLines>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub materials: Option<PlanLines>,
}

impl ProcessingPlan {
    pub fn product_rows(&self) -> &[PlanLine] {
        self.products
            .as_ref()
            .and_then(|p| p.rows.as_deref())
            .unwrap_or(&[])
    }

    pub fn material_rows(&self) -> &[PlanLine] {
        self.materials
            .as_ref()
            .and_then(|m| m.rows.as_deref())
            .unwrap_or(&[])
    }
}

/// Expanded line-item collection of a plan (`expand=materials,products`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanLines {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<PlanLine>>,
}

/// One material or product line of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub assortment: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<EntityRef>,
    pub quantity: f64,
}

// ---------------------------------------------------------------------------
// Shipment (demand)
// ---------------------------------------------------------------------------

/// An outbound shipment. Read-only from this service's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demand {
    pub meta: Meta,
    pub id: String,
    pub name: String,
    pub moment: String,
    pub applicable: bool,
    pub store: EntityRef,
    pub organization: EntityRef,
    pub agent: EntityRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<DemandPositions>,
}

impl Demand {
    pub fn position_rows(&self) -> &[DemandPosition] {
        self.positions.as_ref().map(|p| p.rows.as_slice()).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandPositions {
    pub rows: Vec<DemandPosition>,
}

/// One shipped line item — the trigger unit for reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandPosition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub assortment: EntityRef,
    pub quantity: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserve: Option<f64>,
}

// ---------------------------------------------------------------------------
// Processing operation
// ---------------------------------------------------------------------------

/// A production operation as returned by the remote system. Created with
/// `applicable = false`; only finalization (`applicable = true`) has any
/// stock effect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Processing {
    pub meta: Meta,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_plan: Option<EntityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<EntityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<EntityRef>,
}

/// Request body for `POST /entity/processing`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProcessingRequest {
    pub processing_plan: MetaOnlyRef,
    pub store: MetaOnlyRef,
    /// Where produced output lands; same store as the material source here.
    pub products_store: MetaOnlyRef,
    pub organization: MetaOnlyRef,
    pub products: Vec<ProcessingLineInput>,
    pub materials: Vec<ProcessingLineInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One product or material line of a create request.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingLineInput {
    pub assortment: MetaOnlyRef,
    pub quantity: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
