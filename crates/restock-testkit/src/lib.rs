//! restock-testkit
//!
//! Deterministic in-memory stand-in for the remote inventory API, used by
//! the engine and daemon scenario tests. No network I/O, no randomness;
//! every mutation is recorded so tests can assert exactly which calls were
//! (or were not) issued.

mod fake_inventory;

pub use fake_inventory::FakeInventory;

use restock_schemas::{
    Attribute, AttributeValue, Demand, DemandPosition, DemandPositions, EntityRef, Meta, PlanLine,
    PlanLines, ProcessingPlan, Product,
};

/// Meta block addressing `/entity/<kind>/<id>` on a fictitious host.
pub fn meta(kind: &str, id: &str) -> Meta {
    Meta {
        href: format!("https://inventory.test/api/entity/{kind}/{id}"),
        metadata_href: None,
        entity_type: Some(kind.to_string()),
        media_type: None,
    }
}

/// Entity reference with inline id and name.
pub fn entity(kind: &str, id: &str, name: &str) -> EntityRef {
    EntityRef {
        meta: meta(kind, id),
        id: Some(id.to_string()),
        name: Some(name.to_string()),
    }
}

/// A finalized shipment at the given store.
pub fn demand(id: &str, name: &str, store: &EntityRef, positions: Vec<DemandPosition>) -> Demand {
    Demand {
        meta: meta("demand", id),
        id: id.to_string(),
        name: name.to_string(),
        moment: "2026-08-01 12:00:00".to_string(),
        applicable: true,
        store: store.clone(),
        organization: entity("organization", "org-1", "Acme"),
        agent: entity("counterparty", "agent-1", "Customer"),
        positions: Some(DemandPositions { rows: positions }),
    }
}

/// One shipped line item.
pub fn position(product: &EntityRef, quantity: f64) -> DemandPosition {
    DemandPosition {
        id: None,
        assortment: product.clone(),
        quantity,
        reserve: None,
    }
}

/// A processing plan with expanded product and material lines.
/// Quantities are per-one-batch ratios.
pub fn plan(
    id: &str,
    name: &str,
    products: Vec<(&EntityRef, f64)>,
    materials: Vec<(&EntityRef, f64)>,
) -> ProcessingPlan {
    let lines = |rows: Vec<(&EntityRef, f64)>| PlanLines {
        rows: Some(
            rows.into_iter()
                .map(|(assortment, quantity)| PlanLine {
                    id: None,
                    assortment: assortment.clone(),
                    product: Some(assortment.clone()),
                    quantity,
                })
                .collect(),
        ),
    };
    ProcessingPlan {
        meta: meta("processingplan", id),
        id: id.to_string(),
        name: name.to_string(),
        products: Some(lines(products)),
        materials: Some(lines(materials)),
    }
}

/// A product record carrying the given custom attributes.
pub fn product(id: &str, name: &str, attributes: Vec<Attribute>) -> Product {
    Product {
        meta: meta("product", id),
        id: id.to_string(),
        name: name.to_string(),
        code: None,
        attributes: if attributes.is_empty() {
            None
        } else {
            Some(attributes)
        },
    }
}

/// A text-valued custom attribute.
pub fn text_attribute(id: &str, name: &str, value: &str) -> Attribute {
    Attribute {
        id: id.to_string(),
        name: name.to_string(),
        attr_type: Some("string".to_string()),
        value: Some(AttributeValue::Text(value.to_string())),
    }
}

/// An entity-valued custom attribute referencing another record.
pub fn entity_attribute(id: &str, name: &str, target: &EntityRef) -> Attribute {
    Attribute {
        id: id.to_string(),
        name: name.to_string(),
        attr_type: Some("customentity".to_string()),
        value: Some(AttributeValue::Entity(target.clone())),
    }
}
