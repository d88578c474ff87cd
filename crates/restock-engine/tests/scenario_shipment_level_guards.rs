//! Scenario: shipment-level guards and read idempotence
//!
//! # Invariant under test
//!
//! An unfinalized shipment, a shipment targeting a store other than the
//! monitored one, and an empty shipment all short-circuit with a note and
//! zero position work. An unfetchable shipment is the one condition that
//! aborts the whole reconciliation as a top-level error. Repeated
//! availability reads with no intervening mutation return the same value —
//! nothing in the resolver caches.

use std::sync::Arc;

use restock_engine::{available_quantity, EnginePolicy, ReconcileEngine};
use restock_testkit::{demand, entity, position, FakeInventory};

fn policy() -> EnginePolicy {
    EnginePolicy {
        store_name: "Main FBS".to_string(),
        recipe_field_name: "Recipe".to_string(),
        min_stock_threshold: 2.0,
        max_concurrent_positions: 1,
    }
}

#[tokio::test]
async fn unfinalized_shipment_is_noted_and_untouched() {
    let fake = Arc::new(FakeInventory::new());
    let store = entity("store", "store-1", "Main FBS");
    let cola = entity("product", "prod-cola", "Cola 0.5");
    fake.add_store(store.clone());
    fake.add_organization(entity("organization", "org-1", "Acme"));
    let mut shipment = demand("d1", "SHIP-001", &store, vec![position(&cola, 1.0)]);
    shipment.applicable = false;
    fake.add_demand(shipment);

    let engine = ReconcileEngine::new(fake.clone(), policy());
    let report = engine.reconcile_shipment("d1").await.unwrap();

    assert!(report.ok());
    assert!(report.positions.is_empty());
    assert!(report.note.as_deref().unwrap_or("").contains("not finalized"));
    assert_eq!(fake.stock_reads(), 0);
    assert_eq!(fake.mutation_calls(), 0);
}

#[tokio::test]
async fn shipment_from_another_store_is_noted_and_untouched() {
    let fake = Arc::new(FakeInventory::new());
    let monitored = entity("store", "store-1", "Main FBS");
    let other = entity("store", "store-2", "Backup warehouse");
    let cola = entity("product", "prod-cola", "Cola 0.5");
    fake.add_store(monitored);
    fake.add_organization(entity("organization", "org-1", "Acme"));
    fake.add_demand(demand("d1", "SHIP-001", &other, vec![position(&cola, 1.0)]));

    let engine = ReconcileEngine::new(fake.clone(), policy());
    let report = engine.reconcile_shipment("d1").await.unwrap();

    assert!(report.ok());
    assert!(report.positions.is_empty());
    assert!(report.note.as_deref().unwrap_or("").contains("monitored"));
    assert_eq!(fake.mutation_calls(), 0);
}

#[tokio::test]
async fn empty_shipment_is_noted() {
    let fake = Arc::new(FakeInventory::new());
    let store = entity("store", "store-1", "Main FBS");
    fake.add_store(store.clone());
    fake.add_organization(entity("organization", "org-1", "Acme"));
    fake.add_demand(demand("d1", "SHIP-001", &store, vec![]));

    let engine = ReconcileEngine::new(fake.clone(), policy());
    let report = engine.reconcile_shipment("d1").await.unwrap();

    assert!(report.ok());
    assert!(report.note.as_deref().unwrap_or("").contains("no positions"));
}

#[tokio::test]
async fn unfetchable_shipment_aborts_reconciliation() {
    let fake = Arc::new(FakeInventory::new());
    fake.add_store(entity("store", "store-1", "Main FBS"));
    fake.add_organization(entity("organization", "org-1", "Acme"));

    let engine = ReconcileEngine::new(fake.clone(), policy());
    let err = engine.reconcile_shipment("missing").await.unwrap_err();
    assert!(format!("{err:#}").contains("missing"));
}

#[tokio::test]
async fn unresolvable_store_aborts_reconciliation() {
    let fake = Arc::new(FakeInventory::new());
    let store = entity("store", "store-1", "Main FBS");
    let cola = entity("product", "prod-cola", "Cola 0.5");
    // The demand exists but the monitored store name resolves to nothing.
    fake.add_organization(entity("organization", "org-1", "Acme"));
    fake.add_demand(demand("d1", "SHIP-001", &store, vec![position(&cola, 1.0)]));

    let mut p = policy();
    p.store_name = "Ghost store".to_string();
    let engine = ReconcileEngine::new(fake.clone(), p);
    let err = engine.reconcile_shipment("d1").await.unwrap_err();
    assert!(format!("{err:#}").contains("Ghost store"));
}

#[tokio::test]
async fn repeated_reads_return_the_same_value() {
    let fake = Arc::new(FakeInventory::new());
    fake.set_stock("prod-cola", "store-1", 5.0, 2.0);

    let first = available_quantity(fake.as_ref(), "prod-cola", "store-1")
        .await
        .unwrap();
    let second = available_quantity(fake.as_ref(), "prod-cola", "store-1")
        .await
        .unwrap();

    assert_eq!(first, 3.0);
    assert_eq!(second, 3.0);
    assert_eq!(fake.stock_reads(), 2, "each call must hit the gateway");
}
