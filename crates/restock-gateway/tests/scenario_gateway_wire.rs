//! Scenario: gateway wire contract
//!
//! # Invariant under test
//!
//! Every request carries the bearer credential; name filters are
//! URL-encoded; list envelopes decode to first-match semantics; non-2xx
//! responses surface as RemoteApiError with the status and raw body; the
//! two mutation calls send the expected bodies. All against an in-process
//! mock server — no real network.

use httpmock::prelude::*;
use serde_json::json;

use restock_gateway::{HttpInventoryClient, InventoryApi, RemoteApiError};
use restock_schemas::{CreateProcessingRequest, MetaOnlyRef};

fn client(server: &MockServer) -> HttpInventoryClient {
    HttpInventoryClient::new(server.base_url(), "test-token").expect("client")
}

fn meta(kind: &str, id: &str) -> restock_schemas::Meta {
    restock_schemas::Meta {
        href: format!("https://inventory.test/api/entity/{kind}/{id}"),
        metadata_href: None,
        entity_type: Some(kind.to_string()),
        media_type: None,
    }
}

#[tokio::test]
async fn store_lookup_sends_bearer_and_encoded_filter() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/entity/store")
                .query_param("filter", "name=Main FBS")
                .header("authorization", "Bearer test-token");
            then.status(200).json_body(json!({
                "rows": [{
                    "meta": {"href": "https://inventory.test/api/entity/store/s1", "type": "store"},
                    "id": "s1",
                    "name": "Main FBS"
                }]
            }));
        })
        .await;

    let found = client(&server)
        .find_store_by_name("Main FBS")
        .await
        .unwrap()
        .expect("store");
    assert_eq!(found.id(), Some("s1"));
    mock.assert_async().await;
}

#[tokio::test]
async fn missing_store_is_none_not_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/entity/store");
            then.status(200).json_body(json!({"rows": []}));
        })
        .await;

    let found = client(&server).find_store_by_name("Ghost").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn product_stock_filters_by_assortment_and_store() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/report/stock/all")
                .query_param("filter", "assortmentId=p1;stockStore=s1");
            then.status(200).json_body(json!({
                "rows": [{"assortmentId": "p1", "stock": 5.0, "reserve": 2.0, "inTransit": 7.0}]
            }));
        })
        .await;

    let row = client(&server)
        .product_stock("p1", "s1")
        .await
        .unwrap()
        .expect("row");
    assert_eq!(row.available(), 3.0);
    mock.assert_async().await;
}

#[tokio::test]
async fn absent_stock_row_decodes_to_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/report/stock/all");
            then.status(200).json_body(json!({"rows": []}));
        })
        .await;

    let row = client(&server).product_stock("p1", "s1").await.unwrap();
    assert!(row.is_none());
}

#[tokio::test]
async fn non_2xx_surfaces_remote_api_error_with_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/entity/demand/d404");
            then.status(404).body(r#"{"errors":[{"error":"not found"}]}"#);
        })
        .await;

    let err = client(&server).demand("d404").await.unwrap_err();
    let remote = err
        .downcast_ref::<RemoteApiError>()
        .expect("RemoteApiError in the chain");
    assert_eq!(remote.status, 404);
    assert!(remote.body.contains("not found"));
}

#[tokio::test]
async fn garbage_body_is_a_decode_error_naming_the_url() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/entity/organization");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let err = client(&server).first_organization().await.unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("/entity/organization"));
}

#[tokio::test]
async fn plan_expansion_requests_materials_and_products() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/entity/processingplan/pl1")
                .query_param("expand", "materials,products");
            then.status(200).json_body(json!({
                "meta": {"href": "https://inventory.test/api/entity/processingplan/pl1", "type": "processingplan"},
                "id": "pl1",
                "name": "Cola recipe",
                "materials": {"rows": [{
                    "assortment": {"meta": {"href": "https://inventory.test/api/entity/product/m1", "type": "product"}, "name": "Syrup"},
                    "quantity": 2.0
                }]},
                "products": {"rows": [{
                    "assortment": {"meta": {"href": "https://inventory.test/api/entity/product/p1", "type": "product"}, "name": "Cola"},
                    "quantity": 1.0
                }]}
            }));
        })
        .await;

    let plan = client(&server).plan_expanded("pl1").await.unwrap();
    assert_eq!(plan.material_rows().len(), 1);
    assert_eq!(plan.material_rows()[0].quantity, 2.0);
    assert_eq!(plan.product_rows()[0].assortment.id(), Some("p1"));
    mock.assert_async().await;
}

#[tokio::test]
async fn create_posts_wire_shaped_body() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/entity/processing")
                .header("authorization", "Bearer test-token")
                .json_body_partial(
                    r#"{
                        "processingPlan": {"meta": {"href": "https://inventory.test/api/entity/processingplan/pl1"}},
                        "materials": [{"quantity": 10.0}]
                    }"#,
                );
            then.status(200).json_body(json!({
                "meta": {"href": "https://inventory.test/api/entity/processing/pr1", "type": "processing"},
                "id": "pr1",
                "name": "AUTO-00001",
                "applicable": false
            }));
        })
        .await;

    let request = CreateProcessingRequest {
        processing_plan: MetaOnlyRef {
            meta: meta("processingplan", "pl1"),
        },
        store: MetaOnlyRef {
            meta: meta("store", "s1"),
        },
        products_store: MetaOnlyRef {
            meta: meta("store", "s1"),
        },
        organization: MetaOnlyRef {
            meta: meta("organization", "o1"),
        },
        products: vec![restock_schemas::ProcessingLineInput {
            assortment: MetaOnlyRef {
                meta: meta("product", "p1"),
            },
            quantity: 5.0,
        }],
        materials: vec![restock_schemas::ProcessingLineInput {
            assortment: MetaOnlyRef {
                meta: meta("product", "m1"),
            },
            quantity: 10.0,
        }],
        name: None,
        description: Some("Auto-replenishment for shipment SHIP-001".to_string()),
    };

    let created = client(&server).create_processing(&request).await.unwrap();
    assert_eq!(created.id, "pr1");
    assert_eq!(created.applicable, Some(false));
    mock.assert_async().await;
}

#[tokio::test]
async fn finalize_puts_applicable_true() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/entity/processing/pr1")
                .json_body(json!({"applicable": true}));
            then.status(200).json_body(json!({
                "meta": {"href": "https://inventory.test/api/entity/processing/pr1", "type": "processing"},
                "id": "pr1",
                "name": "AUTO-00001",
                "applicable": true
            }));
        })
        .await;

    let applied = client(&server).apply_processing("pr1").await.unwrap();
    assert_eq!(applied.applicable, Some(true));
    mock.assert_async().await;
}

#[tokio::test]
async fn demand_fetch_expands_positions_and_context() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/entity/demand/d1")
                .query_param("expand", "positions,store,organization,agent");
            then.status(200).json_body(json!({
                "meta": {"href": "https://inventory.test/api/entity/demand/d1", "type": "demand"},
                "id": "d1",
                "name": "SHIP-001",
                "moment": "2026-08-01 12:00:00",
                "applicable": true,
                "store": {"meta": {"href": "https://inventory.test/api/entity/store/s1", "type": "store"}, "name": "Main FBS"},
                "organization": {"meta": {"href": "https://inventory.test/api/entity/organization/o1", "type": "organization"}},
                "agent": {"meta": {"href": "https://inventory.test/api/entity/counterparty/a1", "type": "counterparty"}},
                "positions": {"rows": [{
                    "assortment": {"meta": {"href": "https://inventory.test/api/entity/product/p1", "type": "product"}, "name": "Cola"},
                    "quantity": 4.0,
                    "reserve": 1.0
                }]}
            }));
        })
        .await;

    let shipment = client(&server).demand("d1").await.unwrap();
    assert_eq!(shipment.position_rows().len(), 1);
    assert_eq!(shipment.position_rows()[0].quantity, 4.0);
    assert_eq!(shipment.store.id(), Some("s1"));
    mock.assert_async().await;
}
