//! Axum router and all HTTP handlers for restock-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. All handlers are `pub(crate)` so the scenario tests in
//! `tests/` can compose the router directly against a fake gateway.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info};

use crate::{
    api_types::{
        ConfigResponse, ErrorResponse, HealthResponse, StockLine, StockResponse, WebhookIgnored,
        WebhookParams,
    },
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (tracing) are **not** applied here; `main.rs` attaches
/// them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/webhook", post(webhook))
        .route("/v1/demand/:id/reconcile", post(reconcile_demand))
        .route("/v1/config", get(config))
        .route("/v1/stock", get(stock))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service.to_string(),
            version: st.build.version.to_string(),
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /webhook
// ---------------------------------------------------------------------------

/// Webhook callback from the remote inventory system.
///
/// The subscription is scoped to demand-create events, but the type is
/// re-checked here: anything other than a demand is acknowledged with 200
/// and ignored, because the sender retries on non-2xx and a retry cannot
/// change the outcome.
pub(crate) async fn webhook(
    State(st): State<Arc<AppState>>,
    Query(params): Query<WebhookParams>,
) -> Response {
    let entity_type = params.entity_type.as_deref().unwrap_or("");
    if !entity_type.eq_ignore_ascii_case("demand") {
        info!(entity_type, id = %params.id, "ignoring webhook for non-demand entity");
        return (
            StatusCode::OK,
            Json(WebhookIgnored {
                accepted: false,
                entity_type: entity_type.to_string(),
                note: "only demand events trigger replenishment".to_string(),
            }),
        )
            .into_response();
    }

    info!(demand_id = %params.id, "webhook received, starting reconciliation");
    run_reconcile(&st, &params.id).await
}

// ---------------------------------------------------------------------------
// POST /v1/demand/:id/reconcile
// ---------------------------------------------------------------------------

/// Manual trigger for the same pipeline the webhook drives. Useful for
/// replaying a shipment after a transient remote failure.
pub(crate) async fn reconcile_demand(
    State(st): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    info!(demand_id = %id, "manual reconciliation requested");
    run_reconcile(&st, &id).await
}

async fn run_reconcile(st: &AppState, demand_id: &str) -> Response {
    match st.engine.reconcile_shipment(demand_id).await {
        Ok(report) => {
            info!(
                demand_id,
                produced = report.produced_count(),
                positions = report.positions.len(),
                ok = report.ok(),
                "reconciliation finished"
            );
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(e) => {
            error!(demand_id, error = %format!("{e:#}"), "reconciliation aborted");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("{e:#}"),
                }),
            )
                .into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// GET /v1/config
// ---------------------------------------------------------------------------

pub(crate) async fn config(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let s = &st.settings;
    (
        StatusCode::OK,
        Json(ConfigResponse {
            api_base: s.api_base.clone(),
            store_name: s.store_name.clone(),
            recipe_field_name: s.recipe_field_name.clone(),
            min_stock_threshold: s.min_stock_threshold,
            max_concurrent_positions: s.max_concurrent_positions,
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /v1/stock
// ---------------------------------------------------------------------------

/// Current stock report for the monitored store, with the derived available
/// quantity per row. Read-only diagnostic view.
pub(crate) async fn stock(State(st): State<Arc<AppState>>) -> Response {
    let store = match st
        .gateway
        .find_store_by_name(&st.settings.store_name)
        .await
    {
        Ok(Some(store)) => store,
        Ok(None) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("monitored store '{}' not found", st.settings.store_name),
                }),
            )
                .into_response();
        }
        Err(e) => return stock_error(e),
    };

    let Some(store_id) = store.id().map(str::to_string) else {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "monitored store reference carries no id".to_string(),
            }),
        )
            .into_response();
    };

    match st.gateway.store_stock(&store_id).await {
        Ok(rows) => {
            let rows = rows
                .iter()
                .map(|r| StockLine {
                    assortment_id: r.assortment_id.clone(),
                    name: r.name.clone(),
                    stock: r.stock.unwrap_or(0.0),
                    reserve: r.reserve.unwrap_or(0.0),
                    available: r.available(),
                })
                .collect();
            (
                StatusCode::OK,
                Json(StockResponse {
                    store: st.settings.store_name.clone(),
                    rows,
                }),
            )
                .into_response()
        }
        Err(e) => stock_error(e),
    }
}

fn stock_error(e: anyhow::Error) -> Response {
    error!(error = %format!("{e:#}"), "stock report fetch failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: format!("{e:#}"),
        }),
    )
        .into_response()
}
