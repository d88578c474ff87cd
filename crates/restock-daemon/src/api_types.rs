//! Request and response types for all restock-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here; the
//! reconciliation outcome itself is `restock_engine::ShipmentReport`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// POST /webhook
// ---------------------------------------------------------------------------

/// Query parameters the remote system appends to the webhook callback URL.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookParams {
    /// Entity id of the document that fired the hook.
    pub id: String,
    /// Entity type, e.g. "demand". Anything else is acknowledged and ignored.
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
}

/// Acknowledgement for webhook deliveries that carry a non-demand entity.
///
/// The remote system retries on non-2xx, so unknown types are acknowledged
/// with 200 rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookIgnored {
    pub accepted: bool,
    pub entity_type: String,
    pub note: String,
}

// ---------------------------------------------------------------------------
// Error body (500)
// ---------------------------------------------------------------------------

/// Response body when a reconciliation run aborts wholesale (shipment
/// unfetchable, monitored store missing, no organization).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ---------------------------------------------------------------------------
// GET /v1/config
// ---------------------------------------------------------------------------

/// Effective runtime configuration. The API token is never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigResponse {
    pub api_base: String,
    pub store_name: String,
    pub recipe_field_name: String,
    pub min_stock_threshold: f64,
    pub max_concurrent_positions: usize,
}

// ---------------------------------------------------------------------------
// GET /v1/stock
// ---------------------------------------------------------------------------

/// One line of the monitored store's stock report, with the derived
/// available quantity the engine would act on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLine {
    pub assortment_id: String,
    pub name: Option<String>,
    pub stock: f64,
    pub reserve: f64,
    pub available: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockResponse {
    pub store: String,
    pub rows: Vec<StockLine>,
}
