//! Shared runtime state for restock-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum; this module owns
//! nothing async itself. The state is immutable after boot: the engine
//! re-reads everything it needs from the remote API on every run.

use std::sync::Arc;

use restock_config::Settings;
use restock_engine::{EnginePolicy, ReconcileEngine};
use restock_gateway::InventoryApi;

/// Static build metadata included in the health response.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

/// Shared handle passed to every Axum handler.
pub struct AppState {
    pub build: BuildInfo,
    pub settings: Settings,
    pub gateway: Arc<dyn InventoryApi>,
    pub engine: ReconcileEngine,
}

impl AppState {
    /// Wire up the state from loaded settings and a gateway implementation.
    ///
    /// Tests pass a `FakeInventory` here; `main.rs` passes the real
    /// `HttpInventoryClient`.
    pub fn new(settings: Settings, gateway: Arc<dyn InventoryApi>) -> Self {
        let policy = EnginePolicy {
            store_name: settings.store_name.clone(),
            recipe_field_name: settings.recipe_field_name.clone(),
            min_stock_threshold: settings.min_stock_threshold,
            max_concurrent_positions: settings.max_concurrent_positions,
        };
        let engine = ReconcileEngine::new(Arc::clone(&gateway), policy);
        Self {
            build: BuildInfo {
                service: "restock-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            settings,
            gateway,
            engine,
        }
    }
}
