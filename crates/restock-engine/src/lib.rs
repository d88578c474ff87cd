//! restock-engine
//!
//! The reconciliation decision pipeline: given one shipment, decide per line
//! item whether auto-production should fire, resolve the recipe and scaled
//! quantities, validate material availability against reserved stock, and
//! submit a two-phase (create, then finalize) production operation through
//! the gateway.
//!
//! Architectural decisions:
//! - Outcomes are data: the engine always returns a structured per-position
//!   and per-shipment report; only unrecoverable conditions (the shipment
//!   itself cannot be fetched, a broken account) propagate as errors.
//! - Per-position failures are isolated; one failed line never aborts its
//!   siblings.
//! - No local persistence: the remote system is the sole source of truth
//!   for stock and for which operations exist.

mod engine;
mod recipe;
mod stock;
mod types;

pub use engine::{EnginePolicy, ReconcileEngine};
pub use stock::available_quantity;
pub use types::{
    FailReason, PositionOutcome, PositionReport, ProductSnapshot, ShipmentReport, SkipReason,
};
