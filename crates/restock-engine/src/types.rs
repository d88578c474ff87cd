//! Result types produced by the reconciliation engine.
//!
//! All of these are write-once values: produced by the engine, serialized
//! into HTTP responses, never mutated afterward.

use serde::{Deserialize, Serialize};

/// Why a position was skipped. Skips are expected steady-state conditions,
/// not failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Available stock already meets the configured threshold.
    StockSufficient { available: f64, threshold: f64 },
    /// The product has no recipe configured; auto-production is impossible.
    NoRecipeConfigured,
}

/// Why a position failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailReason {
    /// First material found short during validation; no create call was
    /// issued for this position.
    InsufficientMaterial {
        material: String,
        required: f64,
        available: f64,
    },
    /// The create call was rejected; nothing exists remote-side.
    SubmitRejected { detail: String },
    /// Create succeeded but finalize failed. The operation exists on the
    /// remote system in an inert, unapplied state for an operator to
    /// finalize or discard; the engine never attempts compensating deletion.
    NotFinalized {
        processing_id: String,
        detail: String,
    },
    /// A read step failed against the remote API.
    Gateway { detail: String },
}

impl FailReason {
    pub fn message(&self) -> String {
        match self {
            FailReason::InsufficientMaterial {
                material,
                required,
                available,
            } => format!(
                "insufficient materials: {material} requires {required}, available {available}"
            ),
            FailReason::SubmitRejected { detail } => {
                format!("production operation rejected: {detail}")
            }
            FailReason::NotFinalized {
                processing_id,
                detail,
            } => format!(
                "production operation {processing_id} created but not finalized: {detail}"
            ),
            FailReason::Gateway { detail } => format!("inventory api failure: {detail}"),
        }
    }
}

/// Terminal state of one position's pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PositionOutcome {
    Skipped {
        reason: SkipReason,
    },
    Produced {
        processing_id: String,
        processing_name: String,
    },
    Failed {
        reason: FailReason,
    },
}

impl PositionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, PositionOutcome::Failed { .. })
    }
}

/// Diagnostic snapshot of the product a position shipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub id: String,
    pub name: String,
    /// Quantity the shipment moved out — also the production target.
    pub shipped_quantity: f64,
    /// Available quantity observed before any production, post-shipment.
    pub stock_before: f64,
}

/// Per-position outcome with its diagnostic snapshot and a human-readable
/// message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub product: ProductSnapshot,
    pub outcome: PositionOutcome,
    pub message: String,
}

/// Shipment-level aggregation of all per-position outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentReport {
    pub demand_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_name: Option<String>,
    /// Shipment-level skip note (demand not finalized, different store,
    /// no positions). Empty `positions` with a note is not a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub positions: Vec<PositionReport>,
}

impl ShipmentReport {
    /// Overall success: no position reached Failed. Skipped counts as
    /// success for aggregation purposes.
    pub fn ok(&self) -> bool {
        self.positions.iter().all(|p| !p.outcome.is_failed())
    }

    pub fn produced_count(&self) -> usize {
        self.positions
            .iter()
            .filter(|p| matches!(p.outcome, PositionOutcome::Produced { .. }))
            .count()
    }
}
