//! The per-shipment reconciliation pipeline.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::{stream, StreamExt};
use restock_gateway::InventoryApi;
use restock_schemas::{
    AttributeDescriptor, CreateProcessingRequest, Demand, DemandPosition, EntityRef, MetaOnlyRef,
    ProcessingLineInput, ProcessingPlan,
};
use tracing::{debug, error, info, warn};

use crate::types::{
    FailReason, PositionOutcome, PositionReport, ProductSnapshot, ShipmentReport, SkipReason,
};
use crate::{recipe, stock};

/// Engine configuration, decoupled from how the binary loads it.
#[derive(Debug, Clone)]
pub struct EnginePolicy {
    /// Name of the monitored warehouse store.
    pub store_name: String,
    /// Product custom attribute linking to a recipe.
    pub recipe_field_name: String,
    /// Available quantity below which auto-production is considered.
    pub min_stock_threshold: f64,
    /// Width of the position worker pool; 1 = strictly sequential, which
    /// keeps diagnostic logs in shipment order and stays well inside the
    /// remote API's rate limits.
    pub max_concurrent_positions: usize,
}

/// Per-run resolved context shared by all positions of one shipment.
struct RunContext {
    store: EntityRef,
    store_id: String,
    organization: EntityRef,
    recipe_attribute: Option<AttributeDescriptor>,
    demand_name: String,
    demand_moment: String,
}

/// The reconciliation engine. Owns nothing but a gateway handle and policy;
/// all state it acts on is fetched fresh from the remote system per run.
pub struct ReconcileEngine {
    gateway: Arc<dyn InventoryApi>,
    policy: EnginePolicy,
}

impl ReconcileEngine {
    pub fn new(gateway: Arc<dyn InventoryApi>, policy: EnginePolicy) -> Self {
        Self { gateway, policy }
    }

    pub fn policy(&self) -> &EnginePolicy {
        &self.policy
    }

    /// Run the full reconciliation pipeline for one shipment.
    ///
    /// Pure function of remote state at call time and safe to invoke
    /// repeatedly, but NOT idempotent in its side effects: there is no
    /// idempotency key or local ledger, so a redelivered webhook for the
    /// same shipment can create duplicate production operations. The remote
    /// system is the sole arbiter of material truth; two positions competing
    /// for the same scarce material each validate against fresh remote
    /// stock, and overcommitment is left to the remote system to enforce.
    ///
    /// Errors only when the shipment itself cannot be processed at all
    /// (fetch failure, unresolvable store/organization); everything
    /// position-scoped is reported as data in the returned report.
    pub async fn reconcile_shipment(&self, demand_id: &str) -> Result<ShipmentReport> {
        let gw = self.gateway.as_ref();

        let demand = gw
            .demand(demand_id)
            .await
            .with_context(|| format!("failed to fetch shipment {demand_id}"))?;

        info!(
            demand = %demand.name,
            positions = demand.position_rows().len(),
            "reconciling shipment"
        );

        if !demand.applicable {
            info!(demand = %demand.name, "shipment is not finalized; skipping");
            return Ok(noted_report(
                &demand,
                "shipment is not finalized; nothing to replenish",
            ));
        }

        let store = gw
            .find_store_by_name(&self.policy.store_name)
            .await?
            .with_context(|| format!("monitored store '{}' not found", self.policy.store_name))?;
        let store_id = store
            .id()
            .context("store reference has no extractable id")?
            .to_string();

        if let Some(shipment_store) = demand.store.id() {
            if shipment_store != store_id {
                info!(
                    demand = %demand.name,
                    shipment_store = %demand.store.display_name(),
                    "shipment targets a different store; skipping"
                );
                return Ok(noted_report(
                    &demand,
                    "shipment targets a store other than the monitored one",
                ));
            }
        }

        let organization = gw
            .first_organization()
            .await?
            .context("no organization exists on the account")?;

        let recipe_attribute =
            recipe::resolve_recipe_attribute(gw, &self.policy.recipe_field_name).await?;
        if recipe_attribute.is_none() {
            warn!(
                attribute = %self.policy.recipe_field_name,
                "recipe attribute not defined in the product schema; every position will skip"
            );
        }

        if demand.position_rows().is_empty() {
            warn!(demand = %demand.name, "shipment has no positions");
            return Ok(noted_report(&demand, "shipment has no positions"));
        }

        let ctx = RunContext {
            store,
            store_id,
            organization,
            recipe_attribute,
            demand_name: demand.name.clone(),
            demand_moment: demand.moment.clone(),
        };

        // Positions are independent; evaluate through an order-preserving
        // bounded pool. Width 1 reproduces the strictly sequential loop.
        let width = self.policy.max_concurrent_positions.max(1);
        // Boxed to erase the closure type: rustc cannot prove this stream's
        // future Send under the higher-ranked lifetimes axum's handler check
        // introduces (rust-lang/rust#102211).
        let collect: std::pin::Pin<
            Box<dyn std::future::Future<Output = Vec<PositionReport>> + Send + '_>,
        > = Box::pin(
            stream::iter(
                demand
                    .position_rows()
                    .iter()
                    .map(|position| self.process_position(&ctx, position)),
            )
            .buffered(width)
            .collect(),
        );
        let positions: Vec<PositionReport> = collect.await;

        let report = ShipmentReport {
            demand_id: demand.id.clone(),
            demand_name: Some(demand.name.clone()),
            note: None,
            positions,
        };
        info!(
            demand = %demand.name,
            produced = report.produced_count(),
            ok = report.ok(),
            "shipment reconciliation finished"
        );
        Ok(report)
    }

    /// One position, isolated: any error inside becomes a Failed outcome for
    /// this position only.
    async fn process_position(
        &self,
        ctx: &RunContext,
        position: &DemandPosition,
    ) -> PositionReport {
        let mut snapshot = ProductSnapshot {
            id: position
                .assortment
                .id()
                .unwrap_or("unknown")
                .to_string(),
            name: position.assortment.display_name().to_string(),
            shipped_quantity: position.quantity,
            stock_before: 0.0,
        };

        let outcome = match self.run_position(ctx, position, &mut snapshot).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(product = %snapshot.name, "position pipeline failed: {e:#}");
                PositionOutcome::Failed {
                    reason: FailReason::Gateway {
                        detail: format!("{e:#}"),
                    },
                }
            }
        };

        let message = outcome_message(&outcome, &snapshot);
        PositionReport {
            product: snapshot,
            outcome,
            message,
        }
    }

    /// The per-position state machine:
    /// Evaluate → ResolveRecipe → ComputeBatch → ValidateMaterials →
    /// Submit → Finalize.
    async fn run_position(
        &self,
        ctx: &RunContext,
        position: &DemandPosition,
        snapshot: &mut ProductSnapshot,
    ) -> Result<PositionOutcome> {
        let gw = self.gateway.as_ref();
        let threshold = self.policy.min_stock_threshold;

        let product_id = position
            .assortment
            .id()
            .context("position assortment has no extractable id")?
            .to_string();

        // Evaluate. The read happens after the shipment already decremented
        // remote stock; the remote system's ordering is trusted.
        let available = stock::available_quantity(gw, &product_id, &ctx.store_id).await?;
        snapshot.stock_before = available;
        info!(
            product = %snapshot.name,
            available,
            threshold,
            "evaluated post-shipment stock"
        );
        if available >= threshold {
            return Ok(PositionOutcome::Skipped {
                reason: SkipReason::StockSufficient {
                    available,
                    threshold,
                },
            });
        }

        // ResolveRecipe.
        let Some(descriptor) = ctx.recipe_attribute.as_ref() else {
            return Ok(PositionOutcome::Skipped {
                reason: SkipReason::NoRecipeConfigured,
            });
        };
        let product = gw.product_with_attributes(&position.assortment).await?;
        snapshot.name = product.name.clone();
        let Some(plan) = recipe::resolve_plan_for_product(gw, &product, descriptor).await? else {
            info!(product = %product.name, "no recipe configured; skipping");
            return Ok(PositionOutcome::Skipped {
                reason: SkipReason::NoRecipeConfigured,
            });
        };
        info!(product = %product.name, plan = %plan.name, "resolved processing plan");

        // ComputeBatch: replenish exactly what was shipped.
        let batch = compute_batch(&plan, &product_id, position.quantity, &position.assortment);

        // ValidateMaterials: fail fast on the first shortfall; no partial-
        // material production and no create call.
        for line in &batch.materials {
            let material_id = line
                .assortment
                .id()
                .context("plan material has no extractable id")?;
            let have = stock::available_quantity(gw, material_id, &ctx.store_id).await?;
            debug!(material = %line.name, required = line.quantity, available = have, "material check");
            if have < line.quantity {
                warn!(
                    material = %line.name,
                    required = line.quantity,
                    available = have,
                    "insufficient materials; no production submitted"
                );
                return Ok(PositionOutcome::Failed {
                    reason: FailReason::InsufficientMaterial {
                        material: line.name.clone(),
                        required: line.quantity,
                        available: have,
                    },
                });
            }
        }

        // Submit: created inert (applicable = false).
        let request = CreateProcessingRequest {
            processing_plan: MetaOnlyRef {
                meta: plan.meta.clone(),
            },
            store: (&ctx.store).into(),
            products_store: (&ctx.store).into(),
            organization: (&ctx.organization).into(),
            products: to_line_inputs(&batch.products),
            materials: to_line_inputs(&batch.materials),
            name: None,
            description: Some(format!(
                "Auto-replenishment for shipment {} of {}",
                ctx.demand_name, ctx.demand_moment
            )),
        };
        let created = match gw.create_processing(&request).await {
            Ok(p) => p,
            Err(e) => {
                warn!(product = %product.name, "production create rejected: {e:#}");
                return Ok(PositionOutcome::Failed {
                    reason: FailReason::SubmitRejected {
                        detail: format!("{e:#}"),
                    },
                });
            }
        };

        // Finalize: only this commits stock effects. On failure the created
        // operation is left inert remote-side for an operator; no
        // compensating deletion is attempted.
        match gw.apply_processing(&created.id).await {
            Ok(applied) => {
                info!(
                    processing = %applied.name,
                    product = %product.name,
                    quantity = position.quantity,
                    "production operation created and finalized"
                );
                Ok(PositionOutcome::Produced {
                    processing_id: applied.id,
                    processing_name: applied.name,
                })
            }
            Err(e) => {
                warn!(
                    processing = %created.id,
                    "production operation created but finalize failed: {e:#}"
                );
                Ok(PositionOutcome::Failed {
                    reason: FailReason::NotFinalized {
                        processing_id: created.id,
                        detail: format!("{e:#}"),
                    },
                })
            }
        }
    }
}

fn noted_report(demand: &Demand, note: &str) -> ShipmentReport {
    ShipmentReport {
        demand_id: demand.id.clone(),
        demand_name: Some(demand.name.clone()),
        note: Some(note.to_string()),
        positions: Vec::new(),
    }
}

fn outcome_message(outcome: &PositionOutcome, snapshot: &ProductSnapshot) -> String {
    match outcome {
        PositionOutcome::Skipped {
            reason: SkipReason::StockSufficient {
                available,
                threshold,
            },
        } => format!("stock sufficient ({available} >= {threshold})"),
        PositionOutcome::Skipped {
            reason: SkipReason::NoRecipeConfigured,
        } => "no recipe configured".to_string(),
        PositionOutcome::Produced {
            processing_name, ..
        } => format!(
            "created production operation {processing_name} for {} units of '{}'",
            snapshot.shipped_quantity, snapshot.name
        ),
        PositionOutcome::Failed { reason } => reason.message(),
    }
}

// ---------------------------------------------------------------------------
// Batch computation
// ---------------------------------------------------------------------------

/// One scaled line of a production batch.
struct BatchLine {
    assortment: EntityRef,
    name: String,
    quantity: f64,
}

/// Product and material lines scaled to a target output quantity.
struct BatchPlan {
    products: Vec<BatchLine>,
    materials: Vec<BatchLine>,
}

/// Scale a plan to produce `target_quantity` units of the shorted product.
///
/// Plan line quantities are per-one-batch ratios, so the scale factor is
/// `target / plan output quantity` — the output quantity taken from the
/// plan's product line matching the shorted product, falling back to the
/// first product line. A plan with no product rows produces the shorted
/// product one-to-one (ratio 1), with the position's own reference
/// synthesized as the output line.
fn compute_batch(
    plan: &ProcessingPlan,
    output_assortment_id: &str,
    target_quantity: f64,
    fallback_output: &EntityRef,
) -> BatchPlan {
    let product_rows = plan.product_rows();
    let output_row = product_rows
        .iter()
        .find(|row| row.assortment.id() == Some(output_assortment_id))
        .or_else(|| product_rows.first());

    let output_ratio = match output_row {
        Some(row) if row.quantity > 0.0 => row.quantity,
        _ => 1.0,
    };
    let batches = target_quantity / output_ratio;

    let products = if product_rows.is_empty() {
        vec![BatchLine {
            assortment: fallback_output.clone(),
            name: fallback_output.display_name().to_string(),
            quantity: target_quantity,
        }]
    } else {
        product_rows
            .iter()
            .map(|row| BatchLine {
                assortment: row.assortment.clone(),
                name: row.assortment.display_name().to_string(),
                quantity: row.quantity * batches,
            })
            .collect()
    };

    let materials = plan
        .material_rows()
        .iter()
        .map(|row| BatchLine {
            assortment: row.assortment.clone(),
            name: row.assortment.display_name().to_string(),
            quantity: row.quantity * batches,
        })
        .collect();

    BatchPlan {
        products,
        materials,
    }
}

fn to_line_inputs(lines: &[BatchLine]) -> Vec<ProcessingLineInput> {
    lines
        .iter()
        .map(|line| ProcessingLineInput {
            assortment: (&line.assortment).into(),
            quantity: line.quantity,
        })
        .collect()
}
