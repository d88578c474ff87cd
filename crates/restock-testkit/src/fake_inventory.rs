//! Deterministic in-memory [`InventoryApi`] implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use restock_gateway::InventoryApi;
use restock_schemas::{
    AttributeDescriptor, CreateProcessingRequest, Demand, EntityRef, Processing, ProcessingPlan,
    Product, StockRow,
};

use crate::meta;

#[derive(Default)]
struct Inner {
    stores: Vec<EntityRef>,
    organizations: Vec<EntityRef>,
    /// Keyed by (assortment id, store id).
    stock: HashMap<(String, String), StockRow>,
    products: HashMap<String, Product>,
    descriptors: Vec<AttributeDescriptor>,
    plans: HashMap<String, ProcessingPlan>,
    demands: HashMap<String, Demand>,

    operations: HashMap<String, Processing>,
    created: Vec<CreateProcessingRequest>,
    applied: Vec<String>,
    apply_attempts: usize,
    stock_reads: usize,
    next_operation: u64,

    fail_next_create: Option<String>,
    fail_next_apply: Option<String>,
}

/// In-memory inventory platform with scripted fixtures, recorded mutations
/// and one-shot failure injection for the create and finalize calls.
#[derive(Default)]
pub struct FakeInventory {
    inner: Mutex<Inner>,
}

impl FakeInventory {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("fake inventory lock poisoned")
    }

    // -- fixtures ----------------------------------------------------------

    pub fn add_store(&self, store: EntityRef) {
        self.inner().stores.push(store);
    }

    pub fn add_organization(&self, organization: EntityRef) {
        self.inner().organizations.push(organization);
    }

    pub fn set_stock(&self, assortment_id: &str, store_id: &str, stock: f64, reserve: f64) {
        self.inner().stock.insert(
            (assortment_id.to_string(), store_id.to_string()),
            StockRow {
                assortment_id: assortment_id.to_string(),
                name: None,
                code: None,
                stock: Some(stock),
                reserve: Some(reserve),
                in_transit: None,
            },
        );
    }

    pub fn add_product(&self, product: Product) {
        self.inner().products.insert(product.id.clone(), product);
    }

    pub fn add_descriptor(&self, id: &str, name: &str) {
        self.inner().descriptors.push(AttributeDescriptor {
            id: id.to_string(),
            name: name.to_string(),
            attr_type: Some("string".to_string()),
        });
    }

    pub fn add_plan(&self, plan: ProcessingPlan) {
        self.inner().plans.insert(plan.id.clone(), plan);
    }

    pub fn add_demand(&self, demand: Demand) {
        self.inner().demands.insert(demand.id.clone(), demand);
    }

    // -- failure injection -------------------------------------------------

    /// Make the next create call fail with the given message.
    pub fn fail_next_create(&self, message: &str) {
        self.inner().fail_next_create = Some(message.to_string());
    }

    /// Make the next finalize call fail with the given message.
    pub fn fail_next_apply(&self, message: &str) {
        self.inner().fail_next_apply = Some(message.to_string());
    }

    // -- introspection -----------------------------------------------------

    pub fn created_requests(&self) -> Vec<CreateProcessingRequest> {
        self.inner().created.clone()
    }

    pub fn applied_ids(&self) -> Vec<String> {
        self.inner().applied.clone()
    }

    pub fn apply_attempts(&self) -> usize {
        self.inner().apply_attempts
    }

    /// Total state-mutating calls issued (creates attempted + finalize
    /// attempts). The no-mutation assertions in scenario tests hang off
    /// this.
    pub fn mutation_calls(&self) -> usize {
        let inner = self.inner();
        inner.created.len() + inner.apply_attempts
    }

    pub fn stock_reads(&self) -> usize {
        self.inner().stock_reads
    }
}

#[async_trait]
impl InventoryApi for FakeInventory {
    async fn find_store_by_name(&self, name: &str) -> Result<Option<EntityRef>> {
        Ok(self
            .inner()
            .stores
            .iter()
            .find(|s| s.name.as_deref() == Some(name))
            .cloned())
    }

    async fn store_stock(&self, store_id: &str) -> Result<Vec<StockRow>> {
        Ok(self
            .inner()
            .stock
            .iter()
            .filter(|((_, sid), _)| sid == store_id)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn product_stock(
        &self,
        assortment_id: &str,
        store_id: &str,
    ) -> Result<Option<StockRow>> {
        let mut inner = self.inner();
        inner.stock_reads += 1;
        Ok(inner
            .stock
            .get(&(assortment_id.to_string(), store_id.to_string()))
            .cloned())
    }

    async fn product_with_attributes(&self, reference: &EntityRef) -> Result<Product> {
        let id = reference
            .id()
            .ok_or_else(|| anyhow!("reference has no id"))?;
        self.inner()
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("inventory api error 404: product {id} not found"))
    }

    async fn attribute_metadata(&self) -> Result<Vec<AttributeDescriptor>> {
        Ok(self.inner().descriptors.clone())
    }

    async fn find_plan_by_name(&self, name: &str) -> Result<Option<ProcessingPlan>> {
        Ok(self
            .inner()
            .plans
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn plan_expanded(&self, plan_id: &str) -> Result<ProcessingPlan> {
        self.inner()
            .plans
            .get(plan_id)
            .cloned()
            .ok_or_else(|| anyhow!("inventory api error 404: plan {plan_id} not found"))
    }

    async fn first_organization(&self) -> Result<Option<EntityRef>> {
        Ok(self.inner().organizations.first().cloned())
    }

    async fn demand(&self, demand_id: &str) -> Result<Demand> {
        self.inner()
            .demands
            .get(demand_id)
            .cloned()
            .ok_or_else(|| anyhow!("inventory api error 404: demand {demand_id} not found"))
    }

    async fn create_processing(&self, request: &CreateProcessingRequest) -> Result<Processing> {
        let mut inner = self.inner();
        if let Some(message) = inner.fail_next_create.take() {
            return Err(anyhow!("{message}"));
        }
        inner.next_operation += 1;
        let n = inner.next_operation;
        let id = format!("proc-{n:04}");
        let operation = Processing {
            meta: meta("processing", &id),
            id: id.clone(),
            name: format!("AUTO-{n:05}"),
            description: request.description.clone(),
            applicable: Some(false),
            processing_plan: None,
            store: None,
            organization: None,
        };
        inner.created.push(request.clone());
        inner.operations.insert(id, operation.clone());
        Ok(operation)
    }

    async fn apply_processing(&self, processing_id: &str) -> Result<Processing> {
        let mut inner = self.inner();
        inner.apply_attempts += 1;
        if let Some(message) = inner.fail_next_apply.take() {
            return Err(anyhow!("{message}"));
        }
        let operation = inner
            .operations
            .get_mut(processing_id)
            .ok_or_else(|| anyhow!("inventory api error 404: processing {processing_id} not found"))?;
        operation.applicable = Some(true);
        let applied = operation.clone();
        inner.applied.push(processing_id.to_string());
        Ok(applied)
    }
}
