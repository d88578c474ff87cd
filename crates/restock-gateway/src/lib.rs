//! restock-gateway
//!
//! Typed request/response wrapper around the remote inventory platform's
//! REST API. This crate is a pure transport-and-decoding layer: it attaches
//! the bearer credential, negotiates compressed JSON, and surfaces non-2xx
//! responses as [`RemoteApiError`]. It performs no retries and attaches no
//! business meaning to what it fetches.
//!
//! The [`InventoryApi`] trait is the seam the reconciliation engine is
//! written against; [`HttpInventoryClient`] is the production implementation
//! and `restock-testkit` provides a deterministic fake.

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use restock_schemas::{
    AttributeDescriptor, CreateProcessingRequest, Demand, EntityRef, ListResponse, Processing,
    ProcessingPlan, Product, StockRow,
};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// A non-2xx response from the remote inventory API.
///
/// Carries the HTTP status and the raw response body; interpretation is the
/// caller's problem. Wrapped in `anyhow::Error` by every gateway method, so
/// callers that care can `downcast_ref::<RemoteApiError>()`.
#[derive(Debug, Clone)]
pub struct RemoteApiError {
    pub status: u16,
    pub body: String,
}

impl fmt::Display for RemoteApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inventory api error {}: {}", self.status, self.body)
    }
}

impl std::error::Error for RemoteApiError {}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// The remote inventory API surface consumed by this service.
///
/// One method per remote operation; every state mutation in the whole system
/// flows exclusively through [`create_processing`](Self::create_processing)
/// and [`apply_processing`](Self::apply_processing).
#[async_trait]
pub trait InventoryApi: Send + Sync {
    /// First store whose name matches exactly; `None` when absent.
    /// Duplicate-named stores are a configuration problem surfaced upstream,
    /// not resolved here.
    async fn find_store_by_name(&self, name: &str) -> Result<Option<EntityRef>>;

    /// Bulk stock snapshot for one store (diagnostic read).
    async fn store_stock(&self, store_id: &str) -> Result<Vec<StockRow>>;

    /// Stock row for one product at one store; `None` when the product has
    /// never moved there (a normal state, not an error).
    async fn product_stock(&self, assortment_id: &str, store_id: &str)
        -> Result<Option<StockRow>>;

    /// Product (or assortment entry) with custom attributes expanded.
    async fn product_with_attributes(&self, reference: &EntityRef) -> Result<Product>;

    /// Full custom-attribute schema for products.
    async fn attribute_metadata(&self) -> Result<Vec<AttributeDescriptor>>;

    /// First processing plan whose name matches exactly.
    async fn find_plan_by_name(&self, name: &str) -> Result<Option<ProcessingPlan>>;

    /// Processing plan with material and product lines expanded.
    async fn plan_expanded(&self, plan_id: &str) -> Result<ProcessingPlan>;

    /// First organization of the account (single-organization assumption).
    async fn first_organization(&self) -> Result<Option<EntityRef>>;

    /// Shipment with positions, store, organization and agent expanded.
    async fn demand(&self, demand_id: &str) -> Result<Demand>;

    /// Create a production operation (`applicable = false`; no stock effect).
    async fn create_processing(&self, request: &CreateProcessingRequest) -> Result<Processing>;

    /// Finalize a production operation (`applicable = true`; commits the
    /// material consumption and product addition).
    async fn apply_processing(&self, processing_id: &str) -> Result<Processing>;
}

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Production [`InventoryApi`] over HTTPS.
///
/// A constructed value passed explicitly to consumers — deliberately not a
/// process-wide singleton, so the engine stays testable with a fake gateway.
pub struct HttpInventoryClient {
    client: Client,
    api_base: String,
    token: String,
}

impl HttpInventoryClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_base, endpoint)
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response body from {url}"))?;

        if !status.is_success() {
            warn!(%status, %url, "inventory api returned an error response");
            return Err(RemoteApiError {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        serde_json::from_str(&body).with_context(|| {
            // Truncate on a char boundary; bodies can be arbitrary text.
            let snippet: String = body.chars().take(500).collect();
            format!("failed to decode response from {url}: {snippet}")
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let url = self.url(endpoint);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("GET {url} failed to send"))?;
        Self::decode(&url, response).await
    }

    async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        let url = self.url(endpoint);
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {url} failed to send"))?;
        Self::decode(&url, response).await
    }

    async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        let url = self.url(endpoint);
        debug!(%url, "PUT");
        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("PUT {url} failed to send"))?;
        Self::decode(&url, response).await
    }
}

#[async_trait]
impl InventoryApi for HttpInventoryClient {
    async fn find_store_by_name(&self, name: &str) -> Result<Option<EntityRef>> {
        info!(store = name, "looking up store by name");
        let response: ListResponse<EntityRef> = self
            .get(&format!(
                "/entity/store?filter=name={}",
                urlencoding::encode(name)
            ))
            .await?;
        Ok(response.into_first_row())
    }

    async fn store_stock(&self, store_id: &str) -> Result<Vec<StockRow>> {
        let response: ListResponse<StockRow> = self
            .get(&format!(
                "/report/stock/all?filter=stockStore={store_id}&limit=1000"
            ))
            .await?;
        Ok(response.into_rows())
    }

    async fn product_stock(
        &self,
        assortment_id: &str,
        store_id: &str,
    ) -> Result<Option<StockRow>> {
        let response: ListResponse<StockRow> = self
            .get(&format!(
                "/report/stock/all?filter=assortmentId={assortment_id};stockStore={store_id}"
            ))
            .await?;
        Ok(response.into_first_row())
    }

    async fn product_with_attributes(&self, reference: &EntityRef) -> Result<Product> {
        let id = reference
            .id()
            .context("product reference has no extractable id")?;
        // Shipment lines may reference either a plain product or an
        // assortment entry (e.g. a variant); the expand endpoint differs.
        let family = if reference.meta.is_type("product") {
            "product"
        } else {
            "assortment"
        };
        self.get(&format!("/entity/{family}/{id}?expand=attributes"))
            .await
    }

    async fn attribute_metadata(&self) -> Result<Vec<AttributeDescriptor>> {
        let response: ListResponse<AttributeDescriptor> =
            self.get("/entity/product/metadata/attributes").await?;
        Ok(response.into_rows())
    }

    async fn find_plan_by_name(&self, name: &str) -> Result<Option<ProcessingPlan>> {
        info!(plan = name, "looking up processing plan by name");
        let response: ListResponse<ProcessingPlan> = self
            .get(&format!(
                "/entity/processingplan?filter=name={}",
                urlencoding::encode(name)
            ))
            .await?;
        Ok(response.into_first_row())
    }

    async fn plan_expanded(&self, plan_id: &str) -> Result<ProcessingPlan> {
        self.get(&format!(
            "/entity/processingplan/{plan_id}?expand=materials,products"
        ))
        .await
    }

    async fn first_organization(&self) -> Result<Option<EntityRef>> {
        let response: ListResponse<EntityRef> = self.get("/entity/organization").await?;
        Ok(response.into_first_row())
    }

    async fn demand(&self, demand_id: &str) -> Result<Demand> {
        info!(demand = demand_id, "fetching shipment");
        self.get(&format!(
            "/entity/demand/{demand_id}?expand=positions,store,organization,agent"
        ))
        .await
    }

    async fn create_processing(&self, request: &CreateProcessingRequest) -> Result<Processing> {
        info!("creating production operation");
        self.post("/entity/processing", request).await
    }

    async fn apply_processing(&self, processing_id: &str) -> Result<Processing> {
        info!(processing = processing_id, "finalizing production operation");
        #[derive(serde::Serialize)]
        struct ApplyRequest {
            applicable: bool,
        }
        self.put(
            &format!("/entity/processing/{processing_id}"),
            &ApplyRequest { applicable: true },
        )
        .await
    }
}
