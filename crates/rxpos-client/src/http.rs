//! # HTTP Backend Client
//!
//! [`BackendClient`] implements every adapter trait against the REST backend.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  adapter call                                                           │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  endpoint(path) ── api_root().join(path)                                │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  reqwest (timeout, bearer token, x-request-id)                          │
//! │      │                                                                  │
//! │      ├── no response ──────► ClientError::Request / Timeout            │
//! │      ├── 4xx / 5xx ────────► ClientError::Status { message from body } │
//! │      └── 2xx ──► JSON ──► protocol::decode_rows / decode_record        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use rxpos_core::history::{HistoryQuery, SaleSummary};
use rxpos_core::submission::{SaleOrder, SaleReceipt};
use rxpos_core::types::{Branch, Customer, FaceMatch, StockRow};

use crate::adapters::{CustomerDirectory, FaceIdentifier, SaleGateway, StockCatalog};
use crate::config::BackendConfig;
use crate::error::{ClientError, ClientResult};
use crate::protocol::{
    decode_record, decode_rows, error_message, CustomerSearchParams, FaceIdentifyRequest,
    FaceIdentifyResponse, StockSearchParams, CUSTOMERS_PATH, FACE_IDENTIFY_PATH, SALES_PATH,
    STOCK_PATH,
};

/// REST client for the pharmacy backend. Cheap to clone.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    root: Url,
    config: BackendConfig,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("root", &self.inner.root.as_str())
            .finish()
    }
}

impl BackendClient {
    /// Builds a client from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig`/`InvalidUrl` for a bad configuration or an auth
    /// token that cannot be sent as a header.
    pub fn new(config: BackendConfig) -> ClientResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &config.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| ClientError::InvalidConfig(format!("invalid auth token: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;

        let root = config.api_root()?;
        debug!(root = %root, "Backend client ready");

        Ok(BackendClient {
            inner: Arc::new(BackendClientInner { http, root, config }),
        })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.inner.config
    }

    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        Ok(self.inner.root.join(path)?)
    }

    async fn get<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> ClientResult<Value> {
        let url = self.endpoint(path)?;
        let request = self.inner.http.get(url).query(query);
        self.send(request, path).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<Value> {
        let url = self.endpoint(path)?;
        let request = self.inner.http.post(url).json(body);
        self.send(request, path).await
    }

    async fn send(&self, request: reqwest::RequestBuilder, path: &str) -> ClientResult<Value> {
        let request_id = Uuid::new_v4();
        let started = Instant::now();
        let timeout_secs = self.inner.config.timeout_secs;

        let response = request
            .header("x-request-id", request_id.to_string())
            .send()
            .await
            .map_err(|e| {
                warn!(%path, %request_id, error = %e, "Backend unreachable");
                ClientError::from_reqwest(e, timeout_secs)
            })?;

        let status = response.status();
        debug!(
            %path,
            %request_id,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Backend responded"
        );

        let body = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout_secs))?;

        if !status.is_success() {
            warn!(%path, %request_id, status = status.as_u16(), body = %body, "Backend rejected request");
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

// =============================================================================
// Adapter Implementations
// =============================================================================

#[async_trait]
impl StockCatalog for BackendClient {
    async fn search_stock(&self, branch: &Branch, query: &str) -> ClientResult<Vec<StockRow>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let params = StockSearchParams {
            search: query,
            limit: self.inner.config.stock_search_limit,
            branch_id: &branch.id,
        };
        let rows = decode_rows(self.get(STOCK_PATH, &params).await?)?;
        debug!(branch_id = %branch.id, %query, count = rows.len(), "Stock search");
        Ok(rows)
    }
}

#[async_trait]
impl CustomerDirectory for BackendClient {
    async fn search_customers(&self, query: &str) -> ClientResult<Vec<Customer>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let params = CustomerSearchParams {
            search: query,
            limit: self.inner.config.customer_search_limit,
        };
        let customers = decode_rows(self.get(CUSTOMERS_PATH, &params).await?)?;
        debug!(%query, count = customers.len(), "Customer search");
        Ok(customers)
    }

    async fn purchase_history(&self, query: &HistoryQuery) -> ClientResult<Vec<SaleSummary>> {
        let mut rows: Vec<SaleSummary> = decode_rows(self.get(SALES_PATH, query).await?)?;
        rows.truncate(query.limit as usize);
        debug!(customer_id = %query.customer_id, count = rows.len(), "Purchase history");
        Ok(rows)
    }
}

#[async_trait]
impl FaceIdentifier for BackendClient {
    async fn identify_face(&self, image: &[u8], branch: &Branch) -> ClientResult<FaceMatch> {
        let request = FaceIdentifyRequest::new(image, branch.tenant_id.clone(), branch.id.clone());
        let response: FaceIdentifyResponse =
            decode_record(self.post(FACE_IDENTIFY_PATH, &request).await?)?;
        Ok(response.into())
    }
}

#[async_trait]
impl SaleGateway for BackendClient {
    async fn create_sale(&self, order: &SaleOrder) -> ClientResult<SaleReceipt> {
        let receipt: SaleReceipt = decode_record(self.post(SALES_PATH, order).await?)?;
        debug!(
            invoice_number = ?receipt.invoice_number,
            sale_id = ?receipt.id,
            "Sale created"
        );
        Ok(receipt)
    }
}
