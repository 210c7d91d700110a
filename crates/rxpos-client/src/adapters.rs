//! # Adapter Traits
//!
//! The collaborator contracts the terminal consumes. [`crate::BackendClient`]
//! implements all of them over HTTP; tests substitute in-memory fakes.
//!
//! ```text
//! ┌──────────────────┐   ┌────────────────────┐   ┌──────────────────┐   ┌───────────────┐
//! │  StockCatalog    │   │ CustomerDirectory  │   │  FaceIdentifier  │   │  SaleGateway  │
//! │  search_stock    │   │ search_customers   │   │  identify_face   │   │  create_sale  │
//! │  (branch, q)     │   │ purchase_history   │   │  (image, branch) │   │  (order)      │
//! └──────────────────┘   └────────────────────┘   └──────────────────┘   └───────────────┘
//! ```
//!
//! Every call is branch-scoped through an explicit argument; nothing reads
//! an ambient "current branch".

use async_trait::async_trait;

use rxpos_core::history::{HistoryQuery, SaleSummary};
use rxpos_core::submission::{SaleOrder, SaleReceipt};
use rxpos_core::types::{Branch, Customer, FaceMatch, StockRow};

use crate::error::ClientResult;

#[async_trait]
pub trait StockCatalog: Send + Sync {
    /// Sellable batches at `branch` matching `query`.
    async fn search_stock(&self, branch: &Branch, query: &str) -> ClientResult<Vec<StockRow>>;
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    /// Customers matching a name or phone fragment.
    async fn search_customers(&self, query: &str) -> ClientResult<Vec<Customer>>;

    /// Past sales of one customer inside the query window.
    async fn purchase_history(&self, query: &HistoryQuery) -> ClientResult<Vec<SaleSummary>>;
}

#[async_trait]
pub trait FaceIdentifier: Send + Sync {
    /// Sends a captured still to the matcher, scoped by the branch and its
    /// tenant.
    async fn identify_face(&self, image: &[u8], branch: &Branch) -> ClientResult<FaceMatch>;
}

#[async_trait]
pub trait SaleGateway: Send + Sync {
    async fn create_sale(&self, order: &SaleOrder) -> ClientResult<SaleReceipt>;
}
