//! # Debounced Lookups
//!
//! Stock and customer search as the cashier types: debounced, last query
//! wins, empty input answered locally.

use std::sync::Arc;
use std::time::Duration;

use rxpos_core::types::{Branch, Customer, StockRow};

use crate::adapters::{CustomerDirectory, StockCatalog};
use crate::debounce::{Debounced, Debouncer};
use crate::error::ClientResult;

/// Debounced front for a [`StockCatalog`].
#[derive(Clone)]
pub struct StockLookup {
    catalog: Arc<dyn StockCatalog>,
    debouncer: Debouncer,
}

impl StockLookup {
    pub fn new(catalog: Arc<dyn StockCatalog>, quiet: Duration) -> Self {
        StockLookup {
            catalog,
            debouncer: Debouncer::new(quiet),
        }
    }

    /// Searches `branch` for `query`.
    ///
    /// An empty query returns no options immediately and overtakes any
    /// search still pending.
    pub async fn search(&self, branch: &Branch, query: &str) -> Debounced<ClientResult<Vec<StockRow>>> {
        let query = query.trim();
        if query.is_empty() {
            self.debouncer.supersede();
            return Debounced::Ready(Ok(Vec::new()));
        }
        self.debouncer
            .run(|| self.catalog.search_stock(branch, query))
            .await
    }

    /// Drops every pending search (e.g. after a branch switch).
    pub fn supersede(&self) {
        self.debouncer.supersede();
    }
}

/// Debounced front for a [`CustomerDirectory`].
#[derive(Clone)]
pub struct CustomerLookup {
    directory: Arc<dyn CustomerDirectory>,
    debouncer: Debouncer,
}

impl CustomerLookup {
    pub fn new(directory: Arc<dyn CustomerDirectory>, quiet: Duration) -> Self {
        CustomerLookup {
            directory,
            debouncer: Debouncer::new(quiet),
        }
    }

    pub async fn search(&self, query: &str) -> Debounced<ClientResult<Vec<Customer>>> {
        let query = query.trim();
        if query.is_empty() {
            self.debouncer.supersede();
            return Debounced::Ready(Ok(Vec::new()));
        }
        self.debouncer
            .run(|| self.directory.search_customers(query))
            .await
    }

    pub fn supersede(&self) {
        self.debouncer.supersede();
    }
}
