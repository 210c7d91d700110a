//! # rxpos-client: Backend Adapters
//!
//! Everything the terminal needs from the pharmacy backend, behind traits.
//!
//! ## Module Organization
//! ```text
//! rxpos_client/
//! ├── adapters.rs   ◄─── StockCatalog, CustomerDirectory, FaceIdentifier, SaleGateway
//! ├── http.rs       ◄─── BackendClient (reqwest) implementing all four
//! ├── protocol.rs   ◄─── request params, envelopes, row-tolerant decoding
//! ├── lookup.rs     ◄─── debounced stock / customer search
//! ├── debounce.rs   ◄─── generation-counting debouncer
//! ├── config.rs     ◄─── BackendConfig
//! └── error.rs      ◄─── ClientError
//! ```
//!
//! ## Failure Model
//! Each call either returns its value or one [`ClientError`]. There are no
//! retries and no background work; the caller decides what a failure means.

pub mod adapters;
pub mod config;
pub mod debounce;
pub mod error;
pub mod http;
pub mod lookup;
pub mod protocol;

pub use adapters::{CustomerDirectory, FaceIdentifier, SaleGateway, StockCatalog};
pub use config::BackendConfig;
pub use debounce::{Debounced, Debouncer};
pub use error::{ClientError, ClientResult};
pub use http::BackendClient;
pub use lookup::{CustomerLookup, StockLookup};
