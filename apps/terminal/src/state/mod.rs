//! # State Module
//!
//! What the terminal holds between commands.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────────┐            ┌──────────────────────────────┐  │
//! │  │      CartState       │            │       TerminalConfig         │  │
//! │  │                      │            │                              │  │
//! │  │  Arc<Mutex<Cart>>    │            │  backend, store, lookup,     │  │
//! │  │  one active sale     │            │  operator, receipt           │  │
//! │  └──────────────────────┘            └──────────────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • CartState: exclusive access per engine operation                    │
//! │  • TerminalConfig: read-only after startup                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod config;

pub use cart::CartState;
pub use config::{
    LookupConfig, OperatorConfig, ReceiptConfig, StoreConfig, TerminalConfig, CONFIG_FILE_NAME,
    CONFIG_PATH_ENV,
};
