//! # rxpos Terminal Library
//!
//! The cashier terminal: configuration, the active cart, the session that
//! drives it, and a line-oriented console on top.
//!
//! ## Module Organization
//! ```text
//! rxpos_terminal/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── state/
//! │   ├── cart.rs     ◄─── CartState (Arc<Mutex<Cart>>)
//! │   └── config.rs   ◄─── TerminalConfig (TOML + RXPOS_* env)
//! ├── session.rs      ◄─── PosSession: every cashier operation
//! ├── printer.rs      ◄─── ConsolePrinter, SpoolPrinter
//! ├── console.rs      ◄─── stdin command loop
//! └── error.rs        ◄─── PosError / ErrorCode
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. init_tracing()           RUST_LOG or "info,rxpos=debug,..."        │
//! │  2. TerminalConfig::load()   file ─► env overrides ─► validate         │
//! │  3. BackendClient::new()     reqwest client for the REST backend       │
//! │  4. PosSession::new()        empty cart, configured branch             │
//! │  5. console::run()           until `quit` or end of input              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod console;
pub mod error;
pub mod printer;
pub mod session;
pub mod state;

use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rxpos_client::BackendClient;

use error::PosError;
use printer::{ConsolePrinter, InvoicePrinter, SpoolPrinter};
use session::{Adapters, PosSession};
use state::TerminalConfig;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,rxpos=debug,reqwest=warn";

/// Runs the terminal until the cashier quits.
///
/// Fails on configuration errors and on console I/O errors; cashier errors
/// are printed by the console and never end the run.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting rxpos terminal");

    let config = TerminalConfig::load()?;
    info!(
        backend = %config.backend.base_url,
        branch = ?config.store.branch_id,
        operator = ?config.operator.name,
        "Configuration loaded"
    );

    let client =
        BackendClient::new(config.backend.clone()).map_err(|e| PosError::config(e.to_string()))?;

    let printer: Arc<dyn InvoicePrinter> = match &config.receipt.spool_dir {
        Some(dir) => Arc::new(SpoolPrinter::new(dir)),
        None => Arc::new(ConsolePrinter),
    };

    let session = PosSession::new(config, Adapters::from_client(client));
    println!("{}", console::HELP);

    console::run(
        &session,
        printer.as_ref(),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    info!("Terminal closed");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=rxpos_client=trace` - Trace the backend client only
/// - Default: [`DEFAULT_LOG_FILTER`]
///
/// Logs go to stderr so they never interleave with receipts on stdout.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
