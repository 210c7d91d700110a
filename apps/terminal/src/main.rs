//! # rxpos Terminal Entry Point
//!
//! ```text
//! stdin ──► console ──► PosSession ──► rxpos-core (cart rules)
//!                            │
//!                            └────────► rxpos-client (REST backend)
//! ```
//!
//! The actual setup is in lib.rs for better testability.

use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    rxpos_terminal::init_tracing();

    match rxpos_terminal::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Terminal stopped");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
