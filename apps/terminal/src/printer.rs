//! # Receipt Printers
//!
//! Where a rendered invoice goes. Printing is fire-and-acknowledge: the
//! session hands over the text and, once the printer accepts it, clears the
//! frozen sale.
//!
//! - [`ConsolePrinter`]: writes the receipt to stdout.
//! - [`SpoolPrinter`]: writes `<spool_dir>/<invoice>.txt` for a print daemon.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use rxpos_core::invoice::Invoice;

use crate::error::PosError;

#[async_trait]
pub trait InvoicePrinter: Send + Sync {
    /// Hands `text` (the rendered form of `invoice`) to the printer.
    async fn print(&self, invoice: &Invoice, text: &str) -> Result<(), PosError>;
}

/// Prints receipts to standard output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsolePrinter;

#[async_trait]
impl InvoicePrinter for ConsolePrinter {
    async fn print(&self, invoice: &Invoice, text: &str) -> Result<(), PosError> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(text.as_bytes())
            .await
            .map_err(|e| PosError::print_failed(e.to_string()))?;
        stdout
            .flush()
            .await
            .map_err(|e| PosError::print_failed(e.to_string()))?;
        debug!(invoice = %invoice.reference(), "Receipt written to console");
        Ok(())
    }
}

/// Writes each receipt to its own file in a spool directory.
#[derive(Debug, Clone)]
pub struct SpoolPrinter {
    dir: PathBuf,
}

impl SpoolPrinter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        SpoolPrinter { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File a receipt is spooled to. The invoice reference is reduced to
    /// characters that are safe in a file name.
    pub fn path_for(&self, invoice: &Invoice) -> PathBuf {
        let name: String = invoice
            .reference()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let stamp = invoice.submitted_at.format("%Y%m%d%H%M%S");
        self.dir.join(format!("{}-{}.txt", stamp, name))
    }
}

#[async_trait]
impl InvoicePrinter for SpoolPrinter {
    async fn print(&self, invoice: &Invoice, text: &str) -> Result<(), PosError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            PosError::print_failed(format!("cannot create {}: {}", self.dir.display(), e))
        })?;

        let path = self.path_for(invoice);
        tokio::fs::write(&path, text)
            .await
            .map_err(|e| PosError::print_failed(format!("cannot write {}: {}", path.display(), e)))?;

        info!(?path, invoice = %invoice.reference(), "Receipt spooled");
        Ok(())
    }
}
