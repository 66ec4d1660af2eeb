//! Fatal scan errors. Markup problems are never errors; see `diagnostics`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    /// The underlying byte or character source failed.
    #[error("failed to read input source: {0}")]
    Io(#[from] std::io::Error),
}
