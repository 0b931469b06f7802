use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A failure reading or writing one of the persisted artifacts.
///
/// Every variant carries the path of the file involved so that an operator
/// reading the log can tell the inventory document, the ledger and the audit
/// log apart.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed inventory document {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read ledger {}: {source}", path.display())]
    LedgerRead {
        path: PathBuf,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("failed to write ledger {}: {source}", path.display())]
    LedgerWrite {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("ledger {} has no '{sheet}' worksheet", path.display())]
    MissingWorksheet { path: PathBuf, sheet: &'static str },
}

impl Error {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Returns true when the underlying cause is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
