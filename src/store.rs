//! JSON-file persistence for the [`Catalog`].

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Loads and saves the catalog from a single JSON document.
///
/// Nothing is cached: every [`load`](InventoryStore::load) reads the file
/// again, and every [`save`](InventoryStore::save) rewrites it in full.
#[derive(Debug, Clone)]
pub struct InventoryStore {
    path: PathBuf,
}

impl InventoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        InventoryStore { path: path.into() }
    }

    /// Returns the path to the inventory document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the inventory document.
    ///
    /// A missing document is an empty catalog. Any other read failure, or a
    /// document that does not parse, is returned to the caller.
    pub fn load(&self) -> Result<Catalog> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Catalog::default()),
            Err(e) => return Err(Error::io(&self.path, e)),
        };

        serde_json::from_str(&contents).map_err(|source| Error::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Like [`load`](InventoryStore::load), but any failure is logged and
    /// yields an empty catalog.
    pub fn load_or_empty(&self) -> Catalog {
        self.load().unwrap_or_else(|e| {
            log::warn!("stockbook: serving empty catalog: {e}");
            Catalog::default()
        })
    }

    /// Save the catalog atomically.
    ///
    /// Writes to a `.tmp` file first, syncs, then renames over the document.
    /// Readers see either the old catalog or the new one, never a partial file.
    pub fn save(&self, catalog: &Catalog) -> Result<()> {
        let tmp_path = self.path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(catalog).map_err(|source| Error::Json {
            path: self.path.clone(),
            source,
        })?;

        let mut file = fs::File::create(&tmp_path).map_err(|e| Error::io(&tmp_path, e))?;
        file.write_all(json.as_bytes())
            .and_then(|()| file.sync_data())
            .map_err(|e| Error::io(&tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|e| Error::io(&self.path, e))?;
        Ok(())
    }
}
