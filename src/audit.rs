use crate::booking::BookingRequest;
use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only plain-text record of successful bookings, one line each.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AuditLog { path: path.into() }
    }

    /// Returns the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `line` followed by a newline, creating the file if needed.
    ///
    /// The file is opened in append mode for each call and never read.
    pub fn append(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        writeln!(file, "{line}")
            .and_then(|()| file.sync_data())
            .map_err(|e| Error::io(&self.path, e))
    }
}

/// Render the audit line for one booking.
///
/// ```text
/// [04/01/2025, 09:15:02 AM] Mona (mona@example.com, 0100) - Electronics/Cable | Governorate: Giza, Position: Member, Committee: Media, Notes: None | Stock: 3 → 2
/// ```
pub fn format_line(timestamp: &str, request: &BookingRequest, previous: u32, new: u32) -> String {
    format!(
        "[{timestamp}] {} ({}, {}) - {}/{} | Governorate: {}, Position: {}, Committee: {}, Notes: {} | Stock: {previous} → {new}",
        request.name,
        request.email,
        request.phone,
        request.category,
        request.item,
        request.governorate,
        request.position,
        request.committee,
        request.notes.as_deref().unwrap_or("None"),
    )
}
