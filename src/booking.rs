//! The booking flow: validate, take stock, persist, record.

use crate::audit::{self, AuditLog};
use crate::catalog::Catalog;
use crate::error::Error;
use crate::ledger::{Ledger, LedgerRow, MAX_CELL_CHARS};
use crate::store::InventoryStore;
use chrono::{DateTime, Local};
use fs2::FileExt;
use serde::Deserialize;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Default inventory document name inside the data directory.
pub const ITEMS_FILE: &str = "items.json";
/// Default ledger workbook name inside the data directory.
pub const LEDGER_FILE: &str = "submissions.xlsx";
/// Default audit log name inside the data directory.
pub const LOG_FILE: &str = "log.txt";
/// Lock file guarding the data directory against a second writer process.
pub const LOCK_FILE: &str = "stockbook.lock";

/// `MM/DD/YYYY, hh:mm:ss AM` in local time.
const TIMESTAMP_FORMAT: &str = "%m/%d/%Y, %I:%M:%S %p";

/// A booking submission as received on the wire.
///
/// Every field is optional here so that an incomplete submission is reported
/// as a missing-field rejection instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub governorate: Option<String>,
    pub position: Option<String>,
    pub committee: Option<String>,
    pub category: Option<String>,
    pub item: Option<String>,
    pub notes: Option<String>,
}

/// A submission with every required field present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub governorate: String,
    pub position: String,
    pub committee: String,
    pub category: String,
    pub item: String,
    pub notes: Option<String>,
}

impl BookingForm {
    /// Check that all required fields are present and non-empty, and that
    /// every field fits in a ledger cell.
    ///
    /// An empty `notes` value is treated the same as no notes.
    pub fn validate(self) -> Result<BookingRequest, BookingError> {
        fn required(field: Option<String>) -> Result<String, BookingError> {
            field
                .filter(|v| !v.is_empty())
                .ok_or(BookingError::MissingFields)
        }

        let request = BookingRequest {
            name: required(self.name)?,
            email: required(self.email)?,
            phone: required(self.phone)?,
            governorate: required(self.governorate)?,
            position: required(self.position)?,
            committee: required(self.committee)?,
            category: required(self.category)?,
            item: required(self.item)?,
            notes: self.notes.filter(|n| !n.is_empty()),
        };

        let fields = [
            &request.name,
            &request.email,
            &request.phone,
            &request.governorate,
            &request.position,
            &request.committee,
            &request.category,
            &request.item,
        ];
        let too_long = |v: &str| v.chars().count() > MAX_CELL_CHARS;
        if fields.iter().any(|v| too_long(v)) || request.notes.as_deref().is_some_and(too_long) {
            return Err(BookingError::FieldTooLong);
        }
        Ok(request)
    }
}

/// Why a booking did not go through.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Item not found")]
    ItemNotFound,

    #[error("Item out of stock")]
    OutOfStock,

    #[error("Field exceeds {MAX_CELL_CHARS} characters")]
    FieldTooLong,

    #[error(transparent)]
    Store(#[from] Error),
}

impl BookingError {
    /// True for rejections caused by the submission itself. Nothing has been
    /// persisted when one of these is returned.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, BookingError::Store(_))
    }
}

/// Whether [`BookingService`] takes an exclusive lock on its data directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockMode {
    /// Exclusive advisory lock (`flock`) on the lock file. A second service
    /// over the same directory fails to open.
    #[default]
    Flock,
    /// No cross-process lock. Bookings are still serialized within the process.
    None,
}

/// Builder for [`BookingService`].
///
/// # Examples
///
/// ```no_run
/// use stockbook::{BookingService, LockMode};
///
/// let service = BookingService::builder("./data")
///     .ledger_file("registrations.xlsx")
///     .lock_mode(LockMode::None)
///     .open()?;
/// let catalog = service.list_items();
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct BookingServiceBuilder {
    dir: PathBuf,
    items_file: PathBuf,
    ledger_file: PathBuf,
    log_file: PathBuf,
    lock_mode: LockMode,
}

impl BookingServiceBuilder {
    fn new(dir: impl AsRef<Path>) -> Self {
        BookingServiceBuilder {
            dir: dir.as_ref().to_path_buf(),
            items_file: PathBuf::from(ITEMS_FILE),
            ledger_file: PathBuf::from(LEDGER_FILE),
            log_file: PathBuf::from(LOG_FILE),
            lock_mode: LockMode::default(),
        }
    }

    /// Inventory document, relative to the data directory unless absolute.
    pub fn items_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.items_file = path.into();
        self
    }

    /// Ledger workbook, relative to the data directory unless absolute.
    pub fn ledger_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_file = path.into();
        self
    }

    /// Audit log, relative to the data directory unless absolute.
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = path.into();
        self
    }

    pub fn lock_mode(mut self, mode: LockMode) -> Self {
        self.lock_mode = mode;
        self
    }

    /// Create the data directory, take the lock, and make sure the ledger
    /// exists. No booking can be accepted before this returns.
    pub fn open(self) -> io::Result<BookingService> {
        fs::create_dir_all(&self.dir)?;

        let lock = match self.lock_mode {
            LockMode::Flock => Some(acquire_lock(&self.dir.join(LOCK_FILE))?),
            LockMode::None => None,
        };

        let ledger = Ledger::new(self.dir.join(&self.ledger_file));
        let created = ledger.ensure_initialized().map_err(io::Error::other)?;
        if created {
            log::info!("stockbook: created ledger {}", ledger.path().display());
        } else {
            log::info!("stockbook: ledger {} already exists", ledger.path().display());
        }

        Ok(BookingService {
            dir: self.dir.clone(),
            store: InventoryStore::new(self.dir.join(&self.items_file)),
            ledger,
            audit: AuditLog::new(self.dir.join(&self.log_file)),
            guard: Mutex::new(()),
            _lock: lock,
        })
    }
}

fn acquire_lock(path: &Path) -> io::Result<File> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.try_lock_exclusive().map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("another writer holds the lock on {}", path.display()),
        )
    })?;
    Ok(file)
}

/// Accepts bookings against the inventory and records them.
///
/// Owns the three persisted artifacts. Every booking runs its
/// load-check-decrement-save-record sequence inside one mutex section, so
/// concurrent bookings of the same item cannot both pass the stock check.
#[derive(Debug)]
pub struct BookingService {
    dir: PathBuf,
    store: InventoryStore,
    ledger: Ledger,
    audit: AuditLog,
    guard: Mutex<()>,
    // Held for the lifetime of the service; the flock is released on drop.
    _lock: Option<File>,
}

impl BookingService {
    /// Create a builder for a service rooted at `dir`.
    pub fn builder(dir: impl AsRef<Path>) -> BookingServiceBuilder {
        BookingServiceBuilder::new(dir)
    }

    /// Open a service in `dir` with default file names and locking.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        Self::builder(dir).open()
    }

    /// Returns the data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn audit_log(&self) -> &AuditLog {
        &self.audit
    }

    /// The persisted catalog, or an empty one if it cannot be read.
    pub fn list_items(&self) -> Catalog {
        self.store.load_or_empty()
    }

    /// Book one unit of the requested item, stamped with the current local time.
    pub fn submit(&self, form: BookingForm) -> Result<Catalog, BookingError> {
        self.submit_at(form, Local::now())
    }

    /// Book one unit of the requested item.
    ///
    /// On success the returned catalog is the one just persisted. Client
    /// rejections leave every artifact untouched. A failure saving the
    /// catalog aborts before the ledger is written; a failure appending the
    /// ledger row leaves the decrement in place; a failure writing the audit
    /// line is logged and does not fail the booking.
    pub fn submit_at(
        &self,
        form: BookingForm,
        now: DateTime<Local>,
    ) -> Result<Catalog, BookingError> {
        let request = form.validate()?;

        let _guard = self.guard.lock().unwrap_or_else(PoisonError::into_inner);

        let mut catalog = self.store.load()?;
        let item = catalog
            .category_mut(&request.category)
            .ok_or(BookingError::CategoryNotFound)?
            .item_mut(&request.item)
            .ok_or(BookingError::ItemNotFound)?;

        let previous = item.take_one().ok_or(BookingError::OutOfStock)?;
        let new = item.count;

        self.store.save(&catalog)?;

        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        self.ledger.append_row(&LedgerRow::new(&timestamp, &request))?;

        let line = audit::format_line(&timestamp, &request, previous, new);
        if let Err(e) = self.audit.append(&line) {
            log::error!("stockbook: booking recorded but audit line not written: {e}");
        }

        log::info!(
            "stockbook: {} booked {}/{} ({previous} → {new})",
            request.email,
            request.category,
            request.item
        );
        Ok(catalog)
    }
}
