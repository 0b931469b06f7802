mod audit;
mod booking;
mod catalog;
mod config;
mod error;
mod ledger;
pub mod server;
mod store;

pub use audit::{AuditLog, format_line};
pub use booking::{
    BookingError, BookingForm, BookingRequest, BookingService, BookingServiceBuilder, ITEMS_FILE,
    LEDGER_FILE, LOCK_FILE, LOG_FILE, LockMode,
};
pub use catalog::{Catalog, Category, Item};
pub use config::{Config, DEFAULT_PORT};
pub use error::{Error, Result};
pub use ledger::{COLUMNS, Ledger, LedgerRow, MAX_CELL_CHARS, SHEET_NAME};
pub use store::InventoryStore;
