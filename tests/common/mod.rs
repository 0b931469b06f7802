#![allow(dead_code)]

use chrono::{DateTime, Local, TimeZone};
use std::fs;
use std::path::Path;
use stockbook::{BookingForm, BookingService, Catalog, Category, InventoryStore, Item};

/// Electronics: Cable (1), Adapter (0). Stationery: Pen (5).
pub fn sample_catalog() -> Catalog {
    Catalog::new(vec![
        Category::new(
            "Electronics",
            vec![Item::new("Cable", 1), Item::new("Adapter", 0)],
        ),
        Category::new("Stationery", vec![Item::new("Pen", 5)]),
    ])
}

pub fn seed(dir: &Path, catalog: &Catalog) {
    InventoryStore::new(dir.join(stockbook::ITEMS_FILE))
        .save(catalog)
        .unwrap();
}

/// Seed `dir` with the sample catalog and open a service over it.
pub fn open_seeded(dir: &Path) -> BookingService {
    seed(dir, &sample_catalog());
    BookingService::open(dir).unwrap()
}

pub fn form(category: &str, item: &str) -> BookingForm {
    BookingForm {
        name: Some("Mona Adel".to_string()),
        email: Some("mona@example.com".to_string()),
        phone: Some("01001234567".to_string()),
        governorate: Some("Giza".to_string()),
        position: Some("Member".to_string()),
        committee: Some("Media".to_string()),
        category: Some(category.to_string()),
        item: Some(item.to_string()),
        notes: None,
    }
}

/// 04/01/2025, 09:15:02 AM local time.
pub fn fixed_time() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 4, 1, 9, 15, 2).unwrap()
}

pub fn log_lines(service: &BookingService) -> Vec<String> {
    match fs::read_to_string(service.audit_log().path()) {
        Ok(contents) => contents.lines().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

/// Raw bytes of the three artifacts, for byte-identity checks.
pub fn snapshot_files(service: &BookingService) -> [Option<Vec<u8>>; 3] {
    [
        fs::read(service.store().path()).ok(),
        fs::read(service.ledger().path()).ok(),
        fs::read(service.audit_log().path()).ok(),
    ]
}
