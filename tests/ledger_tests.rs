use calamine::{Data, Reader, Xlsx, open_workbook};
use std::fs;
use std::io::Read;
use stockbook::{COLUMNS, Error, Ledger, LedgerRow, SHEET_NAME};
use tempfile::tempdir;

fn row(name: &str, notes: Option<&str>) -> LedgerRow {
    LedgerRow {
        timestamp: "04/01/2025, 09:15:02 AM".to_string(),
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        phone: "01001234567".to_string(),
        governorate: "Giza".to_string(),
        position: "Member".to_string(),
        committee: "Media".to_string(),
        category: "Electronics".to_string(),
        item: "Cable".to_string(),
        notes: notes.map(str::to_string),
    }
}

#[test]
fn test_initialize_creates_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("submissions.xlsx");
    let ledger = Ledger::new(&path);

    assert!(ledger.ensure_initialized().unwrap());
    assert!(path.exists());
    assert!(ledger.rows().unwrap().is_empty());

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(workbook.sheet_names(), vec![SHEET_NAME.to_string()]);
    let range = workbook.worksheet_range(SHEET_NAME).unwrap();
    let header: Vec<String> = range
        .rows()
        .next()
        .unwrap()
        .iter()
        .map(|c| c.to_string())
        .collect();
    let expected: Vec<String> = COLUMNS.iter().map(|(t, _)| t.to_string()).collect();
    assert_eq!(header, expected);
}

#[test]
fn test_initialize_is_idempotent() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("submissions.xlsx");
    let ledger = Ledger::new(&path);

    ledger.ensure_initialized().unwrap();
    ledger.append_row(&row("Mona", None)).unwrap();
    let before = fs::read(&path).unwrap();

    assert!(!ledger.ensure_initialized().unwrap());
    assert_eq!(fs::read(&path).unwrap(), before);
    assert_eq!(ledger.rows().unwrap().len(), 1);
}

#[test]
fn test_append_preserves_order() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::new(dir.path().join("submissions.xlsx"));
    ledger.ensure_initialized().unwrap();

    let rows = vec![
        row("Mona", Some("window seat")),
        row("Omar", None),
        row("Salma", Some("late arrival")),
    ];
    for r in &rows {
        ledger.append_row(r).unwrap();
    }

    assert_eq!(ledger.rows().unwrap(), rows);
    assert!(!dir.path().join("submissions.xlsx.tmp").exists());
}

#[test]
fn test_append_without_ledger_fails() {
    let dir = tempdir().unwrap();
    let ledger = Ledger::new(dir.path().join("submissions.xlsx"));

    let err = ledger.append_row(&row("Mona", None)).unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");
    assert!(!ledger.path().exists());
}

#[test]
fn test_missing_worksheet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("submissions.xlsx");

    let mut workbook = rust_xlsxwriter::Workbook::new();
    workbook.add_worksheet().set_name("Other").unwrap();
    workbook.save(&path).unwrap();

    let err = Ledger::new(&path).rows().unwrap_err();
    assert!(matches!(err, Error::MissingWorksheet { .. }), "unexpected error: {err}");
}

#[test]
fn test_not_a_workbook() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("submissions.xlsx");
    fs::write(&path, "this is not a zip archive").unwrap();

    let ledger = Ledger::new(&path);
    // Existing file is left alone by initialization
    assert!(!ledger.ensure_initialized().unwrap());
    let err = ledger.rows().unwrap_err();
    assert!(matches!(err, Error::LedgerRead { .. }), "unexpected error: {err}");
}

#[test]
fn test_append_keeps_other_worksheets_and_cells() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("submissions.xlsx");

    // A ledger an operator has worked on: an extra column on the
    // registrations sheet and a summary sheet after it.
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let registrations = workbook.add_worksheet().set_name(SHEET_NAME).unwrap();
    for (col, (title, _)) in (0u16..).zip(COLUMNS) {
        registrations.write_string(0, col, title).unwrap();
    }
    let existing = row("Omar", Some("aisle"));
    let cells: [&str; 10] = [
        &existing.timestamp,
        &existing.name,
        &existing.email,
        &existing.phone,
        &existing.governorate,
        &existing.position,
        &existing.committee,
        &existing.category,
        &existing.item,
        "aisle",
    ];
    for (col, value) in (0u16..).zip(cells) {
        registrations.write_string(1, col, value).unwrap();
    }
    registrations.write_string(0, 10, "Paid").unwrap();
    registrations.write_number(1, 10, 150.0).unwrap();
    let summary = workbook.add_worksheet().set_name("Summary").unwrap();
    summary.write_string(0, 0, "Total").unwrap();
    summary.write_number(0, 1, 1.0).unwrap();
    summary.write_boolean(2, 3, true).unwrap();
    workbook.save(&path).unwrap();

    let ledger = Ledger::new(&path);
    let added = row("Mona", None);
    ledger.append_row(&added).unwrap();

    assert_eq!(ledger.rows().unwrap(), vec![existing, added]);

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec![SHEET_NAME.to_string(), "Summary".to_string()]
    );

    let registrations = workbook.worksheet_range(SHEET_NAME).unwrap();
    assert_eq!(registrations.get_value((0, 10)), Some(&Data::String("Paid".to_string())));
    assert_eq!(registrations.get_value((1, 10)), Some(&Data::Float(150.0)));
    assert_eq!(registrations.height(), 3);

    let summary = workbook.worksheet_range("Summary").unwrap();
    assert_eq!(summary.get_value((0, 0)), Some(&Data::String("Total".to_string())));
    assert_eq!(summary.get_value((0, 1)), Some(&Data::Float(1.0)));
    assert_eq!(summary.get_value((2, 3)), Some(&Data::Bool(true)));
}

fn archive_entry(path: &std::path::Path, name: &str) -> String {
    let mut archive = zip::ZipArchive::new(fs::File::open(path).unwrap()).unwrap();
    let mut contents = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    contents
}

#[test]
fn test_header_styling_and_widths() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("submissions.xlsx");
    let ledger = Ledger::new(&path);
    ledger.ensure_initialized().unwrap();
    // Styling is re-applied on every rewrite
    ledger.append_row(&row("Mona", None)).unwrap();

    let sheet = archive_entry(&path, "xl/worksheets/sheet1.xml");
    let widths: Vec<f64> = sheet
        .split("<col ")
        .skip(1)
        .map(|col| {
            let start = col.find("width=\"").unwrap() + "width=\"".len();
            let len = col[start..].find('"').unwrap();
            col[start..start + len].parse().unwrap()
        })
        .collect();
    let expected: Vec<f64> = COLUMNS.iter().map(|(_, w)| *w).collect();
    assert_eq!(widths.len(), expected.len());
    for (actual, wanted) in widths.iter().zip(&expected) {
        assert_eq!(actual.floor(), *wanted, "column width {actual}");
    }

    let header_row = sheet.split("<row ").nth(1).unwrap();
    assert!(header_row.contains(r#"ht="25""#), "{header_row}");
    assert!(header_row.contains(r#"customHeight="1""#), "{header_row}");

    let styles = archive_entry(&path, "xl/styles.xml");
    assert!(styles.contains("<b/>"));
    assert!(styles.contains(r#"<sz val="12"/>"#));
    assert!(styles.contains("FF6366F1"));
    assert!(styles.contains(r#"patternType="solid""#));
    assert!(styles.contains(r#"horizontal="center""#));
    assert!(styles.contains(r#"vertical="center""#));
    assert!(styles.contains(r#"style="thin""#));
}
