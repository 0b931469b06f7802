//! The registration ledger: an `.xlsx` workbook with one row per booking.

use crate::booking::BookingRequest;
use crate::error::{Error, Result};
use calamine::{Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook, Worksheet, XlsxError,
};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

/// Name of the worksheet holding the registrations.
pub const SHEET_NAME: &str = "Registrations";

/// Header titles and column widths, in column order.
pub const COLUMNS: [(&str, f64); 10] = [
    ("Timestamp", 22.0),
    ("Full Name", 25.0),
    ("Email", 32.0),
    ("Phone", 18.0),
    ("Governorate", 20.0),
    ("Position in Team", 22.0),
    ("Committee", 25.0),
    ("Category", 20.0),
    ("Item Booked", 25.0),
    ("Notes", 40.0),
];

/// Longest string an xlsx cell can hold, in characters.
pub const MAX_CELL_CHARS: usize = 32_767;

const HEADER_HEIGHT: f64 = 25.0;
const HEADER_FILL: u32 = 0x6366F1;

/// One booking as recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub timestamp: String,
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

impl LedgerRow {
    pub fn new(timestamp: impl Into<String>, request: &BookingRequest) -> Self {
        LedgerRow {
            timestamp: timestamp.into(),
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            governorate: request.governorate.clone(),
            position: request.position.clone(),
            committee: request.committee.clone(),
            category: request.category.clone(),
            item: request.item.clone(),
            notes: request.notes.clone(),
        }
    }

    fn cells(&self) -> [&str; 10] {
        [
            &self.timestamp,
            &self.name,
            &self.email,
            &self.phone,
            &self.governorate,
            &self.position,
            &self.committee,
            &self.category,
            &self.item,
            self.notes.as_deref().unwrap_or(""),
        ]
    }

    fn from_cells(cells: &[Data]) -> Self {
        let cell = |i: usize| cells.get(i).map(|d| d.to_string()).unwrap_or_default();
        let notes = cell(9);
        LedgerRow {
            timestamp: cell(0),
            name: cell(1),
            email: cell(2),
            phone: cell(3),
            governorate: cell(4),
            position: cell(5),
            committee: cell(6),
            category: cell(7),
            item: cell(8),
            notes: (!notes.is_empty()).then_some(notes),
        }
    }
}

/// Handle on the ledger workbook.
///
/// The workbook is never edited in place: every append reads all worksheets
/// and writes a fresh workbook over the old one, so the cost of an append
/// grows with the number of bookings. Cell values on every worksheet are
/// carried across the rewrite; cell formatting other than the header row,
/// formulas (their cached values are kept) and other worksheets' layout are
/// not.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Ledger { path: path.into() }
    }

    /// Returns the path to the ledger workbook.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the workbook with its styled header row if it does not exist.
    ///
    /// Returns `true` if a new file was written, `false` if one was already
    /// present (its contents are not inspected).
    pub fn ensure_initialized(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }
        self.write(&[(SHEET_NAME.to_string(), Range::empty())], None)?;
        Ok(true)
    }

    /// Read every booking row, header excluded, in submission order.
    pub fn rows(&self) -> Result<Vec<LedgerRow>> {
        let sheets = self.read_sheets()?;
        let range = self.registrations(&sheets)?;
        Ok(range.rows().skip(1).map(LedgerRow::from_cells).collect())
    }

    /// Append one row and persist the whole workbook.
    ///
    /// The ledger must already exist; see [`ensure_initialized`](Ledger::ensure_initialized).
    pub fn append_row(&self, row: &LedgerRow) -> Result<()> {
        let sheets = self.read_sheets()?;
        self.registrations(&sheets)?;
        self.write(&sheets, Some(row))
    }

    /// Every worksheet in workbook order, with its cell values.
    fn read_sheets(&self) -> Result<Vec<(String, Range<Data>)>> {
        let read_err = |source| Error::LedgerRead {
            path: self.path.clone(),
            source,
        };

        let file = File::open(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let mut workbook = Xlsx::new(BufReader::new(file)).map_err(read_err)?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook.worksheet_range(&name).map_err(read_err)?;
            sheets.push((name, range));
        }
        Ok(sheets)
    }

    fn registrations<'a>(&self, sheets: &'a [(String, Range<Data>)]) -> Result<&'a Range<Data>> {
        sheets
            .iter()
            .find(|(name, _)| name == SHEET_NAME)
            .map(|(_, range)| range)
            .ok_or_else(|| Error::MissingWorksheet {
                path: self.path.clone(),
                sheet: SHEET_NAME,
            })
    }

    /// Rebuild the workbook from `sheets`, adding `new_row` under the last
    /// registration, and swap the result into place via a `.tmp` file and a
    /// rename.
    fn write(&self, sheets: &[(String, Range<Data>)], new_row: Option<&LedgerRow>) -> Result<()> {
        let bytes = build_workbook(sheets, new_row).map_err(|source| Error::LedgerWrite {
            path: self.path.clone(),
            source,
        })?;

        let tmp_path = self.path.with_extension("xlsx.tmp");
        let mut file = File::create(&tmp_path).map_err(|e| Error::io(&tmp_path, e))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_data())
            .map_err(|e| Error::io(&tmp_path, e))?;
        drop(file);

        fs::rename(&tmp_path, &self.path).map_err(|e| Error::io(&self.path, e))
    }
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_size(12)
        .set_font_color(Color::White)
        .set_pattern(FormatPattern::Solid)
        .set_background_color(Color::RGB(HEADER_FILL))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
}

fn build_workbook(
    sheets: &[(String, Range<Data>)],
    new_row: Option<&LedgerRow>,
) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    for (name, range) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;
        if name == SHEET_NAME {
            fill_registrations(worksheet, range, new_row)?;
        } else {
            copy_cells(worksheet, range, |_, _| true)?;
        }
    }
    workbook.save_to_buffer()
}

fn fill_registrations(
    worksheet: &mut Worksheet,
    range: &Range<Data>,
    new_row: Option<&LedgerRow>,
) -> std::result::Result<(), XlsxError> {
    let header = header_format();
    for (col, (title, width)) in (0u16..).zip(COLUMNS) {
        worksheet.set_column_width(col, width)?;
        worksheet.write_string_with_format(0, col, title, &header)?;
    }
    worksheet.set_row_height(0, HEADER_HEIGHT)?;

    // The fixed header is rewritten above; anything an operator added to the
    // right of it is kept.
    let fixed = COLUMNS.len() as u16;
    copy_cells(worksheet, range, |row, col| row > 0 || col >= fixed)?;

    if let Some(entry) = new_row {
        let row = range.end().map_or(1, |(last, _)| last + 1).max(1);
        for (col, value) in (0u16..).zip(entry.cells()) {
            // Empty cells are left blank so they read back as empty.
            if !value.is_empty() {
                worksheet.write_string(row, col, value)?;
            }
        }
    }
    Ok(())
}

/// Write every non-empty cell of `range` accepted by `keep`, keeping numbers,
/// booleans and dates as numbers.
fn copy_cells(
    worksheet: &mut Worksheet,
    range: &Range<Data>,
    keep: impl Fn(u32, u16) -> bool,
) -> std::result::Result<(), XlsxError> {
    let (top, left) = range.start().unwrap_or((0, 0));
    for (r, c, cell) in range.used_cells() {
        let row = top + r as u32;
        let col = (left + c as u32) as u16;
        if !keep(row, col) {
            continue;
        }
        match cell {
            Data::Empty => continue,
            Data::Int(v) => worksheet.write_number(row, col, *v as f64)?,
            Data::Float(v) => worksheet.write_number(row, col, *v)?,
            Data::Bool(v) => worksheet.write_boolean(row, col, *v)?,
            Data::DateTime(v) => worksheet.write_number(row, col, v.as_f64())?,
            other => worksheet.write_string(row, col, other.to_string())?,
        };
    }
    Ok(())
}
