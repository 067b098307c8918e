//! Worksheet template
//!
//! Turns a column schema, a record set and a filter summary into a
//! `SheetLayout`: every cell with its value and style role, the merged
//! ranges, the auto-filter range and the column widths. Layout is pure; the
//! xlsx writer only replays it.
//!
//! ```text
//! row 0        | TITLE (merged across all columns)             |
//! row 1        |                                               |
//! row 2..      |        | Status:     | Incident Open (merged)  |
//! (blank)      |                                               |
//! header_row   | Incident Id | Account Num | ... (auto-filter) |
//! data rows    | X1          |             | ...               |
//! ```
//!
//! The filter block and its surrounding blank rows are omitted when the
//! summary is empty.

use bson::Document;
use serde::Serialize;

use crate::schema::{CellValue, Column};
use crate::styles::StyleRole;
use crate::summary::FilterSummary;

/// Minimum column width in Excel character units.
pub const MIN_COLUMN_WIDTH: f64 = 20.0;

/// Excel caps sheet names at 31 characters.
const MAX_SHEET_NAME: usize = 31;

/// Column holding filter labels; values start one to the right.
const FILTER_LABEL_COL: u16 = 1;

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub row: u32,
    pub col: u16,
    pub value: CellValue,
    pub style: StyleRole,
}

/// Inclusive rectangular range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    pub const fn new(first_row: u32, first_col: u16, last_row: u32, last_col: u16) -> Self {
        Self {
            first_row,
            first_col,
            last_row,
            last_col,
        }
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row) && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }

    /// A1-style reference, e.g. `A5:H9`.
    pub fn to_a1(&self) -> String {
        format!(
            "{}{}:{}{}",
            col_to_letter(self.first_col),
            self.first_row + 1,
            col_to_letter(self.last_col),
            self.last_row + 1
        )
    }
}

/// Convert column index to Excel letter (0 = A, 25 = Z, 26 = AA).
pub fn col_to_letter(col: u16) -> String {
    let mut result = String::new();
    let mut n = u32::from(col);
    loop {
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    result
}

/// A fully computed worksheet.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetLayout {
    pub sheet_name: String,
    pub cells: Vec<Cell>,
    pub merges: Vec<CellRange>,
    pub header_row: u32,
    pub column_count: u16,
    pub record_count: usize,
    pub autofilter: CellRange,
    pub column_widths: Vec<f64>,
}

impl SheetLayout {
    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    /// Displayed text of one row across the schema's columns.
    pub fn row_text(&self, row: u32) -> Vec<String> {
        (0..self.column_count)
            .map(|col| self.cell(row, col).map(|c| c.value.to_string()).unwrap_or_default())
            .collect()
    }

    pub fn header_text(&self) -> Vec<String> {
        self.row_text(self.header_row)
    }

    pub fn data_rows(&self) -> Vec<Vec<String>> {
        (0..self.record_count as u32)
            .map(|i| self.row_text(self.header_row + 1 + i))
            .collect()
    }

    /// Filter block as `(label, value)` pairs.
    pub fn filter_rows(&self) -> Vec<(String, String)> {
        self.cells
            .iter()
            .filter(|c| c.style == StyleRole::FilterParam)
            .map(|label| {
                let value = self
                    .cell(label.row, label.col + 1)
                    .map(|c| c.value.to_string())
                    .unwrap_or_default();
                (label.value.to_string(), value)
            })
            .collect()
    }

    pub fn is_merged(&self, row: u32, col: u16) -> bool {
        self.merges.iter().any(|m| m.contains(row, col))
    }
}

// ============================================================================
// Template
// ============================================================================

/// Shared layout routine for every report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorksheetTemplate {
    pub title: String,
    pub sheet_name: String,
    pub columns: Vec<Column>,
}

impl WorksheetTemplate {
    pub fn new(title: impl Into<String>, columns: Vec<Column>) -> Self {
        let title = title.into();
        Self {
            sheet_name: sanitize_sheet_name(&title),
            title,
            columns,
        }
    }

    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = sanitize_sheet_name(&name.into());
        self
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(Column::header_text).collect()
    }

    /// Lay out one worksheet. Never fails; zero records yields a headered,
    /// filtered, empty table.
    pub fn layout(&self, records: &[Document], summary: &FilterSummary) -> SheetLayout {
        let column_count = self.columns.len().max(1) as u16;
        let last_col = column_count - 1;
        let mut cells = Vec::new();
        let mut merges = Vec::new();

        // Title
        cells.push(Cell {
            row: 0,
            col: 0,
            value: CellValue::text(self.title.clone()),
            style: StyleRole::MainHeader,
        });
        if last_col > 0 {
            merges.push(CellRange::new(0, 0, 0, last_col));
        }
        let mut row: u32 = 1;

        // Filter block
        if !summary.is_empty() {
            row += 1;
            let value_col = FILTER_LABEL_COL + 1;
            for (label, value) in summary.entries() {
                cells.push(Cell {
                    row,
                    col: FILTER_LABEL_COL,
                    value: CellValue::text(label.clone()),
                    style: StyleRole::FilterParam,
                });
                cells.push(Cell {
                    row,
                    col: value_col,
                    value: CellValue::text(value.clone()),
                    style: StyleRole::FilterValue,
                });
                if last_col > value_col {
                    merges.push(CellRange::new(row, value_col, row, last_col));
                }
                row += 1;
            }
            row += 1;
        }

        // Header
        let header_row = row;
        for (col, column) in self.columns.iter().enumerate() {
            cells.push(Cell {
                row: header_row,
                col: col as u16,
                value: CellValue::Text(column.header_text()),
                style: StyleRole::SubHeader,
            });
        }

        // Data
        for (i, record) in records.iter().enumerate() {
            let data_row = header_row + 1 + i as u32;
            for (col, column) in self.columns.iter().enumerate() {
                cells.push(Cell {
                    row: data_row,
                    col: col as u16,
                    value: column.value(record),
                    style: StyleRole::Border,
                });
            }
        }

        let autofilter = CellRange::new(header_row, 0, header_row + records.len() as u32, last_col);
        let column_widths = column_widths(&cells, &merges, column_count);

        SheetLayout {
            sheet_name: self.sheet_name.clone(),
            cells,
            merges,
            header_row,
            column_count,
            record_count: records.len(),
            autofilter,
            column_widths,
        }
    }
}

/// `(longest + 2) * 1.2`, floored at `MIN_COLUMN_WIDTH`. Merged cells are ignored.
fn column_widths(cells: &[Cell], merges: &[CellRange], column_count: u16) -> Vec<f64> {
    let used = cells.iter().map(|c| c.col + 1).max().unwrap_or(0).max(column_count);
    (0..used)
        .map(|col| {
            let longest = cells
                .iter()
                .filter(|c| c.col == col && !merges.iter().any(|m| m.contains(c.row, c.col)))
                .map(|c| c.value.width())
                .max()
                .unwrap_or(0);
            ((longest + 2) as f64 * 1.2).max(MIN_COLUMN_WIDTH)
        })
        .collect()
}

fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\') { ' ' } else { c })
        .collect();
    let trimmed: String = cleaned.trim().chars().take(MAX_SHEET_NAME).collect();
    let trimmed = trimmed.trim_matches('\'').trim().to_string();
    if trimmed.is_empty() {
        "Report".to_string()
    } else {
        trimmed
    }
}
