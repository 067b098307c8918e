//! # xlreport-render
//!
//! Worksheet layout and XLSX output for xlreport.
//!
//! This crate provides:
//! - `WorksheetTemplate`: the shared title / filter summary / header / data layout
//! - `Column` and `ColumnKind`: declarative column schemas and value formatting
//! - `FilterSummary`: the ordered list of applied filters shown above the table
//! - `ExcelRenderer`: writes a `SheetLayout` as an `.xlsx` workbook
//!
//! ## Example
//!
//! ```rust
//! use xlreport_render::{Column, ExcelRenderer, FilterSummary, SheetRenderer, WorksheetTemplate};
//!
//! let template = WorksheetTemplate::new(
//!     "INCIDENT REPORT",
//!     vec![Column::identifier("Incident_Id"), Column::datetime("Created_Dtm")],
//! );
//! let layout = template.layout(&[], &FilterSummary::new().with("Status:", "Reject"));
//! assert_eq!(layout.header_text(), vec!["Incident Id", "Created Dtm"]);
//!
//! let bytes = ExcelRenderer::new().render(&layout).unwrap();
//! assert_eq!(&bytes[0..2], b"PK");
//! ```

use xlreport_core::RenderError;

pub mod excel;
pub mod layout;
pub mod schema;
pub mod styles;
pub mod summary;

pub use excel::ExcelRenderer;
pub use layout::{col_to_letter, Cell, CellRange, SheetLayout, WorksheetTemplate, MIN_COLUMN_WIDTH};
pub use schema::{format_amount, title_case, CellValue, Column, ColumnKind};
pub use styles::StyleRole;
pub use summary::FilterSummary;

/// Output backend for computed worksheets
pub trait SheetRenderer {
    type Output;

    /// Render a laid-out worksheet to the output format
    fn render(&self, layout: &SheetLayout) -> Result<Self::Output, RenderError>;
}
