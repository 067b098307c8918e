//! XLSX emitter
//!
//! Replays a `SheetLayout` onto a single-sheet `rust_xlsxwriter` workbook:
//! cells first, then merged ranges, the auto-filter and column widths.

use rust_xlsxwriter::{Workbook, Worksheet};
use xlreport_core::RenderError;

use crate::layout::SheetLayout;
use crate::schema::CellValue;
use crate::styles::StyleCatalog;
use crate::SheetRenderer;

/// Writes layouts as `.xlsx` workbooks.
#[derive(Clone, Debug, Default)]
pub struct ExcelRenderer {
    /// Freeze everything above the first data row
    pub freeze_header: bool,
}

impl ExcelRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the header visible while scrolling
    pub fn freeze_header(mut self) -> Self {
        self.freeze_header = true;
        self
    }

    /// Render to an in-memory xlsx file.
    pub fn render_to_bytes(&self, layout: &SheetLayout) -> Result<Vec<u8>, RenderError> {
        let mut workbook = Workbook::new();
        let styles = StyleCatalog::new();

        let sheet = workbook.add_worksheet();
        sheet
            .set_name(&layout.sheet_name)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        self.write_sheet(sheet, layout, &styles)?;

        let buffer = workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))?;

        Ok(buffer)
    }

    fn write_sheet(
        &self,
        sheet: &mut Worksheet,
        layout: &SheetLayout,
        styles: &StyleCatalog,
    ) -> Result<(), RenderError> {
        // Merged ranges are written with the text of their anchor cell
        for range in &layout.merges {
            let anchor = layout
                .cell(range.first_row, range.first_col)
                .ok_or_else(|| RenderError::InvalidData(format!("merge {} has no anchor cell", range.to_a1())))?;
            sheet
                .merge_range(
                    range.first_row,
                    range.first_col,
                    range.last_row,
                    range.last_col,
                    &anchor.value.to_string(),
                    styles.get(anchor.style),
                )
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        for cell in &layout.cells {
            if layout.is_merged(cell.row, cell.col) {
                continue;
            }
            let format = styles.get(cell.style);
            let result = match &cell.value {
                CellValue::Text(s) => sheet.write_string_with_format(cell.row, cell.col, s, format),
                CellValue::Integer(n) => {
                    sheet.write_number_with_format(cell.row, cell.col, *n as f64, format)
                }
                CellValue::Number(n) => sheet.write_number_with_format(cell.row, cell.col, *n, format),
                CellValue::Empty => sheet.write_blank(cell.row, cell.col, format),
            };
            result.map_err(|e| RenderError::Format(e.to_string()))?;
        }

        let filter = layout.autofilter;
        sheet
            .autofilter(filter.first_row, filter.first_col, filter.last_row, filter.last_col)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        for (col, width) in layout.column_widths.iter().enumerate() {
            sheet
                .set_column_width(col as u16, *width)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        if self.freeze_header {
            sheet
                .set_freeze_panes(layout.header_row + 1, 0)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        Ok(())
    }
}

impl SheetRenderer for ExcelRenderer {
    type Output = Vec<u8>;

    fn render(&self, layout: &SheetLayout) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(layout)
    }
}
