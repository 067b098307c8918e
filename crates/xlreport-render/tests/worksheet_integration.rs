//! Integration tests for worksheet layout and XLSX output

use bson::{doc, oid::ObjectId, Document};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use xlreport_render::{
    CellValue, Column, ExcelRenderer, FilterSummary, SheetRenderer, StyleRole, WorksheetTemplate,
    MIN_COLUMN_WIDTH,
};

fn at(y: i32, m: u32, d: u32, h: u32) -> bson::DateTime {
    bson::DateTime::from_chrono(Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap())
}

fn request_log_template() -> WorksheetTemplate {
    WorksheetTemplate::new(
        "REQUEST LOG REPORT",
        vec![
            Column::identifier("Case ID"),
            Column::new("Status"),
            Column::amount("Amount"),
            Column::span("Validity Period", "Validity Period Start", "Validity Period End"),
            Column::us_date("Requested date"),
        ],
    )
}

fn records() -> Vec<Document> {
    vec![
        doc! {
            "Case ID": ObjectId::parse_str("65a1b2c3d4e5f60718293a4b").unwrap(),
            "Status": "Open",
            "Amount": 125000.5,
            "Validity Period Start": at(2024, 1, 1, 0),
            "Validity Period End": at(2024, 12, 31, 0),
            "Requested date": at(2024, 2, 14, 9),
        },
        doc! { "Case ID": 1002, "Status": "Closed" },
    ]
}

#[test]
fn every_column_present_in_every_row() {
    let layout = request_log_template().layout(&records(), &FilterSummary::new());
    assert_eq!(
        layout.header_text(),
        vec!["Case Id", "Status", "Amount", "Validity Period", "Requested Date"]
    );
    assert_eq!(
        layout.data_rows(),
        vec![
            vec![
                "65a1b2c3d4e5f60718293a4b",
                "Open",
                "125,000.50",
                "01/01/2024 - 12/31/2024",
                "02/14/2024",
            ],
            vec!["1002", "Closed", "", "", ""],
        ]
    );
}

#[test]
fn header_cells_use_sub_header_role() {
    let layout = request_log_template().layout(&[], &FilterSummary::new());
    for col in 0..layout.column_count {
        assert_eq!(layout.cell(layout.header_row, col).unwrap().style, StyleRole::SubHeader);
    }
}

#[test]
fn autofilter_spans_header_and_data() {
    let layout = request_log_template().layout(&records(), &FilterSummary::new().with("Request Type:", "FMB"));
    let filter = layout.autofilter;
    assert_eq!(filter.first_row, layout.header_row);
    assert_eq!(filter.last_row, layout.header_row + 2);
    assert_eq!(filter.first_col, 0);
    assert_eq!(filter.last_col, 4);
}

#[test]
fn filter_labels_participate_in_width() {
    let label = "A very long filter label:";
    let layout = request_log_template().layout(&[], &FilterSummary::new().with(label, "x"));
    let expected = ((label.len() + 2) as f64 * 1.2).max(MIN_COLUMN_WIDTH);
    assert_eq!(layout.column_widths[1], expected);
}

#[test]
fn rendering_twice_gives_same_layout() {
    let summary = FilterSummary::new().with("Request Type:", "FMB");
    let first = request_log_template().layout(&records(), &summary);
    let second = request_log_template().layout(&records(), &summary);
    assert_eq!(first, second);
}

#[test]
fn numeric_cells_stay_numeric() {
    let t = WorksheetTemplate::new("T", vec![Column::new("case_count")]);
    let layout = t.layout(&[doc! { "case_count": 12 }], &FilterSummary::new());
    assert_eq!(layout.cell(layout.header_row + 1, 0).unwrap().value, CellValue::Integer(12));
}

#[test]
fn writes_xlsx_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("request_log.xlsx");
    let layout = request_log_template().layout(&records(), &FilterSummary::new());
    let bytes = ExcelRenderer::new().render(&layout).unwrap();
    std::fs::write(&path, &bytes).unwrap();
    let on_disk = std::fs::read(&path).unwrap();
    assert_eq!(&on_disk[0..2], b"PK");
    assert!(on_disk.len() > 1000);
}
