//! The export pipeline: validate, query, render, persist, audit

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bson::{doc, Document};
use chrono::Local;
use tracing::{debug, error, info, warn};
use xlreport_core::{DocumentStore, ExportError, Params, TemplateId};
use xlreport_render::{ExcelRenderer, SheetRenderer};

use crate::builder::ReportBuilder;

/// Timestamp embedded in export file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%6f";

/// A written report file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOutcome {
    pub template_id: TemplateId,
    pub path: PathBuf,
    pub file_name: String,
    pub record_count: usize,
}

/// Runs report builders against an injected store.
pub struct Exporter<'a> {
    store: &'a dyn DocumentStore,
    export_dir: PathBuf,
    renderer: ExcelRenderer,
}

impl<'a> Exporter<'a> {
    pub fn new(store: &'a dyn DocumentStore, export_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            export_dir: export_dir.into(),
            renderer: ExcelRenderer::new(),
        }
    }

    /// Use a custom renderer, e.g. with a frozen header row.
    pub fn renderer(mut self, renderer: ExcelRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Produce one report file.
    ///
    /// Validation happens before any I/O, so an invalid parameter leaves
    /// the store and the export directory untouched. An empty result set
    /// still yields a headered file.
    pub fn export(&self, report: &dyn ReportBuilder, params: &Params) -> Result<ExportOutcome, ExportError> {
        let definition = report.definition();
        let filters = report.validate(params)?;

        let query = report.query(&filters);
        debug!(
            template_id = %report.template_id(),
            collection = definition.collection,
            query = %query.to_document(),
            "Executing report query"
        );
        let records = self.store.find(definition.collection, &query)?;
        let records = report.shape(records, &filters);
        info!(
            template_id = %report.template_id(),
            collection = definition.collection,
            records = records.len(),
            "Fetched report records"
        );

        let layout = report.template().layout(&records, &report.summary(&filters));
        let bytes = self.renderer.render(&layout)?;

        let file_name = format!("{}_{}.xlsx", report.name(), Local::now().format(FILE_TIMESTAMP_FORMAT));
        let path = self.export_dir.join(&file_name);
        write_new_file(&self.export_dir, &path, &bytes)?;
        info!(path = %path.display(), records = records.len(), "Report written");

        if let Some(collection) = definition.audit {
            let record = audit_record(&file_name, &path, records.len(), report.audit_filters(&filters));
            match self.store.insert_one(collection, record) {
                Ok(()) => debug!(collection, "Export recorded"),
                Err(e) => error!(collection, error = %e, "Failed to insert download record"),
            }
        }

        Ok(ExportOutcome {
            template_id: report.template_id(),
            path,
            file_name,
            record_count: records.len(),
        })
    }
}

fn write_new_file(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    write_new_file_with(dir, path, |file| {
        file.write_all(bytes)?;
        file.sync_all()
    })
}

/// Create `path` and fill it with `write`. A partly written file is removed.
fn write_new_file_with(
    dir: &Path,
    path: &Path,
    write: impl FnOnce(&mut File) -> io::Result<()>,
) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(io_err)?;
    if let Err(source) = write(&mut file) {
        drop(file);
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Failed to remove partial export");
        }
        return Err(io_err(source));
    }
    Ok(())
}

fn audit_record(file_name: &str, path: &Path, count: usize, filters: Document) -> Document {
    let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    doc! {
        "File_Name": file_name,
        "File_Path": absolute.to_string_lossy().into_owned(),
        "Export_Timestamp": bson::DateTime::now(),
        "Exported_Record_Count": i64::try_from(count).unwrap_or(i64::MAX),
        "Applied_Filters": filters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn failed_write_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report_20240101_000000000000.xlsx");

        let err = write_new_file_with(dir.path(), &path, |file| {
            file.write_all(b"PK\x03\x04")?;
            Err(io::Error::new(io::ErrorKind::Other, "device full"))
        })
        .unwrap_err();

        assert!(matches!(&err, ExportError::Io { path: p, .. } if *p == path));
        assert!(err.to_string().contains("device full"));
        assert!(!path.exists());
    }

    #[test]
    fn existing_file_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("taken.xlsx");
        fs::write(&path, b"keep").unwrap();

        assert!(write_new_file(dir.path(), &path, b"new").is_err());
        assert_eq!(fs::read(&path).unwrap(), b"keep");
    }

    #[test]
    fn written_file_holds_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.xlsx");

        write_new_file(&dir.path().join("nested"), &path, b"PK").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"PK");
    }
}
