//! Workbook persistence.
//!
//! The workbook file is the only datastore. [`load`] reads every sheet;
//! [`save`] merges a patch of sheets into the workbook currently on disk and
//! swaps the result into place through a temporary file in the same
//! directory, so the target path never holds a partially written workbook.

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook as XlsxWorkbook;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::Builder;
use thiserror::Error;

use crate::table::{CellValue, Sheet, Workbook};

pub const DEFAULT_PATH: &str = "data/members.xlsx";

#[derive(Debug, Error)]
pub enum StoreError {
    /// The workbook does not exist yet. Expected on first run.
    #[error("workbook not found at {}; place the file there or create it by adding a member", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read workbook {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error(
        "permission denied while saving {}; the file may be open in another program or locked. Close any program using it and try again ({source})",
        path.display()
    )]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to save workbook {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    fn write_io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            StoreError::PermissionDenied {
                path: path.to_path_buf(),
                source: err,
            }
        } else {
            StoreError::Write {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        }
    }

    fn write_other(path: &Path, reason: impl ToString) -> Self {
        StoreError::Write {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    fn read(path: &Path, reason: impl ToString) -> Self {
        StoreError::Read {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Read every sheet of the workbook at `path`.
///
/// The first row of each sheet is its header. Blank cells come back as
/// [`CellValue::Empty`], so an empty string written by [`save`] reloads as
/// `Empty`, and trailing rows with no values at all are not part of the used
/// range and are dropped.
///
/// # Arguments
/// * `path` - Path to the `.xlsx` workbook
///
/// # Returns
/// * `Result<Workbook, StoreError>` - Every sheet in file order, or an error
///
/// # Errors
/// * [`StoreError::NotFound`] - The file does not exist
/// * [`StoreError::Read`] - Anything else that prevents reading (corrupt
///   file, unsupported format, permissions)
pub fn load(path: impl AsRef<Path>) -> Result<Workbook, StoreError> {
    let path = path.as_ref();

    match fs::metadata(path) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(StoreError::read(path, e)),
    }

    let mut source = open_workbook_auto(path).map_err(|e| StoreError::read(path, e))?;

    let mut workbook = Workbook::new();
    for name in source.sheet_names() {
        let range = source
            .worksheet_range(&name)
            .map_err(|e| StoreError::read(path, format!("sheet '{}': {}", name, e)))?;

        let mut rows = range.rows();
        let sheet = match rows.next() {
            Some(header) => {
                let columns = header
                    .iter()
                    .enumerate()
                    .map(|(idx, cell)| match cell_value(cell).as_text() {
                        text if text.is_empty() => format!("Unnamed: {}", idx),
                        text => text,
                    })
                    .collect();
                let data = rows
                    .map(|row| row.iter().map(cell_value).collect())
                    .collect();
                Sheet::from_rows(columns, data)
            }
            None => Sheet::default(),
        };
        workbook.insert(name, sheet);
    }

    log::debug!(
        "loaded {} sheet(s) from {}",
        workbook.len(),
        path.display()
    );
    Ok(workbook)
}

/// Merge `patch` into the workbook on disk and atomically replace `path`.
///
/// The current file is re-read first (never a cached copy) so sheets absent
/// from `patch` are carried through. A missing file starts from an empty
/// workbook; an unreadable one aborts the save. Two concurrent saves are not
/// serialized: the last one to rename wins.
///
/// Values round-trip as spreadsheet content, not exactly: `Text("")` is
/// written as a blank cell and reloads as `Empty`, and trailing rows that are
/// entirely `Empty` do not come back from [`load`].
///
/// # Arguments
/// * `patch` - Sheets to write; each replaces the sheet of the same name
/// * `path` - Path to the `.xlsx` workbook, created along with its directory
///   if missing
///
/// # Returns
/// * `Result<(), StoreError>` - `Ok` once the new file has been renamed into place
///
/// # Errors
/// * [`StoreError::PermissionDenied`] - The file or its directory cannot be
///   opened, written or replaced, usually because another program has it open
/// * [`StoreError::Read`] - The existing file is corrupt; it is left as is
/// * [`StoreError::Write`] - Serialization or any other I/O failure
pub fn save(patch: Workbook, path: impl AsRef<Path>) -> Result<(), StoreError> {
    let path = path.as_ref();

    let mut merged = match fs::File::open(path) {
        Ok(_) => load(path)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Workbook::new(),
        Err(e) => return Err(StoreError::write_io(path, e)),
    };
    merged.merge(patch);

    let buffer = to_xlsx(&merged).map_err(|e| StoreError::write_other(path, e))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| StoreError::write_io(path, e))?;

    // Dropping `tmp` on any early return removes the temporary file.
    let mut tmp = Builder::new()
        .prefix(".members-")
        .suffix(".xlsx")
        .tempfile_in(&dir)
        .map_err(|e| StoreError::write_io(path, e))?;
    tmp.write_all(&buffer)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| StoreError::write_io(path, e))?;
    tmp.persist(path)
        .map_err(|e| StoreError::write_io(path, e.error))?;

    log::info!(
        "saved {} sheet(s) to {}",
        merged.len(),
        path.display()
    );
    Ok(())
}

/// Serialize a workbook to XLSX bytes, header row first.
pub fn to_xlsx(workbook: &Workbook) -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
    let mut out = XlsxWorkbook::new();

    for (name, sheet) in workbook.sheets() {
        let worksheet = out.add_worksheet();
        worksheet.set_name(name)?;

        for (c, column) in sheet.columns().iter().enumerate() {
            worksheet.write_string(0, col_num(c)?, column)?;
        }

        for (r, row) in sheet.rows().iter().enumerate() {
            let r = row_num(r + 1)?;
            for (c, value) in row.iter().enumerate() {
                let c = col_num(c)?;
                match value {
                    CellValue::Empty => {}
                    CellValue::Bool(b) => {
                        worksheet.write_boolean(r, c, *b)?;
                    }
                    CellValue::Int(i) => {
                        worksheet.write_number(r, c, *i as f64)?;
                    }
                    CellValue::Float(f) => {
                        worksheet.write_number(r, c, *f)?;
                    }
                    CellValue::Text(s) => {
                        worksheet.write_string(r, c, s)?;
                    }
                }
            }
        }
    }

    out.save_to_buffer()
}

fn row_num(idx: usize) -> Result<u32, rust_xlsxwriter::XlsxError> {
    u32::try_from(idx).map_err(|_| rust_xlsxwriter::XlsxError::RowColumnLimitError)
}

fn col_num(idx: usize) -> Result<u16, rust_xlsxwriter::XlsxError> {
    u16::try_from(idx).map_err(|_| rust_xlsxwriter::XlsxError::RowColumnLimitError)
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::number(dt.as_f64()),
        // Error cells, ISO dates and durations pass through as their text.
        other => CellValue::Text(other.to_string()),
    }
}
