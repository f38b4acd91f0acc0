//! Spreadsheet export of the active month.
//!
//! Layout:
//! Type,Date,Category/Label,Note,Amount
//!
//! Expenses come first, then incomes, each in stored order. Fields are never
//! quoted, so commas inside free text are replaced with semicolons. The file
//! starts with a UTF-8 byte-order mark so spreadsheet apps pick the encoding.

use std::fs;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use finlight_core::{LedgerDocument, expenses_in_month, format_date_human, incomes_in_month};
use tracing::info;

use crate::error::{ExportError, Result};

pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
pub const HEADER: [&str; 5] = ["Type", "Date", "Category/Label", "Note", "Amount"];

const EXPENSE_TYPE: &str = "expense";
const INCOME_TYPE: &str = "income";

/// `finances_<month>.csv`
pub fn export_filename(month: &str) -> String {
    format!("finances_{month}.csv")
}

fn sanitize(field: &str) -> String {
    field.replace(',', ";")
}

/// CSV bytes (BOM included) for the document's active month.
pub fn export_month(doc: &LedgerDocument) -> Result<Vec<u8>> {
    let month = doc.active_month.as_str();
    let mut out = UTF8_BOM.to_vec();
    {
        let mut wtr = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .flexible(false)
            .from_writer(&mut out);

        wtr.write_record(HEADER)?;
        for e in expenses_in_month(doc, month) {
            let note = e.note.as_deref().map(sanitize).unwrap_or_default();
            wtr.write_record([
                EXPENSE_TYPE.to_string(),
                e.date.map(format_date_human).unwrap_or_default(),
                sanitize(&e.category),
                note,
                e.amount.to_string(),
            ])?;
        }
        for i in incomes_in_month(doc, month) {
            wtr.write_record([
                INCOME_TYPE.to_string(),
                i.date.map(format_date_human).unwrap_or_default(),
                sanitize(&i.label),
                String::new(),
                i.amount.to_string(),
            ])?;
        }
        wtr.flush()?;
    }

    // rows are newline-separated, not newline-terminated
    if out.last() == Some(&b'\n') {
        out.pop();
    }
    Ok(out)
}

/// Write the active month's export into `dir`, returning the file path.
pub fn write_month_csv(dir: impl AsRef<Path>, doc: &LedgerDocument) -> Result<PathBuf> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(ExportError::MissingDir(dir.to_path_buf()));
    }
    let bytes = export_month(doc)?;
    let path = dir.join(export_filename(&doc.active_month));
    fs::write(&path, &bytes).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), bytes = bytes.len(), "exported month");
    Ok(path)
}
