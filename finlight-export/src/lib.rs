//! finlight-export: CSV export of a month's incomes and expenses

pub mod csv_export;
pub mod error;

pub use csv_export::{HEADER, UTF8_BOM, export_filename, export_month, write_month_csv};
pub use error::{ExportError, Result};
