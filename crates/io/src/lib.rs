// Workbook I/O: xlsx template import (calamine) and export
// (rust_xlsxwriter) to an in-memory buffer.

pub mod xlsx;

pub use xlsx::{export_to_buffer, import, XlsxError};
