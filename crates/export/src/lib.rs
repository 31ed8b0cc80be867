//! export - 表格契约与导出格式
//!
//! 报表层产出 Table，导出层按注册表里的格式渲染

mod destination;
mod error;
mod formats;
mod table;

pub use destination::{timestamped_file_name, write_report, Destination};
pub use error::{ExportError, Result};
pub use formats::{Exporter, ExporterRegistry, RenderFn};
pub use table::{Cell, Row, Table};
