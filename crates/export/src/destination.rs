//! 输出目的地 - 终端、指定文件或带时间戳的目录

use crate::error::Result;
use crate::formats::Exporter;
use crate::table::Table;
use chrono::NaiveDateTime;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 导出目的地，路径由调用方显式传入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    /// 写到指定文件
    File(PathBuf),
    /// 写到目录下的 `<stem>_<YYYYmmdd_HHMMSS>.<ext>`
    Directory { dir: PathBuf, stem: String },
}

/// 渲染并写出报表，返回写入的文件路径 (终端输出时为 None)
///
/// 先完整渲染到内存，再经临时文件原子替换，失败时不会留下半截文件。
pub fn write_report(
    exporter: &Exporter,
    table: &Table,
    destination: &Destination,
    now: NaiveDateTime,
) -> Result<Option<PathBuf>> {
    let bytes = exporter.render_to_vec(table)?;

    match destination {
        Destination::Stdout => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(&bytes)?;
            lock.flush()?;
            Ok(None)
        }
        Destination::File(path) => {
            persist(path, &bytes)?;
            tracing::info!("Report written to {}", path.display());
            Ok(Some(path.clone()))
        }
        Destination::Directory { dir, stem } => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(timestamped_file_name(stem, exporter.extension, now));
            persist(&path, &bytes)?;
            tracing::info!("Report written to {}", path.display());
            Ok(Some(path))
        }
    }
}

/// `<stem>_<YYYYmmdd_HHMMSS>.<ext>`
pub fn timestamped_file_name(stem: &str, extension: &str, now: NaiveDateTime) -> String {
    format!("{}_{}.{}", stem, now.format("%Y%m%d_%H%M%S"), extension)
}

fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
