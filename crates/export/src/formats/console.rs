//! 终端输出: 标题 + 计数 + 编号行

use super::Exporter;
use crate::error::Result;
use crate::table::Table;
use std::io::Write;

pub(super) const EXPORTER: Exporter =
    Exporter::new("console", "txt", "Numbered plain-text listing", render).interactive();

fn render(table: &Table, out: &mut dyn Write) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", table.title())?;
    writeln!(out, "Found {} items:", table.len())?;

    for (i, row) in table.rows().iter().enumerate() {
        // 空文本单元格不输出，避免出现 "a -  - b"
        let line = row
            .iter()
            .filter(|cell| !cell.is_empty())
            .map(|cell| cell.to_string())
            .collect::<Vec<_>>()
            .join(" - ");
        writeln!(out, "{}. {}", i + 1, line)?;
    }

    Ok(())
}
