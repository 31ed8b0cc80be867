use super::Exporter;
use crate::error::Result;
use crate::table::Table;
use std::io::Write;

pub(super) const EXPORTER: Exporter =
    Exporter::new("markdown", "md", "Markdown pipe table", render);

fn render(table: &Table, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "# {}", table.title())?;
    writeln!(out)?;

    let header: Vec<String> = table.columns().iter().map(|c| escape(c)).collect();
    writeln!(out, "| {} |", header.join(" | "))?;
    writeln!(out, "|{}|", vec![" --- "; header.len()].join("|"))?;

    for row in table.rows() {
        let cells: Vec<String> = row.iter().map(|c| escape(&c.to_string())).collect();
        writeln!(out, "| {} |", cells.join(" | "))?;
    }
    Ok(())
}

/// 管道符转义，换行压成空格
fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}
