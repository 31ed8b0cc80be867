use super::Exporter;
use crate::error::Result;
use crate::table::Table;
use std::io::Write;

pub(super) const EXPORTER: Exporter =
    Exporter::new("html", "html", "Standalone HTML page with one table", render);

fn render(table: &Table, out: &mut dyn Write) -> Result<()> {
    let title = escape(table.title());
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(out, "<head>")?;
    writeln!(out, "<meta charset=\"utf-8\">")?;
    writeln!(out, "<title>{}</title>", title)?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "<h1>{}</h1>", title)?;
    writeln!(out, "<p>{} items</p>", table.len())?;
    writeln!(out, "<table>")?;

    write!(out, "<thead><tr>")?;
    for column in table.columns() {
        write!(out, "<th>{}</th>", escape(column))?;
    }
    writeln!(out, "</tr></thead>")?;

    writeln!(out, "<tbody>")?;
    for row in table.rows() {
        write!(out, "<tr>")?;
        for cell in row {
            write!(out, "<td>{}</td>", escape(&cell.to_string()))?;
        }
        writeln!(out, "</tr>")?;
    }
    writeln!(out, "</tbody>")?;
    writeln!(out, "</table>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")?;
    Ok(())
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
