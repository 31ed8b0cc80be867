use super::Exporter;
use crate::error::Result;
use crate::table::{Cell, Table};
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::io::Write;

pub(super) const EXPORTER: Exporter = Exporter::new(
    "json",
    "json",
    "JSON document with title, columns and row objects",
    render,
);

fn render(table: &Table, out: &mut dyn Write) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, &TableDocument(table))?;
    writeln!(out)?;
    Ok(())
}

struct TableDocument<'a>(&'a Table);

impl Serialize for TableDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut doc = serializer.serialize_struct("Table", 3)?;
        doc.serialize_field("title", self.0.title())?;
        doc.serialize_field("columns", self.0.columns())?;
        doc.serialize_field("rows", &Rows(self.0))?;
        doc.end()
    }
}

struct Rows<'a>(&'a Table);

impl Serialize for Rows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for cells in self.0.rows() {
            seq.serialize_element(&RowObject {
                columns: self.0.columns(),
                cells,
            })?;
        }
        seq.end()
    }
}

/// 按列顺序输出的行对象
struct RowObject<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Row;

    #[test]
    fn test_render_json() {
        let mut table = Table::new("Coverage", ["Process Name", "Process Count"]).unwrap();
        let mut row = Row::new();
        row.insert("Process Name".to_string(), Cell::from("Order"));
        row.insert("Process Count".to_string(), Cell::from(3usize));
        table.push_row(row).unwrap();

        let out = EXPORTER.render_to_vec(&table).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["title"], "Coverage");
        assert_eq!(value["columns"][1], "Process Count");
        assert_eq!(value["rows"][0]["Process Name"], "Order");
        assert_eq!(value["rows"][0]["Process Count"], 3);
    }
}
