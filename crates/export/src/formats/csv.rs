use super::Exporter;
use crate::error::Result;
use crate::table::Table;
use std::io::Write;

pub(super) const EXPORTER: Exporter =
    Exporter::new("csv", "csv", "Comma-separated values with a header row", render);

fn render(table: &Table, out: &mut dyn Write) -> Result<()> {
    let mut writer = ::csv::Writer::from_writer(out);
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_string()))?;
    }
    writer.flush()?;
    Ok(())
}
