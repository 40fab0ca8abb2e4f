//! Terminal rendering of frames and JSON.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use serde::Serialize;
use surql_protocol::DataFrame;

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    println!("{}", render_table(headers, rows));
}

fn render_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }
    table
}

/// Row-major display cells of a frame.
pub fn frame_rows(frame: &DataFrame) -> Vec<Vec<String>> {
    let columns: Vec<Vec<String>> = frame.fields.iter().map(|f| f.display_values()).collect();
    (0..frame.row_count())
        .map(|row| {
            columns
                .iter()
                .map(|column| column.get(row).cloned().unwrap_or_default())
                .collect()
        })
        .collect()
}

pub fn print_frame(frame: &DataFrame) {
    println!("{} ({} rows)", frame.name, frame.row_count());
    let headers: Vec<&str> = frame.fields.iter().map(|f| f.name.as_str()).collect();
    print_table(&headers, frame_rows(frame));
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
