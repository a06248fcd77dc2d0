use serde::Serialize;
use tabled::builder::Builder;
use tabled::{settings::Style, Table, Tabled};

use crate::loader::RawTable;

/// Print up to `max_rows` of a report as a markdown-style table, or a
/// placeholder when there is nothing to show.
pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(sem dados)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Same, but for an untyped [`RawTable`] whose columns are only known at
/// runtime (the emicizumab scenario tables).
pub fn preview_raw_table(table: &RawTable, max_rows: usize) {
    if table.rows.is_empty() {
        println!("(sem dados)\n");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(table.headers.clone());
    for row in table.rows.iter().take(max_rows) {
        builder.push_record(row.clone());
    }
    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

/// Print a KPI summary as pretty JSON. Serialization of these flat structs
/// cannot fail, but the signature stays honest about serde_json.
pub fn print_summary_json<T: Serialize>(label: &str, value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{} {}\n", label, s),
        Err(e) => eprintln!("Failed to serialize {}: {}", label, e),
    }
}
