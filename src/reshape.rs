// Wide-to-long reshaping for tables that carry one column per year.
use crate::loader::RawTable;
use crate::util::parse_year;

/// Names the reshape policy instead of leaving it to ambient string
/// matching: the identifier column is excluded by case-insensitive name
/// (never by position), and a column participates as a value column iff its
/// header is a purely numeric year.
#[derive(Debug, Clone, Copy)]
pub struct ReshapeSpec<'a> {
    pub identifier_column: &'a str,
}

/// One cell of the long form: `(identifier, former-column-header, value)`.
/// The value stays text; typing happens downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongCell {
    pub id: String,
    pub key: String,
    pub value: String,
}

/// Indices of the columns that participate as value columns under `spec`.
/// Non-year headers (other than the identifier) are simply not considered
/// value columns and fall out of the long form.
pub fn value_columns(table: &RawTable, spec: &ReshapeSpec) -> Vec<usize> {
    let id = spec.identifier_column.trim().to_lowercase();
    table
        .headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.trim().to_lowercase() != id)
        .filter(|(_, h)| parse_year(h).is_some())
        .map(|(i, _)| i)
        .collect()
}

/// Melt `table` into one [`LongCell`] per (identifier, year-column) pair.
/// Returns an empty vec if the identifier column is absent; callers are
/// expected to have validated required columns already.
pub fn reshape(table: &RawTable, spec: &ReshapeSpec) -> Vec<LongCell> {
    let Some(id_idx) = table.column_index(spec.identifier_column) else {
        return Vec::new();
    };
    let values = value_columns(table, spec);
    let mut cells = Vec::with_capacity(table.rows.len() * values.len());
    for row in &table.rows {
        for &col in &values {
            cells.push(LongCell {
                id: row[id_idx].trim().to_string(),
                key: table.headers[col].trim().to_string(),
                value: row[col].clone(),
            });
        }
    }
    cells
}
