// ============================================================
// UPLOADED TABLE TYPES
// ============================================================
// Per-request tabular data before and after numeric coercion

/// A single cell. `None` marks a missing value.
pub type Cell = Option<String>;

/// Literal cell contents treated as missing values.
pub const MISSING_VALUE_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

pub fn is_missing_token(value: &str) -> bool {
    MISSING_VALUE_TOKENS.contains(&value)
}

/// Parsed upload: ordered headers and string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl UploadedTable {
    /// Build a table. Every row must have exactly one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Cells of one column, top to bottom.
    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = Option<&str>> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).and_then(|cell| cell.as_deref()))
    }
}

/// Table reduced to the four equipment columns with numeric values resolved.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CoercedTable {
    pub row_count: usize,
    pub flowrate: Vec<Option<f64>>,
    pub pressure: Vec<Option<f64>>,
    pub temperature: Vec<Option<f64>>,
    pub types: Vec<Option<String>>,
}
