use super::schema_validator::EquipmentColumns;
use crate::domain::equipment::{CoercedTable, UploadedTable};

/// Parse a cell as a number. Unparsable and non-finite values are missing.
pub fn parse_numeric(cell: Option<&str>) -> Option<f64> {
    cell.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Resolve the numeric columns; bad cells never fail the table.
pub fn coerce_table(table: &UploadedTable, columns: &EquipmentColumns) -> CoercedTable {
    let numeric = |index: usize| -> Vec<Option<f64>> {
        table.column_cells(index).map(parse_numeric).collect()
    };

    CoercedTable {
        row_count: table.row_count(),
        flowrate: numeric(columns.flowrate),
        pressure: numeric(columns.pressure),
        temperature: numeric(columns.temperature),
        types: table
            .column_cells(columns.kind)
            .map(|cell| cell.map(str::to_string))
            .collect(),
    }
}
