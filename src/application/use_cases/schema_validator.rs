use crate::domain::equipment::{UploadedTable, FLOWRATE, PRESSURE, REQUIRED_COLUMNS, TEMPERATURE, TYPE};
use crate::domain::error::{AppError, Result};

/// Positions of the required columns inside a validated table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquipmentColumns {
    pub flowrate: usize,
    pub pressure: usize,
    pub temperature: usize,
    pub kind: usize,
}

/// Check that every required column is present (exact case).
pub fn validate_columns(table: &UploadedTable) -> Result<EquipmentColumns> {
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|name| table.column_index(name).is_none())
        .map(|name| name.to_string())
        .collect();

    match (
        table.column_index(FLOWRATE),
        table.column_index(PRESSURE),
        table.column_index(TEMPERATURE),
        table.column_index(TYPE),
    ) {
        (Some(flowrate), Some(pressure), Some(temperature), Some(kind)) if missing.is_empty() => {
            Ok(EquipmentColumns {
                flowrate,
                pressure,
                temperature,
                kind,
            })
        }
        _ => Err(AppError::SchemaValidation {
            missing,
            available: table.columns().to_vec(),
        }),
    }
}
