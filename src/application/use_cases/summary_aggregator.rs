use crate::domain::equipment::{CoercedTable, Summary, TypeDistribution};

/// Mean of the present values, `None` when there are none.
///
/// Finite inputs always give a finite mean, even when their sum overflows.
pub fn mean(values: &[Option<f64>]) -> Option<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0f64, 0usize), |(sum, count), value| (sum + value, count + 1));

    if count == 0 {
        return None;
    }
    if sum.is_finite() {
        return Some(sum / count as f64);
    }

    let mut running = 0.0f64;
    for (n, value) in values.iter().flatten().enumerate() {
        let n = (n + 1) as f64;
        running += value / n - running / n;
    }
    Some(running)
}

/// Reduce a coerced table to its summary.
pub fn summarize(table: &CoercedTable) -> Summary {
    let mut type_distribution = TypeDistribution::new();
    for label in table.types.iter().flatten() {
        type_distribution.record(label);
    }

    Summary {
        total_equipment: table.row_count as u64,
        avg_flowrate: mean(&table.flowrate),
        avg_pressure: mean(&table.pressure),
        avg_temperature: mean(&table.temperature),
        type_distribution,
    }
}
