use crate::domain::equipment::{Summary, TypeDistribution};

/// One `Parameter | Value` row of the summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub parameter: String,
    pub value: String,
}

/// One wedge of the type distribution pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub count: u64,
    pub fraction: f64,
}

impl PieSlice {
    /// Share as shown on the chart, e.g. `33.3%`.
    pub fn percent_label(&self) -> String {
        format!("{:.1}%", self.fraction * 100.0)
    }
}

pub const TABLE_HEADERS: [&str; 2] = ["Parameter", "Value"];

pub fn summary_table(summary: &Summary) -> Vec<TableRow> {
    let row = |parameter: &str, value: String| TableRow {
        parameter: parameter.to_string(),
        value,
    };

    vec![
        row("Total Equipment", summary.total_equipment.to_string()),
        row("Avg Flowrate", rounded(summary.avg_flowrate)),
        row("Avg Pressure", rounded(summary.avg_pressure)),
        row("Avg Temperature", rounded(summary.avg_temperature)),
    ]
}

/// Two decimals at most, trailing zeros dropped: `15.0`, `6.33`.
fn rounded(value: Option<f64>) -> String {
    match value {
        Some(v) => {
            let r = (v * 100.0).round() / 100.0;
            if r.fract() == 0.0 {
                format!("{:.1}", r)
            } else {
                format!("{}", r)
            }
        }
        None => "n/a".to_string(),
    }
}

pub fn pie_slices(distribution: &TypeDistribution) -> Vec<PieSlice> {
    let total = distribution.total();
    if total == 0 {
        return Vec::new();
    }

    distribution
        .iter()
        .map(|(label, count)| PieSlice {
            label: label.to_string(),
            count,
            fraction: count as f64 / total as f64,
        })
        .collect()
}
