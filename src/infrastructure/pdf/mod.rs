// ============================================================
// PDF INFRASTRUCTURE LAYER
// ============================================================
// Single-page summary reports drawn with lopdf

mod report_renderer;

pub use report_renderer::{format_value, ReportRenderer, REPORT_FILENAME, REPORT_TITLE};
