// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV decoding, delimiter detection and table construction

mod csv_parser;

pub use csv_parser::{decode_upload, CsvParser};
