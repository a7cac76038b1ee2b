// ============================================================
// CSV PARSER
// ============================================================
// Decode uploaded bytes, detect the delimiter and build a table

use std::borrow::Cow;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::domain::equipment::{is_missing_token, Cell, UploadedTable};
use crate::domain::error::AppError;

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];
const DELIMITER_SAMPLE_LINES: usize = 10;
const BOM: char = '\u{feff}';

/// CSV parser with encoding fallback and delimiter detection
#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    /// Fixed delimiter; detected from the content when unset
    delimiter: Option<u8>,
}

impl CsvParser {
    /// Create a parser that detects the delimiter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    /// Parse raw upload bytes into a table
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<UploadedTable, AppError> {
        let content = decode_upload(bytes);
        self.parse_content(&content)
    }

    /// Parse CSV content from string, first row as headers
    pub fn parse_content(&self, content: &str) -> Result<UploadedTable, AppError> {
        let content = content.strip_prefix(BOM).unwrap_or(content);
        if content.trim().is_empty() {
            return Err(AppError::CsvParse("No columns to parse from file".to_string()));
        }

        let delimiter = self
            .delimiter
            .unwrap_or_else(|| Self::detect_delimiter(content));

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(Trim::None)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::CsvParse(format!("Failed to read CSV headers: {}", e)))?
            .clone();
        let columns = dedupe_headers(&headers);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| {
                AppError::CsvParse(format!("Failed to parse CSV row {}: {}", rows.len() + 1, e))
            })?;
            rows.push(self.parse_row(&columns, &record)?);
        }

        Ok(UploadedTable::new(columns, rows))
    }

    /// Pad short rows with missing cells; reject rows wider than the header
    fn parse_row(&self, columns: &[String], record: &StringRecord) -> Result<Vec<Cell>, AppError> {
        if record.len() > columns.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(AppError::CsvParse(format!(
                "Expected {} fields in line {}, saw {}",
                columns.len(),
                line,
                record.len()
            )));
        }

        Ok((0..columns.len())
            .map(|idx| match record.get(idx) {
                Some(value) if !is_missing_token(value) => Some(value.to_string()),
                _ => None,
            })
            .collect())
    }

    /// Detect delimiter from content (comma, semicolon, tab, pipe)
    pub fn detect_delimiter(content: &str) -> u8 {
        let sample_lines: Vec<_> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .take(DELIMITER_SAMPLE_LINES)
            .collect();

        if sample_lines.is_empty() {
            return b',';
        }

        let mut best_delimiter = b',';
        let mut best_score = 0.0f32;

        for &delimiter in &DELIMITER_CANDIDATES {
            let field_counts: Vec<usize> = sample_lines
                .iter()
                .map(|line| count_unquoted(line, delimiter))
                .collect();

            // Score by frequency, penalized by inconsistency between lines
            let avg = field_counts.iter().sum::<usize>() as f32 / field_counts.len() as f32;
            let variance = field_counts
                .iter()
                .map(|&x| (x as f32 - avg).powi(2))
                .sum::<f32>()
                / field_counts.len() as f32;

            let score = avg / (1.0 + variance.sqrt());

            if score > best_score {
                best_score = score;
                best_delimiter = delimiter;
            }
        }

        best_delimiter
    }
}

/// UTF-8 first, ISO-8859-1 otherwise. Latin-1 maps every byte, so this never fails.
pub fn decode_upload(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(content) => Cow::Borrowed(content),
        Err(_) => encoding_rs::mem::decode_latin1(bytes),
    }
}

fn count_unquoted(line: &str, delimiter: u8) -> usize {
    let mut in_quotes = false;
    line.bytes()
        .filter(|&b| {
            if b == b'"' {
                in_quotes = !in_quotes;
            }
            !in_quotes && b == delimiter
        })
        .count()
}

/// Repeated header names become `Name`, `Name.1`, `Name.2`, ...
fn dedupe_headers(headers: &StringRecord) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers.iter() {
        let mut candidate = header.to_string();
        let mut suffix = 1;
        while columns.contains(&candidate) {
            candidate = format!("{}.{}", header, suffix);
            suffix += 1;
        }
        columns.push(candidate);
    }
    columns
}
