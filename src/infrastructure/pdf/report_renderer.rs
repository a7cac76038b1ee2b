use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::domain::equipment::{Summary, TypeDistribution};
use crate::domain::error::{AppError, Result};

pub const REPORT_TITLE: &str = "Chemical Equipment Report";
pub const REPORT_FILENAME: &str = "chemical_equipment_report.pdf";

// A4 in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN_LEFT: i64 = 50;
const TITLE_OFFSET: i64 = 50;
const TITLE_SIZE: i64 = 16;
const BODY_SIZE: i64 = 11;
const BODY_GAP: i64 = 40;
const LINE_HEIGHT: i64 = 20;

/// Renders a summary as a `key: value` listing under a fixed title.
#[derive(Debug, Clone, Default)]
pub struct ReportRenderer;

impl ReportRenderer {
    pub fn new() -> Self {
        Self
    }

    /// One text line per summary field, in field order.
    pub fn lines(summary: &Summary) -> Vec<String> {
        vec![
            format!("total_equipment: {}", summary.total_equipment),
            format!("avg_flowrate: {}", format_value(summary.avg_flowrate)),
            format!("avg_pressure: {}", format_value(summary.avg_pressure)),
            format!("avg_temperature: {}", format_value(summary.avg_temperature)),
            format!(
                "type_distribution: {}",
                format_distribution(&summary.type_distribution)
            ),
        ]
    }

    pub fn render(&self, summary: &Summary) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(font("Helvetica"));
        let bold_id = doc.add_object(font("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut y = PAGE_HEIGHT - TITLE_OFFSET;
        let mut operations = text_line("F2", TITLE_SIZE, y, REPORT_TITLE);
        y -= BODY_GAP;
        for line in Self::lines(summary) {
            operations.extend(text_line("F1", BODY_SIZE, y, &line));
            y -= LINE_HEIGHT;
        }

        let content = Content { operations };
        let encoded = content
            .encode()
            .map_err(|e| AppError::Internal(format!("Failed to encode report content: {}", e)))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| AppError::Internal(format!("Failed to write report: {}", e)))?;
        Ok(buffer)
    }
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn text_line(font: &str, size: i64, y: i64, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), Object::Integer(size)]),
        Operation::new("Td", vec![Object::Integer(MARGIN_LEFT), Object::Integer(y)]),
        Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]),
        Operation::new("ET", vec![]),
    ]
}

/// Standard fonts expect single-byte WinAnsi text.
/// Characters outside CP1252 become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = encoding_rs::WINDOWS_1252.encode(text);
    if !had_errors {
        return bytes.into_owned();
    }

    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for ch in text.chars() {
        let (encoded, _, unmappable) = encoding_rs::WINDOWS_1252.encode(ch.encode_utf8(&mut buf));
        if unmappable {
            out.push(b'?');
        } else {
            out.extend_from_slice(&encoded);
        }
    }
    out
}

/// Mean formatting: `15.0`, `6.25`, or `n/a` when undefined.
pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e16 => format!("{:.1}", v),
        Some(v) => format!("{}", v),
        None => "n/a".to_string(),
    }
}

fn format_distribution(distribution: &TypeDistribution) -> String {
    let entries: Vec<String> = distribution
        .iter()
        .map(|(label, count)| format!("{}: {}", label, count))
        .collect();
    format!("{{{}}}", entries.join(", "))
}
