//! Upload boundary: size cap, format sniffing, and dispatch into the JSON
//! or spreadsheet pipeline.

use serde_json::Value;

use crate::data::ChartData;
use crate::error::IngestError;
use crate::json_path::{ingest_json_text, JsonIngest, JsonPathInfo};
use crate::sheet::{chart_sheet, read_csv, Workbook};
use crate::xlsx::read_xlsx_bytes;

/// Hard upload cap, checked before any parsing.
pub const MAX_FILE_SIZE: usize = 15 * 1024 * 1024;

/// Descriptor of an uploaded file, as the outer surface reports it.
#[derive(Debug, Clone)]
pub struct UploadedFileInfo {
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub last_modified_ms: Option<u64>,
}

impl UploadedFileInfo {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, size: u64) -> UploadedFileInfo {
        UploadedFileInfo { name: name.into(), mime: mime.into(), size, last_modified_ms: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    Csv,
    Xlsx,
}

/// Decide the format from the file name and mime type, with a zip-magic
/// check as the workbook tiebreaker.
pub fn sniff_format(info: &UploadedFileInfo, bytes: &[u8]) -> Option<FileFormat> {
    let name = info.name.to_ascii_lowercase();
    if name.ends_with(".json") || info.mime == "application/json" {
        return Some(FileFormat::Json);
    }
    if name.ends_with(".csv") || info.mime == "text/csv" {
        return Some(FileFormat::Csv);
    }
    let looks_like_workbook = name.ends_with(".xlsx")
        || name.ends_with(".xls")
        || info.mime.contains("spreadsheet")
        || info.mime.contains("ms-excel");
    if looks_like_workbook && bytes.starts_with(b"PK") {
        return Some(FileFormat::Xlsx);
    }
    None
}

/// What an upload produced.
#[derive(Debug)]
pub enum IngestOutcome {
    /// The payload charted directly.
    Ready(ChartData),
    /// JSON needed path discovery; the caller picks paths and resumes with
    /// `json_path::chart_data_from_paths`.
    NeedsSelection { raw: Value, paths: Vec<JsonPathInfo>, default_selection: Vec<String> },
    /// A workbook, charted from its first sheet; the caller may re-chart
    /// another sheet or a column subset.
    Workbook { workbook: Workbook, chart: ChartData },
}

/// Ingest an uploaded file. The size cap fails before any parser runs, so
/// an oversized payload costs nothing but the length check.
pub fn ingest_upload(info: &UploadedFileInfo, bytes: &[u8]) -> Result<IngestOutcome, IngestError> {
    if bytes.len() > MAX_FILE_SIZE {
        return Err(IngestError::TooLarge { size: bytes.len(), limit: MAX_FILE_SIZE });
    }

    let format = sniff_format(info, bytes)
        .ok_or_else(|| IngestError::UnsupportedFormat(info.name.clone()))?;
    log::info!("ingesting {} as {:?} ({} bytes)", info.name, format, bytes.len());

    match format {
        FileFormat::Json => {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| IngestError::UnsupportedFormat("file is not valid UTF-8".into()))?;
            let (raw, ingest) = ingest_json_text(text)?;
            Ok(match ingest {
                JsonIngest::Ready(chart) => IngestOutcome::Ready(chart),
                JsonIngest::NeedsSelection { paths, default_selection } => {
                    IngestOutcome::NeedsSelection { raw, paths, default_selection }
                }
            })
        }
        FileFormat::Csv => workbook_outcome(read_csv(bytes)?),
        FileFormat::Xlsx => workbook_outcome(read_xlsx_bytes(bytes)?),
    }
}

fn workbook_outcome(workbook: Workbook) -> Result<IngestOutcome, IngestError> {
    let chart = chart_sheet(&workbook, None, None)?;
    Ok(IngestOutcome::Workbook { workbook, chart })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_upload_fails_before_parsing() {
        // Deliberately malformed content: it must never reach a parser.
        let mut bytes = vec![b'{'; MAX_FILE_SIZE + 1];
        bytes[0] = b'!';
        let info = UploadedFileInfo::new("big.json", "application/json", bytes.len() as u64);
        let err = ingest_upload(&info, &bytes).unwrap_err();
        assert!(matches!(err, IngestError::TooLarge { .. }));
    }

    #[test]
    fn test_sniff_by_extension_and_mime() {
        let json = UploadedFileInfo::new("data.JSON", "", 0);
        assert_eq!(sniff_format(&json, b"{}"), Some(FileFormat::Json));

        let csv = UploadedFileInfo::new("data.txt", "text/csv", 0);
        assert_eq!(sniff_format(&csv, b"a,b"), Some(FileFormat::Csv));

        let xlsx = UploadedFileInfo::new("data.xlsx", "", 0);
        assert_eq!(sniff_format(&xlsx, b"PK\x03\x04"), Some(FileFormat::Xlsx));
        // Right extension, wrong bytes: not a zip container.
        assert_eq!(sniff_format(&xlsx, b"hello"), None);

        let unknown = UploadedFileInfo::new("data.bin", "application/octet-stream", 0);
        assert_eq!(sniff_format(&unknown, b"PK"), None);
    }

    #[test]
    fn test_csv_upload_charts_first_sheet() {
        let csv = b"Month,Sales\nJan,10\nFeb,20\n";
        let info = UploadedFileInfo::new("sales.csv", "text/csv", csv.len() as u64);
        let outcome = ingest_upload(&info, csv).unwrap();
        let IngestOutcome::Workbook { workbook, chart } = outcome else {
            panic!("expected workbook outcome");
        };
        assert_eq!(workbook.sheet_names(), vec!["Sheet1"]);
        assert_eq!(chart.labels, vec!["Jan", "Feb"]);
        assert_eq!(chart.datasets[0].label, "Sales");
    }

    #[test]
    fn test_chart_shaped_json_is_ready() {
        let json = br#"{"labels":["a","b"],"datasets":[{"label":"S","data":[1,2]}]}"#;
        let info = UploadedFileInfo::new("chart.json", "application/json", json.len() as u64);
        let outcome = ingest_upload(&info, json).unwrap();
        assert!(matches!(outcome, IngestOutcome::Ready(_)));
    }

    #[test]
    fn test_arbitrary_json_needs_selection() {
        let json = br#"[{"name":"a","v":1},{"name":"b","v":2}]"#;
        let info = UploadedFileInfo::new("rows.json", "application/json", json.len() as u64);
        let outcome = ingest_upload(&info, json).unwrap();
        let IngestOutcome::NeedsSelection { paths, default_selection, .. } = outcome else {
            panic!("expected selection outcome");
        };
        assert!(paths.iter().any(|p| p.path == "name"));
        assert!(default_selection.contains(&"v".to_string()));
    }

    #[test]
    fn test_unsupported_format_is_a_user_error() {
        let info = UploadedFileInfo::new("image.png", "image/png", 4);
        let err = ingest_upload(&info, b"\x89PNG").unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(_)));
        assert!(err.is_user_error());
    }
}
