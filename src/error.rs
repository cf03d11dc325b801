use thiserror::Error;

/// Errors produced at the data-ingestion boundary.
///
/// User-input errors (`TooLarge`, `NotEnoughRows`, `SelectionTooSmall`,
/// `InvalidJson`, `IncompatibleShape`) and parser errors (`Workbook`, `Xml`,
/// `Zip`, `Csv`) are both reported to the caller without touching any chart
/// state already in place. Render failures are handled separately by the
/// host's fallback path and never surface through this type.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("file is too large: {size} bytes (maximum {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("spreadsheet needs at least a header row and one data row")]
    NotEnoughRows,

    #[error("at least 2 columns or paths must be selected (got {0})")]
    SelectionTooSmall(usize),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("JSON must be an object or an array of objects")]
    NotAnObject,

    #[error("selected paths do not form valid chart data")]
    IncompatibleShape,

    #[error("invalid workbook: {0}")]
    Workbook(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl IngestError {
    /// True when the error is the user's input rather than a broken file.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            IngestError::TooLarge { .. }
                | IngestError::UnsupportedFormat(_)
                | IngestError::NotEnoughRows
                | IngestError::SelectionTooSmall(_)
                | IngestError::InvalidJson(_)
                | IngestError::NotAnObject
                | IngestError::IncompatibleShape
        )
    }
}
