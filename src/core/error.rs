use std::fmt;
use std::error::Error;

#[derive(Debug)]
pub enum ExportError {
    IoError(String),
    CaptureError(String),
    EncodeError(String),
    ValidationError(String),
    GenerationError(String),
    BusyError(String),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::IoError(msg) => write!(f, "I/O error: {}", msg),
            ExportError::CaptureError(msg) => write!(f, "Failed to capture invoice: {}", msg),
            ExportError::EncodeError(msg) => write!(f, "Failed to encode PDF: {}", msg),
            ExportError::ValidationError(msg) => write!(f, "Invalid invoice data: {}", msg),
            ExportError::GenerationError(msg) => write!(f, "Failed to generate document: {}", msg),
            ExportError::BusyError(msg) => write!(f, "Export already in progress: {}", msg),
        }
    }
}

impl Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(error: std::io::Error) -> Self {
        ExportError::IoError(error.to_string())
    }
}

pub type ExportResult<T> = Result<T, ExportError>;
