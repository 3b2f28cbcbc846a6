use std::path::PathBuf;
use thiserror::Error;

/// Result type for rtcurate operations
pub type Result<T> = std::result::Result<T, CurateError>;

/// Error types for rtcurate operations
///
/// Expected absence of data (optional attributes, unresolved references)
/// is never reported through this type; those surface as `Option` values
/// plus a [`crate::diagnostics::Diagnostic`].
#[derive(Error, Debug)]
pub enum CurateError {
    /// Corrupt, non-DICOM, or incomplete file
    #[error("unreadable DICOM file {path}: {reason}")]
    UnreadableFile { path: PathBuf, reason: String },

    /// External decompression step failed
    #[error("decompression failed for {path}: {reason}")]
    CodecFailure { path: PathBuf, reason: String },

    /// File-system failure tied to a path
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Untargeted I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// DICOM reading error
    #[error("DICOM error: {0}")]
    DicomRead(String),

    /// DICOM serialisation error
    #[error("DICOM write error: {0}")]
    DicomWrite(String),

    /// Output location is the input tree or nested with it
    #[error("output {output} overlaps input {input}")]
    OverlappingOutput { input: PathBuf, output: PathBuf },

    /// Scan folder without any DICOM file
    #[error("no DICOM files found in {0}")]
    NoDicomFiles(PathBuf),

    /// Invalid tag value
    #[error("Invalid tag value: {0}")]
    InvalidValue(String),

    /// Generic extraction error
    #[error("Extraction error: {0}")]
    Extraction(String),
}

impl CurateError {
    /// Wraps an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CurateError::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds an [`CurateError::UnreadableFile`]
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CurateError::UnreadableFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

// Helper conversions
impl From<String> for CurateError {
    fn from(s: String) -> Self {
        CurateError::Extraction(s)
    }
}

impl From<&str> for CurateError {
    fn from(s: &str) -> Self {
        CurateError::Extraction(s.to_string())
    }
}

// Convert dicom-object errors
impl From<dicom_object::ReadError> for CurateError {
    fn from(e: dicom_object::ReadError) -> Self {
        CurateError::DicomRead(format!("{}", e))
    }
}

impl From<dicom_object::WriteError> for CurateError {
    fn from(e: dicom_object::WriteError) -> Self {
        CurateError::DicomWrite(format!("{}", e))
    }
}

impl From<dicom_core::value::ConvertValueError> for CurateError {
    fn from(e: dicom_core::value::ConvertValueError) -> Self {
        CurateError::InvalidValue(format!("{}", e))
    }
}
