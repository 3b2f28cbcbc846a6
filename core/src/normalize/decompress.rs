use super::Normalized;
use crate::api::{DicomRecord, RecordReader};
use crate::error::{CurateError, Result};
use log::debug;
use std::path::Path;
use std::process::Command;

/// Rewrites a DICOM file in place with uncompressed pixel data
pub trait Decompressor: Send + Sync {
    /// Decompresses `path` in place
    ///
    /// # Errors
    ///
    /// Returns [`CurateError::CodecFailure`] when the file could not be rewritten.
    fn decompress(&self, path: &Path) -> Result<()>;
}

/// Runs an external tool such as `gdcmconv --raw` or `dcmdjpeg`
///
/// The tool is called as `<program> <args...> <input> <output>` with input
/// and output being the same path.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDecompressor {
    program: String,
    args: Vec<String>,
}

impl CommandDecompressor {
    /// Creates a decompressor for `program` with leading `args`
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Builds a decompressor from a command line split into words
    ///
    /// Returns `None` for an empty command.
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl Decompressor for CommandDecompressor {
    fn decompress(&self, path: &Path) -> Result<()> {
        debug!("Running {} on {}", self.program, path.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .arg(path)
            .output()
            .map_err(|e| CurateError::CodecFailure {
                path: path.to_path_buf(),
                reason: format!("failed to run {}: {}", self.program, e),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CurateError::CodecFailure {
                path: path.to_path_buf(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            })
        }
    }
}

/// Stand-in used when no decompression command is configured
///
/// Every compressed file becomes a codec failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDecompressor;

impl Decompressor for NoDecompressor {
    fn decompress(&self, path: &Path) -> Result<()> {
        Err(CurateError::CodecFailure {
            path: path.to_path_buf(),
            reason: "no decompression command configured".to_string(),
        })
    }
}

/// Makes sure the file behind `record` stores uncompressed pixel data
///
/// Already uncompressed files are left untouched. Otherwise the file is
/// decompressed in place and re-read, so the returned record reflects the
/// rewritten header.
///
/// # Errors
///
/// Returns [`CurateError::CodecFailure`] if the decompressor fails, the
/// rewritten file cannot be read, or it is still compressed afterwards.
pub fn ensure_uncompressed(
    record: DicomRecord,
    decompressor: &dyn Decompressor,
) -> Result<Normalized> {
    if record.is_uncompressed() {
        return Ok(Normalized::unchanged(record));
    }

    let codec_failure = |reason: String| CurateError::CodecFailure {
        path: record.path.clone(),
        reason,
    };

    decompressor.decompress(&record.path).map_err(|e| match e {
        CurateError::CodecFailure { .. } => e,
        other => codec_failure(other.to_string()),
    })?;

    let reread = RecordReader::read(&record.path).map_err(|e| codec_failure(e.to_string()))?;
    if !reread.is_uncompressed() {
        return Err(codec_failure(format!(
            "still compressed after decompression ({})",
            reread.transfer_syntax_uid.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(Normalized::rewritten(reread))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{Normalization, SideEffectKind};
    use crate::testing::{DicomFixture, FailingDecompressor, ReencodingDecompressor, JPEG_BASELINE};
    use tempfile::TempDir;

    #[test]
    fn test_from_command() {
        let command = vec!["gdcmconv".to_string(), "--raw".to_string()];
        let decompressor = CommandDecompressor::from_command(&command).unwrap();
        assert_eq!(
            decompressor,
            CommandDecompressor::new("gdcmconv", vec!["--raw".to_string()])
        );
        assert!(CommandDecompressor::from_command(&[]).is_none());
    }

    #[test]
    fn test_no_decompressor_fails() {
        assert!(matches!(
            NoDecompressor.decompress(Path::new("d.dcm")),
            Err(CurateError::CodecFailure { .. })
        ));
    }

    #[test]
    fn test_uncompressed_is_noop() {
        let dir = TempDir::new().unwrap();
        let path = DicomFixture::dose("D1", "PHYSICAL", "PLAN").write(dir.path(), "D1.dcm");
        let before = std::fs::read(&path).unwrap();

        let record = RecordReader::read(&path).unwrap();
        let normalized = ensure_uncompressed(record, &FailingDecompressor).unwrap();

        assert_eq!(normalized.normalization, Normalization::AlreadyNormalized);
        assert_eq!(normalized.side_effect(SideEffectKind::Decompressed), None);
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }

    #[test]
    fn test_compressed_is_rewritten_once() {
        let dir = TempDir::new().unwrap();
        let path = DicomFixture::dose("D1", "PHYSICAL", "PLAN")
            .transfer_syntax(JPEG_BASELINE)
            .write(dir.path(), "D1.dcm");

        let record = RecordReader::read(&path).unwrap();
        assert!(!record.is_uncompressed());

        let first = ensure_uncompressed(record, &ReencodingDecompressor).unwrap();
        assert_eq!(first.normalization, Normalization::Rewritten);
        assert!(first.record.is_uncompressed());
        assert_eq!(first.record.dose_type.as_deref(), Some("PHYSICAL"));

        let second = ensure_uncompressed(first.record, &ReencodingDecompressor).unwrap();
        assert_eq!(second.normalization, Normalization::AlreadyNormalized);
    }

    #[test]
    fn test_failing_decompressor_reports_codec_failure() {
        let dir = TempDir::new().unwrap();
        let path = DicomFixture::dose("D1", "PHYSICAL", "PLAN")
            .transfer_syntax(JPEG_BASELINE)
            .write(dir.path(), "D1.dcm");

        let record = RecordReader::read(&path).unwrap();
        let err = ensure_uncompressed(record, &FailingDecompressor).unwrap_err();
        assert!(matches!(err, CurateError::CodecFailure { .. }));
    }

    #[test]
    fn test_missing_program_reports_codec_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.dcm");
        std::fs::write(&path, b"").unwrap();

        let decompressor = CommandDecompressor::new("rtcurate-no-such-tool", vec![]);
        assert!(matches!(
            decompressor.decompress(&path),
            Err(CurateError::CodecFailure { .. })
        ));
    }
}
