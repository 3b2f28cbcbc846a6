//! In-place, idempotent normalisation of input files
//!
//! Two steps rewrite input files: pixel-data decompression and ROI name
//! sanitisation. Each first checks whether the file is already in its
//! normalised state and is a no-op if so. The outcome is returned as a
//! [`Normalized`] value so callers can report the side effect.

mod decompress;
mod roi;

pub use decompress::{ensure_uncompressed, CommandDecompressor, Decompressor, NoDecompressor};
pub use roi::{sanitize_roi_name, sanitize_roi_names};

use crate::api::DicomRecord;
use std::path::PathBuf;

/// Whether a normalisation step touched the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum Normalization {
    AlreadyNormalized,
    Rewritten,
}

/// A record after a normalisation step
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub record: DicomRecord,
    pub normalization: Normalization,
}

impl Normalized {
    fn unchanged(record: DicomRecord) -> Self {
        Self {
            record,
            normalization: Normalization::AlreadyNormalized,
        }
    }

    fn rewritten(record: DicomRecord) -> Self {
        Self {
            record,
            normalization: Normalization::Rewritten,
        }
    }

    /// The side effect to report, if the file was rewritten
    pub fn side_effect(&self, kind: SideEffectKind) -> Option<SideEffect> {
        match self.normalization {
            Normalization::Rewritten => Some(SideEffect {
                path: self.record.path.clone(),
                kind,
            }),
            Normalization::AlreadyNormalized => None,
        }
    }
}

/// Kind of in-place rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum SideEffectKind {
    Decompressed,
    RoiNamesSanitized,
}

impl SideEffectKind {
    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            SideEffectKind::Decompressed => "decompressed",
            SideEffectKind::RoiNamesSanitized => "roi-names-sanitized",
        }
    }
}

/// An input file rewritten during resolution
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SideEffect {
    pub path: PathBuf,
    pub kind: SideEffectKind,
}
