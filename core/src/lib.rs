//! Radiotherapy treatment-record resolution and DICOM series triage
//!
//! Reads a sorted `<patient>/<timepoint>/<MODALITY>/...` tree, resolves the
//! plan, structure set, planning CT and dose cubes of each session by
//! following their UID references, and writes the canonical
//! `1-*_Used` / `Other_*` output layout.
//!
//! - [`api`]: header-only DICOM record reading
//! - [`selection`]: series filter, reference graph and slot resolvers
//! - [`session`]: per-session orchestration and reports
//! - [`layout`]: output layout writer and raw export sorting
//! - [`normalize`]: in-place decompression and ROI name sanitisation

pub mod api;
pub mod cli;
pub mod diagnostics;
pub mod error;
pub mod extraction;
pub mod layout;
pub mod normalize;
pub mod selection;
pub mod session;
#[cfg(test)]
mod testing;
pub mod types;

pub use api::{DicomRecord, RecordReader};
pub use cli::report::TextReport;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{CurateError, Result};
pub use session::{Session, SessionId, SessionReport, SessionResolver, SessionState, SessionStatus};
pub use types::*;
