//! Per-session diagnostics sink
//!
//! Every component receives a `&mut Diagnostics` instead of writing to a
//! shared logger only. Entries are forwarded to the `log` facade as they
//! are pushed and handed back with the session report.

use std::fmt;
use std::path::{Path, PathBuf};

/// Category of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum DiagnosticKind {
    /// Corrupt or non-DICOM file, excluded from candidate sets
    UnreadableFile,
    /// A reference UID without a matching target
    MissingLink,
    /// External decompression failed
    CodecFailure,
    /// Directory creation or copy failed
    Io,
    /// A session finished with no slot resolved
    EmptySession,
    /// A candidate routed to an `Other_*` folder
    Superseded,
    /// Informational
    Note,
}

impl DiagnosticKind {
    fn level(&self) -> log::Level {
        match self {
            DiagnosticKind::Io => log::Level::Error,
            DiagnosticKind::UnreadableFile
            | DiagnosticKind::MissingLink
            | DiagnosticKind::CodecFailure
            | DiagnosticKind::EmptySession => log::Level::Warn,
            DiagnosticKind::Superseded => log::Level::Debug,
            DiagnosticKind::Note => log::Level::Info,
        }
    }

    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            DiagnosticKind::UnreadableFile => "unreadable-file",
            DiagnosticKind::MissingLink => "missing-link",
            DiagnosticKind::CodecFailure => "codec-failure",
            DiagnosticKind::Io => "io",
            DiagnosticKind::EmptySession => "empty-session",
            DiagnosticKind::Superseded => "superseded",
            DiagnosticKind::Note => "note",
        }
    }
}

/// One diagnostic entry
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub path: Option<PathBuf>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.simple_name(), self.message)?;
        if let Some(path) = &self.path {
            write!(f, " ({})", path.display())?;
        }
        Ok(())
    }
}

/// Collects diagnostics for one unit of work
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    scope: String,
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates a sink whose log lines are prefixed with `scope`
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            entries: Vec::new(),
        }
    }

    /// Records a diagnostic and forwards it to the logger
    pub fn push(&mut self, kind: DiagnosticKind, message: impl Into<String>, path: Option<&Path>) {
        let entry = Diagnostic {
            kind,
            message: message.into(),
            path: path.map(Path::to_path_buf),
        };
        if self.scope.is_empty() {
            log::log!(kind.level(), "{}", entry);
        } else {
            log::log!(kind.level(), "{}: {}", self.scope, entry);
        }
        self.entries.push(entry);
    }

    pub fn unreadable(&mut self, path: &Path, reason: impl fmt::Display) {
        self.push(DiagnosticKind::UnreadableFile, reason.to_string(), Some(path));
    }

    pub fn missing_link(&mut self, message: impl Into<String>) {
        self.push(DiagnosticKind::MissingLink, message, None);
    }

    pub fn codec_failure(&mut self, path: &Path, reason: impl fmt::Display) {
        self.push(DiagnosticKind::CodecFailure, reason.to_string(), Some(path));
    }

    pub fn superseded(&mut self, path: &Path, message: impl Into<String>) {
        self.push(DiagnosticKind::Superseded, message, Some(path));
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.push(DiagnosticKind::Note, message, None);
    }

    /// All entries, in push order
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of entries of one kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Consumes the sink
    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
