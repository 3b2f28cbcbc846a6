//! Per-session resolution state and reports
//!
//! A session is one `<patient>/<timepoint>` folder. It is built fresh on
//! every run and never persisted.

mod resolver;

pub use resolver::{discover_sessions, SessionResolver};

use crate::api::DicomRecord;
use crate::diagnostics::Diagnostic;
use crate::layout::LayoutSummary;
use crate::normalize::SideEffect;
use crate::selection::DosePartition;
use crate::types::PlanRejection;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Identifies a session by patient and timepoint folder names
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SessionId {
    pub patient: String,
    pub timepoint: String,
}

impl SessionId {
    pub fn new(patient: impl Into<String>, timepoint: impl Into<String>) -> Self {
        Self {
            patient: patient.into(),
            timepoint: timepoint.into(),
        }
    }

    /// `<patient>/<timepoint>` below an input or output root
    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.patient).join(&self.timepoint)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.patient, self.timepoint)
    }
}

/// Progress of a session through resolution
///
/// Every step may leave its slot empty; no step blocks on a missing link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum SessionState {
    Init,
    PlanResolved,
    StructResolved,
    CtResolved,
    DoseClassified,
    Written,
}

impl SessionState {
    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            SessionState::Init => "init",
            SessionState::PlanResolved => "plan-resolved",
            SessionState::StructResolved => "struct-resolved",
            SessionState::CtResolved => "ct-resolved",
            SessionState::DoseClassified => "dose-classified",
            SessionState::Written => "written",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// A plan that was not selected
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct RejectedPlan {
    pub record: DicomRecord,
    pub reason: PlanRejection,
}

/// Resolved slots of one session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct Session {
    pub id: SessionId,
    /// Input folder of the session
    pub root: PathBuf,
    pub state: SessionState,

    pub plan: Option<DicomRecord>,
    pub rejected_plans: Vec<RejectedPlan>,
    /// Plans per radiation type
    pub radiation_types: BTreeMap<String, usize>,

    pub structure_set: Option<DicomRecord>,
    pub other_structure_sets: Vec<DicomRecord>,

    /// Representative file of the planning CT series
    pub ct_series: Option<DicomRecord>,
    pub other_ct_series: Vec<DicomRecord>,

    pub doses: DosePartition,
}

impl Session {
    pub fn new(id: SessionId, root: impl Into<PathBuf>) -> Self {
        Self {
            id,
            root: root.into(),
            state: SessionState::Init,
            plan: None,
            rejected_plans: Vec::new(),
            radiation_types: BTreeMap::new(),
            structure_set: None,
            other_structure_sets: Vec::new(),
            ct_series: None,
            other_ct_series: Vec::new(),
            doses: DosePartition::default(),
        }
    }

    /// Moves to `next`, which must not be an earlier state
    pub(crate) fn advance(&mut self, next: SessionState) {
        debug_assert!(next >= self.state, "{} -> {}", self.state, next);
        self.state = next;
    }

    /// Folder holding the planning CT series
    pub fn ct_folder(&self) -> Option<&Path> {
        self.ct_series.as_ref().and_then(|ct| ct.path.parent())
    }

    /// Dose cube downstream conversion should start from
    pub fn reference_dose(&self) -> Option<&DicomRecord> {
        self.doses.reference_dose()
    }

    /// True when no slot was resolved
    pub fn is_empty(&self) -> bool {
        self.plan.is_none()
            && self.structure_set.is_none()
            && self.ct_series.is_none()
            && self.doses.used().next().is_none()
    }
}

/// Terminal outcome of a session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum SessionStatus {
    Written(LayoutSummary),
    /// Writing the output failed; other sessions are unaffected
    Failed { error: String },
}

/// Everything one run produced for one session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SessionReport {
    pub session: Session,
    /// Input files rewritten in place
    pub side_effects: Vec<SideEffect>,
    pub diagnostics: Vec<Diagnostic>,
    pub status: SessionStatus,
}

impl SessionReport {
    pub fn id(&self) -> &SessionId {
        &self.session.id
    }

    pub fn is_written(&self) -> bool {
        matches!(self.status, SessionStatus::Written(_))
    }

    /// Output files of the resolved slots, empty for a failed session
    pub fn used_paths(&self) -> &[PathBuf] {
        match &self.status {
            SessionStatus::Written(summary) => &summary.used,
            SessionStatus::Failed { .. } => &[],
        }
    }
}
