use super::{RejectedPlan, Session, SessionId, SessionReport, SessionState, SessionStatus};
use crate::api::{DicomRecord, RecordReader};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{CurateError, Result};
use crate::layout::files::{collect_dicom_files, file_name, list_subfolders, paths_overlap};
use crate::layout::write_session;
use crate::normalize::{CommandDecompressor, Decompressor, NoDecompressor, SideEffect};
use crate::selection::{
    classify_doses, normalize_structure_set, read_series_representative, resolve_ct_series,
    resolve_structure_set, select_plan, NodeId, ReferenceGraph,
};
use crate::types::{Modality, ResolverConfig};
use log::{debug, info};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Lists the session folders `<base>/<patient>/<timepoint>`, sorted
///
/// # Errors
///
/// Returns [`crate::CurateError::Io`] if a folder cannot be listed.
pub fn discover_sessions(base: &Path) -> Result<Vec<(SessionId, PathBuf)>> {
    let mut sessions = Vec::new();
    for patient in list_subfolders(base)? {
        for timepoint in list_subfolders(&patient)? {
            let id = SessionId::new(file_name(&patient), file_name(&timepoint));
            sessions.push((id, timepoint));
        }
    }
    Ok(sessions)
}

/// Resolves treatment records session by session
///
/// # Example
///
/// ```no_run
/// use rtcurate_core::{ResolverConfig, SessionResolver};
/// use std::path::Path;
///
/// let resolver = SessionResolver::new(ResolverConfig::default());
/// let reports = resolver.process_tree(Path::new("sorted"), Path::new("curated")).unwrap();
/// for report in &reports {
///     println!("{}: {}", report.id(), report.session.state);
/// }
/// ```
pub struct SessionResolver {
    config: ResolverConfig,
    decompressor: Box<dyn Decompressor>,
}

impl SessionResolver {
    /// Creates a resolver running the configured decompression command
    pub fn new(config: ResolverConfig) -> Self {
        let decompressor: Box<dyn Decompressor> =
            match CommandDecompressor::from_command(&config.decompress_command) {
                Some(command) => Box::new(command),
                None => Box::new(NoDecompressor),
            };
        Self::with_decompressor(config, decompressor)
    }

    /// Creates a resolver with a custom decompressor
    pub fn with_decompressor(config: ResolverConfig, decompressor: Box<dyn Decompressor>) -> Self {
        Self {
            config,
            decompressor,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn decompressor(&self) -> &dyn Decompressor {
        self.decompressor.as_ref()
    }

    /// Resolves and writes every session below `base`
    ///
    /// Sessions are independent; a failed session is reported in its own
    /// report and does not stop the others. Reports are in session order
    /// even when resolved in parallel.
    ///
    /// # Errors
    ///
    /// Returns [`CurateError::OverlappingOutput`] before reading anything
    /// when `out` is `base` or either one lies inside the other, and an IO
    /// error if `base` itself cannot be listed.
    pub fn process_tree(&self, base: &Path, out: &Path) -> Result<Vec<SessionReport>> {
        if paths_overlap(base, out)? {
            return Err(CurateError::OverlappingOutput {
                input: base.to_path_buf(),
                output: out.to_path_buf(),
            });
        }
        let sessions = discover_sessions(base)?;
        info!("Found {} sessions in {}", sessions.len(), base.display());

        let reports: Vec<SessionReport> = if self.config.parallel {
            sessions
                .into_par_iter()
                .map(|(id, root)| self.process(id, &root, out))
                .collect()
        } else {
            sessions
                .into_iter()
                .map(|(id, root)| self.process(id, &root, out))
                .collect()
        };
        Ok(reports)
    }

    /// Resolves one session and writes it to `<out>/<patient>/<timepoint>`
    pub fn process(&self, id: SessionId, root: &Path, out: &Path) -> SessionReport {
        let session_dir = out.join(id.relative_path());
        let (mut session, side_effects, mut diagnostics) = self.resolve(id, root);

        let status = match write_session(&session, &session_dir) {
            Ok(summary) => {
                session.advance(SessionState::Written);
                SessionStatus::Written(summary)
            }
            Err(e) => {
                diagnostics.push(DiagnosticKind::Io, e.to_string(), Some(&session_dir));
                SessionStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        SessionReport {
            session,
            side_effects,
            diagnostics: diagnostics.into_entries(),
            status,
        }
    }

    /// Resolves the slots of one session without writing output
    ///
    /// Input files may still be rewritten in place (decompression, ROI
    /// name sanitisation); each rewrite is returned as a [`SideEffect`].
    pub fn resolve(&self, id: SessionId, root: &Path) -> (Session, Vec<SideEffect>, Diagnostics) {
        let mut diagnostics = Diagnostics::new(id.to_string());
        let mut side_effects = Vec::new();
        let mut session = Session::new(id, root);

        let mut graph = ReferenceGraph::from_records(read_session_records(root, &mut diagnostics));
        debug!("{}: {} records", session.id, graph.len());

        let plans = select_plan(&graph, &self.config, &mut diagnostics);
        session.plan = plans.selected.map(|id| graph.get(id).clone());
        session.rejected_plans = plans
            .rejected
            .iter()
            .map(|(id, reason)| RejectedPlan {
                record: graph.get(*id).clone(),
                reason: reason.clone(),
            })
            .collect();
        session.radiation_types = plans.radiation_types;
        session.advance(SessionState::PlanResolved);

        let structure = plans
            .selected
            .and_then(|plan| resolve_structure_set(&graph, plan, &mut diagnostics));
        if let Some(structure) = structure {
            if self.config.sanitize_roi_names {
                side_effects.extend(normalize_structure_set(&mut graph, structure, &mut diagnostics));
            }
        }
        session.structure_set = structure.map(|id| graph.get(id).clone());
        session.other_structure_sets = others(&graph, Modality::RtStruct, structure, &mut diagnostics);
        session.advance(SessionState::StructResolved);

        let ct = structure.and_then(|structure| resolve_ct_series(&graph, structure, &mut diagnostics));
        session.ct_series = ct.map(|id| graph.get(id).clone());
        session.other_ct_series = others(&graph, Modality::Ct, ct, &mut diagnostics);
        session.advance(SessionState::CtResolved);

        session.doses = classify_doses(
            &mut graph,
            plans.selected,
            &self.config,
            self.decompressor(),
            &mut diagnostics,
            &mut side_effects,
        );
        session.advance(SessionState::DoseClassified);

        if session.is_empty() {
            diagnostics.push(DiagnosticKind::EmptySession, "no slot resolved", Some(root));
        }
        (session, side_effects, diagnostics)
    }
}

/// Non-selected candidates of one modality, logged as superseded
fn others(
    graph: &ReferenceGraph,
    modality: Modality,
    selected: Option<NodeId>,
    diagnostics: &mut Diagnostics,
) -> Vec<DicomRecord> {
    graph
        .candidates(modality)
        .into_iter()
        .filter(|id| Some(*id) != selected)
        .map(|id| {
            let record = graph.get(id).clone();
            diagnostics.superseded(&record.path, format!("{} not selected", modality));
            record
        })
        .collect()
}

/// Reads the candidate records of a session folder
///
/// RT objects are read from every file of `<MODALITY>/<instance-folder>/`;
/// each CT series folder contributes one representative file. Files that
/// do not read as the folder's modality are excluded and logged.
fn read_session_records(root: &Path, diagnostics: &mut Diagnostics) -> Vec<DicomRecord> {
    let mut records = Vec::new();

    for modality in [Modality::RtPlan, Modality::RtStruct, Modality::RtDose] {
        for folder in subfolders(&root.join(modality.dicom_name()), diagnostics) {
            let files = match collect_dicom_files(&folder) {
                Ok(files) => files,
                Err(e) => {
                    diagnostics.push(DiagnosticKind::Io, e.to_string(), Some(&folder));
                    continue;
                }
            };
            for path in files {
                match RecordReader::read(&path) {
                    Ok(record) if record.modality == modality => records.push(record),
                    Ok(record) => diagnostics.unreadable(
                        &path,
                        format!("{} file in the {} folder", record.modality, modality),
                    ),
                    Err(e) => diagnostics.unreadable(&path, e),
                }
            }
        }
    }

    for folder in subfolders(&root.join(Modality::Ct.dicom_name()), diagnostics) {
        records.extend(read_series_representative(&folder, diagnostics));
    }
    records
}

fn subfolders(dir: &Path, diagnostics: &mut Diagnostics) -> Vec<PathBuf> {
    match list_subfolders(dir) {
        Ok(folders) => folders,
        Err(e) => {
            diagnostics.push(DiagnosticKind::Io, e.to_string(), Some(dir));
            Vec::new()
        }
    }
}
