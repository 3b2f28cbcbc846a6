use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::normalize::{sanitize_roi_names, SideEffect, SideEffectKind};
use crate::selection::graph::{Link, NodeId, ReferenceGraph};

/// Follows the selected plan's structure-set reference
///
/// An absent or dangling reference leaves the slot empty and records a
/// missing link.
pub fn resolve_structure_set(
    graph: &ReferenceGraph,
    plan: NodeId,
    diagnostics: &mut Diagnostics,
) -> Option<NodeId> {
    let plan_uid = &graph.get(plan).sop_instance_uid;
    match graph.structure_set_of(plan) {
        Link::Resolved(id) => Some(id),
        Link::Missing(uid) => {
            diagnostics.missing_link(format!(
                "RTPLAN {} references RTSTRUCT {} which is not in the session",
                plan_uid, uid
            ));
            None
        }
        Link::NotReferenced => {
            diagnostics.missing_link(format!(
                "RTPLAN {} has no ReferencedStructureSetSequence",
                plan_uid
            ));
            None
        }
    }
}

/// Sanitises the ROI names of the selected structure set in place
///
/// The graph node is replaced with the rewritten record. A failed rewrite
/// is logged and leaves the file as it was.
pub fn normalize_structure_set(
    graph: &mut ReferenceGraph,
    structure_set: NodeId,
    diagnostics: &mut Diagnostics,
) -> Option<SideEffect> {
    let record = graph.get(structure_set).clone();
    let path = record.path.clone();
    match sanitize_roi_names(record) {
        Ok(normalized) => {
            let side_effect = normalized.side_effect(SideEffectKind::RoiNamesSanitized);
            graph.replace(structure_set, normalized.record);
            side_effect
        }
        Err(e) => {
            diagnostics.push(
                DiagnosticKind::Io,
                format!("ROI names not sanitised: {}", e),
                Some(&path),
            );
            None
        }
    }
}
