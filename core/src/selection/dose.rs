//! Dose cube classification
//!
//! Every RTDOSE record of a session ends up in exactly one
//! [`DoseClass`] bucket. Doses referenced by the selected plan and
//! classified are "used"; the rest go to the side channel.

use crate::api::DicomRecord;
use crate::diagnostics::Diagnostics;
use crate::normalize::{ensure_uncompressed, Decompressor, SideEffect, SideEffectKind};
use crate::selection::graph::{Link, NodeId, ReferenceGraph};
use crate::types::{DoseClass, Modality, ResolverConfig};
use std::collections::HashSet;

/// One RTDOSE record with its classification
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ClassifiedDose {
    pub record: DicomRecord,
    pub class: DoseClass,
    /// Referenced by the selected plan
    pub referenced: bool,
    /// Referenced and classified; copied to a `1-*_Used` folder
    pub used: bool,
    /// Decompression failed; the record was classified as unclassified
    pub codec_failure: bool,
}

/// All RTDOSE records of a session, partitioned by class
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct DosePartition {
    /// In path order
    pub doses: Vec<ClassifiedDose>,
}

impl DosePartition {
    /// Records in one bucket, in path order
    pub fn bucket(&self, class: DoseClass) -> Vec<&DicomRecord> {
        self.doses
            .iter()
            .filter(|d| d.class == class)
            .map(|d| &d.record)
            .collect()
    }

    /// Doses copied to a `1-*_Used` folder
    pub fn used(&self) -> impl Iterator<Item = &ClassifiedDose> {
        self.doses.iter().filter(|d| d.used)
    }

    /// Doses routed to `Other_RTDOSE`
    pub fn unused(&self) -> impl Iterator<Item = &ClassifiedDose> {
        self.doses.iter().filter(|d| !d.used)
    }

    pub fn len(&self) -> usize {
        self.doses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doses.is_empty()
    }

    /// The single dose cube downstream conversion should start from
    ///
    /// Only used doses with a GridFrameOffsetVector are eligible. Physical
    /// buckets come before RBE buckets and plan-level before fraction; on
    /// equal class the first dose in path order wins.
    pub fn reference_dose(&self) -> Option<&DicomRecord> {
        self.used()
            .filter(|d| d.record.has_grid_frame_offset_vector)
            .enumerate()
            .min_by_key(|(position, d)| (d.class, *position))
            .map(|(_, d)| &d.record)
    }
}

/// Classifies every RTDOSE record of the session
///
/// Compressed files are decompressed in place first and the graph node is
/// replaced with the re-read record. A file that cannot be decompressed is
/// kept in the partition as unclassified and never used.
pub fn classify_doses(
    graph: &mut ReferenceGraph,
    plan: Option<NodeId>,
    config: &ResolverConfig,
    decompressor: &dyn Decompressor,
    diagnostics: &mut Diagnostics,
    side_effects: &mut Vec<SideEffect>,
) -> DosePartition {
    let referenced = plan
        .map(|plan| referenced_doses(graph, plan, config, diagnostics))
        .unwrap_or_default();

    let mut partition = DosePartition::default();
    for id in graph.candidates(Modality::RtDose) {
        let record = graph.get(id).clone();
        let path = record.path.clone();
        let (record, codec_failure) = match ensure_uncompressed(record, decompressor) {
            Ok(normalized) => {
                side_effects.extend(normalized.side_effect(SideEffectKind::Decompressed));
                graph.replace(id, normalized.record.clone());
                (normalized.record, false)
            }
            Err(e) => {
                diagnostics.codec_failure(&path, e);
                (graph.get(id).clone(), true)
            }
        };

        let class = if codec_failure {
            DoseClass::Unclassified
        } else {
            record.dose_class()
        };
        let is_referenced = referenced.contains(&id);
        let used = is_referenced && class != DoseClass::Unclassified;
        if is_referenced && !used {
            diagnostics.note(format!(
                "referenced RTDOSE {} is unclassified and goes to Other_RTDOSE",
                record.sop_instance_uid
            ));
        }
        if !used {
            diagnostics.superseded(&record.path, format!("RTDOSE not used ({})", class));
        }

        partition.doses.push(ClassifiedDose {
            record,
            class,
            referenced: is_referenced,
            used,
            codec_failure,
        });
    }
    partition
}

/// Dose nodes the plan points at
///
/// With `dose_back_references` enabled and a plan that lists no doses,
/// doses pointing back at the plan count instead.
fn referenced_doses(
    graph: &ReferenceGraph,
    plan: NodeId,
    config: &ResolverConfig,
    diagnostics: &mut Diagnostics,
) -> HashSet<NodeId> {
    let links = graph.doses_of(plan);
    let plan_uid = &graph.get(plan).sop_instance_uid;

    if links.is_empty() {
        if config.dose_back_references {
            let back: HashSet<NodeId> = graph.doses_referencing(plan).into_iter().collect();
            diagnostics.note(format!(
                "RTPLAN {} lists no doses; {} dose(s) reference it",
                plan_uid,
                back.len()
            ));
            return back;
        }
        diagnostics.missing_link(format!("RTPLAN {} has no ReferencedDoseSequence", plan_uid));
        return HashSet::new();
    }

    let mut referenced = HashSet::new();
    for link in links {
        match link {
            Link::Resolved(id) => {
                referenced.insert(id);
            }
            Link::Missing(uid) => diagnostics.missing_link(format!(
                "RTPLAN {} references RTDOSE {} which is not in the session",
                plan_uid, uid
            )),
            Link::NotReferenced => {}
        }
    }
    referenced
}
