//! Explicit reference graph of one session
//!
//! Records live in an arena ordered by path. UID references embedded in
//! the records are resolved by lookup in two indices: SOPInstanceUID for
//! plan, structure set and dose links, SeriesInstanceUID for the
//! structure set to CT link.

use crate::api::DicomRecord;
use crate::types::Modality;
use std::collections::HashMap;

/// Index of a record in a [`ReferenceGraph`]
pub type NodeId = usize;

/// Outcome of following one reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Link {
    /// The target is in the session
    Resolved(NodeId),
    /// The source names a UID that no record in the session carries
    Missing(String),
    /// The source carries no reference of this kind
    NotReferenced,
}

impl Link {
    /// The resolved node, if any
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Link::Resolved(id) => Some(*id),
            Link::Missing(_) | Link::NotReferenced => None,
        }
    }
}

/// Arena of session records with UID indices
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    nodes: Vec<DicomRecord>,
    by_uid: HashMap<String, Vec<NodeId>>,
    by_series: HashMap<String, Vec<NodeId>>,
}

impl ReferenceGraph {
    /// Builds the graph, ordering nodes by path
    ///
    /// The order in which `records` arrive has no influence on node ids,
    /// so every traversal is independent of directory enumeration order.
    pub fn from_records(records: impl IntoIterator<Item = DicomRecord>) -> Self {
        let mut nodes: Vec<DicomRecord> = records.into_iter().collect();
        nodes.sort_by(|a, b| a.path.cmp(&b.path));

        let mut graph = Self::default();
        for record in nodes {
            let id = graph.nodes.len();
            graph
                .by_uid
                .entry(record.sop_instance_uid.clone())
                .or_default()
                .push(id);
            if record.modality.is_image() {
                if let Some(series) = &record.series_instance_uid {
                    graph.by_series.entry(series.clone()).or_default().push(id);
                }
            }
            graph.nodes.push(record);
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The record behind `id`
    pub fn get(&self, id: NodeId) -> &DicomRecord {
        &self.nodes[id]
    }

    /// Replaces a record after an in-place rewrite of its file
    ///
    /// The UIDs of a file never change when it is normalised, so the
    /// indices stay valid.
    pub fn replace(&mut self, id: NodeId, record: DicomRecord) {
        debug_assert_eq!(self.nodes[id].sop_instance_uid, record.sop_instance_uid);
        self.nodes[id] = record;
    }

    /// All nodes of one modality, in path order
    pub fn candidates(&self, modality: Modality) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, record)| record.modality == modality)
            .map(|(id, _)| id)
            .collect()
    }

    /// First node in path order with this SOPInstanceUID and modality
    ///
    /// Accidental duplicate imports share a UID; the first copy wins.
    pub fn lookup(&self, uid: &str, modality: Modality) -> Option<NodeId> {
        self.by_uid
            .get(uid)?
            .iter()
            .copied()
            .find(|id| self.nodes[*id].modality == modality)
    }

    /// First image node in path order belonging to this series
    pub fn lookup_series(&self, series_uid: &str, modality: Modality) -> Option<NodeId> {
        self.by_series
            .get(series_uid)?
            .iter()
            .copied()
            .find(|id| self.nodes[*id].modality == modality)
    }

    /// Plan → structure set
    pub fn structure_set_of(&self, plan: NodeId) -> Link {
        match &self.nodes[plan].referenced_structure_set_uid {
            Some(uid) => self.link(uid, self.lookup(uid, Modality::RtStruct)),
            None => Link::NotReferenced,
        }
    }

    /// Structure set → planning CT series
    pub fn ct_series_of(&self, structure_set: NodeId) -> Link {
        match &self.nodes[structure_set].referenced_frame_of_reference_series_uid {
            Some(uid) => self.link(uid, self.lookup_series(uid, Modality::Ct)),
            None => Link::NotReferenced,
        }
    }

    /// Plan → dose cubes, one link per referenced UID
    pub fn doses_of(&self, plan: NodeId) -> Vec<Link> {
        self.nodes[plan]
            .referenced_dose_uids
            .iter()
            .map(|uid| self.link(uid, self.lookup(uid, Modality::RtDose)))
            .collect()
    }

    /// Dose cubes whose ReferencedRTPlanSequence points at `plan`
    pub fn doses_referencing(&self, plan: NodeId) -> Vec<NodeId> {
        let plan_uid = &self.nodes[plan].sop_instance_uid;
        self.candidates(Modality::RtDose)
            .into_iter()
            .filter(|id| self.nodes[*id].referenced_plan_uids.contains(plan_uid))
            .collect()
    }

    fn link(&self, uid: &str, target: Option<NodeId>) -> Link {
        match target {
            Some(id) => Link::Resolved(id),
            None => Link::Missing(uid.to_string()),
        }
    }
}
