use crate::diagnostics::Diagnostics;
use crate::selection::graph::{NodeId, ReferenceGraph};
use crate::types::{Modality, PlanRejection, PlanTimestamp, ResolverConfig};
use std::collections::BTreeMap;

/// Outcome of plan selection for one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanSelection {
    pub selected: Option<NodeId>,
    /// Every other plan with the reason it lost, in path order
    pub rejected: Vec<(NodeId, PlanRejection)>,
    /// Number of plans per radiation type (`UNKNOWN` when absent)
    pub radiation_types: BTreeMap<String, usize>,
}

/// Selects the treatment plan of a session
///
/// A plan qualifies when its ApprovalStatus and PlanIntent match the
/// configured values; an absent attribute matches, and an empty configured
/// value accepts anything. The most recent qualifying plan by RTPlanDate
/// and RTPlanTime wins. On an exact tie the plan that comes last in path
/// order wins.
pub fn select_plan(
    graph: &ReferenceGraph,
    config: &ResolverConfig,
    diagnostics: &mut Diagnostics,
) -> PlanSelection {
    let candidates = graph.candidates(Modality::RtPlan);
    let mut selection = PlanSelection {
        radiation_types: group_radiation_types(graph, &candidates),
        ..PlanSelection::default()
    };

    if candidates.is_empty() {
        diagnostics.note("no RTPLAN found");
        return selection;
    }
    if selection.radiation_types.len() > 1 {
        let groups: Vec<String> = selection
            .radiation_types
            .iter()
            .map(|(radiation, count)| format!("{} ({})", radiation, count))
            .collect();
        diagnostics.note(format!("plans span several radiation types: {}", groups.join(", ")));
    }

    let mut best: Option<(NodeId, PlanTimestamp)> = None;
    let mut qualifying = Vec::new();
    for id in candidates {
        let plan = graph.get(id);
        if let Some(rejection) = qualification(plan.approval_status.as_deref(), plan.plan_intent.as_deref(), config) {
            selection.rejected.push((id, rejection));
            continue;
        }
        qualifying.push(id);
        let timestamp = plan.plan_timestamp();
        match &best {
            Some((_, best_timestamp)) if timestamp < *best_timestamp => {}
            _ => best = Some((id, timestamp)),
        }
    }

    match best {
        Some((winner, timestamp)) => {
            selection.selected = Some(winner);
            selection.rejected.extend(
                qualifying
                    .into_iter()
                    .filter(|id| *id != winner)
                    .map(|id| (id, PlanRejection::Superseded)),
            );
            selection.rejected.sort_by_key(|(id, _)| *id);
            diagnostics.note(format!(
                "selected RTPLAN {} ({})",
                graph.get(winner).sop_instance_uid,
                timestamp
            ));
        }
        None => diagnostics.note("no RTPLAN qualifies"),
    }

    for (id, rejection) in &selection.rejected {
        diagnostics.superseded(&graph.get(*id).path, rejection.to_string());
    }
    selection
}

/// Returns why a plan does not qualify, or `None` if it does
fn qualification(
    approval: Option<&str>,
    intent: Option<&str>,
    config: &ResolverConfig,
) -> Option<PlanRejection> {
    if !matches_requirement(approval, &config.required_approval) {
        return Some(PlanRejection::NotApproved(approval.unwrap_or_default().to_string()));
    }
    if !matches_requirement(intent, &config.required_intent) {
        return Some(PlanRejection::NotCurative(intent.unwrap_or_default().to_string()));
    }
    None
}

fn matches_requirement(value: Option<&str>, required: &str) -> bool {
    required.is_empty()
        || value
            .map(|v| v.trim().eq_ignore_ascii_case(required))
            .unwrap_or(true)
}

fn group_radiation_types(graph: &ReferenceGraph, plans: &[NodeId]) -> BTreeMap<String, usize> {
    let mut groups = BTreeMap::new();
    for id in plans {
        let radiation = graph
            .get(*id)
            .radiation_type
            .clone()
            .unwrap_or_else(|| "UNKNOWN".to_string());
        *groups.entry(radiation).or_insert(0) += 1;
    }
    groups
}
