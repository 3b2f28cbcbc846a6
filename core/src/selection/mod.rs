//! Candidate selection and reference resolution
//!
//! The session's records are held in a [`ReferenceGraph`]. Each step picks
//! from a candidate set or follows one kind of reference:
//!
//! - [`select_plan`]: approval/intent policy, then recency
//! - [`resolve_structure_set`]: plan → structure set
//! - [`resolve_ct_series`]: structure set → planning CT series
//! - [`classify_doses`]: dose cubes, partitioned by class
//!
//! [`filter_series`] runs independently on diagnostic scan folders.

mod ct;
mod dose;
mod graph;
mod plan;
mod series;
mod structure;

pub use ct::{read_series_representative, resolve_ct_series};
pub use dose::{classify_doses, ClassifiedDose, DosePartition};
pub use graph::{Link, NodeId, ReferenceGraph};
pub use plan::{select_plan, PlanSelection};
pub use series::{check_scan_folder, filter_series, DroppedFile, ScanCheck, SeriesDrop, SeriesSelection};
pub use structure::{normalize_structure_set, resolve_structure_set};
