pub mod references;
pub mod tags;

pub use references::{
    extract_frame_of_reference_series, extract_radiation_type, extract_referenced_doses,
    extract_referenced_plans, extract_referenced_structure_set, extract_roi_names,
};
pub use tags::*;
