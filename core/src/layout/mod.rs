//! Output layout and file-system plumbing
//!
//! - [`write_session`]: canonical `1-*_Used` / `Other_*` layout of a resolved session
//! - [`sort_export`]: raw export → `<patient>/<timepoint>/<MODALITY>/...` input layout
//! - [`files`]: sorted directory listings and copy helpers

pub mod files;
mod sorting;
mod writer;

pub use sorting::{short_name, sort_export, SortedFolder, NOT_RT};
pub use writer::{
    used_dose_folder, used_folder, write_session, LayoutSummary, CT_FOLDER, DOSE_FOLDER, OTHER_CT,
    OTHER_DOSE, OTHER_PLAN, OTHER_STRUCT, OUTPUT_FOLDERS, PLAN_FOLDER, STRUCT_FOLDER,
    USED_CT_PREFIX, USED_PLAN, USED_STRUCT,
};
