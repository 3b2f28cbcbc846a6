//! Core type definitions for RT treatment records
//!
//! - [`Modality`]: RT object / image modality of a file
//! - [`DoseType`], [`DoseSummationType`], [`DoseClass`]: dose cube classification
//! - [`PlanRejection`]: why a plan candidate lost
//! - [`ImageType`]: ordered DICOM ImageType values
//! - [`PlanTimestamp`]: RTPlanDate + RTPlanTime, chronologically ordered
//! - [`ResolverConfig`]: knobs for session resolution

mod config;
mod enums;
mod image_type;
mod plan_timestamp;
pub mod transfer_syntax;

pub use config::ResolverConfig;
pub use enums::{
    DoseClass, DoseSummationType, DoseType, Modality, PlanRejection, CT_IMAGE_STORAGE,
    MR_IMAGE_STORAGE, RT_DOSE_STORAGE, RT_ION_PLAN_STORAGE, RT_PLAN_STORAGE,
    RT_STRUCTURE_SET_STORAGE,
};
pub use image_type::{ImageType, LOCALIZER_TOKENS};
pub use plan_timestamp::PlanTimestamp;
