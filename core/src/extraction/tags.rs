use dicom_core::Tag;
use dicom_object::InMemDicomObject;

pub use dicom_dictionary_std::tags::{
    // Core identification
    IMAGE_TYPE, MODALITY, SOP_CLASS_UID, SOP_INSTANCE_UID,
    // Study/series
    ACQUISITION_DATE, ACQUISITION_TIME, INSTANCE_NUMBER, SERIES_INSTANCE_UID, SERIES_NUMBER,
    // References
    REFERENCED_SOP_INSTANCE_UID,
    // RT Plan
    APPROVAL_STATUS, BEAM_SEQUENCE, ION_BEAM_SEQUENCE, PLAN_INTENT, RADIATION_TYPE,
    REFERENCED_DOSE_SEQUENCE, REFERENCED_RT_PLAN_SEQUENCE, REFERENCED_STRUCTURE_SET_SEQUENCE,
    RT_PLAN_DATE, RT_PLAN_LABEL, RT_PLAN_TIME,
    // RT Dose
    DOSE_SUMMATION_TYPE, DOSE_TYPE, GRID_FRAME_OFFSET_VECTOR,
    // RT Structure Set
    REFERENCED_FRAME_OF_REFERENCE_SEQUENCE, ROI_NAME, RT_REFERENCED_SERIES_SEQUENCE,
    RT_REFERENCED_STUDY_SEQUENCE, STRUCTURE_SET_ROI_SEQUENCE,
    // Pixel data
    PIXEL_DATA,
};

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present, cannot be converted to string,
/// or holds only padding
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim_matches(|c: char| c.is_whitespace() || c == '\0').to_string())
        .filter(|s| !s.is_empty())
}

/// Helper to get integer value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to i32
pub fn get_int_value(dcm: &InMemDicomObject, tag: Tag) -> Option<i32> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<i32>().ok())
}

/// Helper to get multi-string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to Vec<String>
pub fn get_multi_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<Vec<String>> {
    dcm.element(tag).ok().and_then(|elem| {
        if let Ok(strs) = elem.to_multi_str() {
            Some(strs.iter().map(|s| s.trim().to_string()).collect())
        } else {
            // Fallback: single string split on the value delimiter
            elem.to_str()
                .ok()
                .map(|s| s.split('\\').map(|part| part.trim().to_string()).collect())
        }
    })
}

/// Returns the items of a sequence element, or `None` if absent or not a sequence
pub fn get_sequence_items(dcm: &InMemDicomObject, tag: Tag) -> Option<&[InMemDicomObject]> {
    dcm.element(tag).ok().and_then(|elem| elem.items())
}

/// Follows a chain of sequences, always taking the first item
///
/// `first_item_path(dcm, &[A, B])` yields `A[0].B[0]`.
pub fn first_item_path<'a>(dcm: &'a InMemDicomObject, path: &[Tag]) -> Option<&'a InMemDicomObject> {
    path.iter().try_fold(dcm, |current, tag| {
        get_sequence_items(current, *tag).and_then(|items| items.first())
    })
}

/// Returns `true` when the element is present, whatever its value
pub fn has_element(dcm: &InMemDicomObject, tag: Tag) -> bool {
    dcm.element(tag).is_ok()
}
