use super::Normalized;
use crate::api::DicomRecord;
use crate::error::Result;
use crate::extraction::tags::{get_sequence_items, get_string_value, ROI_NAME, STRUCTURE_SET_ROI_SEQUENCE};
use dicom_core::value::{DataSetSequence, Value};
use dicom_core::{DataElement, PrimitiveValue, VR};
use dicom_object::open_file;
use log::info;
use regex::Regex;
use std::sync::OnceLock;

/// Removes every character that is not an ASCII letter
pub fn sanitize_roi_name(name: &str) -> String {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new("[^a-zA-Z]").expect("Failed to compile regex"));
    re.replace_all(name, "").into_owned()
}

/// Sanitises the ROI names of a structure set in place
///
/// If every name is already sanitised the file is not touched.
///
/// # Errors
///
/// Returns an error if the file cannot be re-opened or written back.
pub fn sanitize_roi_names(record: DicomRecord) -> Result<Normalized> {
    let sanitized: Vec<String> = record
        .roi_names
        .iter()
        .map(|name| sanitize_roi_name(name))
        .collect();
    if sanitized == record.roi_names {
        return Ok(Normalized::unchanged(record));
    }

    let mut obj = open_file(&record.path)?;
    let items: Vec<_> = get_sequence_items(&obj, STRUCTURE_SET_ROI_SEQUENCE)
        .map(|items| items.to_vec())
        .unwrap_or_default()
        .into_iter()
        .map(|mut item| {
            if let Some(name) = get_string_value(&item, ROI_NAME) {
                item.put(DataElement::new(
                    ROI_NAME,
                    VR::LO,
                    PrimitiveValue::from(sanitize_roi_name(&name)),
                ));
            }
            item
        })
        .collect();
    obj.put(DataElement::new(
        STRUCTURE_SET_ROI_SEQUENCE,
        VR::SQ,
        Value::Sequence(DataSetSequence::from(items)),
    ));
    obj.write_to_file(&record.path)?;

    info!(
        "Sanitised {} ROI names in {}",
        record.roi_names.len(),
        record.path.display()
    );
    Ok(Normalized::rewritten(DicomRecord {
        roi_names: sanitized,
        ..record
    }))
}
