use dicom_object::InMemDicomObject;

use super::tags::{
    first_item_path, get_sequence_items, get_string_value, BEAM_SEQUENCE, ION_BEAM_SEQUENCE,
    RADIATION_TYPE, REFERENCED_DOSE_SEQUENCE, REFERENCED_FRAME_OF_REFERENCE_SEQUENCE,
    REFERENCED_RT_PLAN_SEQUENCE, REFERENCED_SOP_INSTANCE_UID, REFERENCED_STRUCTURE_SET_SEQUENCE,
    ROI_NAME, RT_REFERENCED_SERIES_SEQUENCE, RT_REFERENCED_STUDY_SEQUENCE, SERIES_INSTANCE_UID,
    STRUCTURE_SET_ROI_SEQUENCE,
};

/// Extracts the structure set referenced by an RT Plan
///
/// Navigates: ReferencedStructureSetSequence[0] → ReferencedSOPInstanceUID
pub fn extract_referenced_structure_set(dcm: &InMemDicomObject) -> Option<String> {
    first_item_path(dcm, &[REFERENCED_STRUCTURE_SET_SEQUENCE])
        .and_then(|item| get_string_value(item, REFERENCED_SOP_INSTANCE_UID))
}

/// Extracts every dose cube referenced by an RT Plan, in sequence order
pub fn extract_referenced_doses(dcm: &InMemDicomObject) -> Vec<String> {
    referenced_instances(dcm, REFERENCED_DOSE_SEQUENCE)
}

/// Extracts the plans an RT Dose points back to
pub fn extract_referenced_plans(dcm: &InMemDicomObject) -> Vec<String> {
    referenced_instances(dcm, REFERENCED_RT_PLAN_SEQUENCE)
}

fn referenced_instances(dcm: &InMemDicomObject, sequence: dicom_core::Tag) -> Vec<String> {
    get_sequence_items(dcm, sequence)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| get_string_value(item, REFERENCED_SOP_INSTANCE_UID))
                .collect()
        })
        .unwrap_or_default()
}

/// Extracts the CT series a structure set was delineated on
///
/// Navigates: ReferencedFrameOfReferenceSequence[0] → RTReferencedStudySequence[0]
/// → RTReferencedSeriesSequence[0] → SeriesInstanceUID
pub fn extract_frame_of_reference_series(dcm: &InMemDicomObject) -> Option<String> {
    first_item_path(
        dcm,
        &[
            REFERENCED_FRAME_OF_REFERENCE_SEQUENCE,
            RT_REFERENCED_STUDY_SEQUENCE,
            RT_REFERENCED_SERIES_SEQUENCE,
        ],
    )
    .and_then(|item| get_string_value(item, SERIES_INSTANCE_UID))
}

/// Extracts ROI names from the StructureSetROISequence
///
/// Items without a name yield an empty string so indices stay aligned
/// with the sequence.
pub fn extract_roi_names(dcm: &InMemDicomObject) -> Vec<String> {
    get_sequence_items(dcm, STRUCTURE_SET_ROI_SEQUENCE)
        .map(|items| {
            items
                .iter()
                .map(|item| get_string_value(item, ROI_NAME).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default()
}

/// Extracts the radiation type of the first beam
///
/// Photon plans carry a BeamSequence, particle plans an IonBeamSequence.
pub fn extract_radiation_type(dcm: &InMemDicomObject) -> Option<String> {
    first_item_path(dcm, &[BEAM_SEQUENCE])
        .or_else(|| first_item_path(dcm, &[ION_BEAM_SEQUENCE]))
        .and_then(|beam| get_string_value(beam, RADIATION_TYPE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::value::{DataSetSequence, Value};
    use dicom_core::{DataElement, PrimitiveValue, Tag, VR};

    fn reference(uid: &str) -> InMemDicomObject {
        InMemDicomObject::from_element_iter([DataElement::new(
            REFERENCED_SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(uid),
        )])
    }

    fn sequence(tag: Tag, items: Vec<InMemDicomObject>) -> InMemDicomObject {
        InMemDicomObject::from_element_iter([DataElement::new(
            tag,
            VR::SQ,
            Value::Sequence(DataSetSequence::from(items)),
        )])
    }

    #[test]
    fn test_referenced_structure_set() {
        let plan = sequence(REFERENCED_STRUCTURE_SET_SEQUENCE, vec![reference("S1")]);
        assert_eq!(extract_referenced_structure_set(&plan).as_deref(), Some("S1"));
    }

    #[test]
    fn test_missing_structure_set_reference() {
        let plan = InMemDicomObject::new_empty();
        assert_eq!(extract_referenced_structure_set(&plan), None);
        assert!(extract_referenced_doses(&plan).is_empty());
    }

    #[test]
    fn test_referenced_doses_keep_order() {
        let plan = sequence(
            REFERENCED_DOSE_SEQUENCE,
            vec![reference("D1"), reference("D2")],
        );
        assert_eq!(extract_referenced_doses(&plan), vec!["D1", "D2"]);
    }

    #[test]
    fn test_radiation_type_falls_back_to_ion_beams() {
        let beam = InMemDicomObject::from_element_iter([DataElement::new(
            RADIATION_TYPE,
            VR::CS,
            PrimitiveValue::from("PROTON"),
        )]);
        let plan = sequence(ION_BEAM_SEQUENCE, vec![beam]);
        assert_eq!(extract_radiation_type(&plan).as_deref(), Some("PROTON"));
    }

    #[test]
    fn test_roi_names_keep_unnamed_items() {
        let named = InMemDicomObject::from_element_iter([DataElement::new(
            ROI_NAME,
            VR::LO,
            PrimitiveValue::from("GTV_1"),
        )]);
        let rtstruct = sequence(
            STRUCTURE_SET_ROI_SEQUENCE,
            vec![named, InMemDicomObject::new_empty()],
        );
        assert_eq!(extract_roi_names(&rtstruct), vec!["GTV_1", ""]);
    }
}
