use crate::error::{CurateError, Result};
use crate::extraction::tags::{
    get_int_value, get_multi_string_value, get_string_value, has_element, ACQUISITION_DATE,
    ACQUISITION_TIME, APPROVAL_STATUS, DOSE_SUMMATION_TYPE, DOSE_TYPE, GRID_FRAME_OFFSET_VECTOR,
    IMAGE_TYPE, INSTANCE_NUMBER, MODALITY, PIXEL_DATA, PLAN_INTENT, RT_PLAN_DATE, RT_PLAN_LABEL,
    RT_PLAN_TIME, SERIES_INSTANCE_UID, SERIES_NUMBER, SOP_CLASS_UID, SOP_INSTANCE_UID,
};
use crate::extraction::{
    extract_frame_of_reference_series, extract_radiation_type, extract_referenced_doses,
    extract_referenced_plans, extract_referenced_structure_set, extract_roi_names,
};
use crate::types::transfer_syntax::is_uncompressed;
use crate::types::{DoseClass, DoseSummationType, DoseType, ImageType, Modality, PlanTimestamp};
use dicom_object::{InMemDicomObject, OpenFileOptions};
use std::path::{Path, PathBuf};

/// Reads DICOM headers into [`DicomRecord`]s
///
/// Reading stops at PixelData, so pixel payloads are never loaded.
///
/// # Example
///
/// ```
/// use rtcurate_core::{Modality, RecordReader};
/// use dicom_object::InMemDicomObject;
/// use dicom_core::{DataElement, PrimitiveValue, VR, Tag};
///
/// let mut dcm = InMemDicomObject::new_empty();
/// dcm.put(DataElement::new(
///     Tag(0x0008, 0x0018), // SOPInstanceUID
///     VR::UI,
///     PrimitiveValue::from("1.2.3.4"),
/// ));
/// dcm.put(DataElement::new(
///     Tag(0x0008, 0x0060), // Modality
///     VR::CS,
///     PrimitiveValue::from("RTDOSE"),
/// ));
/// dcm.put(DataElement::new(
///     Tag(0x3004, 0x0004), // DoseType
///     VR::CS,
///     PrimitiveValue::from("PHYSICAL"),
/// ));
///
/// let record = RecordReader::extract("dose.dcm".into(), &dcm, None).unwrap();
///
/// assert_eq!(record.modality, Modality::RtDose);
/// assert_eq!(record.sop_instance_uid, "1.2.3.4");
/// assert_eq!(record.dose_type.as_deref(), Some("PHYSICAL"));
/// assert_eq!(record.dose_summation_type, None);
/// ```
pub struct RecordReader;

impl RecordReader {
    /// Reads the header of a DICOM file
    ///
    /// # Errors
    ///
    /// Returns [`CurateError::UnreadableFile`] if the file does not parse as
    /// DICOM or lacks the minimal attribute set for its modality.
    pub fn read(path: &Path) -> Result<DicomRecord> {
        let obj = OpenFileOptions::new()
            .read_until(PIXEL_DATA)
            .open_file(path)
            .map_err(|e| CurateError::unreadable(path, e.to_string()))?;
        let transfer_syntax = obj.meta().transfer_syntax().to_string();
        Self::extract(path.to_path_buf(), &obj, Some(transfer_syntax))
    }

    /// Builds a record from an already-opened DICOM object
    pub fn extract(
        path: PathBuf,
        dcm: &InMemDicomObject,
        transfer_syntax_uid: Option<String>,
    ) -> Result<DicomRecord> {
        let sop_class_uid = get_string_value(dcm, SOP_CLASS_UID);
        let modality = get_string_value(dcm, MODALITY)
            .map(|m| Modality::from_str(&m))
            .filter(|m| *m != Modality::Other)
            .or_else(|| sop_class_uid.as_deref().and_then(Modality::from_sop_class))
            .unwrap_or(Modality::Other);

        let sop_instance_uid = match get_string_value(dcm, SOP_INSTANCE_UID) {
            Some(uid) => uid,
            None => return Err(CurateError::unreadable(path, "missing SOPInstanceUID")),
        };

        let record = DicomRecord {
            sop_instance_uid,
            sop_class_uid,
            modality,
            series_instance_uid: get_string_value(dcm, SERIES_INSTANCE_UID),
            series_number: get_int_value(dcm, SERIES_NUMBER),
            instance_number: get_int_value(dcm, INSTANCE_NUMBER),
            image_type: get_multi_string_value(dcm, IMAGE_TYPE).map(ImageType::new),
            acquisition_date: get_string_value(dcm, ACQUISITION_DATE),
            acquisition_time: get_string_value(dcm, ACQUISITION_TIME),
            transfer_syntax_uid: transfer_syntax_uid
                .map(|ts| ts.trim_end_matches(['\0', ' ']).to_string()),
            rt_plan_label: get_string_value(dcm, RT_PLAN_LABEL),
            approval_status: get_string_value(dcm, APPROVAL_STATUS),
            plan_intent: get_string_value(dcm, PLAN_INTENT),
            rt_plan_date: get_string_value(dcm, RT_PLAN_DATE),
            rt_plan_time: get_string_value(dcm, RT_PLAN_TIME),
            radiation_type: extract_radiation_type(dcm),
            referenced_structure_set_uid: extract_referenced_structure_set(dcm),
            referenced_dose_uids: extract_referenced_doses(dcm),
            referenced_plan_uids: extract_referenced_plans(dcm),
            referenced_frame_of_reference_series_uid: extract_frame_of_reference_series(dcm),
            dose_type: get_string_value(dcm, DOSE_TYPE),
            dose_summation_type: get_string_value(dcm, DOSE_SUMMATION_TYPE),
            has_grid_frame_offset_vector: has_element(dcm, GRID_FRAME_OFFSET_VECTOR),
            roi_names: extract_roi_names(dcm),
            path,
        };

        record.check_minimal_attributes()?;
        Ok(record)
    }
}

/// Header attributes of one DICOM file
///
/// Every attribute that a file may legitimately lack is optional; reading a
/// record never fails because of a missing optional attribute.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct DicomRecord {
    /// Path to the DICOM file
    pub path: PathBuf,

    /// SOP Instance UID (identity key)
    pub sop_instance_uid: String,
    pub sop_class_uid: Option<String>,
    pub modality: Modality,

    pub series_instance_uid: Option<String>,
    pub series_number: Option<i32>,
    pub instance_number: Option<i32>,
    pub image_type: Option<ImageType>,
    pub acquisition_date: Option<String>,
    pub acquisition_time: Option<String>,
    pub transfer_syntax_uid: Option<String>,

    // RT Plan
    pub rt_plan_label: Option<String>,
    pub approval_status: Option<String>,
    pub plan_intent: Option<String>,
    pub rt_plan_date: Option<String>,
    pub rt_plan_time: Option<String>,
    pub radiation_type: Option<String>,
    pub referenced_structure_set_uid: Option<String>,
    pub referenced_dose_uids: Vec<String>,

    // RT Structure Set
    pub referenced_frame_of_reference_series_uid: Option<String>,
    pub roi_names: Vec<String>,

    // RT Dose
    pub referenced_plan_uids: Vec<String>,
    pub dose_type: Option<String>,
    pub dose_summation_type: Option<String>,
    pub has_grid_frame_offset_vector: bool,
}

impl DicomRecord {
    /// Minimal attribute set per modality
    fn check_minimal_attributes(&self) -> Result<()> {
        match self.modality {
            Modality::Other => Err(CurateError::unreadable(
                &self.path,
                "neither Modality nor SOPClassUID identify the object",
            )),
            Modality::RtPlan if self.rt_plan_date.is_none() => {
                Err(CurateError::unreadable(&self.path, "RTPLAN without RTPlanDate"))
            }
            m if m.is_image() && self.series_instance_uid.is_none() => Err(
                CurateError::unreadable(&self.path, "image without SeriesInstanceUID"),
            ),
            _ => Ok(()),
        }
    }

    /// Whether pixel data is stored uncompressed
    ///
    /// A record read without file meta (no transfer syntax) counts as uncompressed.
    pub fn is_uncompressed(&self) -> bool {
        self.transfer_syntax_uid
            .as_deref()
            .map(is_uncompressed)
            .unwrap_or(true)
    }

    /// RTPlanDate + RTPlanTime
    pub fn plan_timestamp(&self) -> PlanTimestamp {
        PlanTimestamp::parse(self.rt_plan_date.as_deref(), self.rt_plan_time.as_deref())
    }

    /// Clinical dose classification from DoseType and DoseSummationType
    pub fn dose_class(&self) -> DoseClass {
        DoseClass::classify(
            self.dose_type.as_deref().map(DoseType::from_str),
            self.dose_summation_type
                .as_deref()
                .map(DoseSummationType::from_str),
        )
    }

    /// Name of the folder holding the file
    pub fn folder_name(&self) -> Option<String> {
        self.path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
    }
}
