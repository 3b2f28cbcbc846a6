//! Synthetic DICOM files for tests

use crate::api::DicomRecord;
use crate::error::{CurateError, Result};
use crate::extraction::tags::*;
use crate::normalize::Decompressor;
use crate::types::transfer_syntax::EXPLICIT_VR_LITTLE_ENDIAN;
use crate::types::{
    Modality, CT_IMAGE_STORAGE, RT_DOSE_STORAGE, RT_PLAN_STORAGE, RT_STRUCTURE_SET_STORAGE,
};
use dicom_core::value::{DataSetSequence, Value};
use dicom_core::{DataElement, PrimitiveValue, Tag, VR};
use dicom_object::{open_file, FileMetaTableBuilder, InMemDicomObject};
use std::path::{Path, PathBuf};

/// JPEG Baseline (Process 1), a compressed transfer syntax
pub const JPEG_BASELINE: &str = "1.2.840.10008.1.2.4.50";

/// Builder for a DICOM file written to disk
pub struct DicomFixture {
    obj: InMemDicomObject,
    transfer_syntax: String,
}

impl DicomFixture {
    fn new(sop_uid: &str, sop_class: &str, modality: &str) -> Self {
        let mut fixture = Self {
            obj: InMemDicomObject::new_empty(),
            transfer_syntax: EXPLICIT_VR_LITTLE_ENDIAN.to_string(),
        };
        fixture.put_str(SOP_CLASS_UID, VR::UI, sop_class);
        fixture.put_str(SOP_INSTANCE_UID, VR::UI, sop_uid);
        fixture.put_str(MODALITY, VR::CS, modality);
        fixture
    }

    pub fn plan(sop_uid: &str, date: &str, time: &str) -> Self {
        let mut fixture = Self::new(sop_uid, RT_PLAN_STORAGE, "RTPLAN");
        fixture.put_str(RT_PLAN_DATE, VR::DA, date);
        fixture.put_str(RT_PLAN_TIME, VR::TM, time);
        fixture
    }

    pub fn structure_set(sop_uid: &str) -> Self {
        Self::new(sop_uid, RT_STRUCTURE_SET_STORAGE, "RTSTRUCT")
    }

    pub fn dose(sop_uid: &str, dose_type: &str, summation: &str) -> Self {
        let mut fixture = Self::new(sop_uid, RT_DOSE_STORAGE, "RTDOSE");
        fixture.put_str(DOSE_TYPE, VR::CS, dose_type);
        fixture.put_str(DOSE_SUMMATION_TYPE, VR::CS, summation);
        fixture
    }

    pub fn image(sop_uid: &str, series_uid: &str) -> Self {
        let mut fixture = Self::new(sop_uid, CT_IMAGE_STORAGE, "CT");
        fixture.put_str(SERIES_INSTANCE_UID, VR::UI, series_uid);
        fixture
    }

    fn put_str(&mut self, tag: Tag, vr: VR, value: &str) {
        if !value.is_empty() {
            self.obj
                .put(DataElement::new(tag, vr, PrimitiveValue::from(value)));
        }
    }

    fn put_sequence(&mut self, tag: Tag, items: Vec<InMemDicomObject>) {
        self.obj.put(DataElement::new(
            tag,
            VR::SQ,
            Value::Sequence(DataSetSequence::from(items)),
        ));
    }

    fn reference(uid: &str) -> InMemDicomObject {
        InMemDicomObject::from_element_iter([DataElement::new(
            REFERENCED_SOP_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(uid),
        )])
    }

    pub fn approval(mut self, status: &str) -> Self {
        self.put_str(APPROVAL_STATUS, VR::CS, status);
        self
    }

    pub fn intent(mut self, intent: &str) -> Self {
        self.put_str(PLAN_INTENT, VR::CS, intent);
        self
    }

    pub fn structure_set_ref(mut self, uid: &str) -> Self {
        self.put_sequence(REFERENCED_STRUCTURE_SET_SEQUENCE, vec![Self::reference(uid)]);
        self
    }

    pub fn dose_refs(mut self, uids: &[&str]) -> Self {
        let items = uids.iter().map(|uid| Self::reference(uid)).collect();
        self.put_sequence(REFERENCED_DOSE_SEQUENCE, items);
        self
    }

    pub fn plan_refs(mut self, uids: &[&str]) -> Self {
        let items = uids.iter().map(|uid| Self::reference(uid)).collect();
        self.put_sequence(REFERENCED_RT_PLAN_SEQUENCE, items);
        self
    }

    pub fn radiation_type(mut self, radiation: &str) -> Self {
        let beam = InMemDicomObject::from_element_iter([DataElement::new(
            RADIATION_TYPE,
            VR::CS,
            PrimitiveValue::from(radiation),
        )]);
        let sequence = if radiation == "PHOTON" || radiation == "ELECTRON" {
            BEAM_SEQUENCE
        } else {
            ION_BEAM_SEQUENCE
        };
        self.put_sequence(sequence, vec![beam]);
        self
    }

    pub fn frame_of_reference_series(mut self, series_uid: &str) -> Self {
        let series = InMemDicomObject::from_element_iter([DataElement::new(
            SERIES_INSTANCE_UID,
            VR::UI,
            PrimitiveValue::from(series_uid),
        )]);
        let study = InMemDicomObject::from_element_iter([DataElement::new(
            RT_REFERENCED_SERIES_SEQUENCE,
            VR::SQ,
            Value::Sequence(DataSetSequence::from(vec![series])),
        )]);
        let frame = InMemDicomObject::from_element_iter([DataElement::new(
            RT_REFERENCED_STUDY_SEQUENCE,
            VR::SQ,
            Value::Sequence(DataSetSequence::from(vec![study])),
        )]);
        self.put_sequence(REFERENCED_FRAME_OF_REFERENCE_SEQUENCE, vec![frame]);
        self
    }

    pub fn roi_names(mut self, names: &[&str]) -> Self {
        let items = names
            .iter()
            .map(|name| {
                InMemDicomObject::from_element_iter([DataElement::new(
                    ROI_NAME,
                    VR::LO,
                    PrimitiveValue::from(*name),
                )])
            })
            .collect();
        self.put_sequence(STRUCTURE_SET_ROI_SEQUENCE, items);
        self
    }

    pub fn grid_frame_offsets(mut self) -> Self {
        self.put_str(GRID_FRAME_OFFSET_VECTOR, VR::DS, "0\\2.5\\5");
        self
    }

    pub fn image_type(mut self, values: &[&str]) -> Self {
        let strs: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        self.obj.put(DataElement::new(
            IMAGE_TYPE,
            VR::CS,
            PrimitiveValue::Strs(strs.into()),
        ));
        self
    }

    pub fn series_number(mut self, number: i32) -> Self {
        self.put_str(SERIES_NUMBER, VR::IS, &number.to_string());
        self
    }

    pub fn instance_number(mut self, number: i32) -> Self {
        self.put_str(INSTANCE_NUMBER, VR::IS, &number.to_string());
        self
    }

    pub fn modality(mut self, modality: &str) -> Self {
        self.put_str(MODALITY, VR::CS, modality);
        self
    }

    pub fn transfer_syntax(mut self, uid: &str) -> Self {
        self.transfer_syntax = uid.to_string();
        self
    }

    /// Writes the file under `root/relative`, creating parent folders
    pub fn write(self, root: &Path, relative: &str) -> PathBuf {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        self.obj
            .with_meta(FileMetaTableBuilder::new().transfer_syntax(self.transfer_syntax))
            .unwrap()
            .write_to_file(&path)
            .unwrap();
        path
    }
}

/// Decompressor stub that re-encodes the file as Explicit VR Little Endian
#[derive(Debug, Default)]
pub struct ReencodingDecompressor;

impl Decompressor for ReencodingDecompressor {
    fn decompress(&self, path: &Path) -> Result<()> {
        let obj = open_file(path)?;
        obj.into_inner()
            .with_meta(FileMetaTableBuilder::new().transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN))
            .map_err(|e| CurateError::DicomWrite(e.to_string()))?
            .write_to_file(path)?;
        Ok(())
    }
}

/// Decompressor stub that always fails
#[derive(Debug, Default)]
pub struct FailingDecompressor;

impl Decompressor for FailingDecompressor {
    fn decompress(&self, path: &Path) -> Result<()> {
        Err(CurateError::CodecFailure {
            path: path.to_path_buf(),
            reason: "codec not available".to_string(),
        })
    }
}

/// Relative paths of every file under `root`, sorted
pub fn list_tree(root: &Path) -> Vec<String> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<String>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(&path, root, out);
            } else if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

/// In-memory record with only path, UID and modality set
pub fn bare_record(path: &str, uid: &str, modality: Modality) -> DicomRecord {
    DicomRecord {
        path: PathBuf::from(path),
        sop_instance_uid: uid.to_string(),
        sop_class_uid: None,
        modality,
        series_instance_uid: None,
        series_number: None,
        instance_number: None,
        image_type: None,
        acquisition_date: None,
        acquisition_time: None,
        transfer_syntax_uid: None,
        rt_plan_label: None,
        approval_status: None,
        plan_intent: None,
        rt_plan_date: None,
        rt_plan_time: None,
        radiation_type: None,
        referenced_structure_set_uid: None,
        referenced_dose_uids: Vec::new(),
        referenced_frame_of_reference_series_uid: None,
        roi_names: Vec::new(),
        referenced_plan_uids: Vec::new(),
        dose_type: None,
        dose_summation_type: None,
        has_grid_frame_offset_vector: false,
    }
}
