//! Sorting of raw exports into the session input layout
//!
//! A raw export holds `<patient>/<timepoint>/<image-folder>` with folder
//! names such as `1-RTPLAN-83427` or `-CT 3mm`. Each image folder is
//! copied to `<patient>/<timepoint>/<MODALITY>/<short-name>`.

use crate::api::RecordReader;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::layout::files::{collect_dicom_files, copy_tree, file_name, list_subfolders};
use crate::types::Modality;
use log::info;
use std::path::{Path, PathBuf};

/// Modality folder for image folders that are not part of a treatment record
pub const NOT_RT: &str = "NOT_RT";

/// One image folder copied by [`sort_export`]
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SortedFolder {
    pub source: PathBuf,
    pub target: PathBuf,
    pub modality: String,
}

/// Copies every image folder of a raw export into the input layout
///
/// The modality is read from the first readable DICOM file of a folder.
/// Folders without one are skipped and logged. The export is never
/// modified.
///
/// # Errors
///
/// Returns [`crate::CurateError::Io`] if a folder cannot be listed or copied.
pub fn sort_export(input: &Path, output: &Path, diagnostics: &mut Diagnostics) -> Result<Vec<SortedFolder>> {
    let mut sorted = Vec::new();
    for patient in list_subfolders(input)? {
        for timepoint in list_subfolders(&patient)? {
            let session_out = output.join(file_name(&patient)).join(file_name(&timepoint));
            for image in list_subfolders(&timepoint)? {
                let Some(modality) = folder_modality(&image, diagnostics)? else {
                    continue;
                };
                let modality_dir = session_out.join(modality);
                let target = unique_target(&modality_dir, &short_name(&file_name(&image)));
                copy_tree(&image, &target)?;
                info!("Sorted {} into {}", image.display(), target.display());
                sorted.push(SortedFolder {
                    source: image,
                    target,
                    modality: modality.to_string(),
                });
            }
        }
    }
    Ok(sorted)
}

/// Output modality folder of an image folder
fn folder_modality(folder: &Path, diagnostics: &mut Diagnostics) -> Result<Option<&'static str>> {
    for path in collect_dicom_files(folder)? {
        match RecordReader::read(&path) {
            Ok(record) => {
                let name = match record.modality {
                    Modality::RtPlan | Modality::RtStruct | Modality::RtDose | Modality::Ct => {
                        record.modality.dicom_name()
                    }
                    Modality::Mr | Modality::Other => NOT_RT,
                };
                return Ok(Some(name));
            }
            Err(e) => diagnostics.unreadable(&path, e),
        }
    }
    diagnostics.note(format!("no readable DICOM file in {}, not sorted", folder.display()));
    Ok(None)
}

/// Part of a folder name before the first `-`, or `image` if that is empty
pub fn short_name(folder_name: &str) -> String {
    match folder_name.split('-').next() {
        Some(prefix) if !prefix.is_empty() => prefix.to_string(),
        _ => "image".to_string(),
    }
}

/// `<dir>/<name>`, or `<dir>/<name>_<n>` with the first free `n`
fn unique_target(dir: &Path, name: &str) -> PathBuf {
    let mut target = dir.join(name);
    let mut n = 1;
    while target.exists() {
        target = dir.join(format!("{}_{}", name, n));
        n += 1;
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{list_tree, DicomFixture};
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("1-RTPLAN-83427", "1")]
    #[case("-CT 3mm", "image")]
    #[case("planning", "planning")]
    #[case("", "image")]
    fn test_short_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(short_name(input), expected);
    }

    #[test]
    fn test_sort_export() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        DicomFixture::plan("P1", "20200101", "")
            .write(input.path(), "P001/T0/1-plan-1/P1.dcm");
        DicomFixture::structure_set("S1")
            .modality("RTSS")
            .write(input.path(), "P001/T0/1-struct-2/S1.dcm");
        DicomFixture::image("I1", "SER1")
            .write(input.path(), "P001/T0/-ct/I1.dcm");
        DicomFixture::image("M1", "SER2")
            .modality("MR")
            .write(input.path(), "P001/T0/7-t1/M1.dcm");
        std::fs::create_dir_all(input.path().join("P001/T0/empty")).unwrap();

        let mut diagnostics = Diagnostics::default();
        let sorted = sort_export(input.path(), output.path(), &mut diagnostics).unwrap();
        assert_eq!(sorted.len(), 4);

        assert_eq!(
            list_tree(output.path()),
            vec![
                "P001/T0/CT/image/I1.dcm",
                "P001/T0/NOT_RT/7/M1.dcm",
                "P001/T0/RTPLAN/1/P1.dcm",
                "P001/T0/RTSTRUCT/1/S1.dcm",
            ]
        );
        assert!(input.path().join("P001/T0/1-plan-1/P1.dcm").exists());
    }

    #[test]
    fn test_name_collision_gets_suffix() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        DicomFixture::dose("D1", "PHYSICAL", "PLAN")
            .write(input.path(), "P/T/1-dose-a/D1.dcm");
        DicomFixture::dose("D2", "EFFECTIVE", "PLAN")
            .write(input.path(), "P/T/1-dose-b/D2.dcm");

        sort_export(input.path(), output.path(), &mut Diagnostics::default()).unwrap();
        assert_eq!(
            list_tree(output.path()),
            vec!["P/T/RTDOSE/1/D1.dcm", "P/T/RTDOSE/1_1/D2.dcm"]
        );
    }
}
