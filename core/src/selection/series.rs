//! Series integrity filter for diagnostic scan folders
//!
//! A raw scan folder may hold localizer images next to the real series,
//! two series of the same scan (e.g. before and after contrast), or the
//! same acquisition imported twice. The filter reduces it to one
//! coherent series and never adds files.

use crate::api::{DicomRecord, RecordReader};
use crate::diagnostics::Diagnostics;
use crate::error::{CurateError, Result};
use crate::layout::files::{collect_dicom_files, copy_into};
use crate::normalize::{ensure_uncompressed, Decompressor, SideEffect, SideEffectKind};
use crate::types::ImageType;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// Why a file was removed from a scan folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
#[cfg_attr(feature = "json", serde(rename_all = "snake_case"))]
pub enum SeriesDrop {
    /// ImageType, SeriesNumber or InstanceNumber absent
    MissingAttributes,
    /// Localizer, projection or otherwise non-canonical image type
    ExcludedImageType,
    /// Not the highest series number in the folder
    EarlierSeries,
    /// Second copy of a duplicated acquisition
    DuplicateAcquisition,
}

impl fmt::Display for SeriesDrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SeriesDrop::MissingAttributes => "missing ImageType, SeriesNumber or InstanceNumber",
            SeriesDrop::ExcludedImageType => "non-canonical image type",
            SeriesDrop::EarlierSeries => "earlier series number",
            SeriesDrop::DuplicateAcquisition => "duplicate acquisition",
        };
        write!(f, "{}", reason)
    }
}

/// A file the filter removed
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct DroppedFile {
    pub record: DicomRecord,
    pub reason: SeriesDrop,
}

/// Result of [`filter_series`]
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct SeriesSelection {
    /// Surviving files, in path order
    pub kept: Vec<DicomRecord>,
    pub dropped: Vec<DroppedFile>,
}

impl SeriesSelection {
    fn drop_all(&mut self, records: impl IntoIterator<Item = DicomRecord>, reason: SeriesDrop) {
        self.dropped
            .extend(records.into_iter().map(|record| DroppedFile { record, reason }));
    }
}

/// Reduces the files of one scan folder to a single series
///
/// 1. Files lacking ImageType, SeriesNumber or InstanceNumber are dropped.
/// 2. With more than one image type, only the first type in path order
///    that is not a localizer/projection type is kept. If every type is a
///    localizer type the next rule applies instead.
/// 3. Otherwise, with more than one series number, only the highest
///    series number is kept.
/// 4. If the survivors form a single series in which the instance count
///    is exactly twice the distinct instance count, the files are sorted by
///    instance number and the first of every consecutive pair is dropped.
///
/// # Example
///
/// ```
/// use rtcurate_core::diagnostics::Diagnostics;
/// use rtcurate_core::selection::filter_series;
///
/// let mut diagnostics = Diagnostics::default();
/// let selection = filter_series(Vec::new(), &mut diagnostics);
/// assert!(selection.kept.is_empty());
/// ```
pub fn filter_series(records: Vec<DicomRecord>, diagnostics: &mut Diagnostics) -> SeriesSelection {
    let mut records = records;
    records.sort_by(|a, b| a.path.cmp(&b.path));

    let mut selection = SeriesSelection::default();
    let (candidates, incomplete): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| {
        r.image_type.is_some() && r.series_number.is_some() && r.instance_number.is_some()
    });
    for record in &incomplete {
        diagnostics.unreadable(&record.path, SeriesDrop::MissingAttributes);
    }
    selection.drop_all(incomplete, SeriesDrop::MissingAttributes);

    let candidates = match canonical_image_type(&candidates) {
        Some(canonical) => keep_where(candidates, &mut selection, SeriesDrop::ExcludedImageType, |r| {
            r.image_type.as_ref() == Some(&canonical)
        }),
        None => {
            let series: BTreeSet<i32> = candidates.iter().filter_map(|r| r.series_number).collect();
            match series.iter().next_back() {
                Some(&latest) if series.len() > 1 => {
                    keep_where(candidates, &mut selection, SeriesDrop::EarlierSeries, |r| {
                        r.series_number == Some(latest)
                    })
                }
                _ => candidates,
            }
        }
    };

    selection.kept = drop_duplicate_acquisition(candidates, &mut selection);

    for dropped in selection
        .dropped
        .iter()
        .filter(|d| d.reason != SeriesDrop::MissingAttributes)
    {
        diagnostics.superseded(&dropped.record.path, dropped.reason.to_string());
    }
    diagnostics.note(format!(
        "kept {} of {} files",
        selection.kept.len(),
        selection.kept.len() + selection.dropped.len()
    ));
    selection
}

/// First non-localizer type in path order, when more than one type is present
fn canonical_image_type(records: &[DicomRecord]) -> Option<ImageType> {
    let mut seen = Vec::new();
    for image_type in records.iter().filter_map(|r| r.image_type.as_ref()) {
        if !seen.contains(&image_type) {
            seen.push(image_type);
        }
    }
    if seen.len() < 2 {
        return None;
    }
    seen.into_iter().find(|t| !t.is_localizer()).cloned()
}

fn keep_where(
    records: Vec<DicomRecord>,
    selection: &mut SeriesSelection,
    reason: SeriesDrop,
    keep: impl Fn(&DicomRecord) -> bool,
) -> Vec<DicomRecord> {
    let (kept, dropped): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| keep(r));
    selection.drop_all(dropped, reason);
    kept
}

fn drop_duplicate_acquisition(
    records: Vec<DicomRecord>,
    selection: &mut SeriesSelection,
) -> Vec<DicomRecord> {
    let series: HashSet<i32> = records.iter().filter_map(|r| r.series_number).collect();
    let instances: HashSet<i32> = records.iter().filter_map(|r| r.instance_number).collect();
    if series.len() != 1 || records.len() != 2 * instances.len() {
        return records;
    }

    let mut records = records;
    records.sort_by(|a, b| {
        a.instance_number
            .cmp(&b.instance_number)
            .then_with(|| a.path.cmp(&b.path))
    });

    let mut kept = Vec::with_capacity(instances.len());
    let mut duplicates = Vec::with_capacity(instances.len());
    for (position, record) in records.into_iter().enumerate() {
        if position % 2 == 0 {
            duplicates.push(record);
        } else {
            kept.push(record);
        }
    }
    selection.drop_all(duplicates, SeriesDrop::DuplicateAcquisition);

    kept.sort_by(|a, b| a.path.cmp(&b.path));
    kept
}

/// Result of checking one scan folder on disk
#[derive(Debug, Clone)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct ScanCheck {
    pub scan_dir: PathBuf,
    pub output_dir: PathBuf,
    pub selection: SeriesSelection,
    /// Copies written to `output_dir`
    pub copied: Vec<PathBuf>,
    pub side_effects: Vec<SideEffect>,
}

/// Filters a scan folder and copies the surviving files to `output_dir`
///
/// `*.dcm` files are used when present, otherwise `*.IMA` files.
/// Compressed files are decompressed in place before they are read;
/// files that cannot be read or decompressed are left out.
///
/// # Errors
///
/// Returns [`CurateError::NoDicomFiles`] for a folder without DICOM files
/// and [`CurateError::Io`] when the output cannot be written.
pub fn check_scan_folder(
    scan_dir: &Path,
    output_dir: &Path,
    decompressor: &dyn Decompressor,
    diagnostics: &mut Diagnostics,
) -> Result<ScanCheck> {
    let (ima, dcm): (Vec<_>, Vec<_>) = collect_dicom_files(scan_dir)?
        .into_iter()
        .partition(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("ima"))
                .unwrap_or(false)
        });
    let files = if dcm.is_empty() { ima } else { dcm };
    if files.is_empty() {
        return Err(CurateError::NoDicomFiles(scan_dir.to_path_buf()));
    }

    let mut records = Vec::with_capacity(files.len());
    let mut side_effects = Vec::new();
    for path in &files {
        let record = match RecordReader::read(path) {
            Ok(record) => record,
            Err(e) => {
                diagnostics.unreadable(path, e);
                continue;
            }
        };
        match ensure_uncompressed(record, decompressor) {
            Ok(normalized) => {
                side_effects.extend(normalized.side_effect(SideEffectKind::Decompressed));
                records.push(normalized.record);
            }
            Err(e) => diagnostics.codec_failure(path, e),
        }
    }

    let selection = filter_series(records, diagnostics);

    let mut copied = Vec::with_capacity(selection.kept.len());
    for record in &selection.kept {
        copied.push(copy_into(&record.path, output_dir)?);
    }

    Ok(ScanCheck {
        scan_dir: scan_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        selection,
        copied,
        side_effects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::testing::{bare_record, DicomFixture, ReencodingDecompressor, JPEG_BASELINE};
    use crate::types::Modality;
    use rstest::rstest;
    use tempfile::TempDir;

    fn slice(name: &str, image_type: &[&str], series: i32, instance: i32) -> DicomRecord {
        let mut record = bare_record(name, name, Modality::Ct);
        record.image_type = Some(ImageType::new(image_type.iter().copied()));
        record.series_number = Some(series);
        record.instance_number = Some(instance);
        record
    }

    const AXIAL: &[&str] = &["ORIGINAL", "PRIMARY", "AXIAL"];
    const LOCALIZER: &[&str] = &["ORIGINAL", "PRIMARY", "LOCALIZER"];

    fn kept_names(selection: &SeriesSelection) -> Vec<String> {
        selection
            .kept
            .iter()
            .map(|r| r.path.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_single_series_is_unchanged() {
        let input = vec![
            slice("c.dcm", AXIAL, 3, 3),
            slice("a.dcm", AXIAL, 3, 1),
            slice("b.dcm", AXIAL, 3, 2),
        ];
        let selection = filter_series(input, &mut Diagnostics::default());
        assert_eq!(kept_names(&selection), vec!["a.dcm", "b.dcm", "c.dcm"]);
        assert!(selection.dropped.is_empty());
    }

    #[test]
    fn test_localizer_is_removed() {
        let input = vec![
            slice("0.dcm", LOCALIZER, 1, 1),
            slice("1.dcm", AXIAL, 2, 1),
            slice("2.dcm", AXIAL, 2, 2),
        ];
        let mut diagnostics = Diagnostics::default();
        let selection = filter_series(input, &mut diagnostics);

        assert_eq!(kept_names(&selection), vec!["1.dcm", "2.dcm"]);
        assert_eq!(selection.dropped.len(), 1);
        assert_eq!(selection.dropped[0].reason, SeriesDrop::ExcludedImageType);
        assert_eq!(diagnostics.count(DiagnosticKind::Superseded), 1);
    }

    #[test]
    fn test_projection_only_falls_through_to_series_number() {
        let input = vec![
            slice("a.dcm", &["DERIVED", "PROJECTION IMAGE"], 1, 1),
            slice("b.dcm", LOCALIZER, 2, 1),
        ];
        let selection = filter_series(input, &mut Diagnostics::default());
        assert_eq!(kept_names(&selection), vec!["b.dcm"]);
        assert_eq!(selection.dropped[0].reason, SeriesDrop::EarlierSeries);
    }

    #[test]
    fn test_highest_series_number_wins() {
        let input = vec![
            slice("pre1.dcm", AXIAL, 4, 1),
            slice("pre2.dcm", AXIAL, 4, 2),
            slice("post1.dcm", AXIAL, 5, 1),
            slice("post2.dcm", AXIAL, 5, 2),
        ];
        let selection = filter_series(input, &mut Diagnostics::default());
        assert_eq!(kept_names(&selection), vec!["post1.dcm", "post2.dcm"]);
    }

    #[test]
    fn test_duplicate_acquisition_keeps_one_copy() {
        let input = vec![
            slice("a1.dcm", AXIAL, 2, 1),
            slice("a2.dcm", AXIAL, 2, 2),
            slice("b1.dcm", AXIAL, 2, 1),
            slice("b2.dcm", AXIAL, 2, 2),
        ];
        let selection = filter_series(input, &mut Diagnostics::default());
        assert_eq!(kept_names(&selection), vec!["b1.dcm", "b2.dcm"]);
        assert!(selection
            .dropped
            .iter()
            .all(|d| d.reason == SeriesDrop::DuplicateAcquisition));
    }

    #[rstest]
    #[case(&[("a", 1), ("b", 1), ("c", 1), ("d", 2)], &["b", "d"])]
    #[case(&[("x", 2), ("y", 1), ("z", 1), ("w", 2)], &["x", "z"])]
    #[case(&[("a", 3), ("b", 1), ("c", 3), ("d", 1)], &["c", "d"])]
    fn test_duplicate_drop_is_positional(#[case] files: &[(&str, i32)], #[case] expected: &[&str]) {
        let input: Vec<_> = files
            .iter()
            .map(|(name, instance)| slice(name, AXIAL, 7, *instance))
            .collect();
        let selection = filter_series(input, &mut Diagnostics::default());

        assert_eq!(kept_names(&selection), expected);
        let instances: HashSet<i32> = selection
            .kept
            .iter()
            .filter_map(|r| r.instance_number)
            .collect();
        assert_eq!(instances.len(), selection.kept.len());
    }

    #[test]
    fn test_incomplete_files_are_dropped() {
        let mut incomplete = slice("x.dcm", AXIAL, 1, 1);
        incomplete.instance_number = None;
        let input = vec![incomplete, slice("y.dcm", AXIAL, 1, 1)];

        let mut diagnostics = Diagnostics::default();
        let selection = filter_series(input, &mut diagnostics);
        assert_eq!(kept_names(&selection), vec!["y.dcm"]);
        assert_eq!(selection.dropped[0].reason, SeriesDrop::MissingAttributes);
        assert_eq!(diagnostics.count(DiagnosticKind::UnreadableFile), 1);
    }

    #[rstest]
    #[case(vec![(AXIAL, 1, 1), (AXIAL, 1, 2), (AXIAL, 1, 3)])]
    #[case(vec![(LOCALIZER, 1, 1), (AXIAL, 2, 1), (AXIAL, 2, 1), (AXIAL, 2, 2)])]
    #[case(vec![(AXIAL, 1, 1), (AXIAL, 2, 1), (AXIAL, 2, 1), (AXIAL, 3, 1)])]
    #[case(vec![(AXIAL, 1, 1), (AXIAL, 1, 1), (AXIAL, 1, 1), (AXIAL, 1, 2)])]
    fn test_never_returns_more_than_input(#[case] files: Vec<(&[&str], i32, i32)>) {
        let input: Vec<_> = files
            .iter()
            .enumerate()
            .map(|(i, (t, s, n))| slice(&format!("{}.dcm", i), t, *s, *n))
            .collect();
        let total = input.len();
        let selection = filter_series(input.clone(), &mut Diagnostics::default());

        assert!(selection.kept.len() <= total);
        assert_eq!(selection.kept.len() + selection.dropped.len(), total);
        assert!(selection.kept.iter().all(|r| input.contains(r)));
    }

    #[test]
    fn test_check_scan_folder_copies_survivors() {
        let dir = TempDir::new().unwrap();
        let scan = dir.path().join("T1");
        DicomFixture::image("L1", "SER1")
            .image_type(LOCALIZER)
            .series_number(1)
            .instance_number(1)
            .write(&scan, "000.dcm");
        DicomFixture::image("I1", "SER2")
            .image_type(AXIAL)
            .series_number(2)
            .instance_number(1)
            .transfer_syntax(JPEG_BASELINE)
            .write(&scan, "001.dcm");
        DicomFixture::image("I2", "SER2")
            .image_type(AXIAL)
            .series_number(2)
            .instance_number(2)
            .write(&scan, "002.dcm");
        std::fs::write(scan.join("003.dcm"), b"garbage").unwrap();

        let out = dir.path().join("checked");
        let mut diagnostics = Diagnostics::new("T1");
        let check =
            check_scan_folder(&scan, &out, &ReencodingDecompressor, &mut diagnostics).unwrap();

        assert_eq!(check.copied, vec![out.join("001.dcm"), out.join("002.dcm")]);
        assert_eq!(check.side_effects.len(), 1);
        assert_eq!(check.side_effects[0].kind, SideEffectKind::Decompressed);
        assert_eq!(diagnostics.count(DiagnosticKind::UnreadableFile), 1);
        assert!(!out.join("000.dcm").exists());
    }

    #[test]
    fn test_check_scan_folder_falls_back_to_ima() {
        let dir = TempDir::new().unwrap();
        DicomFixture::image("I1", "SER1")
            .image_type(AXIAL)
            .series_number(1)
            .instance_number(1)
            .write(dir.path(), "scan/I1.IMA");

        let out = dir.path().join("out");
        let check = check_scan_folder(
            &dir.path().join("scan"),
            &out,
            &ReencodingDecompressor,
            &mut Diagnostics::default(),
        )
        .unwrap();
        assert_eq!(check.copied, vec![out.join("I1.IMA")]);
    }

    #[test]
    fn test_check_scan_folder_without_dicom_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let result = check_scan_folder(
            dir.path(),
            &dir.path().join("out"),
            &ReencodingDecompressor,
            &mut Diagnostics::default(),
        );
        assert!(matches!(result, Err(CurateError::NoDicomFiles(_))));
    }
}
