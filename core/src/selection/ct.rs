use crate::api::{DicomRecord, RecordReader};
use crate::diagnostics::Diagnostics;
use crate::layout::files::collect_dicom_files;
use crate::selection::graph::{Link, NodeId, ReferenceGraph};
use std::path::Path;

/// Reads the file that stands for a whole CT series folder
///
/// This is the first file in path order that reads as a CT image.
/// Returns `None` for a folder without one.
pub fn read_series_representative(folder: &Path, diagnostics: &mut Diagnostics) -> Option<DicomRecord> {
    let files = match collect_dicom_files(folder) {
        Ok(files) => files,
        Err(e) => {
            diagnostics.unreadable(folder, e);
            return None;
        }
    };
    for path in files {
        match RecordReader::read(&path) {
            Ok(record) if record.modality.is_image() => return Some(record),
            Ok(record) => diagnostics.unreadable(
                &path,
                format!("{} file in a CT series folder", record.modality),
            ),
            Err(e) => diagnostics.unreadable(&path, e),
        }
    }
    diagnostics.note(format!("no readable CT image in {}", folder.display()));
    None
}

/// Follows the structure set's frame-of-reference chain to a CT series
pub fn resolve_ct_series(
    graph: &ReferenceGraph,
    structure_set: NodeId,
    diagnostics: &mut Diagnostics,
) -> Option<NodeId> {
    let structure_uid = &graph.get(structure_set).sop_instance_uid;
    match graph.ct_series_of(structure_set) {
        Link::Resolved(id) => Some(id),
        Link::Missing(series_uid) => {
            diagnostics.missing_link(format!(
                "RTSTRUCT {} references CT series {} which is not in the session",
                structure_uid, series_uid
            ));
            None
        }
        Link::NotReferenced => {
            diagnostics.missing_link(format!(
                "RTSTRUCT {} has no referenced series in its frame of reference",
                structure_uid
            ));
            None
        }
    }
}
