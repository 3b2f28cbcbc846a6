use crate::api::DicomRecord;
use crate::error::{CurateError, Result};
use crate::layout::files::{
    collect_dicom_files, copy_tree, file_name, list_files, list_subfolders, paths_overlap,
};
use crate::session::Session;
use crate::types::{DoseClass, Modality};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

pub const PLAN_FOLDER: &str = "RTPLAN";
pub const STRUCT_FOLDER: &str = "RTSTRUCT";
pub const CT_FOLDER: &str = "RTCT";
pub const DOSE_FOLDER: &str = "RTDOSE";

/// Modality folders of a written session
pub const OUTPUT_FOLDERS: [&str; 4] = [PLAN_FOLDER, STRUCT_FOLDER, CT_FOLDER, DOSE_FOLDER];

pub const USED_PLAN: &str = "1-RTPLAN_Used";
pub const OTHER_PLAN: &str = "Other_RTPLAN";
pub const USED_STRUCT: &str = "1-RTSTRUCT_Used";
pub const OTHER_STRUCT: &str = "Other_RTSTRUCT";
pub const USED_CT_PREFIX: &str = "1-BPLCT_Used_";
pub const OTHER_CT: &str = "Other_CT";
pub const OTHER_DOSE: &str = "Other_RTDOSE";

/// Files written for one session
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "json", derive(serde::Serialize))]
pub struct LayoutSummary {
    pub session_dir: PathBuf,
    /// Copies of resolved artifacts, in write order
    pub used: Vec<PathBuf>,
    /// Copies routed to `Other_*` folders
    pub other: Vec<PathBuf>,
}

/// Writes a resolved session into the canonical output layout
///
/// The four modality folders below `session_dir` are removed first, so
/// the result reflects exactly this run. Resolved artifacts are copied
/// into fixed `1-*_Used` folders; every other input file of the session is
/// copied to the `Other_*` folder of its modality under its original
/// sub-folder name. Input files are never moved or deleted.
///
/// # Errors
///
/// Returns [`CurateError::OverlappingOutput`] without touching anything when
/// `session_dir` is the session input folder or nested with it, and
/// [`CurateError::Io`] on the first directory or copy failure.
pub fn write_session(session: &Session, session_dir: &Path) -> Result<LayoutSummary> {
    if paths_overlap(&session.root, session_dir)? {
        return Err(CurateError::OverlappingOutput {
            input: session.root.clone(),
            output: session_dir.to_path_buf(),
        });
    }
    let mut writer = LayoutWriter {
        summary: LayoutSummary {
            session_dir: session_dir.to_path_buf(),
            ..LayoutSummary::default()
        },
    };
    writer.clear(session_dir)?;

    let plan = session.plan.iter().map(|r| r.path.as_path()).collect::<Vec<_>>();
    writer.write_used(&plan, &session_dir.join(PLAN_FOLDER).join(USED_PLAN))?;
    writer.write_others(
        &session.root.join(Modality::RtPlan.dicom_name()),
        &plan,
        &session_dir.join(PLAN_FOLDER).join(OTHER_PLAN),
    )?;

    let structure = session
        .structure_set
        .iter()
        .map(|r| r.path.as_path())
        .collect::<Vec<_>>();
    writer.write_used(&structure, &session_dir.join(STRUCT_FOLDER).join(USED_STRUCT))?;
    writer.write_others(
        &session.root.join(Modality::RtStruct.dicom_name()),
        &structure,
        &session_dir.join(STRUCT_FOLDER).join(OTHER_STRUCT),
    )?;

    writer.write_ct(session, &session_dir.join(CT_FOLDER))?;

    let mut used_doses = Vec::new();
    for dose in session.doses.used() {
        if let Some(folder) = used_dose_folder(dose.class) {
            writer.write_used(&[dose.record.path.as_path()], &session_dir.join(folder))?;
            used_doses.push(dose.record.path.as_path());
        }
    }
    writer.write_others(
        &session.root.join(Modality::RtDose.dicom_name()),
        &used_doses,
        &session_dir.join(DOSE_FOLDER).join(OTHER_DOSE),
    )?;

    info!(
        "{}: wrote {} used and {} other files to {}",
        session.id,
        writer.summary.used.len(),
        writer.summary.other.len(),
        session_dir.display()
    );
    Ok(writer.summary)
}

struct LayoutWriter {
    summary: LayoutSummary,
}

impl LayoutWriter {
    fn clear(&self, session_dir: &Path) -> Result<()> {
        for folder in OUTPUT_FOLDERS {
            let path = session_dir.join(folder);
            if path.exists() {
                debug!("Removing previous output {}", path.display());
                fs::remove_dir_all(&path).map_err(|e| CurateError::io(&path, e))?;
            }
        }
        Ok(())
    }

    fn write_used(&mut self, files: &[&Path], target_dir: &Path) -> Result<()> {
        for file in files {
            let target = copy_unique(file, target_dir)?;
            self.summary.used.push(target);
        }
        Ok(())
    }

    /// Copies every file below `modality_dir` that is not in `used`
    fn write_others(&mut self, modality_dir: &Path, used: &[&Path], target_dir: &Path) -> Result<()> {
        for folder in list_subfolders(modality_dir)? {
            let destination = target_dir.join(file_name(&folder));
            for file in list_files(&folder)? {
                if used.contains(&file.as_path()) {
                    continue;
                }
                self.summary.other.push(copy_unique(&file, &destination)?);
            }
            for nested in list_subfolders(&folder)? {
                let nested_target = destination.join(file_name(&nested));
                copy_tree(&nested, &nested_target)?;
                self.summary.other.push(nested_target);
            }
        }
        Ok(())
    }

    /// The planning CT folder is copied whole; other series folders go to `Other_CT`
    fn write_ct(&mut self, session: &Session, ct_dir: &Path) -> Result<()> {
        let used_folder = session.ct_folder();
        if let Some(folder) = used_folder {
            let target = ct_dir.join(format!("{}{}", USED_CT_PREFIX, file_name(folder)));
            let files = collect_dicom_files(folder)?;
            let files: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
            self.write_used(&files, &target)?;
        }

        for folder in list_subfolders(&session.root.join(Modality::Ct.dicom_name()))? {
            if Some(folder.as_path()) == used_folder {
                continue;
            }
            let target = ct_dir.join(OTHER_CT).join(file_name(&folder));
            copy_tree(&folder, &target)?;
            self.summary.other.push(target);
        }
        Ok(())
    }
}

/// Copies `file` into `target_dir`, suffixing `_<n>` on a name collision
fn copy_unique(file: &Path, target_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(target_dir).map_err(|e| CurateError::io(target_dir, e))?;
    let name = file_name(file);
    let mut target = target_dir.join(&name);
    let mut n = 1;
    while target.exists() {
        let stem = file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        target = match file.extension() {
            Some(ext) => target_dir.join(format!("{}_{}.{}", stem, n, ext.to_string_lossy())),
            None => target_dir.join(format!("{}_{}", name, n)),
        };
        n += 1;
    }
    fs::copy(file, &target).map_err(|e| CurateError::io(file, e))?;
    Ok(target)
}

/// Output folder a used record lands in, relative to the session output
pub fn used_folder(record: &DicomRecord) -> Option<PathBuf> {
    match record.modality {
        Modality::RtPlan => Some(Path::new(PLAN_FOLDER).join(USED_PLAN)),
        Modality::RtStruct => Some(Path::new(STRUCT_FOLDER).join(USED_STRUCT)),
        Modality::RtDose => used_dose_folder(record.dose_class()),
        Modality::Ct => record
            .folder_name()
            .map(|name| Path::new(CT_FOLDER).join(format!("{}{}", USED_CT_PREFIX, name))),
        Modality::Mr | Modality::Other => None,
    }
}

/// Output folder of a used dose of `class`, relative to the session output
pub fn used_dose_folder(class: DoseClass) -> Option<PathBuf> {
    class
        .used_folder_name()
        .map(|folder| Path::new(DOSE_FOLDER).join(folder))
}
