//! File-system helpers shared by the resolver and the layout writer
//!
//! Every listing is sorted by path so results never depend on the order
//! in which the file system enumerates directory entries.

use crate::error::{CurateError, Result};
use log::debug;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Collects the DICOM files directly inside `directory`, sorted by path
///
/// Files with a `.dcm`, `.dicom` or `.ima` extension (any case) are
/// accepted; files without an extension are accepted when they carry the
/// DICOM preamble.
pub fn collect_dicom_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(directory).map_err(|e| CurateError::io(directory, e))? {
        let path = entry.map_err(|e| CurateError::io(directory, e))?.path();
        if !path.is_file() {
            continue;
        }
        match path.extension() {
            Some(ext) => {
                if ext.eq_ignore_ascii_case("dcm")
                    || ext.eq_ignore_ascii_case("dicom")
                    || ext.eq_ignore_ascii_case("ima")
                {
                    files.push(path);
                }
            }
            None => {
                if is_dicom_file(&path) {
                    debug!("Found headerless DICOM file: {}", path.display());
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Checks if a file has a DICOM header
///
/// DICOM files typically have:
/// - 128-byte preamble
/// - 4-byte "DICM" magic string at offset 128
pub fn is_dicom_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = [0u8; 132];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[128..132] == b"DICM",
        Err(_) => false,
    }
}

/// Sub-directories of `directory`, sorted by path
///
/// A missing directory yields an empty list.
pub fn list_subfolders(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Ok(Vec::new());
    }
    let mut folders = Vec::new();
    for entry in fs::read_dir(directory).map_err(|e| CurateError::io(directory, e))? {
        let path = entry.map_err(|e| CurateError::io(directory, e))?.path();
        if path.is_dir() {
            folders.push(path);
        }
    }
    folders.sort();
    Ok(folders)
}

/// Regular files directly inside `directory`, sorted by path
pub fn list_files(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(directory).map_err(|e| CurateError::io(directory, e))? {
        let path = entry.map_err(|e| CurateError::io(directory, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Final path component as a string
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Copies `file` into `target_dir` under its own name, creating the directory
pub fn copy_into(file: &Path, target_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(target_dir).map_err(|e| CurateError::io(target_dir, e))?;
    let target = target_dir.join(file_name(file));
    fs::copy(file, &target).map_err(|e| CurateError::io(file, e))?;
    Ok(target)
}

/// Recursively copies `source` to `target`
pub fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    fs::create_dir_all(target).map_err(|e| CurateError::io(target, e))?;
    for entry in fs::read_dir(source).map_err(|e| CurateError::io(source, e))? {
        let path = entry.map_err(|e| CurateError::io(source, e))?.path();
        let destination = target.join(file_name(&path));
        if path.is_dir() {
            copy_tree(&path, &destination)?;
        } else {
            fs::copy(&path, &destination).map_err(|e| CurateError::io(&path, e))?;
        }
    }
    Ok(())
}

/// Absolute form of `path` with symlinks resolved
///
/// The path does not need to exist: the deepest existing ancestor is
/// canonicalized and the remaining components are appended.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(canonical) => {
                return Ok(missing
                    .iter()
                    .rev()
                    .fold(canonical, |acc: PathBuf, part| acc.join(part)))
            }
            Err(e) => match (existing.parent(), existing.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    existing = if parent.as_os_str().is_empty() {
                        Path::new(".")
                    } else {
                        parent
                    };
                }
                _ => return Err(CurateError::io(path, e)),
            },
        }
    }
}

/// True when `a` and `b` are the same directory or one lies inside the other
pub fn paths_overlap(a: &Path, b: &Path) -> Result<bool> {
    let a = absolute_path(a)?;
    let b = absolute_path(b)?;
    Ok(a.starts_with(&b) || b.starts_with(&a))
}
