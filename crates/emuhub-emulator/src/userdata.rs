//! Exporting, importing and deleting emulator user data

use crate::{Emulator, EmulatorError};
use emuhub_progress::ProgressHandle;
use std::fs;
use std::path::{Path, PathBuf};

/// Which part of the user directory an operation touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataScope {
    /// The whole user directory
    All,
    /// Only the emulator's save data directories
    Save,
    /// Named top-level folders inside the user directory
    Custom(Vec<String>),
}

/// Result of a data copy
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyOutcome {
    pub files_copied: u64,
}

/// Copy user data out of the emulator's user directory
pub fn export_data(
    emulator: &Emulator,
    scope: &DataScope,
    target: &Path,
    progress: &ProgressHandle,
) -> Result<CopyOutcome, EmulatorError> {
    let user = emulator.user_directory();
    if !user.is_dir() {
        return Err(EmulatorError::MissingData(user.to_path_buf()));
    }

    let title = format!("Exporting {} data", emulator.id().display_name());
    let files_copied = copy_scoped(emulator, scope, user, target, progress, &title)?;

    tracing::info!("Exported {} files to {}", files_copied, target.display());
    Ok(CopyOutcome { files_copied })
}

/// Copy previously exported data back into the emulator's user directory
pub fn import_data(
    emulator: &Emulator,
    scope: &DataScope,
    source: &Path,
    progress: &ProgressHandle,
) -> Result<CopyOutcome, EmulatorError> {
    if !source.is_dir() {
        return Err(EmulatorError::MissingData(source.to_path_buf()));
    }

    let title = format!("Importing {} data", emulator.id().display_name());
    let files_copied = copy_scoped(
        emulator,
        scope,
        source,
        emulator.user_directory(),
        progress,
        &title,
    )?;

    tracing::info!("Imported {} files from {}", files_copied, source.display());
    Ok(CopyOutcome { files_copied })
}

/// Delete user data, returning the directories that were removed
pub fn delete_data(emulator: &Emulator, scope: &DataScope) -> Result<Vec<PathBuf>, EmulatorError> {
    let user = emulator.user_directory();
    let targets: Vec<PathBuf> = match scope {
        DataScope::All => vec![user.to_path_buf()],
        DataScope::Save => emulator
            .save_data_subdirs()
            .iter()
            .map(|sub| user.join(sub))
            .collect(),
        DataScope::Custom(folders) => folders.iter().map(|f| user.join(f)).collect(),
    };

    let mut removed = Vec::new();
    for target in targets {
        if target.is_dir() {
            fs::remove_dir_all(&target)?;
            tracing::info!("Deleted {}", target.display());
            removed.push(target);
        }
    }
    Ok(removed)
}

/// Copy `scope`'s slice of `source` into `target`
///
/// Save data keeps its relative location, so a save export lands under the
/// same subpath on the other side and imports straight back.
fn copy_scoped(
    emulator: &Emulator,
    scope: &DataScope,
    source: &Path,
    target: &Path,
    progress: &ProgressHandle,
    title: &str,
) -> Result<u64, EmulatorError> {
    match scope {
        DataScope::All => copy_tree(source, target, None, progress, title),
        DataScope::Save => {
            let mut copied = 0;
            for sub in emulator.save_data_subdirs() {
                let sub_source = source.join(sub);
                if sub_source.is_dir() {
                    copied += copy_tree(&sub_source, &target.join(sub), None, progress, title)?;
                }
            }
            Ok(copied)
        }
        DataScope::Custom(folders) => copy_tree(source, target, Some(folders), progress, title),
    }
}

/// Copy a directory tree with file-count progress and cancellation
///
/// `include` restricts the copy to the named top-level entries.
fn copy_tree(
    source: &Path,
    dest: &Path,
    include: Option<&[String]>,
    progress: &ProgressHandle,
    title: &str,
) -> Result<u64, EmulatorError> {
    let included = |name: &str| match include {
        Some(names) => names.iter().any(|n| n == name),
        None => true,
    };

    let mut total = 0;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        if !included(&entry.file_name().to_string_lossy()) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            total += count_files(&entry.path())?;
        } else {
            total += 1;
        }
    }

    progress.begin(title, total, "files");
    progress.set_status("Copying...");
    fs::create_dir_all(dest)?;

    let mut copied = 0;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let name = entry.file_name();
        if !included(&name.to_string_lossy()) {
            continue;
        }

        if entry.file_type()?.is_dir() {
            copied += copy_recursive(&entry.path(), &dest.join(&name), progress)?;
        } else {
            if progress.is_cancelled() {
                return Err(EmulatorError::Cancelled);
            }
            fs::copy(entry.path(), dest.join(&name))?;
            copied += 1;
            progress.advance(1);
        }
    }

    progress.finish();
    Ok(copied)
}

fn copy_recursive(
    source: &Path,
    dest: &Path,
    progress: &ProgressHandle,
) -> Result<u64, EmulatorError> {
    fs::create_dir_all(dest)?;

    let mut copied = 0;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let name = entry.file_name();

        if entry.file_type()?.is_dir() {
            copied += copy_recursive(&entry.path(), &dest.join(&name), progress)?;
        } else {
            if progress.is_cancelled() {
                return Err(EmulatorError::Cancelled);
            }
            fs::copy(entry.path(), dest.join(&name))?;
            copied += 1;
            progress.advance(1);
        }
    }
    Ok(copied)
}

fn count_files(dir: &Path) -> Result<u64, EmulatorError> {
    let mut total = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            total += count_files(&entry.path())?;
        } else {
            total += 1;
        }
    }
    Ok(total)
}
