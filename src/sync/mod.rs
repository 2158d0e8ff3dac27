//! Directory synchronizer - rebuilds a distribution tree from a source tree
//!
//! The destination is wiped and recreated, then the source is walked level by
//! level: regular files of a directory are copied before its subdirectories
//! are entered. Entries are visited in name order.
//!
//! Limitation: symbolic links and special files are skipped.
//!
//! Any failure aborts the walk immediately. Whatever was copied so far stays
//! in place; there is no rollback.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while synchronizing, each naming the offending path
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cannot remove previous destination {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot open file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot copy file {path}: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("destination {dest} lies inside source {source_dir}")]
    DestinationInsideSource { source_dir: PathBuf, dest: PathBuf },

    #[error("source {source_dir} lies inside destination {dest}")]
    SourceInsideDestination { source_dir: PathBuf, dest: PathBuf },
}

/// What a synchronization copied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Mirror `source` into a fresh `dest`
///
/// `source` must exist and `dest`'s parent must exist. Anything previously at
/// `dest` is removed first.
pub fn sync(source: &Path, dest: &Path) -> Result<SyncStats, SyncError> {
    debug!("Synchronizing {} into {}", source.display(), dest.display());

    reject_nested(source, dest)?;
    clear_destination(dest)?;
    fs::create_dir(dest).map_err(|e| SyncError::CreateDir {
        path: dest.to_path_buf(),
        source: e,
    })?;

    let mut stats = SyncStats::default();
    copy_tree(source, dest, &mut stats)?;

    debug!(
        "Synchronized {} files, {} directories ({} bytes)",
        stats.files, stats.directories, stats.bytes
    );
    Ok(stats)
}

/// Source and destination must not contain one another
///
/// A destination inside the source would be copied into itself; a source
/// inside the destination would be removed before it is read.
fn reject_nested(source: &Path, dest: &Path) -> Result<(), SyncError> {
    let source_abs = fs::canonicalize(source).map_err(|e| SyncError::ReadDir {
        path: source.to_path_buf(),
        source: e,
    })?;

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let Ok(parent_abs) = fs::canonicalize(parent) else {
        // Missing parent: create_dir reports it with the destination path
        return Ok(());
    };
    let dest_abs = match dest.file_name() {
        Some(name) => parent_abs.join(name),
        None => parent_abs,
    };

    if dest_abs.starts_with(&source_abs) {
        return Err(SyncError::DestinationInsideSource {
            source_dir: source.to_path_buf(),
            dest: dest.to_path_buf(),
        });
    }
    if source_abs.starts_with(&dest_abs) {
        return Err(SyncError::SourceInsideDestination {
            source_dir: source.to_path_buf(),
            dest: dest.to_path_buf(),
        });
    }
    Ok(())
}

fn clear_destination(dest: &Path) -> Result<(), SyncError> {
    let metadata = match fs::symlink_metadata(dest) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(SyncError::Remove {
                path: dest.to_path_buf(),
                source: e,
            })
        }
    };

    debug!("Removing previous destination {}", dest.display());
    let removed = if metadata.is_dir() {
        fs::remove_dir_all(dest)
    } else {
        fs::remove_file(dest)
    };
    removed.map_err(|e| SyncError::Remove {
        path: dest.to_path_buf(),
        source: e,
    })
}

fn copy_tree(source: &Path, dest: &Path, stats: &mut SyncStats) -> Result<(), SyncError> {
    let read_dir_err = |e| SyncError::ReadDir {
        path: source.to_path_buf(),
        source: e,
    };

    let mut entries = fs::read_dir(source)
        .map_err(read_dir_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_dir_err)?;
    entries.sort_by_key(|e| e.file_name());

    let mut subdirs = Vec::new();
    for entry in entries {
        let from = entry.path();
        let to = dest.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| SyncError::ReadDir {
            path: from.clone(),
            source: e,
        })?;

        if file_type.is_dir() {
            fs::create_dir(&to).map_err(|e| SyncError::CreateDir {
                path: to.clone(),
                source: e,
            })?;
            stats.directories += 1;
            subdirs.push((from, to));
        } else if file_type.is_file() {
            stats.bytes += copy_file(&from, &to)?;
            stats.files += 1;
        } else {
            debug!("Skipping non-regular entry {}", from.display());
        }
    }

    for (from, to) in subdirs {
        copy_tree(&from, &to, stats)?;
    }
    Ok(())
}

/// Both handles are dropped when this returns, whatever the outcome
fn copy_file(from: &Path, to: &Path) -> Result<u64, SyncError> {
    let mut reader = File::open(from).map_err(|e| SyncError::Open {
        path: from.to_path_buf(),
        source: e,
    })?;
    let mut writer = File::create(to).map_err(|e| SyncError::Create {
        path: to.to_path_buf(),
        source: e,
    })?;
    io::copy(&mut reader, &mut writer).map_err(|e| SyncError::Copy {
        path: from.to_path_buf(),
        source: e,
    })
}
