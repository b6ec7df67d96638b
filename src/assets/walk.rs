use jwalk::{Parallelism, WalkDir};
use std::{fs, io, path::Path};
use tracing::{debug, warn};

use crate::{
    config::SymlinkPolicy,
    error::{Result, StackError},
};

/// Depth-first traversal of `root`, calling `on_file` once per regular file.
///
/// A subdirectory is fully walked before its later siblings; siblings are
/// visited in file-name order. Any failing filesystem call aborts the walk,
/// as does an error returned by `on_file`. File contents are never read.
pub fn walk_files<F>(root: &Path, symlinks: SymlinkPolicy, on_file: &mut F) -> Result<()>
where
    F: FnMut(&Path) -> Result<()>,
{
    let meta = fs::metadata(root).map_err(|e| StackError::fs(root, e))?;
    if !meta.is_dir() {
        return Err(StackError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let walker = WalkDir::new(root)
        .sort(true)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(Parallelism::Serial);

    for entry in walker {
        let mut entry = entry.map_err(|e| walk_error(root, e))?;
        let path = entry.path();

        if let Some(err) = entry.read_children_error.take() {
            return Err(walk_error(&path, err));
        }
        if entry.depth == 0 {
            continue;
        }

        let ft = entry.file_type();
        if ft.is_dir() {
            continue;
        } else if ft.is_file() {
            on_file(&path)?;
        } else if ft.is_symlink() {
            visit_symlink(&path, symlinks, on_file)?;
        } else {
            warn!(path = %path.display(), "skipping special file");
        }
    }

    Ok(())
}

fn walk_error(fallback: &Path, err: jwalk::Error) -> StackError {
    let path = err.path().unwrap_or(fallback).to_path_buf();
    StackError::fs(path, io::Error::from(err))
}

fn visit_symlink<F>(path: &Path, symlinks: SymlinkPolicy, on_file: &mut F) -> Result<()>
where
    F: FnMut(&Path) -> Result<()>,
{
    match symlinks {
        SymlinkPolicy::Skip => {
            debug!(path = %path.display(), "skipping symlink");
            Ok(())
        }
        SymlinkPolicy::Error => Err(StackError::SymlinkRejected {
            path: path.to_path_buf(),
        }),
        SymlinkPolicy::Follow => {
            // dangling links fail here
            let target = fs::metadata(path).map_err(|e| StackError::fs(path, e))?;
            if target.is_file() {
                on_file(path)
            } else {
                if target.is_dir() {
                    warn!(path = %path.display(), "skipping symlink to directory");
                } else {
                    warn!(path = %path.display(), "skipping symlink to special file");
                }
                Ok(())
            }
        }
    }
}
