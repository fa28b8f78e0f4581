use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("input directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("failed to list input directory {path}: {source}")]
    List {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One archive to process, consumed by exactly one worker.
#[derive(Debug, Clone)]
pub struct ArchiveTask {
    pub id: u64,
    pub path: PathBuf,
}

/// Enumerate archive files in `dir`, sorted lexicographically by path so runs
/// over the same corpus dispatch in a stable order.
pub fn enumerate_archives(dir: &Path, archive_suffix: &str) -> Result<Vec<ArchiveTask>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::DirectoryNotFound(dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(dir).map_err(|source| ScanError::List {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ScanError::List {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(archive_suffix));
        if matches {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths
        .into_iter()
        .enumerate()
        .map(|(id, path)| ArchiveTask {
            id: id as u64,
            path,
        })
        .collect())
}
