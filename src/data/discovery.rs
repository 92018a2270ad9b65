// data/discovery.rs
// Locate simulation result directories and files under a results root.
//
// Layout: <root>/<run-group>/<result-dir>/<result-file>.csv. Result
// directories whose name contains "num" hold per-number simulations and
// are not used by the figures.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::run_params::{Param, RunParams};
use crate::error::PlotError;

fn walk_error(root: &Path, err: walkdir::Error) -> PlotError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    match err.into_io_error() {
        Some(source) => PlotError::io(path, source),
        None => PlotError::MissingData(format!("filesystem loop under {}", path.display())),
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Second-level directories under `root`, sorted by path.
pub fn result_directories(root: &Path) -> Result<Vec<PathBuf>, PlotError> {
    if !root.is_dir() {
        return Err(PlotError::MissingData(format!(
            "results folder {} does not exist",
            root.display()
        )));
    }
    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(2)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()))
    {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.contains("num") {
            continue;
        }
        dirs.push(entry.into_path());
    }
    debug!(root = %root.display(), count = dirs.len(), "result directories");
    Ok(dirs)
}

/// Regular, non-hidden files directly inside `dir`, sorted by name.
pub fn result_files(dir: &Path) -> Result<Vec<PathBuf>, PlotError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        if entry.file_type().is_file() && !is_hidden(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Result files from every directory whose path contains `relevant`, keyed
/// by the value of `param` in their file name. A later file with the same
/// key replaces an earlier one.
pub fn files_by_param(
    dirs: &[PathBuf],
    relevant: &str,
    param: Param,
) -> Result<BTreeMap<u32, (PathBuf, RunParams)>, PlotError> {
    let matching = dirs
        .iter()
        .filter(|d| d.to_string_lossy().contains(relevant));
    keyed_files(matching, |params| Some(params.get(param)))
}

/// Result files from directories named exactly `name`, keyed by `param`,
/// keeping only runs accepted by `keep`.
pub fn files_in_named_dirs(
    dirs: &[PathBuf],
    name: &str,
    param: Param,
    keep: impl Fn(&RunParams) -> bool,
) -> Result<BTreeMap<u32, (PathBuf, RunParams)>, PlotError> {
    let matching = dirs
        .iter()
        .filter(|d| d.file_name().is_some_and(|n| n == name));
    keyed_files(matching, |params| keep(params).then(|| params.get(param)))
}

/// Every result file in `dirs`, keyed by `key`; files mapped to `None` are
/// skipped.
pub fn keyed_files<'a, K: Ord + Copy + std::fmt::Debug>(
    dirs: impl IntoIterator<Item = &'a PathBuf>,
    key: impl Fn(&RunParams) -> Option<K>,
) -> Result<BTreeMap<K, (PathBuf, RunParams)>, PlotError> {
    let mut out = BTreeMap::new();
    for dir in dirs {
        for file in result_files(dir)? {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let params = RunParams::from_file_name(&name)?;
            let Some(k) = key(&params) else {
                continue;
            };
            if let Some((previous, _)) = out.insert(k, (file.clone(), params)) {
                warn!(
                    key = ?k,
                    replaced = %previous.display(),
                    by = %file.display(),
                    "duplicate result file for key"
                );
            }
        }
    }
    Ok(out)
}
