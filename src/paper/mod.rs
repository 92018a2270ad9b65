//! Paper figure pipelines.
//!
//! Each pipeline reads its inputs, builds one or more [`figure::Figure`]
//! values and renders them under the output root.

pub mod cdf;
pub mod comparison;
pub mod expected;
pub mod figure;
pub mod packet;
pub mod recovery;
pub mod timing;

use std::fs::{create_dir_all, write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::PlotError;
use figure::{Figure, RenderStyle};

/// Where and how a pipeline writes its figures.
#[derive(Clone, Debug)]
pub struct Output {
    pub root: PathBuf,
    pub style: RenderStyle,
}

impl Output {
    pub fn new(root: impl Into<PathBuf>, style: RenderStyle) -> Self {
        Self {
            root: root.into(),
            style,
        }
    }

    pub fn dir(&self, sub: impl AsRef<Path>) -> PathBuf {
        self.root.join(sub)
    }

    pub fn save(&self, fig: &Figure, sub: impl AsRef<Path>, stem: &str) -> Result<PathBuf, PlotError> {
        fig.save(&self.dir(sub), stem, &self.style)
    }
}

/// Write `contents` to `dir/name`, creating `dir` first.
pub fn write_csv(dir: &Path, name: &str, contents: String) -> Result<PathBuf, PlotError> {
    create_dir_all(dir).map_err(|e| PlotError::io(dir, e))?;
    let path = dir.join(name);
    write(&path, contents).map_err(|e| PlotError::io(&path, e))?;
    debug!(path = %path.display(), "csv written");
    Ok(path)
}
