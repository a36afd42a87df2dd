use std::fs::{self, File};
use std::path::Path;

use crate::error::AnalysisError;

pub fn ensure_parent_dir(path: &Path) -> Result<(), AnalysisError> {
    match path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        Some(dir) => fs::create_dir_all(dir).map_err(|e| AnalysisError::write(dir, e)),
        None => Ok(()),
    }
}

/// Creates (or truncates) `path`, creating missing parent directories first.
pub fn create_file(path: &Path) -> Result<File, AnalysisError> {
    ensure_parent_dir(path)?;
    File::create(path).map_err(|e| AnalysisError::write(path, e))
}

pub(crate) fn hex(value: u64) -> String {
    format!("{value:#x}")
}
