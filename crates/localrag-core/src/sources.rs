use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::traits::Converter;

/// Expand files and directories into the sorted list of convertible sources.
///
/// Explicit file arguments must exist and be convertible; directories are
/// walked recursively and unsupported files inside them are skipped.
pub fn collect_sources(inputs: &[PathBuf], converter: &dyn Converter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(list_convertible(input, converter));
        } else if input.is_file() {
            if !converter.can_convert(input) {
                return Err(Error::conversion(input.display().to_string(), "unsupported file type"));
            }
            files.push(input.clone());
        } else {
            return Err(Error::NotFound(input.display().to_string()));
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn list_convertible(root: &Path, converter: &dyn Converter) -> Vec<PathBuf> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && converter.can_convert(e.path()))
        .map(|e| e.path().to_path_buf())
        .collect()
}
