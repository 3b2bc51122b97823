//! Expanding command-line inputs into the ordered document list of a run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::types::SourceDocument;

fn is_docx(path: &Path) -> bool {
    let is_lock_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("~$"));
    let has_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("docx"));
    has_ext && !is_lock_file
}

/// Files keep their given order; a directory contributes its `.docx` files sorted by name.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_docx(p))
                .collect();
            entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
            debug!(dir = %path.display(), files = entries.len(), "expanded input directory");
            out.extend(entries);
        } else if path.exists() {
            out.push(path.clone());
        } else {
            return Err(ConvertError::InvalidConfig(format!(
                "input not found: {}",
                path.display()
            )));
        }
    }
    Ok(out)
}

/// Read every input into memory, named by file name.
pub fn load_documents(paths: &[PathBuf]) -> Result<Vec<SourceDocument>> {
    paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(SourceDocument::new(name, fs::read(path)?))
        })
        .collect()
}
