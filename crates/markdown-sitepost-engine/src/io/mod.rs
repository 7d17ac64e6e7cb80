use relative_path::RelativePathBuf;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid pages directory: {0}")]
    InvalidPagesDir(String),
}

/// Scan for markdown pages below `pages_root`, sorted, as site-relative paths
pub fn scan_markdown_files(pages_root: &Path) -> Result<Vec<RelativePathBuf>, IoError> {
    validate_pages_dir(pages_root)?;

    let mut files = Vec::new();
    scan_directory_recursive(pages_root, &mut files)?;
    files.sort();

    Ok(files
        .iter()
        .filter_map(|path| path.strip_prefix(pages_root).ok())
        .filter_map(|path| RelativePathBuf::from_path(path).ok())
        .collect())
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;

    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();

        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if let Some(ext) = path.extension()
            && ext == "md"
        {
            files.push(path);
        }
    }

    Ok(())
}

pub fn validate_pages_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidPagesDir(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}
