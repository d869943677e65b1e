//! File-system conveniences for tools sitting on top of the engine. The
//! core parse/apply/serialize path itself never touches the disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ParseError;
use crate::model::ParsedForm;
use crate::{parse_form, serialize};

pub const FORM_EXTENSION: &str = ".form.md";

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        source: ParseError,
    },
    #[error("Invalid forms directory: {0}")]
    InvalidFormsDir(String),
}

/// Read and parse a form document.
pub fn read_form(path: &Path) -> Result<ParsedForm, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(IoError::Io)?;
    parse_form(&text).map_err(|source| IoError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Serialize a form to its canonical text and write it out.
pub fn write_form(path: &Path, form: &ParsedForm) -> Result<(), IoError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }
    fs::write(path, serialize(form)).map_err(IoError::Io)
}

/// Scan for `.form.md` files under a directory, sorted for determinism.
pub fn scan_form_files(forms_root: &Path) -> Result<Vec<PathBuf>, IoError> {
    if !forms_root.exists() {
        return Err(IoError::InvalidFormsDir(
            "forms directory not found".to_string(),
        ));
    }
    let mut files = Vec::new();
    scan_directory_recursive(forms_root, &mut files)?;
    files.sort();
    Ok(files)
}

fn scan_directory_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), IoError> {
    let entries = fs::read_dir(dir).map_err(IoError::Io)?;
    for entry in entries {
        let entry = entry.map_err(IoError::Io)?;
        let path = entry.path();
        if path.is_dir() {
            scan_directory_recursive(&path, files)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(FORM_EXTENSION))
        {
            files.push(path);
        }
    }
    Ok(())
}
