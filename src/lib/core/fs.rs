use crate::core::error::Result;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Create parent directories for a path when missing.
pub fn make_parent_dirs<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Detect whether a path uses a gzip/BGZF-compatible extension.
pub fn is_bgzipped<P: AsRef<Path>>(path: P) -> bool {
    matches!(
        path.as_ref().extension().unwrap_or_else(|| OsStr::new("")),
        ext if ext == "gz" || ext == "gzip" || ext == "bgzf"
    )
}

/// Append `suffix` to the file name of `path`, keeping a trailing gzip extension last.
///
/// `out/run.gz` with suffix `_hme.txt` becomes `out/run_hme.txt.gz`.
pub fn with_name_suffix<P: AsRef<Path>>(path: P, suffix: &str) -> PathBuf {
    let path = path.as_ref();
    let gzipped = is_bgzipped(path);
    let stem = if gzipped {
        path.file_stem()
    } else {
        path.file_name()
    };
    let base = stem.and_then(|s| s.to_str()).unwrap_or_default();
    let name = if gzipped {
        format!("{}{}.gz", base, suffix)
    } else {
        format!("{}{}", base, suffix)
    };
    path.with_file_name(name)
}
