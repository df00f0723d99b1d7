use crate::error::BenchError;
use crate::files::resolve::resolve_path;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Extensions the locator is allowed to search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceExt {
    /// Raw memray capture.
    Bin,
    /// Decoded `memray stats --json` document.
    Json,
}

impl TraceExt {
    pub fn as_str(self) -> &'static str {
        match self {
            TraceExt::Bin => "bin",
            TraceExt::Json => "json",
        }
    }
}

impl fmt::Display for TraceExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraceExt {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_ext(s).as_str() {
            "bin" => Ok(TraceExt::Bin),
            "json" => Ok(TraceExt::Json),
            other => Err(BenchError::UnsupportedExtension(other.to_string())),
        }
    }
}

/// ".json " and "json" name the same extension.
pub(crate) fn normalize_ext(ext: &str) -> String {
    ext.replace('.', "").trim().to_string()
}

pub(crate) fn has_ext(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

/// List the files with extension `ext` directly under `dir`.
///
/// Fails with `NoMatchingFiles` rather than returning an empty list: an empty
/// benchmark directory would otherwise produce an empty report.
pub fn find_benchmark_files(dir: &Path, ext: TraceExt) -> Result<Vec<PathBuf>, BenchError> {
    let dir = resolve_path(dir, true)?;

    let mut out = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.is_file() && has_ext(&path, ext.as_str()) {
            out.push(path);
        }
    }

    if out.is_empty() {
        return Err(BenchError::NoMatchingFiles {
            dir,
            ext: ext.to_string(),
        });
    }
    out.sort();
    Ok(out)
}
