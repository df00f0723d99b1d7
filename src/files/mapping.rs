//! Dataset name → source data file mapping, used to attach input file sizes.

use crate::error::BenchError;
use crate::files::locate::{has_ext, normalize_ext};
use crate::files::resolve::resolve_path;
use crate::trace::BenchmarkRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where a dataset's source file lives, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFile {
    Found(PathBuf),
    NotFound,
}

impl SourceFile {
    pub fn path(&self) -> Option<&Path> {
        match self {
            SourceFile::Found(p) => Some(p),
            SourceFile::NotFound => None,
        }
    }
}

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub(crate) fn bytes_to_mb_rounded(bytes: u64) -> f64 {
    ((bytes as f64 / BYTES_PER_MB) * 1000.0).round() / 1000.0
}

/// Map every name to the first data file (sorted by file name) in `data_dir`
/// with extension `data_ext` whose file name starts with that name.
///
/// Names must be non-overlapping prefixes: `plate1` also matches
/// `plate10_converted.sqlite` if that file sorts first.
pub fn create_filename_path_mapping<S: AsRef<str>>(
    names: &[S],
    data_dir: &Path,
    data_ext: &str,
) -> Result<BTreeMap<String, SourceFile>, BenchError> {
    let data_dir = resolve_path(data_dir, true)?;
    let data_ext = normalize_ext(data_ext);

    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(&data_dir)? {
        let path = entry?.path();
        if has_ext(&path, &data_ext) {
            candidates.push(path);
        }
    }
    candidates.sort();

    let mut out = BTreeMap::new();
    for name in names {
        let name = name.as_ref();
        let found = candidates.iter().find(|p| {
            p.file_name()
                .and_then(|f| f.to_str())
                .is_some_and(|f| f.starts_with(name))
        });
        let source = match found {
            Some(p) => SourceFile::Found(p.canonicalize()?),
            None => SourceFile::NotFound,
        };
        out.insert(name.to_string(), source);
    }
    Ok(out)
}

/// Size of a mapped source file in MB (3 decimals); `None` when unmapped.
pub fn file_size_mb(source: &SourceFile) -> Result<Option<f64>, BenchError> {
    match source {
        SourceFile::Found(path) => Ok(Some(bytes_to_mb_rounded(fs::metadata(path)?.len()))),
        SourceFile::NotFound => Ok(None),
    }
}

/// Fill `file_size` on every record from the data files in `data_dir`.
pub fn enrich_file_sizes(
    records: &mut [BenchmarkRecord],
    data_dir: &Path,
    data_ext: &str,
) -> Result<(), BenchError> {
    let names: Vec<String> = records
        .iter()
        .map(|r| r.input_data_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mapping = create_filename_path_mapping(&names, data_dir, data_ext)?;

    let mut sizes: BTreeMap<&str, Option<f64>> = BTreeMap::new();
    for (name, source) in &mapping {
        let size = file_size_mb(source)?;
        match source.path() {
            Some(p) => debug!(dataset = %name, path = %p.display(), ?size, "mapped source file"),
            None => warn!(dataset = %name, "no source file found; file_size left empty"),
        }
        sizes.insert(name.as_str(), size);
    }

    for record in records.iter_mut() {
        record.file_size = sizes.get(record.input_data_name.as_str()).copied().flatten();
    }
    Ok(())
}
