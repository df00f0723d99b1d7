use crate::error::BenchError;
use crate::files::locate::{has_ext, normalize_ext};
use crate::files::mapping::bytes_to_mb_rounded;
use crate::files::resolve::resolve_path;
use crate::trace::BenchmarkRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Size in MB of every `ext` file in `data_dir`, keyed by plate name.
///
/// The plate name is the file stem cut at the first occurrence of
/// `strip_suffix` (`plateA_converted.parquet` → `plateA`).
pub fn collect_file_sizes(
    data_dir: &Path,
    ext: &str,
    strip_suffix: Option<&str>,
) -> Result<BTreeMap<String, f64>, BenchError> {
    let data_dir = resolve_path(data_dir, true)?;
    let ext = normalize_ext(ext);

    let mut out = BTreeMap::new();
    for entry in fs::read_dir(&data_dir)? {
        let path = entry?.path();
        if !path.is_file() || !has_ext(&path, &ext) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let name = match strip_suffix.filter(|s| !s.is_empty()) {
            Some(suffix) => stem.split(suffix).next().unwrap_or(stem),
            None => stem,
        };
        out.insert(name.to_string(), bytes_to_mb_rounded(fs::metadata(&path)?.len()));
    }

    if out.is_empty() {
        return Err(BenchError::NoMatchingFiles { dir: data_dir, ext });
    }
    Ok(out)
}

/// Read a size map written by `cytobench sizes`.
pub fn load_size_map(path: &Path) -> Result<BTreeMap<String, f64>, BenchError> {
    let text = fs::read_to_string(path).map_err(|source| BenchError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text)
        .map_err(|e| BenchError::malformed(&path.display().to_string(), e.to_string()))
}

/// Fill `file_size` on every record from a precomputed size map.
///
/// Datasets missing from the map keep `None`.
pub fn apply_size_map(records: &mut [BenchmarkRecord], sizes: &BTreeMap<String, f64>) {
    let mut unknown = BTreeSet::new();
    for record in records.iter_mut() {
        record.file_size = sizes.get(&record.input_data_name).copied();
        if record.file_size.is_none() {
            unknown.insert(record.input_data_name.clone());
        }
    }
    for name in unknown {
        warn!(dataset = %name, "not in size map; file_size left empty");
    }
}
