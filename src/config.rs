//! Report configuration: optional JSON file merged with command line flags.
//!
//! JSON shape (every key optional; flags win over file values):
//! {
//!   "benchmark_dir": "./benchmarks",
//!   "data_dir": "./data",
//!   "data_ext": "sqlite",
//!   "sizes": "./file_size.json",
//!   "out_dir": "./reports",
//!   "tool": "memray",
//!   "step_order": ["aggregate_cells", "annotate", "normalize"]
//! }
//!
//! Path-valued keys are kept as raw JSON values until validation so a
//! non-string value is reported as an invalid path kind, not a parse error.

use crate::Result;
use crate::decode::DecodeMode;
use crate::files::{PathInput, resolve_path};

use anyhow::{Context, anyhow, bail};
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_EXT: &str = "sqlite";
pub const DEFAULT_TOOL: &str = "memray";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    #[serde(default)]
    pub benchmark_dir: Option<Value>,

    #[serde(default)]
    pub data_dir: Option<Value>,

    #[serde(default)]
    pub data_ext: Option<String>,

    /// Size map from `cytobench sizes`, used instead of `data_dir`.
    #[serde(default)]
    pub sizes: Option<Value>,

    #[serde(default)]
    pub out_dir: Option<Value>,

    #[serde(default)]
    pub tool: Option<String>,

    #[serde(default)]
    pub step_order: Vec<String>,
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ReportFlags {
    pub benchmark_dir: Option<String>,
    pub data_dir: Option<String>,
    pub data_ext: Option<String>,
    pub sizes: Option<String>,
    pub out_dir: Option<String>,
    pub tool: Option<String>,
    pub step_order: Vec<String>,
    pub decode: bool,
    pub keep_going: bool,
    pub html: Option<String>,
}

/// Validated configuration for one `report` run.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Canonical, existing directory.
    pub benchmark_dir: PathBuf,
    /// Canonical, existing directory holding the input data files.
    pub data_dir: Option<PathBuf>,
    pub data_ext: String,
    /// Canonical, existing size map file; never set together with `data_dir`.
    pub sizes: Option<PathBuf>,
    /// Absolute; created on write.
    pub out_dir: PathBuf,
    pub tool: String,
    pub step_order: Vec<String>,
    pub decode: bool,
    pub mode: DecodeMode,
    pub html: Option<PathBuf>,
}

impl RawConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse config file {}", path.display()))
    }

    /// Overlay command line flags and validate every path.
    pub fn validate(self, flags: ReportFlags) -> Result<ReportConfig> {
        let benchmark_dir = flags
            .benchmark_dir
            .map(Value::String)
            .or(self.benchmark_dir)
            .ok_or_else(|| anyhow!("no benchmark directory given (--benchmarks or `benchmark_dir`)"))?;
        let benchmark_dir = resolve_path(PathInput::try_from(&benchmark_dir)?, true)
            .context("benchmark directory")?;

        let data_dir = match flags.data_dir.map(Value::String).or(self.data_dir) {
            Some(v) => Some(resolve_path(PathInput::try_from(&v)?, true).context("data directory")?),
            None => None,
        };

        let sizes = match flags.sizes.map(Value::String).or(self.sizes) {
            Some(v) => Some(resolve_path(PathInput::try_from(&v)?, false).context("size map")?),
            None => None,
        };
        if data_dir.is_some() && sizes.is_some() {
            bail!("give either a data directory or a size map, not both");
        }

        let out_dir = match flags.out_dir.map(Value::String).or(self.out_dir) {
            Some(v) => absolute(PathInput::try_from(&v)?)?,
            None => env::current_dir()?,
        };

        let html = flags.html.map(|h| absolute(PathInput::Text(h))).transpose()?;

        let step_order = if flags.step_order.is_empty() {
            self.step_order
        } else {
            flags.step_order
        };

        Ok(ReportConfig {
            benchmark_dir,
            data_dir,
            data_ext: flags
                .data_ext
                .or(self.data_ext)
                .unwrap_or_else(|| DEFAULT_DATA_EXT.to_string()),
            sizes,
            out_dir,
            tool: flags
                .tool
                .or(self.tool)
                .unwrap_or_else(|| DEFAULT_TOOL.to_string()),
            step_order,
            decode: flags.decode,
            mode: if flags.keep_going {
                DecodeMode::KeepGoing
            } else {
                DecodeMode::Strict
            },
            html,
        })
    }
}

/// Absolute form of a path that may not exist yet.
fn absolute(input: PathInput) -> Result<PathBuf> {
    let path = match input {
        PathInput::Text(s) if s.trim().is_empty() => return Err(anyhow!("empty output path")),
        PathInput::Text(s) => PathBuf::from(s),
        PathInput::Path(p) => p,
    };
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_override_file_values() {
        let bench = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let raw: RawConfig = serde_json::from_value(serde_json::json!({
            "benchmark_dir": other.path().to_str().unwrap(),
            "data_ext": "parquet",
            "step_order": ["annotate"]
        }))
        .unwrap();

        let cfg = raw
            .validate(ReportFlags {
                benchmark_dir: Some(bench.path().to_string_lossy().into_owned()),
                out_dir: Some(bench.path().join("out").to_string_lossy().into_owned()),
                keep_going: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(cfg.benchmark_dir, bench.path().canonicalize().unwrap());
        assert_eq!(cfg.data_ext, "parquet");
        assert_eq!(cfg.tool, DEFAULT_TOOL);
        assert_eq!(cfg.step_order, vec!["annotate".to_string()]);
        assert_eq!(cfg.mode, DecodeMode::KeepGoing);
        assert_eq!(cfg.out_dir, bench.path().join("out"));
        assert!(cfg.data_dir.is_none());
    }

    #[test]
    fn non_string_path_is_invalid_kind() {
        let raw: RawConfig =
            serde_json::from_value(serde_json::json!({ "benchmark_dir": 42 })).unwrap();
        let err = raw.validate(ReportFlags::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BenchError>(),
            Some(BenchError::InvalidInputKind(_))
        ));
    }

    #[test]
    fn data_dir_must_exist() {
        let bench = tempfile::tempdir().unwrap();
        let err = RawConfig::default()
            .validate(ReportFlags {
                benchmark_dir: Some(bench.path().to_string_lossy().into_owned()),
                data_dir: Some(bench.path().join("data").to_string_lossy().into_owned()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BenchError>(),
            Some(BenchError::PathNotFound(_))
        ));
    }

    #[test]
    fn size_map_and_data_dir_are_exclusive() {
        let bench = tempfile::tempdir().unwrap();
        let map = bench.path().join("file_size.json");
        fs::write(&map, "{}").unwrap();
        let raw: RawConfig = serde_json::from_value(serde_json::json!({
            "sizes": map.to_str().unwrap()
        }))
        .unwrap();

        let flags = ReportFlags {
            benchmark_dir: Some(bench.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        let cfg = raw.clone().validate(flags.clone()).unwrap();
        assert_eq!(cfg.sizes, Some(map.canonicalize().unwrap()));

        let both = ReportFlags {
            data_dir: Some(bench.path().to_string_lossy().into_owned()),
            ..flags
        };
        assert!(raw.validate(both).is_err());
    }

    #[test]
    fn missing_benchmark_dir_is_reported() {
        assert!(RawConfig::default().validate(ReportFlags::default()).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed: std::result::Result<RawConfig, _> =
            serde_json::from_value(serde_json::json!({ "benchmarks": "x" }));
        assert!(parsed.is_err());
    }
}
