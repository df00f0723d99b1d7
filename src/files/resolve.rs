use crate::error::BenchError;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};

/// A path as handed to the pipeline: free text (CLI, config) or an already
/// structured path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathInput {
    Text(String),
    Path(PathBuf),
}

impl From<&str> for PathInput {
    fn from(s: &str) -> Self {
        PathInput::Text(s.to_string())
    }
}

impl From<String> for PathInput {
    fn from(s: String) -> Self {
        PathInput::Text(s)
    }
}

impl From<PathBuf> for PathInput {
    fn from(p: PathBuf) -> Self {
        PathInput::Path(p)
    }
}

impl From<&Path> for PathInput {
    fn from(p: &Path) -> Self {
        PathInput::Path(p.to_path_buf())
    }
}

impl TryFrom<&Value> for PathInput {
    type Error = BenchError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(PathInput::Text(s.clone())),
            other => Err(BenchError::InvalidInputKind(json_kind(other).to_string())),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Validate a path and return its absolute, canonical form.
///
/// Relative paths are resolved against the current working directory.
/// With `must_be_dir`, a target that exists but is not a directory fails
/// with `NotADirectory`.
pub fn resolve_path(input: impl Into<PathInput>, must_be_dir: bool) -> Result<PathBuf, BenchError> {
    let raw = match input.into() {
        PathInput::Text(s) => {
            if s.trim().is_empty() {
                return Err(BenchError::InvalidInputKind("an empty string".to_string()));
            }
            PathBuf::from(s)
        }
        PathInput::Path(p) => p,
    };

    let absolute = if raw.is_absolute() {
        raw
    } else {
        env::current_dir()?.join(raw)
    };

    if !absolute.exists() {
        return Err(BenchError::PathNotFound(absolute));
    }
    let resolved = absolute.canonicalize()?;

    if must_be_dir && !resolved.is_dir() {
        return Err(BenchError::NotADirectory(resolved));
    }
    Ok(resolved)
}
