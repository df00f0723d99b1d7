//! Error taxonomy for the benchmark pipeline.
//!
//! Every variant aborts the current batch. The only tolerated gap (a dataset
//! with no source file) is modelled as `files::mapping::SourceFile::NotFound` instead.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("path must be a string or a path value, got {0}")]
    InvalidInputKind(String),

    #[error("path {} is not found", .0.display())]
    PathNotFound(PathBuf),

    #[error("path {} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("'{0}' is not a supported extension (expected one of: bin, json)")]
    UnsupportedExtension(String),

    #[error("unable to find `{ext}` files inside {}", .dir.display())]
    NoMatchingFiles { dir: PathBuf, ext: String },

    #[error("unable to locate '{0}' executable")]
    ToolNotAvailable(String),

    #[error("decoding {} failed ({status}): {stderr}", .path.display())]
    DecodeFailed {
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("reading {}: {source}", .path.display())]
    ReadFailed { path: PathBuf, source: io::Error },

    #[error("malformed metadata in {file}: {details}")]
    MalformedMetadata { file: String, details: String },

    #[error("{field} {value:?} in {file} does not match YYYY-MM-DD HH:MM:SS.ffffff")]
    TimestampFormatError {
        file: String,
        field: &'static str,
        value: String,
    },

    #[error("file name {0:?} does not follow {{dataset}}_{{step}}_benchmark or {{step}}_benchmark")]
    BadFileName(String),

    #[error(transparent)]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl BenchError {
    pub(crate) fn malformed(file: &str, details: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            file: file.to_string(),
            details: details.into(),
        }
    }
}
