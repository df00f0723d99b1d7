//! Conversion of raw memray captures (`.bin`) into decoded JSON documents.

use crate::error::BenchError;
use crate::files::{TraceExt, find_benchmark_files, resolve_path};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

/// Something that turns a trace artifact into a decoded trace document.
pub trait TraceDecoder {
    /// Write the decoded form of `input` to `output`, replacing any file there.
    fn decode(&self, input: &Path, output: &Path) -> Result<(), BenchError>;
}

/// Decoder backed by the `memray stats` command line tool.
#[derive(Debug, Clone)]
pub struct MemrayDecoder {
    program: PathBuf,
}

impl MemrayDecoder {
    /// Find `program` (a bare name searched on `PATH`, or a path).
    ///
    /// Called once before any file is processed.
    pub fn locate(program: &str) -> Result<Self, BenchError> {
        let program = find_executable(program)
            .ok_or_else(|| BenchError::ToolNotAvailable(program.to_string()))?;
        Ok(Self { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl TraceDecoder for MemrayDecoder {
    fn decode(&self, input: &Path, output: &Path) -> Result<(), BenchError> {
        let out = Command::new(&self.program)
            .arg("stats")
            .arg("--json")
            .arg("--output")
            .arg(output)
            .arg("--force")
            .arg(input)
            .output()?;

        if !out.status.success() {
            let mut stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            if stderr.is_empty() {
                stderr = String::from_utf8_lossy(&out.stdout).trim().to_string();
            }
            return Err(BenchError::DecodeFailed {
                path: input.to_path_buf(),
                status: out.status,
                stderr,
            });
        }
        Ok(())
    }
}

fn find_executable(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let paths = env::var_os("PATH")?;
    for dir in env::split_paths(&paths) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let full = dir.join(program);
        if full.is_file() {
            return Some(full);
        }
        if cfg!(windows) {
            let exe = full.with_extension("exe");
            if exe.is_file() {
                return Some(exe);
            }
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Abort on the first failing artifact.
    #[default]
    Strict,
    /// Log failures, keep converting the rest.
    KeepGoing,
}

/// Outcome of decoding a directory.
#[derive(Debug, Default)]
pub struct DecodeReport {
    pub decoded: Vec<PathBuf>,
    /// Only populated in [`DecodeMode::KeepGoing`].
    pub failed: Vec<(PathBuf, BenchError)>,
}

/// Decode every `.bin` directly under `dir` into a sibling `{stem}.json`.
///
/// A sibling left over from an earlier run is removed first, so a trace that
/// fails to decode never leaves a stale document behind.
pub fn decode_directory(
    decoder: &dyn TraceDecoder,
    dir: &Path,
    mode: DecodeMode,
) -> Result<DecodeReport, BenchError> {
    let dir = resolve_path(dir, true)?;
    let mut report = DecodeReport::default();

    for bin_path in find_benchmark_files(&dir, TraceExt::Bin)? {
        let json_out = bin_path.with_extension(TraceExt::Json.as_str());
        if json_out.is_file() {
            fs::remove_file(&json_out)?;
        }

        match decoder.decode(&bin_path, &json_out) {
            Ok(()) => {
                info!(
                    input = %display_relative(&bin_path, &dir),
                    output = %display_relative(&json_out, &dir),
                    "converted trace"
                );
                report.decoded.push(json_out);
            }
            Err(e) if mode == DecodeMode::KeepGoing => {
                warn!(input = %bin_path.display(), error = %e, "skipping trace that failed to decode");
                report.failed.push((bin_path, e));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(report)
}

fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base).unwrap_or(path).display().to_string()
}
