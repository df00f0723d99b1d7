use crate::error::BenchError;
use crate::files::{TraceExt, find_benchmark_files};
use crate::trace::doc::DecodedTrace;
use crate::trace::record::{BenchmarkRecord, TIME_PARSE_FORMAT, duration_secs};
use crate::trace::stem::InputName;
use chrono::NaiveDateTime;
use std::fs;
use std::path::Path;
use tracing::debug;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Turn one decoded trace into a record.
///
/// `file_name` is the decoded file's name (`plate1_annotate_benchmark.json`);
/// the dataset comes from it, the step from the traced command line.
pub fn normalize(doc: &DecodedTrace, file_name: &str) -> Result<BenchmarkRecord, BenchError> {
    let meta = doc.metadata(file_name)?;

    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    let input = InputName::from_stem(stem)?;

    let script = script_from_command_line(&meta.command_line).ok_or_else(|| {
        BenchError::malformed(
            file_name,
            format!(
                "cannot derive a script name from command_line {:?}",
                meta.command_line
            ),
        )
    })?;
    let step = script.split('.').next().unwrap_or(script);

    let start_time = parse_timestamp(&meta.start_time, "start_time", file_name)?;
    let end_time = parse_timestamp(&meta.end_time, "end_time", file_name)?;
    if end_time < start_time {
        return Err(BenchError::malformed(
            file_name,
            format!(
                "end_time {} precedes start_time {}",
                meta.end_time, meta.start_time
            ),
        ));
    }

    Ok(BenchmarkRecord {
        pid: meta.pid,
        script: script.to_string(),
        step: step.to_string(),
        input_data_name: input.as_str().to_string(),
        start_time,
        end_time,
        time_duration: duration_secs(start_time, end_time),
        total_allocations: meta.total_allocations,
        peak_memory: meta.peak_memory as f64 / BYTES_PER_MB,
        file_size: None,
        source: file_name.to_string(),
    })
}

/// `.../memray_2.annotate.py` → `annotate.py`.
///
/// The script is the first `.py` argument of the command line, or the whole
/// command line when there is none. Its last path component loses everything
/// up to and including its first `.`.
fn script_from_command_line(command_line: &str) -> Option<&str> {
    let command_line = command_line.trim();
    let script_path = command_line
        .split_whitespace()
        .find(|arg| arg.ends_with(".py"))
        .unwrap_or(command_line);
    let last = script_path
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()?;
    let (_, script) = last.split_once('.')?;
    (!script.is_empty()).then_some(script)
}

fn parse_timestamp(
    value: &str,
    field: &'static str,
    file: &str,
) -> Result<NaiveDateTime, BenchError> {
    NaiveDateTime::parse_from_str(value.trim(), TIME_PARSE_FORMAT).map_err(|_| {
        BenchError::TimestampFormatError {
            file: file.to_string(),
            field,
            value: value.to_string(),
        }
    })
}

/// Read and normalize every decoded trace directly under `dir`.
///
/// Stops at the first file that fails; nothing is dropped silently.
pub fn load_records(dir: &Path) -> Result<Vec<BenchmarkRecord>, BenchError> {
    let mut records = Vec::new();
    for path in find_benchmark_files(dir, TraceExt::Json)? {
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .ok_or_else(|| BenchError::BadFileName(path.display().to_string()))?;

        let bytes = fs::read(&path).map_err(|source| BenchError::ReadFailed {
            path: path.clone(),
            source,
        })?;
        let text = String::from_utf8(bytes)
            .map_err(|e| BenchError::malformed(file_name, format!("not UTF-8 text: {e}")))?;
        let doc = DecodedTrace::from_json(&text, file_name)?;
        let record = normalize(&doc, file_name)?;
        debug!(
            file = file_name,
            step = %record.step,
            input = %record.input_data_name,
            duration_s = record.time_duration,
            peak_mb = record.peak_memory,
            "normalized trace"
        );
        records.push(record);
    }
    Ok(records)
}
