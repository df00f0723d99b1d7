use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;

/// Timestamp format written to the record table.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Timestamp format accepted from memray: the dot and all six fraction
/// digits are required.
pub const TIME_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%6f";

/// One profiled execution of one pipeline step.
///
/// Field order is the column order of `complete_benchmark.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkRecord {
    pub pid: u64,
    /// Script file name, e.g. `annotate.py`.
    pub script: String,
    /// Bare step name, e.g. `annotate`.
    pub step: String,
    pub input_data_name: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub start_time: NaiveDateTime,
    #[serde(serialize_with = "serialize_timestamp")]
    pub end_time: NaiveDateTime,
    /// Seconds; always `end_time - start_time`.
    pub time_duration: f64,
    pub total_allocations: u64,
    /// Megabytes.
    pub peak_memory: f64,
    /// Megabytes; `None` when the dataset has no source file.
    pub file_size: Option<f64>,
    /// Decoded file this record came from.
    #[serde(skip)]
    pub source: String,
}

impl BenchmarkRecord {
    /// Total order used before reducing a group, so float sums do not
    /// depend on discovery order.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.start_time
            .cmp(&other.start_time)
            .then_with(|| self.step.cmp(&other.step))
            .then_with(|| self.pid.cmp(&other.pid))
            .then_with(|| self.end_time.cmp(&other.end_time))
            .then_with(|| self.source.cmp(&other.source))
            .then_with(|| self.input_data_name.cmp(&other.input_data_name))
    }
}

fn serialize_timestamp<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(TIME_FORMAT))
}

/// Seconds between two timestamps, with microsecond precision.
pub fn duration_secs(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    let delta = end - start;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}
