//! Shape of a `memray stats --json` document, as far as we read it.
//!
//! JSON shape (other keys ignored):
//! {
//!   "metadata": {
//!     "pid": 1234,
//!     "command_line": "/usr/bin/python memray_2.annotate.py ...",
//!     "start_time": "2023-07-01 12:00:00.000000",
//!     "end_time": "2023-07-01 12:00:10.500000",
//!     "total_allocations": 51234,
//!     "peak_memory": 2097152
//!   }
//! }

use crate::error::BenchError;
use serde::Deserialize;
use serde::de::Deserializer;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct DecodedTrace {
    #[serde(default)]
    pub metadata: Option<RawMetadata>,
}

/// Metadata as it appears in the document; every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetadata {
    #[serde(default, deserialize_with = "deserialize_count")]
    pub pid: Option<u64>,

    #[serde(default)]
    pub command_line: Option<String>,

    #[serde(default)]
    pub start_time: Option<String>,

    #[serde(default)]
    pub end_time: Option<String>,

    #[serde(default, deserialize_with = "deserialize_count")]
    pub total_allocations: Option<u64>,

    #[serde(default, deserialize_with = "deserialize_count")]
    pub peak_memory: Option<u64>,
}

/// Metadata with every required key present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceMetadata {
    pub pid: u64,
    pub command_line: String,
    pub start_time: String,
    pub end_time: String,
    pub total_allocations: u64,
    /// Bytes.
    pub peak_memory: u64,
}

impl DecodedTrace {
    pub fn from_json(text: &str, file: &str) -> Result<Self, BenchError> {
        serde_json::from_str(text).map_err(|e| BenchError::malformed(file, e.to_string()))
    }

    /// Check that every required metadata key is present.
    ///
    /// All missing keys are reported together.
    pub fn metadata(&self, file: &str) -> Result<TraceMetadata, BenchError> {
        let Some(raw) = &self.metadata else {
            return Err(BenchError::malformed(file, "missing `metadata` object"));
        };

        let mut missing: Vec<&str> = Vec::new();
        if raw.pid.is_none() {
            missing.push("pid");
        }
        if raw.command_line.is_none() {
            missing.push("command_line");
        }
        if raw.start_time.is_none() {
            missing.push("start_time");
        }
        if raw.end_time.is_none() {
            missing.push("end_time");
        }
        if raw.total_allocations.is_none() {
            missing.push("total_allocations");
        }
        if raw.peak_memory.is_none() {
            missing.push("peak_memory");
        }

        match (
            raw.pid,
            &raw.command_line,
            &raw.start_time,
            &raw.end_time,
            raw.total_allocations,
            raw.peak_memory,
        ) {
            (Some(pid), Some(cmd), Some(start), Some(end), Some(allocs), Some(peak)) => {
                Ok(TraceMetadata {
                    pid,
                    command_line: cmd.clone(),
                    start_time: start.clone(),
                    end_time: end.clone(),
                    total_allocations: allocs,
                    peak_memory: peak,
                })
            }
            _ => Err(BenchError::malformed(
                file,
                format!("missing metadata keys: {}", missing.join(", ")),
            )),
        }
    }
}

/// Counts arrive as JSON numbers, but older dumps quote them.
fn deserialize_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a non-negative integer, got {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a non-negative integer, got {s:?}"))),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full() -> Value {
        json!({
            "metadata": {
                "pid": 4242,
                "command_line": "python memray_2.annotate.py",
                "start_time": "2023-07-01 12:00:00.000000",
                "end_time": "2023-07-01 12:00:10.000000",
                "total_allocations": 100,
                "peak_memory": 2097152
            },
            "top_allocations_by_size": []
        })
    }

    #[test]
    fn complete_metadata_validates() {
        let doc = DecodedTrace::from_json(&full().to_string(), "a.json").unwrap();
        let meta = doc.metadata("a.json").unwrap();
        assert_eq!(meta.pid, 4242);
        assert_eq!(meta.peak_memory, 2_097_152);
    }

    #[test]
    fn each_missing_key_is_malformed() {
        for key in [
            "pid",
            "command_line",
            "start_time",
            "end_time",
            "total_allocations",
            "peak_memory",
        ] {
            let mut value = full();
            value["metadata"].as_object_mut().unwrap().remove(key);
            let doc = DecodedTrace::from_json(&value.to_string(), "a.json").unwrap();

            match doc.metadata("a.json").unwrap_err() {
                BenchError::MalformedMetadata { details, .. } => assert!(details.contains(key)),
                other => panic!("unexpected error for {key}: {other}"),
            }
        }
    }

    #[test]
    fn missing_metadata_object_is_malformed() {
        let doc = DecodedTrace::from_json("{}", "a.json").unwrap();
        assert!(matches!(
            doc.metadata("a.json").unwrap_err(),
            BenchError::MalformedMetadata { .. }
        ));
    }

    #[test]
    fn quoted_counts_are_accepted() {
        let mut value = full();
        value["metadata"]["peak_memory"] = json!("1048576");
        let doc = DecodedTrace::from_json(&value.to_string(), "a.json").unwrap();
        assert_eq!(doc.metadata("a.json").unwrap().peak_memory, 1_048_576);
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = DecodedTrace::from_json("{\"metadata\": ", "a.json").unwrap_err();
        assert!(matches!(err, BenchError::MalformedMetadata { .. }));

        let mut value = full();
        value["metadata"]["pid"] = json!(-1);
        let err = DecodedTrace::from_json(&value.to_string(), "a.json").unwrap_err();
        assert!(matches!(err, BenchError::MalformedMetadata { .. }));
    }
}
