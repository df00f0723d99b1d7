//! Aggregation model: group normalized records by input dataset and by step.
//!
//! Every function here is pure over the record slice and independent of its
//! order: groups are keyed in `BTreeMap`s and each group's members are sorted
//! with [`BenchmarkRecord::canonical_cmp`] before any float is reduced.

use crate::trace::{ALL_INPUTS, BenchmarkRecord};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Workflow cost of one input dataset across all steps run on it.
///
/// Field order is the column order of `workflow_per_input_performance.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputSummary {
    pub input_name: String,
    pub file_size: Option<f64>,
    /// Max over the group.
    pub peak_memory: f64,
    /// Sum over the group.
    pub total_allocation: u64,
    /// Sum over the group: steps on one dataset run one after another.
    pub time_duration: f64,
}

/// Cost of one step across every dataset it ran on.
///
/// Field order is the column order of `step_performance.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepSummary {
    pub process_name: String,
    /// Sum over the group: per-dataset runs of a step overlap.
    pub peak_memory: f64,
    /// Max over the group: the slowest run bounds the stage.
    pub time_duration: f64,
}

/// Per-dataset runtime of every step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeMatrix {
    pub steps: Vec<String>,
    pub rows: Vec<RuntimeRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeRow {
    pub input_name: String,
    /// Seconds, aligned with [`RuntimeMatrix::steps`].
    pub durations: Vec<Option<f64>>,
    pub file_size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunTotals {
    pub records: usize,
    pub inputs: usize,
    pub steps: usize,
    /// Sum of per-step max durations.
    pub total_runtime_s: f64,
    pub total_runtime_min: f64,
    /// Largest per-step summed peak memory.
    pub peak_memory: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub totals: RunTotals,
    pub inputs: Vec<InputSummary>,
    pub steps: Vec<StepSummary>,
    pub runtime: RuntimeMatrix,
}

fn group_by<'a, F>(records: &'a [BenchmarkRecord], key: F) -> BTreeMap<&'a str, Vec<&'a BenchmarkRecord>>
where
    F: Fn(&'a BenchmarkRecord) -> &'a str,
{
    let mut groups: BTreeMap<&str, Vec<&BenchmarkRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    for members in groups.values_mut() {
        members.sort_by(|a, b| a.canonical_cmp(b));
    }
    groups
}

fn max_f64(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}

/// One row per distinct `input_data_name`, sorted by name.
pub fn summarize_by_input(records: &[BenchmarkRecord]) -> Vec<InputSummary> {
    group_by(records, |r| r.input_data_name.as_str())
        .into_iter()
        .map(|(name, members)| InputSummary {
            input_name: name.to_string(),
            // Members of a group share one source file; not cross-checked.
            file_size: members.iter().find_map(|r| r.file_size),
            peak_memory: max_f64(members.iter().map(|r| r.peak_memory)),
            total_allocation: members.iter().map(|r| r.total_allocations).sum(),
            time_duration: members.iter().map(|r| r.time_duration).sum(),
        })
        .collect()
}

/// One row per distinct `step`, sorted by name.
pub fn summarize_by_step(records: &[BenchmarkRecord]) -> Vec<StepSummary> {
    group_by(records, |r| r.step.as_str())
        .into_iter()
        .map(|(step, members)| StepSummary {
            process_name: step.to_string(),
            peak_memory: members.iter().map(|r| r.peak_memory).sum(),
            time_duration: max_f64(members.iter().map(|r| r.time_duration)),
        })
        .collect()
}

/// Step columns: `step_order` first (steps absent from the records are
/// skipped), then the remaining steps by earliest start, ties by name.
fn ordered_steps(records: &[BenchmarkRecord], step_order: &[String]) -> Vec<String> {
    let mut first_start = BTreeMap::new();
    for r in records {
        first_start
            .entry(r.step.as_str())
            .and_modify(|t| {
                if r.start_time < *t {
                    *t = r.start_time;
                }
            })
            .or_insert(r.start_time);
    }

    let mut out: Vec<String> = Vec::new();
    for step in step_order {
        if first_start.contains_key(step.as_str()) && !out.contains(step) {
            out.push(step.clone());
        }
    }

    let mut rest: Vec<(&str, NaiveDateTime)> = first_start
        .iter()
        .map(|(step, t)| (*step, *t))
        .filter(|(step, _)| !out.iter().any(|s| s.as_str() == *step))
        .collect();
    rest.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    out.extend(rest.into_iter().map(|(s, _)| s.to_string()));
    out
}

/// Runtime of each step for each dataset.
///
/// Steps that only ran over all inputs at once fill the same (slowest)
/// duration into every dataset's row.
pub fn build_runtime_matrix(records: &[BenchmarkRecord], step_order: &[String]) -> RuntimeMatrix {
    let steps = ordered_steps(records, step_order);

    let mut shared: BTreeMap<&str, f64> = BTreeMap::new();
    for (step, members) in group_by(records, |r| r.step.as_str()) {
        let all: Vec<f64> = members
            .iter()
            .filter(|r| r.input_data_name == ALL_INPUTS)
            .map(|r| r.time_duration)
            .collect();
        if !all.is_empty() {
            shared.insert(step, max_f64(all.into_iter()));
        }
    }

    let mut rows = Vec::new();
    for (name, members) in group_by(records, |r| r.input_data_name.as_str()) {
        if name == ALL_INPUTS {
            continue;
        }
        let durations = steps
            .iter()
            .map(|step| {
                let own: Vec<f64> = members
                    .iter()
                    .filter(|r| &r.step == step)
                    .map(|r| r.time_duration)
                    .collect();
                if own.is_empty() {
                    shared.get(step.as_str()).copied()
                } else {
                    Some(own.into_iter().sum())
                }
            })
            .collect();
        rows.push(RuntimeRow {
            input_name: name.to_string(),
            durations,
            file_size: members.iter().find_map(|r| r.file_size),
        });
    }

    RuntimeMatrix { steps, rows }
}

pub fn run_totals(records: &[BenchmarkRecord], steps: &[StepSummary]) -> RunTotals {
    let inputs: BTreeSet<&str> = records.iter().map(|r| r.input_data_name.as_str()).collect();
    let mut step_durations: Vec<f64> = steps.iter().map(|s| s.time_duration).collect();
    step_durations.sort_by(f64::total_cmp);
    let total_runtime_s: f64 = step_durations.into_iter().sum();

    RunTotals {
        records: records.len(),
        inputs: inputs.len(),
        steps: steps.len(),
        total_runtime_s,
        total_runtime_min: total_runtime_s / 60.0,
        peak_memory: if steps.is_empty() {
            0.0
        } else {
            max_f64(steps.iter().map(|s| s.peak_memory))
        },
    }
}

/// Build every summary the report writers consume.
pub fn build_report_data(records: &[BenchmarkRecord], step_order: &[String]) -> ReportData {
    let inputs = summarize_by_input(records);
    let steps = summarize_by_step(records);
    let totals = run_totals(records, &steps);
    let runtime = build_runtime_matrix(records, step_order);
    ReportData {
        totals,
        inputs,
        steps,
        runtime,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::trace::record::{TIME_FORMAT, duration_secs};
    use chrono::TimeDelta;
    use pretty_assertions::assert_eq;

    pub(crate) fn record(
        input: &str,
        step: &str,
        start_offset_s: i64,
        duration_s: i64,
        peak_mb: f64,
    ) -> BenchmarkRecord {
        let base = NaiveDateTime::parse_from_str("2023-07-01 12:00:00.000000", TIME_FORMAT).unwrap();
        let start_time = base + TimeDelta::seconds(start_offset_s);
        let end_time = start_time + TimeDelta::seconds(duration_s);
        BenchmarkRecord {
            pid: 1000 + start_offset_s as u64,
            script: format!("{step}.py"),
            step: step.to_string(),
            input_data_name: input.to_string(),
            start_time,
            end_time,
            time_duration: duration_secs(start_time, end_time),
            total_allocations: 100,
            peak_memory: peak_mb,
            file_size: None,
            source: format!("{input}_{step}_benchmark.json"),
        }
    }

    #[test]
    fn by_input_sums_time_and_takes_max_memory() {
        let records = vec![
            record("plateA", "annotate", 0, 10, 3.0),
            record("plateA", "normalize", 10, 5, 8.5),
            record("plateB", "annotate", 0, 7, 1.0),
        ];
        let rows = summarize_by_input(&records);
        assert_eq!(
            rows[0],
            InputSummary {
                input_name: "plateA".into(),
                file_size: None,
                peak_memory: 8.5,
                total_allocation: 200,
                time_duration: 15.0,
            }
        );
        assert_eq!(rows[1].input_name, "plateB");
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn by_input_takes_first_known_file_size() {
        let mut a = record("plateA", "annotate", 0, 1, 1.0);
        let mut b = record("plateA", "normalize", 5, 1, 1.0);
        a.file_size = None;
        b.file_size = Some(12.5);
        let rows = summarize_by_input(&[a, b]);
        assert_eq!(rows[0].file_size, Some(12.5));
    }

    #[test]
    fn by_step_sums_memory_and_takes_max_time() {
        let records = vec![
            record("plateA", "annotate", 0, 10, 3.0),
            record("plateB", "annotate", 0, 12, 4.0),
            record(ALL_INPUTS, "consensus", 30, 2, 9.0),
        ];
        let rows = summarize_by_step(&records);
        assert_eq!(
            rows,
            vec![
                StepSummary {
                    process_name: "annotate".into(),
                    peak_memory: 7.0,
                    time_duration: 12.0,
                },
                StepSummary {
                    process_name: "consensus".into(),
                    peak_memory: 9.0,
                    time_duration: 2.0,
                },
            ]
        );
    }

    #[test]
    fn summaries_ignore_record_order() {
        let records = vec![
            record("plateA", "annotate", 0, 10, 0.1),
            record("plateA", "normalize", 10, 5, 0.2),
            record("plateB", "annotate", 1, 11, 0.3),
            record("plateB", "normalize", 12, 3, 0.7),
            record("plateC", "annotate", 2, 9, 1e-9),
            record(ALL_INPUTS, "feature_select", 20, 30, 1e9),
            record(ALL_INPUTS, "consensus", 50, 4, 0.01),
        ];
        let expected = build_report_data(&records, &[]);

        // Every rotation and the reversal of the input.
        let mut variants: Vec<Vec<BenchmarkRecord>> = (0..records.len())
            .map(|k| {
                let mut v = records.clone();
                v.rotate_left(k);
                v
            })
            .collect();
        variants.push(records.iter().rev().cloned().collect());

        for shuffled in variants {
            let got = build_report_data(&shuffled, &[]);
            assert_eq!(got.inputs, expected.inputs);
            assert_eq!(got.steps, expected.steps);
            assert_eq!(got.runtime, expected.runtime);
            assert_eq!(got.totals, expected.totals);
        }
    }

    #[test]
    fn runtime_matrix_fills_shared_steps() {
        let mut records = vec![
            record("plateA", "annotate", 0, 10, 1.0),
            record("plateA", "normalize", 10, 5, 1.0),
            record("plateB", "annotate", 0, 8, 1.0),
            record(ALL_INPUTS, "feature_select", 20, 30, 1.0),
        ];
        records[0].file_size = Some(2.0);

        let matrix = build_runtime_matrix(&records, &[]);
        assert_eq!(matrix.steps, vec!["annotate", "normalize", "feature_select"]);
        assert_eq!(
            matrix.rows,
            vec![
                RuntimeRow {
                    input_name: "plateA".into(),
                    durations: vec![Some(10.0), Some(5.0), Some(30.0)],
                    file_size: Some(2.0),
                },
                RuntimeRow {
                    input_name: "plateB".into(),
                    durations: vec![Some(8.0), None, Some(30.0)],
                    file_size: None,
                },
            ]
        );
    }

    #[test]
    fn explicit_step_order_comes_first() {
        let records = vec![
            record("plateA", "annotate", 0, 1, 1.0),
            record("plateA", "aggregate_cells", 5, 1, 1.0),
            record("plateA", "normalize", 9, 1, 1.0),
        ];
        let order = vec!["normalize".to_string(), "missing".to_string()];
        let matrix = build_runtime_matrix(&records, &order);
        assert_eq!(matrix.steps, vec!["normalize", "annotate", "aggregate_cells"]);
    }

    #[test]
    fn totals_over_steps() {
        let records = vec![
            record("plateA", "annotate", 0, 60, 3.0),
            record("plateB", "annotate", 0, 90, 4.0),
            record(ALL_INPUTS, "consensus", 100, 30, 5.0),
        ];
        let data = build_report_data(&records, &[]);
        assert_eq!(
            data.totals,
            RunTotals {
                records: 3,
                inputs: 3,
                steps: 2,
                total_runtime_s: 120.0,
                total_runtime_min: 2.0,
                peak_memory: 7.0,
            }
        );
    }
}
