//! Flat tabular outputs consumed by plotting and notebooks.

use crate::error::BenchError;
use crate::model::{InputSummary, ReportData, RuntimeMatrix, StepSummary};
use crate::trace::BenchmarkRecord;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const RECORDS_CSV: &str = "complete_benchmark.csv";
pub const INPUTS_CSV: &str = "workflow_per_input_performance.csv";
pub const STEPS_CSV: &str = "step_performance.csv";
pub const RUNTIME_CSV: &str = "runtime_per_input_each_step.csv";

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), BenchError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Rows are ordered by dataset, then by start time.
pub fn write_records_csv(path: &Path, records: &[BenchmarkRecord]) -> Result<(), BenchError> {
    let mut sorted: Vec<&BenchmarkRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.input_data_name
            .cmp(&b.input_data_name)
            .then_with(|| a.canonical_cmp(b))
    });
    write_rows(path, &sorted)
}

pub fn write_input_summary_csv(path: &Path, rows: &[InputSummary]) -> Result<(), BenchError> {
    write_rows(path, rows)
}

pub fn write_step_summary_csv(path: &Path, rows: &[StepSummary]) -> Result<(), BenchError> {
    write_rows(path, rows)
}

/// Columns are `input_name`, one per step, then `file_size`.
pub fn write_runtime_matrix_csv(path: &Path, matrix: &RuntimeMatrix) -> Result<(), BenchError> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["input_name"];
    header.extend(matrix.steps.iter().map(String::as_str));
    header.push("file_size");
    wtr.write_record(&header)?;

    for row in &matrix.rows {
        let mut fields = vec![row.input_name.clone()];
        fields.extend(row.durations.iter().map(|d| fmt_opt(*d)));
        fields.push(fmt_opt(row.file_size));
        wtr.write_record(&fields)?;
    }
    wtr.flush()?;
    Ok(())
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:?}")).unwrap_or_default()
}

/// Write all four tables into `out_dir`, creating it if needed.
pub fn write_report_tables(
    out_dir: &Path,
    records: &[BenchmarkRecord],
    data: &ReportData,
) -> Result<Vec<PathBuf>, BenchError> {
    fs::create_dir_all(out_dir)?;

    let records_path = out_dir.join(RECORDS_CSV);
    write_records_csv(&records_path, records)?;

    let inputs_path = out_dir.join(INPUTS_CSV);
    write_input_summary_csv(&inputs_path, &data.inputs)?;

    let steps_path = out_dir.join(STEPS_CSV);
    write_step_summary_csv(&steps_path, &data.steps)?;

    let runtime_path = out_dir.join(RUNTIME_CSV);
    write_runtime_matrix_csv(&runtime_path, &data.runtime)?;

    Ok(vec![records_path, inputs_path, steps_path, runtime_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RuntimeRow, build_report_data};
    use crate::model::tests::record;
    use crate::trace::ALL_INPUTS;
    use pretty_assertions::assert_eq;

    #[test]
    fn record_table_has_fixed_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RECORDS_CSV);
        let mut r = record("plate1", "annotate", 0, 10, 2.0);
        r.file_size = Some(1.5);
        write_records_csv(&path, &[r, record(ALL_INPUTS, "consensus", 5, 1, 0.5)]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "pid,script,step,input_data_name,start_time,end_time,time_duration,total_allocations,peak_memory,file_size"
        );
        assert!(lines[1].ends_with(",0.5,"), "{}", lines[1]);
        assert_eq!(
            lines[2],
            "1000,annotate.py,annotate,plate1,2023-07-01 12:00:00.000000,2023-07-01 12:00:10.000000,10.0,100,2.0,1.5"
        );
    }

    #[test]
    fn summary_tables_headers() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record("plateA", "annotate", 0, 10, 3.0),
            record("plateA", "normalize", 10, 5, 4.0),
        ];
        let data = build_report_data(&records, &[]);
        let written = write_report_tables(&dir.path().join("out"), &records, &data).unwrap();
        assert_eq!(written.len(), 4);

        let inputs = fs::read_to_string(dir.path().join("out").join(INPUTS_CSV)).unwrap();
        assert_eq!(
            inputs.lines().collect::<Vec<_>>(),
            vec![
                "input_name,file_size,peak_memory,total_allocation,time_duration",
                "plateA,,4.0,200,15.0",
            ]
        );

        let steps = fs::read_to_string(dir.path().join("out").join(STEPS_CSV)).unwrap();
        assert_eq!(
            steps.lines().collect::<Vec<_>>(),
            vec![
                "process_name,peak_memory,time_duration",
                "annotate,3.0,10.0",
                "normalize,4.0,5.0",
            ]
        );
    }

    #[test]
    fn runtime_matrix_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(RUNTIME_CSV);
        let matrix = RuntimeMatrix {
            steps: vec!["annotate".into(), "normalize".into()],
            rows: vec![RuntimeRow {
                input_name: "plateA".into(),
                durations: vec![Some(10.5), None],
                file_size: Some(3.25),
            }],
        };
        write_runtime_matrix_csv(&path, &matrix).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "input_name,annotate,normalize,file_size\nplateA,10.5,,3.25\n"
        );
    }
}
