//! End-to-end `report` run: decode → normalize → enrich → aggregate → write.

use crate::Result;
use crate::config::ReportConfig;
use crate::decode::{TraceDecoder, decode_directory};
use crate::files::{apply_size_map, enrich_file_sizes, load_size_map};
use crate::model::{ReportData, build_report_data};
use crate::render::{render_html_report, write_report_tables};
use crate::trace::{BenchmarkRecord, load_records};

use anyhow::{Context, bail};
use std::fs;
use std::path::PathBuf;
use tracing::info;

pub struct ReportOutput {
    pub records: Vec<BenchmarkRecord>,
    pub data: ReportData,
    pub written: Vec<PathBuf>,
}

/// Run the whole report. `decoder` is only used when `cfg.decode` is set.
pub fn run_report(cfg: &ReportConfig, decoder: Option<&dyn TraceDecoder>) -> Result<ReportOutput> {
    if cfg.decode {
        let decoder = decoder.context("decoding requested but no decoder is available")?;
        let report = decode_directory(decoder, &cfg.benchmark_dir, cfg.mode)
            .with_context(|| format!("decode traces in {}", cfg.benchmark_dir.display()))?;
        info!(decoded = report.decoded.len(), failed = report.failed.len(), "decoded traces");
        if !report.failed.is_empty() {
            let names: Vec<String> = report
                .failed
                .iter()
                .map(|(path, _)| path.display().to_string())
                .collect();
            bail!(
                "{} trace(s) failed to decode: {}",
                names.len(),
                names.join(", ")
            );
        }
    }

    let mut records = load_records(&cfg.benchmark_dir)
        .with_context(|| format!("load decoded traces from {}", cfg.benchmark_dir.display()))?;
    info!(records = records.len(), "normalized benchmark records");

    if let Some(data_dir) = &cfg.data_dir {
        enrich_file_sizes(&mut records, data_dir, &cfg.data_ext)
            .with_context(|| format!("map input files in {}", data_dir.display()))?;
    } else if let Some(sizes_path) = &cfg.sizes {
        let sizes = load_size_map(sizes_path)
            .with_context(|| format!("read size map {}", sizes_path.display()))?;
        apply_size_map(&mut records, &sizes);
    }

    let data = build_report_data(&records, &cfg.step_order);
    info!(
        total_runtime_min = data.totals.total_runtime_min,
        peak_memory_mb = data.totals.peak_memory,
        "aggregated"
    );

    let mut written = write_report_tables(&cfg.out_dir, &records, &data)
        .with_context(|| format!("write tables to {}", cfg.out_dir.display()))?;

    if let Some(html_path) = &cfg.html {
        let html = render_html_report(&data)?;
        if let Some(parent) = html_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(html_path, html).with_context(|| format!("write {}", html_path.display()))?;
        written.push(html_path.clone());
    }

    Ok(ReportOutput {
        records,
        data,
        written,
    })
}
