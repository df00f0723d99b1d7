use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod decode;
mod error;
mod files;
mod model;
mod pipeline;
mod render;
mod trace;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "cytobench")]
#[command(about = "Workflow benchmark aggregator for memray traces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert every `.bin` trace in a directory into a sibling `.json`.
    Decode {
        #[arg(long)]
        benchmarks: String,

        /// Profiler executable (name on PATH or path).
        #[arg(long, default_value = config::DEFAULT_TOOL)]
        tool: String,

        /// Log traces that fail to decode and continue with the rest.
        #[arg(long)]
        keep_going: bool,
    },

    /// Build the benchmark tables (and optionally an HTML page).
    Report {
        /// JSON config file; flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        benchmarks: Option<String>,

        /// Directory with the input data files, for file sizes.
        #[arg(long)]
        data_dir: Option<String>,

        /// Extension of the input data files (default: sqlite).
        #[arg(long)]
        data_ext: Option<String>,

        /// Size map written by `cytobench sizes`, instead of --data-dir.
        #[arg(long, conflicts_with = "data_dir")]
        sizes: Option<String>,

        #[arg(short = 'o', long)]
        out_dir: Option<String>,

        /// Decode `.bin` traces before reading the `.json` ones.
        #[arg(long)]
        decode: bool,

        /// Profiler executable used with --decode (default: memray).
        #[arg(long)]
        tool: Option<String>,

        #[arg(long)]
        keep_going: bool,

        #[arg(long)]
        html: Option<String>,

        /// Column order for the runtime table, e.g. annotate,normalize.
        #[arg(long, value_delimiter = ',')]
        step_order: Vec<String>,
    },

    /// Write a JSON map of input plate name to file size (MB).
    Sizes {
        #[arg(long)]
        data_dir: PathBuf,

        #[arg(long, default_value = "parquet")]
        data_ext: String,

        /// Cut plate names at this marker (`plateA_converted` → `plateA`).
        #[arg(long)]
        strip_suffix: Option<String>,

        #[arg(short = 'o', long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cytobench=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Decode {
            benchmarks,
            tool,
            keep_going,
        } => {
            // Fail before touching any file if the tool is missing.
            let decoder = decode::MemrayDecoder::locate(&tool)?;
            info!(tool = %decoder.program().display(), "using profiler");
            let dir = files::resolve_path(benchmarks.as_str(), true)?;
            let mode = if keep_going {
                decode::DecodeMode::KeepGoing
            } else {
                decode::DecodeMode::Strict
            };

            let report = decode::decode_directory(&decoder, &dir, mode)?;
            println!(
                "Decoded {} trace(s) in {}",
                report.decoded.len(),
                dir.display()
            );
            if !report.failed.is_empty() {
                anyhow::bail!("{} trace(s) failed to decode", report.failed.len());
            }
        }

        Commands::Report {
            config: config_path,
            benchmarks,
            data_dir,
            data_ext,
            sizes,
            out_dir,
            decode,
            tool,
            keep_going,
            html,
            step_order,
        } => {
            let raw = match &config_path {
                Some(path) => config::RawConfig::load(path)?,
                None => config::RawConfig::default(),
            };
            let cfg = raw.validate(config::ReportFlags {
                benchmark_dir: benchmarks,
                data_dir,
                data_ext,
                sizes,
                out_dir,
                tool,
                step_order,
                decode,
                keep_going,
                html,
            })?;

            let decoder = if cfg.decode {
                let decoder = decode::MemrayDecoder::locate(&cfg.tool)?;
                info!(tool = %decoder.program().display(), "using profiler");
                Some(decoder)
            } else {
                None
            };

            let output = pipeline::run_report(
                &cfg,
                decoder.as_ref().map(|d| d as &dyn decode::TraceDecoder),
            )?;
            info!(
                records = output.records.len(),
                inputs = output.data.inputs.len(),
                steps = output.data.steps.len(),
                "report complete"
            );
            for path in &output.written {
                println!("Wrote {}", path.display());
            }
        }

        Commands::Sizes {
            data_dir,
            data_ext,
            strip_suffix,
            out,
        } => {
            let sizes = files::collect_file_sizes(&data_dir, &data_ext, strip_suffix.as_deref())?;
            std::fs::write(&out, serde_json::to_string_pretty(&sizes)?)?;
            println!("Wrote {}", out.display());
        }
    }

    Ok(())
}
