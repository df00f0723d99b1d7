//! Filesystem side of the pipeline: path validation, artifact discovery, and
//! mapping datasets to their source data files.

pub mod locate;
pub mod mapping;
pub mod resolve;
pub mod sizes;

pub use locate::{TraceExt, find_benchmark_files};
pub use mapping::enrich_file_sizes;
pub use resolve::{PathInput, resolve_path};
pub use sizes::{apply_size_map, collect_file_sizes, load_size_map};
