//! Decoded memray traces → normalized benchmark records.

pub mod doc;
pub mod parse;
pub mod record;
pub mod stem;

pub use parse::load_records;
pub use record::BenchmarkRecord;
pub use stem::ALL_INPUTS;
