//! Report writers: CSV tables and an HTML summary page.

pub mod html;
pub mod tables;

pub use html::render_html_report;
pub use tables::write_report_tables;
