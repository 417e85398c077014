//! Output module

pub mod formatter;

pub use formatter::{create_spinner, write_output, JsonFormatter, SummaryFormatter};
