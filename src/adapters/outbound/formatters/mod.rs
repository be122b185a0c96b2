/// Formatter adapters for BOM output formats
mod spdx_formatter;

pub use spdx_formatter::{DocumentInfo, SpdxFormatter};
