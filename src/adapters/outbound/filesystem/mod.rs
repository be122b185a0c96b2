/// Filesystem adapters for file I/O operations
mod bom_file_writer;
mod file_reader;
mod file_writer;

pub use bom_file_writer::{BomFileWriter, DEFAULT_BOM_FILE};
pub use file_reader::FileSystemReader;
pub use file_writer::{FileSystemWriter, StdoutPresenter};
