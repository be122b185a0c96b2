use super::FileSystemWriter;
use crate::bom::domain::ResolvedDependency;
use crate::ports::outbound::OutputPresenter;
use crate::shared::Result;
use std::path::{Path, PathBuf};

/// Default name of the side file listing ledger keys
pub const DEFAULT_BOM_FILE: &str = ".bom";

/// BomFileWriter writes the `.bom` side file
///
/// One `vcn.<signer>.<hash>` line per resolved dependency. A later
/// notarization step reads this file to attach the BOM to the artifact.
pub struct BomFileWriter {
    writer: FileSystemWriter,
}

impl BomFileWriter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            writer: FileSystemWriter::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.writer.output_path()
    }

    pub fn render(dependencies: &[ResolvedDependency]) -> String {
        dependencies
            .iter()
            .map(|dep| format!("{}\n", dep.ledger_key()))
            .collect()
    }

    pub fn write(&self, dependencies: &[ResolvedDependency]) -> Result<()> {
        self.writer.present(&Self::render(dependencies))
    }
}
