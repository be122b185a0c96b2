//! Go extractors: linked executables, module source trees and bare `go.sum` files

mod buildinfo;
mod exe;
mod go_list;
mod go_sum;

pub use buildinfo::{read_build_info, BuildInfo};
pub use exe::GoBinaryArtifact;
pub use go_list::GoListArtifact;
pub use go_sum::GoSumArtifact;

use super::{files_with_extension, EcosystemContext};
use crate::ports::outbound::Artifact;
use crate::shared::Result;
use std::path::Path;

/// Detects a Go executable or a Go module directory
///
/// A file is accepted only when it carries Go build information. A
/// directory with `go.mod` or `*.go` sources is listed with `go list`; a
/// directory with only `go.sum` is read directly.
pub fn detect(path: &Path, ctx: &EcosystemContext) -> Result<Option<Box<dyn Artifact>>> {
    if path.is_file() {
        return Ok(GoBinaryArtifact::detect(path)?.map(|a| Box::new(a) as Box<dyn Artifact>));
    }
    if !path.is_dir() {
        return Ok(None);
    }

    let go_sum = path.join("go.sum");
    let go_sum = go_sum.is_file().then_some(go_sum);
    let is_module = path.join("go.mod").is_file() || !files_with_extension(path, &["go"])?.is_empty();

    if is_module {
        return Ok(Some(Box::new(GoListArtifact::new(path, ctx, go_sum))));
    }
    Ok(go_sum.map(|sum| Box::new(GoSumArtifact::new(path, sum)) as Box<dyn Artifact>))
}
