use crate::shared::Result;
use async_trait::async_trait;
use std::path::Path;

/// CommandRunner port for external ecosystem tools
///
/// Extractors run `go`, `python`, `dotnet`, `mvn` and `npm` through this
/// port so they can be exercised without the tools installed.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` and returns its standard output
    ///
    /// # Arguments
    /// * `program` - Executable name, resolved through `PATH`
    /// * `args` - Command-line arguments
    /// * `dir` - Working directory, or the current one when `None`
    ///
    /// # Errors
    /// Returns an error if the program cannot be started, exits with a
    /// non-zero status, or exceeds the configured timeout.
    async fn run(&self, program: &str, args: &[&str], dir: Option<&Path>) -> Result<Vec<u8>>;
}
