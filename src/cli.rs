use clap::Parser;
use std::path::PathBuf;

/// Discover the dependencies of a build artifact and check them against the ledger
#[derive(Parser, Debug)]
#[command(name = "vcn-bom")]
#[command(version)]
#[command(
    about = "Discover the dependencies of a build artifact and check them against the ledger",
    long_about = "Discovers the dependencies of a Go binary or module, a Python project, \
                  a .NET solution, a Maven project or an npm project, resolves a content \
                  hash for each of them and authenticates every dependency against the \
                  notarization ledger. On success a .bom file listing the ledger keys is \
                  written, optionally together with an SPDX 2.2 document."
)]
pub struct Args {
    /// Artifact to analyze: a directory, an executable, a solution, a POM or a JAR
    pub path: PathBuf,

    /// Identity dependencies are looked up under and notarized as
    #[arg(long = "signer-id", value_name = "ID")]
    pub signer_id: Option<String>,

    /// Minimum trust level: 0 (untrusted) / 1 (unsupported) / 2 (trusted)
    #[arg(long = "trust-level", value_name = "LEVEL", allow_negative_numbers = true)]
    pub trust_level: Option<i64>,

    /// Max number (in %) of unsupported dependencies allowed
    #[arg(long = "max-unsupported", value_name = "PERCENT", allow_negative_numbers = true)]
    pub max_unsupported: Option<i64>,

    /// Enables automatic notarization of unsupported dependencies
    #[arg(long = "nd", visible_alias = "auto-notarize")]
    pub auto_notarize: bool,

    /// Name of the file to output the BOM in SPDX format ("-" for stdout)
    #[arg(long, value_name = "FILE")]
    pub spdx: Option<PathBuf>,

    /// Side file receiving one ledger key per dependency (default: .bom)
    #[arg(long = "bom-file", value_name = "FILE")]
    pub bom_file: Option<PathBuf>,

    /// JSON ledger file holding notarization records
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Configuration file (default: vcn-bom.config.yml in the current directory)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of concurrent hash resolution workers
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Timeout in seconds for checksum authority requests
    #[arg(long = "http-timeout", value_name = "SECS")]
    pub http_timeout: Option<u64>,

    /// Timeout in seconds after which external tools are killed
    #[arg(long = "command-timeout", value_name = "SECS")]
    pub command_timeout: Option<u64>,

    /// Enable verbose logging (repeat for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log filter matching the number of `-v` flags
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
