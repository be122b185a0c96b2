//! Configuration file support for vcn-bom.
//!
//! Provides YAML-based configuration through `vcn-bom.config.yml` files,
//! and the merge of file values with command-line flags into [`Settings`].

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::cli::Args;
use vcn_bom::adapters::outbound::filesystem::DEFAULT_BOM_FILE;
use vcn_bom::adapters::outbound::network::{DEFAULT_MAVEN_REPO, DEFAULT_PYPI_URL, DEFAULT_SUMDB};
use vcn_bom::bom::domain::TrustLevel;
use vcn_bom::bom::policies::UnsupportedThreshold;
use vcn_bom::shared::error::BomError;
use vcn_bom::shared::worker_pool::DEFAULT_WORKERS;
use vcn_bom::shared::Result;

pub const CONFIG_FILENAME: &str = "vcn-bom.config.yml";

/// Ledger file used when neither the flag nor the config names one
pub const DEFAULT_LEDGER_FILE: &str = "vcn-ledger.json";

/// Environment variable consulted when no signer ID is configured
pub const SIGNER_ID_ENV: &str = "VCN_SIGNER_ID";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Top-level configuration file schema.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    pub signer_id: Option<String>,
    pub trust_level: Option<i64>,
    pub max_unsupported: Option<i64>,
    pub auto_notarize: Option<bool>,
    pub spdx: Option<PathBuf>,
    pub bom_file: Option<PathBuf>,
    pub ledger: Option<PathBuf>,
    pub workers: Option<usize>,
    pub http_timeout_secs: Option<u64>,
    pub command_timeout_secs: Option<u64>,
    pub sumdb: Option<String>,
    pub pypi_url: Option<String>,
    pub maven_repo: Option<String>,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// Load config from an explicit path. Returns an error if the file is not found.
pub fn load_config_from_path(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "Failed to read config file: {}\n\n💡 Hint: Check that the file exists and is readable.",
            path.display()
        )
    })?;

    let config: ConfigFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse config file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    warn_unknown_fields(&config);
    debug!(path = %path.display(), "Loaded configuration");

    Ok(config)
}

/// Auto-discover config in a directory. Returns `None` silently if not found.
pub fn discover_config(dir: &Path) -> Result<Option<ConfigFile>> {
    let config_path = dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        return Ok(None);
    }

    let config = load_config_from_path(&config_path)?;
    Ok(Some(config))
}

/// Warn about unknown fields in the config file.
fn warn_unknown_fields(config: &ConfigFile) {
    let mut keys: Vec<_> = config.unknown_fields.keys().collect();
    keys.sort();
    for key in keys {
        warn!("Unknown config field '{}' will be ignored", key);
    }
}

/// Effective settings of one run
///
/// Command-line flags win over the environment, which wins over the
/// configuration file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub signer_id: String,
    pub trust_level: i64,
    pub max_unsupported: UnsupportedThreshold,
    pub auto_notarize: bool,
    pub spdx: Option<PathBuf>,
    pub bom_file: PathBuf,
    pub ledger: PathBuf,
    pub workers: usize,
    pub http_timeout: Duration,
    pub command_timeout: Option<Duration>,
    pub sumdb: String,
    pub pypi_url: String,
    pub maven_repo: String,
}

impl Settings {
    /// Merges flags, environment and config, validating ranges
    ///
    /// # Errors
    /// Returns `BomError::InvalidParameter` for a trust level outside 0-2,
    /// a threshold outside 0-100 or a zero worker count.
    pub fn resolve(args: &Args, config: ConfigFile, env_signer_id: Option<String>) -> Result<Self> {
        let trust_level = args
            .trust_level
            .or(config.trust_level)
            .unwrap_or(TrustLevel::Trusted.as_i64());
        TrustLevel::try_from(trust_level)?;

        let max_unsupported =
            UnsupportedThreshold::try_from(args.max_unsupported.or(config.max_unsupported).unwrap_or(0))?;

        let workers = args.workers.or(config.workers).unwrap_or(DEFAULT_WORKERS);
        if workers == 0 {
            return Err(BomError::InvalidParameter {
                name: "workers".to_string(),
                details: "at least one worker is required".to_string(),
            }
            .into());
        }

        let signer_id = args
            .signer_id
            .clone()
            .or(env_signer_id.filter(|id| !id.trim().is_empty()))
            .or(config.signer_id)
            .unwrap_or_default();

        Ok(Self {
            signer_id,
            trust_level,
            max_unsupported,
            auto_notarize: args.auto_notarize || config.auto_notarize.unwrap_or(false),
            spdx: args.spdx.clone().or(config.spdx),
            bom_file: args
                .bom_file
                .clone()
                .or(config.bom_file)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_BOM_FILE)),
            ledger: args
                .ledger
                .clone()
                .or(config.ledger)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_FILE)),
            workers,
            http_timeout: Duration::from_secs(
                args.http_timeout
                    .or(config.http_timeout_secs)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
            command_timeout: args
                .command_timeout
                .or(config.command_timeout_secs)
                .map(Duration::from_secs),
            sumdb: config.sumdb.unwrap_or_else(|| DEFAULT_SUMDB.to_string()),
            pypi_url: config.pypi_url.unwrap_or_else(|| DEFAULT_PYPI_URL.to_string()),
            maven_repo: config.maven_repo.unwrap_or_else(|| DEFAULT_MAVEN_REPO.to_string()),
        })
    }
}
