use crate::bom::services::TrustPolicyOptions;
use std::path::PathBuf;

/// BomRequest - Internal request DTO for BOM generation use case
///
/// Built by the CLI once flags and configuration have been merged and
/// range-checked.
#[derive(Debug, Clone)]
pub struct BomRequest {
    /// File or directory whose dependencies are discovered
    pub artifact_path: PathBuf,
    /// Signer, minimum trust level, auto-notarize flag and threshold
    pub policy: TrustPolicyOptions,
    /// Destination of the `vcn.<signer>.<hash>` side file
    pub bom_file: PathBuf,
    /// Optional destination of the SPDX tag:value document
    pub spdx_file: Option<PathBuf>,
}

impl BomRequest {
    pub fn new(artifact_path: PathBuf, policy: TrustPolicyOptions, bom_file: PathBuf) -> Self {
        Self {
            artifact_path,
            policy,
            bom_file,
            spdx_file: None,
        }
    }

    pub fn with_spdx_file(mut self, spdx_file: Option<PathBuf>) -> Self {
        self.spdx_file = spdx_file;
        self
    }
}
