use crate::bom::domain::{ArtifactKind, Dependency, ResolvedDependency, TrustLevel};
use crate::bom::policies::UnsupportedThreshold;
use crate::ports::outbound::{Ledger, LedgerArtifact, LedgerError, LedgerStatus, LoadedArtifact};
use crate::shared::error::{BomError, PolicyFailure, PolicyOffender};
use crate::shared::Result;
use anyhow::Context;
use std::collections::BTreeMap;
use tracing::{debug, info};

const NOTARIZED_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Inputs of one trust evaluation pass
#[derive(Debug, Clone)]
pub struct TrustPolicyOptions {
    /// Identity dependencies are looked up under and notarized as
    pub signer_id: String,
    /// Requested minimum trust level, validated against the accepted range
    pub trust_level: i64,
    pub auto_notarize: bool,
    pub max_unsupported: UnsupportedThreshold,
}

/// TrustPolicyEngine authenticates dependencies against the ledger
///
/// Evaluation is serialized in list order so the logged outcome is
/// deterministic even when extraction ran concurrently.
pub struct TrustPolicyEngine<'a, L: Ledger> {
    ledger: &'a L,
}

impl<'a, L: Ledger> TrustPolicyEngine<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Authenticates every dependency and applies the trust policy
    ///
    /// # Arguments
    /// * `kind` - Ecosystem of the artifact, used as notarization kind
    /// * `dependencies` - Extracted dependencies
    /// * `options` - Signer, minimum level, auto-notarize flag and threshold
    ///
    /// # Returns
    /// One resolved dependency per input, in input order. When
    /// auto-notarization ran, previously Unsupported entries are Trusted.
    ///
    /// # Errors
    /// - `BomError::InvalidParameter` for a trust level outside 0-2
    /// - `BomError::LedgerCompromised` if a ledger proof fails verification
    /// - `BomError::TrustPolicyViolation` listing every offending dependency
    /// - Any ledger or notarization failure, which stops the pass at once
    pub async fn auth_dependencies(
        &self,
        kind: ArtifactKind,
        dependencies: &[Dependency],
        options: &TrustPolicyOptions,
    ) -> Result<Vec<ResolvedDependency>> {
        let required = TrustLevel::try_from(options.trust_level)?;

        if dependencies.is_empty() {
            return Ok(Vec::new());
        }

        info!(count = dependencies.len(), %required, "Authenticating dependencies");

        let mut resolved = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let level = self.authenticate(dependency, &options.signer_id).await?;
            debug!(name = dependency.name(), version = dependency.version(), %level, "Authenticated");
            resolved.push(ResolvedDependency::authenticated(
                dependency.clone(),
                level,
                &options.signer_id,
            ));
        }

        Self::evaluate(&resolved, required, options.max_unsupported)?;

        let unsupported = resolved
            .iter()
            .filter(|dep| dep.trust_level() == TrustLevel::Unsupported)
            .count();
        if !options.auto_notarize || unsupported == 0 {
            return Ok(resolved);
        }

        info!(count = unsupported, "Notarizing unsupported dependencies");
        let mut notarized = Vec::with_capacity(resolved.len());
        for dep in resolved {
            if dep.trust_level() == TrustLevel::Unsupported {
                notarized.push(self.notarize(kind, dep, &options.signer_id).await?);
            } else {
                notarized.push(dep);
            }
        }

        Ok(notarized)
    }

    async fn authenticate(&self, dependency: &Dependency, signer_id: &str) -> Result<TrustLevel> {
        match self.ledger.load_artifact(dependency.hash(), signer_id).await {
            Ok(loaded) => Self::classify(dependency, &loaded),
            Err(LedgerError::NotFound) => Ok(TrustLevel::Unsupported),
            Err(e) => Err(e).with_context(|| {
                format!("Failed to authenticate dependency {}", dependency.name())
            }),
        }
    }

    /// Maps a loaded ledger record to a trust level
    fn classify(dependency: &Dependency, loaded: &LoadedArtifact) -> Result<TrustLevel> {
        if !loaded.verified {
            return Err(BomError::LedgerCompromised {
                dependency: dependency.name().to_string(),
            }
            .into());
        }

        let level = if loaded.record.is_revoked() {
            TrustLevel::Untrusted
        } else if loaded.record.status == LedgerStatus::Unsupported {
            TrustLevel::Unsupported
        } else {
            TrustLevel::Trusted
        };
        Ok(level)
    }

    /// Applies the minimum level and the unsupported threshold to the pass
    fn evaluate(
        resolved: &[ResolvedDependency],
        required: TrustLevel,
        threshold: UnsupportedThreshold,
    ) -> Result<()> {
        let mut offenders = Vec::new();
        let mut unsupported_count = 0;
        let mut failed = false;

        for dep in resolved.iter().filter(|dep| dep.trust_level() < required) {
            if dep.trust_level() == TrustLevel::Unsupported {
                unsupported_count += 1;
            } else {
                failed = true;
            }
            offenders.push(PolicyOffender {
                name: dep.name().to_string(),
                version: dep.dependency().version().to_string(),
                level: dep.trust_level(),
            });
        }

        if threshold.is_exceeded(unsupported_count, resolved.len()) {
            failed = true;
        }

        if failed {
            return Err(BomError::TrustPolicyViolation(PolicyFailure {
                required,
                offenders,
                unsupported_count,
                unsupported_allowed: threshold.allowed(resolved.len()),
            })
            .into());
        }

        Ok(())
    }

    async fn notarize(
        &self,
        kind: ArtifactKind,
        dep: ResolvedDependency,
        signer_id: &str,
    ) -> Result<ResolvedDependency> {
        let dependency = dep.dependency();
        let metadata = BTreeMap::from([
            ("version".to_string(), dependency.version().to_string()),
            ("hashType".to_string(), dependency.hash_type().name().to_string()),
        ]);
        let artifact = LedgerArtifact {
            kind: kind.to_string(),
            name: dependency.name().to_string(),
            hash: dependency.hash().to_string(),
            size: 0,
            content_type: NOTARIZED_CONTENT_TYPE.to_string(),
            metadata,
        };

        let receipt = self
            .ledger
            .sign(artifact, signer_id, LedgerStatus::Trusted)
            .await
            .with_context(|| format!("Notarization of {} failed", dependency.name()))?;
        debug!(name = dependency.name(), tx_id = receipt.tx_id, "Notarized");

        dep.notarized(signer_id)
    }
}
