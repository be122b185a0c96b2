use super::{ContentHash, HashType, TrustLevel};
use crate::shared::Result;

/// Dependency value object: one third-party unit an artifact relies on
///
/// Extractors produce these. Trust information lives on
/// [`ResolvedDependency`], which only the trust policy engine creates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    name: String,
    version: String,
    hash: ContentHash,
}

impl Dependency {
    pub fn new(name: impl Into<String>, version: impl Into<String>, hash: ContentHash) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            anyhow::bail!("Dependency name cannot be empty");
        }

        Ok(Self {
            name,
            version: version.into(),
            hash,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn hash(&self) -> &str {
        self.hash.value()
    }

    pub fn hash_type(&self) -> HashType {
        self.hash.hash_type()
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.hash
    }
}

/// A dependency after ledger authentication
///
/// Construction is restricted to the trust policy engine so that the trust
/// level and signer are written exactly once per resolution pass. The only
/// further transition is `Unsupported -> Trusted` through [`ResolvedDependency::notarized`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDependency {
    dependency: Dependency,
    trust_level: TrustLevel,
    signer_id: Option<String>,
}

impl ResolvedDependency {
    /// Records the outcome of authenticating `dependency` under `signer_id`
    ///
    /// The signer is only kept when the ledger actually knows the dependency.
    pub(crate) fn authenticated(dependency: Dependency, trust_level: TrustLevel, signer_id: &str) -> Self {
        let signer_id = match trust_level {
            TrustLevel::Unsupported => None,
            TrustLevel::Untrusted | TrustLevel::Trusted => Some(signer_id.to_string()),
        };

        Self {
            dependency,
            trust_level,
            signer_id,
        }
    }

    /// Promotes an unsupported dependency to trusted after notarization
    pub(crate) fn notarized(self, signer_id: &str) -> Result<Self> {
        if self.trust_level != TrustLevel::Unsupported {
            anyhow::bail!(
                "Dependency {} cannot be notarized from trust level {}",
                self.dependency.name(),
                self.trust_level
            );
        }

        Ok(Self {
            dependency: self.dependency,
            trust_level: TrustLevel::Trusted,
            signer_id: Some(signer_id.to_string()),
        })
    }

    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    pub fn name(&self) -> &str {
        self.dependency.name()
    }

    pub fn trust_level(&self) -> TrustLevel {
        self.trust_level
    }

    pub fn signer_id(&self) -> Option<&str> {
        self.signer_id.as_deref()
    }

    /// Ledger key of the dependency, as written to the `.bom` side file
    pub fn ledger_key(&self) -> String {
        format!(
            "vcn.{}.{}",
            self.signer_id.as_deref().unwrap_or_default(),
            self.dependency.hash()
        )
    }
}
