pub mod artifact_kind;
pub mod content_hash;
pub mod dependency;
pub mod hash_type;
pub mod trust_level;

pub use artifact_kind::ArtifactKind;
pub use content_hash::ContentHash;
pub use dependency::{Dependency, ResolvedDependency};
pub use hash_type::HashType;
pub use trust_level::TrustLevel;
