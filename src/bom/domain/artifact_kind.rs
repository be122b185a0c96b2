use std::fmt;

/// Ecosystem tag of an artifact
///
/// The tag is also the `kind` under which dependencies of the artifact get
/// notarized, so its string form must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Go,
    Python,
    DotNet,
    Java,
    Node,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Go => "go",
            ArtifactKind::Python => "python",
            ArtifactKind::DotNet => ".Net",
            ArtifactKind::Java => "JavaMaven",
            ArtifactKind::Node => "node",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
