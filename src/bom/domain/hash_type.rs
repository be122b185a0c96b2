use crate::shared::Result;
use std::fmt;

/// Closed set of digest algorithms a dependency hash can be tagged with
///
/// `Invalid` marks the absence of a hash. It is never paired with a
/// non-empty hash value (see [`super::ContentHash`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashType {
    #[default]
    Invalid,
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Md2,
    Md4,
    Md5,
    Md6,
}

impl HashType {
    /// Name used in SPDX `PackageChecksum` lines and ledger metadata
    pub fn name(self) -> &'static str {
        match self {
            HashType::Invalid => "Invalid",
            HashType::Sha1 => "SHA1",
            HashType::Sha224 => "SHA224",
            HashType::Sha256 => "SHA256",
            HashType::Sha384 => "SHA384",
            HashType::Sha512 => "SHA512",
            HashType::Md2 => "MD2",
            HashType::Md4 => "MD4",
            HashType::Md5 => "MD5",
            HashType::Md6 => "MD6",
        }
    }

    /// Digest length in bytes, when the algorithm has a fixed one
    pub fn digest_len(self) -> Option<usize> {
        match self {
            HashType::Invalid | HashType::Md6 => None,
            HashType::Sha1 => Some(20),
            HashType::Sha224 => Some(28),
            HashType::Sha256 => Some(32),
            HashType::Sha384 => Some(48),
            HashType::Sha512 => Some(64),
            HashType::Md2 | HashType::Md4 | HashType::Md5 => Some(16),
        }
    }

    /// Maps an algorithm tag (`sha256:...`, `md5:...`) to a hash type
    ///
    /// Returns `None` for tags the combination step does not recognize.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "sha1" => Some(HashType::Sha1),
            "sha224" => Some(HashType::Sha224),
            "sha256" => Some(HashType::Sha256),
            "sha384" => Some(HashType::Sha384),
            "sha512" => Some(HashType::Sha512),
            "md2" => Some(HashType::Md2),
            "md4" => Some(HashType::Md4),
            "md5" => Some(HashType::Md5),
            "md6" => Some(HashType::Md6),
            _ => None,
        }
    }

    /// Parses the name produced by [`HashType::name`]
    pub fn parse_name(name: &str) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "INVALID" => Ok(HashType::Invalid),
            "SHA1" => Ok(HashType::Sha1),
            "SHA224" => Ok(HashType::Sha224),
            "SHA256" => Ok(HashType::Sha256),
            "SHA384" => Ok(HashType::Sha384),
            "SHA512" => Ok(HashType::Sha512),
            "MD2" => Ok(HashType::Md2),
            "MD4" => Ok(HashType::Md4),
            "MD5" => Ok(HashType::Md5),
            "MD6" => Ok(HashType::Md6),
            other => anyhow::bail!("Unknown hash type: {}", other),
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
