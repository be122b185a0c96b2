use super::HashType;
use crate::shared::Result;

/// ContentHash value object pairing a hex digest with its algorithm
///
/// The digest is always stored as lower-case hex. `HashType::Invalid` is only
/// ever paired with an empty digest, which is the permitted "no hash" state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ContentHash {
    hash_type: HashType,
    value: String,
}

impl ContentHash {
    /// Creates a hash from a hex digest, validating the pairing invariant
    pub fn new(hash_type: HashType, value: impl Into<String>) -> Result<Self> {
        let value = value.into().to_ascii_lowercase();

        if hash_type == HashType::Invalid {
            if !value.is_empty() {
                anyhow::bail!("Hash type Invalid cannot carry a hash value ({})", value);
            }
            return Ok(Self::none());
        }

        if value.is_empty() {
            anyhow::bail!("{} hash value cannot be empty", hash_type);
        }

        if !value.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("{} hash value is not hex-encoded: {}", hash_type, value);
        }

        Ok(Self { hash_type, value })
    }

    /// Creates a hash from raw digest bytes
    pub fn from_bytes(hash_type: HashType, bytes: &[u8]) -> Result<Self> {
        Self::new(hash_type, hex::encode(bytes))
    }

    /// The "no hash available" state
    pub fn none() -> Self {
        Self {
            hash_type: HashType::Invalid,
            value: String::new(),
        }
    }

    pub fn hash_type(&self) -> HashType {
        self.hash_type
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_none(&self) -> bool {
        self.hash_type == HashType::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lowercases_hex() {
        let hash = ContentHash::new(HashType::Sha1, "ABCDEF0123").unwrap();
        assert_eq!(hash.value(), "abcdef0123");
        assert_eq!(hash.hash_type(), HashType::Sha1);
    }

    #[test]
    fn test_invalid_with_value_is_rejected() {
        assert!(ContentHash::new(HashType::Invalid, "00").is_err());
    }

    #[test]
    fn test_invalid_without_value_is_none() {
        let hash = ContentHash::new(HashType::Invalid, "").unwrap();
        assert!(hash.is_none());
        assert_eq!(hash, ContentHash::none());
    }

    #[test]
    fn test_typed_hash_requires_value() {
        assert!(ContentHash::new(HashType::Sha256, "").is_err());
    }

    #[test]
    fn test_non_hex_value_is_rejected() {
        let err = ContentHash::new(HashType::Sha256, "xyz").unwrap_err();
        assert!(err.to_string().contains("not hex-encoded"));
    }

    #[test]
    fn test_from_bytes() {
        let hash = ContentHash::from_bytes(HashType::Md5, &[0xde, 0xad]).unwrap();
        assert_eq!(hash.value(), "dead");
    }
}
