use crate::bom::domain::{ContentHash, HashType};
use crate::shared::error::BomError;
use crate::shared::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// HashCombiner collapses the per-file hashes of a package into one digest
///
/// A package can ship several files (wheel, sdist, ...) and each manifest
/// lists one hash per file. The canonical digest is the byte-wise XOR of all
/// of them. Ledger records are keyed on this value, so the combination rule
/// must not change without migrating already-notarized records.
pub struct HashCombiner;

impl HashCombiner {
    /// Combines hex-encoded hashes, each optionally prefixed with an algorithm tag
    ///
    /// # Arguments
    /// * `hashes` - Entries shaped `<tag>:<hex>` or `<hex>`
    ///
    /// # Returns
    /// The XOR of all decoded hashes, tagged with the algorithm of the last
    /// tagged entry. An empty input yields the "no hash" state.
    ///
    /// # Errors
    /// Returns `BomError::UnsupportedHashType` for an algorithm tag outside
    /// [`HashType`], and an error if an entry is not valid hex or the decoded
    /// hashes differ in length.
    pub fn combine<S: AsRef<str>>(hashes: &[S]) -> Result<ContentHash> {
        let mut hash_type = HashType::Invalid;
        let mut combined: Option<Vec<u8>> = None;

        for entry in hashes {
            let entry = entry.as_ref();
            let encoded = match entry.split_once(':') {
                Some((tag, value)) => {
                    hash_type = HashType::from_tag(tag).ok_or_else(|| BomError::UnsupportedHashType {
                        tag: tag.to_string(),
                        entry: entry.to_string(),
                    })?;
                    value
                }
                None => entry,
            };

            let bytes = hex::decode(encoded)
                .map_err(|e| anyhow::anyhow!("malformed hash value '{}': {}", entry, e))?;

            combined = Some(match combined {
                None => bytes,
                Some(mut acc) => {
                    if acc.len() != bytes.len() {
                        anyhow::bail!(
                            "malformed hash value '{}': expected {} bytes, got {}",
                            entry,
                            acc.len(),
                            bytes.len()
                        );
                    }
                    acc.iter_mut().zip(&bytes).for_each(|(a, b)| *a ^= b);
                    acc
                }
            });
        }

        match combined {
            None => Ok(ContentHash::none()),
            Some(_) if hash_type == HashType::Invalid => {
                anyhow::bail!("malformed hash value: no entry carries an algorithm tag")
            }
            Some(bytes) => ContentHash::from_bytes(hash_type, &bytes),
        }
    }

    /// Combines untagged hex hashes that are all known to use `hash_type`
    pub fn combine_as<S: AsRef<str>>(hash_type: HashType, hashes: &[S]) -> Result<ContentHash> {
        if hashes.is_empty() {
            return Ok(ContentHash::none());
        }
        let tagged: Vec<String> = hashes
            .iter()
            .map(|h| format!("{}:{}", hash_type.name().to_ascii_lowercase(), h.as_ref()))
            .collect();
        Self::combine(&tagged)
    }

    /// Decodes a Go module hash (`h1:<base64>`) into a hex SHA-256 digest
    ///
    /// # Errors
    /// Returns an error for a missing prefix, any prefix other than `h1`,
    /// or invalid base64.
    pub fn decode_mod_hash(encoded: &str) -> Result<ContentHash> {
        let (prefix, payload) = encoded
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("malformed hash value '{}'", encoded))?;

        // h1 is the only hash type the Go toolchain defines
        if prefix != "h1" {
            anyhow::bail!("unsupported hash type '{}' in '{}'", prefix, encoded);
        }

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| anyhow::anyhow!("cannot decode base64 hash '{}': {}", encoded, e))?;

        ContentHash::from_bytes(HashType::Sha256, &bytes)
    }

    /// Re-encodes a base64 digest as hex, tagging it with `hash_type`
    pub fn from_base64(hash_type: HashType, encoded: &str) -> Result<ContentHash> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| anyhow::anyhow!("cannot decode base64 hash '{}': {}", encoded, e))?;

        ContentHash::from_bytes(hash_type, &bytes)
    }
}
