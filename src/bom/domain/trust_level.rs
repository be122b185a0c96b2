use crate::shared::error::BomError;
use std::fmt;

/// Policy classification of a dependency against the ledger
///
/// The variants form a strict total order:
/// `Untrusted < Unsupported < Trusted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrustLevel {
    Untrusted = 0,
    Unsupported = 1,
    Trusted = 2,
}

impl TrustLevel {
    pub const MIN: TrustLevel = TrustLevel::Untrusted;
    pub const MAX: TrustLevel = TrustLevel::Trusted;

    pub fn name(self) -> &'static str {
        match self {
            TrustLevel::Untrusted => "Untrusted",
            TrustLevel::Unsupported => "Unsupported",
            TrustLevel::Trusted => "Trusted",
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for TrustLevel {
    type Error = BomError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TrustLevel::Untrusted),
            1 => Ok(TrustLevel::Unsupported),
            2 => Ok(TrustLevel::Trusted),
            other => Err(BomError::InvalidParameter {
                name: "trust level".to_string(),
                details: format!(
                    "{} is outside the accepted range {}-{}",
                    other,
                    TrustLevel::MIN.as_i64(),
                    TrustLevel::MAX.as_i64()
                ),
            }),
        }
    }
}

impl fmt::Display for TrustLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
