use crate::shared::error::BomError;

/// Tolerated share of Unsupported dependencies, as a whole percentage
///
/// A value of 100 or more means there is no limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedThreshold {
    percent: u32,
}

impl UnsupportedThreshold {
    pub const UNLIMITED: UnsupportedThreshold = UnsupportedThreshold { percent: 100 };

    pub fn new(percent: u32) -> Self {
        Self { percent }
    }

    pub fn percent(&self) -> u32 {
        self.percent
    }

    /// Maximum number of Unsupported dependencies allowed out of `total`
    ///
    /// Returns `None` when the threshold is unlimited. Integer division
    /// rounds the allowance down.
    pub fn allowed(&self, total: usize) -> Option<usize> {
        if self.percent >= 100 {
            return None;
        }
        Some(total * self.percent as usize / 100)
    }

    pub fn is_exceeded(&self, unsupported: usize, total: usize) -> bool {
        self.allowed(total)
            .is_some_and(|allowed| unsupported > allowed)
    }
}

impl TryFrom<i64> for UnsupportedThreshold {
    type Error = BomError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if !(0..=100).contains(&value) {
            return Err(BomError::InvalidParameter {
                name: "max-unsupported".to_string(),
                details: format!("{} must be a valid percentage value (0-100)", value),
            });
        }
        Ok(Self::new(value as u32))
    }
}
