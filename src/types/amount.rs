use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount in a chain's smallest unit (MIST on SUI, octas on Aptos).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseUnits(pub u128);

impl BaseUnits {
    #[must_use]
    pub const fn value(self) -> u128 {
        self.0
    }

    /// Renders the amount as whole tokens with `decimals` fractional digits,
    /// trailing zeros trimmed.
    #[must_use]
    pub fn to_whole_tokens(self, decimals: u32) -> String {
        let scale = 10_u128.pow(decimals);
        let whole = self.0 / scale;
        let fraction = self.0 % scale;
        if fraction == 0 {
            return whole.to_string();
        }
        let width = decimals as usize;
        let digits = format!("{fraction:0width$}");
        format!("{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl fmt::Display for BaseUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BaseUnits {
    fn from(value: u64) -> Self {
        Self(u128::from(value))
    }
}
