use super::*;

/// Expected hashes per difficulty-1 share: 2^32 =~ 4.29 billion. The precise
/// value is 2^256/pdiff1, about 0.0015% higher, but 2^32 is the standard
/// approximation used across the mining ecosystem.
pub(crate) const HASHES_PER_DIFF_1: u64 = 1 << 32;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct HashRate(pub f64);

impl HashRate {
    pub const ZERO: Self = Self(0.0);

    pub(crate) fn estimate(total_difficulty: f64, window: Duration) -> Self {
        if window.is_zero() {
            return Self::ZERO;
        }

        Self(total_difficulty * HASHES_PER_DIFF_1 as f64 / window.as_secs_f64())
    }
}

impl Display for HashRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        stratum::format_si(self.0, "H/s", f)
    }
}

impl FromStr for HashRate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(stratum::parse_si(s, &["H/s", "H"])?))
    }
}

impl std::ops::Add for HashRate {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}
