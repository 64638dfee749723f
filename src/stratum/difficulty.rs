use super::*;

/// The difficulty-1 pool target, 0x00000000FFFF0000…0000.
static POOL_TARGET_1: LazyLock<U256> =
    LazyLock::new(|| U256::from_big_endian(&Target::MAX.to_be_bytes()));

/// Pool-difficulty units. Difficulty d corresponds to the share target
/// floor(pdiff1 / d); smaller targets are harder.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Difficulty(f64);

impl Difficulty {
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// floor(pdiff1 / d), computed with scaled integer division so the
    /// quotient is exact rather than rounded through a compact encoding.
    pub fn to_target(self) -> Target {
        // 2^32 - 1 is safe: pdiff1 (~2^224) times the scale fits in 256 bits.
        const MAX_SCALE: u64 = 0xFFFF_FFFF;

        let max_by_den = (u64::MAX as f64 / self.0).floor();
        let scale = max_by_den.min(MAX_SCALE as f64).max(1.0) as u64;

        let numerator = POOL_TARGET_1.saturating_mul(U256::from(scale));
        let denominator = (self.0 * scale as f64).round() as u64;

        let target = if denominator == 0 {
            U256::MAX
        } else {
            numerator / U256::from(denominator)
        };

        Target::from_be_bytes(target.to_big_endian())
    }
}

impl From<f64> for Difficulty {
    fn from(difficulty: f64) -> Self {
        assert!(
            difficulty.is_finite() && difficulty > 0.0,
            "difficulty must be finite and > 0"
        );
        Difficulty(difficulty)
    }
}

impl From<u64> for Difficulty {
    fn from(difficulty: u64) -> Self {
        assert!(difficulty > 0, "difficulty must be > 0");
        Difficulty(difficulty as f64)
    }
}

impl Serialize for Difficulty {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        if self.0 < 1.0 {
            ser.serialize_f64(self.0)
        } else {
            ser.serialize_u64(self.0.floor() as u64)
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Int(u64),
            Float(f64),
        }

        match Wire::deserialize(de)? {
            Wire::Int(u) => {
                if u == 0 {
                    return Err(de::Error::custom("difficulty must be > 0"));
                }
                Ok(Difficulty::from(u))
            }
            Wire::Float(x) => {
                if !x.is_finite() || x <= 0.0 {
                    return Err(de::Error::custom("difficulty must be finite and > 0"));
                }
                Ok(Difficulty::from(x))
            }
        }
    }
}

impl Display for Difficulty {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0 >= 1.0 {
            write!(f, "{}", self.0.floor() as u64)
        } else if let Some(p) = f.precision() {
            write!(f, "{:.*}", p, self.0)
        } else {
            let s = format!("{:.12}", self.0);
            let s = s.trim_end_matches('0').trim_end_matches('.');
            f.write_str(s)
        }
    }
}

impl FromStr for Difficulty {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let d: f64 = s.parse().map_err(|_| InternalError::Parse {
            message: format!("invalid difficulty '{s}'"),
        })?;
        if !d.is_finite() || d <= 0.0 {
            return Err(InternalError::InvalidValue {
                reason: "difficulty must be finite and > 0".into(),
            });
        }
        Ok(Difficulty(d))
    }
}
