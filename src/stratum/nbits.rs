use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct Nbits(CompactTarget);

impl Nbits {
    pub fn to_compact(self) -> CompactTarget {
        self.0
    }

    /// Expands the compact encoding into the network target. The mantissa is
    /// clamped at 0x7FFFFF: consensus treats the high mantissa bit as a sign
    /// bit, so 0x800000 and 0x7FFFFF denote the same target.
    pub fn to_target(self) -> Target {
        let bits = self.0.to_consensus();
        let exp = bits >> 24;
        let mant = (bits & 0x00FF_FFFF).min(0x007F_FFFF);

        let target = if exp <= 3 {
            U256::from(mant) >> (8 * (3 - exp) as usize)
        } else {
            U256::from(mant) << (8 * (exp - 3) as usize)
        };

        Target::from_be_bytes(target.to_big_endian())
    }
}

impl FromStr for Nbits {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 {
            return Err(InternalError::InvalidLength {
                expected: 8,
                actual: s.len(),
            });
        }
        let bits = u32::from_str_radix(s, 16).map_err(|e| InternalError::Parse {
            message: format!("invalid nbits hex string '{s}': {e}"),
        })?;
        Ok(Nbits(CompactTarget::from_consensus(bits)))
    }
}

impl Display for Nbits {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0.to_consensus())
    }
}

impl From<Nbits> for CompactTarget {
    fn from(n: Nbits) -> CompactTarget {
        n.0
    }
}

impl From<CompactTarget> for Nbits {
    fn from(n: CompactTarget) -> Nbits {
        Nbits(n)
    }
}
