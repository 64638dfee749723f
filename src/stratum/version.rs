use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct Version(pub block::Version);

impl FromStr for Version {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n = u32::from_str_radix(s, 16).map_err(|e| InternalError::Parse {
            message: format!("invalid version hex string '{s}': {e}"),
        })?;
        // The as conversion matches Bitcoin's behaviour
        Ok(Self(block::Version::from_consensus(n as i32)))
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0.to_consensus())
    }
}

impl From<block::Version> for Version {
    fn from(v: block::Version) -> Self {
        Self(v)
    }
}

impl From<Version> for block::Version {
    fn from(v: Version) -> Self {
        v.0
    }
}

impl From<i32> for Version {
    fn from(value: i32) -> Self {
        Self(block::Version::from_consensus(value))
    }
}
