use super::*;

/// Opaque 4-byte job identifier, 8 lowercase hex chars on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay, Hash)]
#[repr(transparent)]
pub struct JobId(u32);

impl JobId {
    pub fn new(n: u32) -> Self {
        Self(n)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl FromStr for JobId {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = u32::from_str_radix(s, 16).map_err(|e| InternalError::Parse {
            message: format!("invalid job id hex string '{s}': {e}"),
        })?;
        Ok(JobId(id))
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u32> for JobId {
    fn from(id: u32) -> JobId {
        JobId(id)
    }
}
