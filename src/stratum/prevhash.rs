use super::*;

/// The previous block hash on the Stratum wire swaps the bytes of every
/// 32-bit word relative to the header's internal byte order.
#[derive(Debug, PartialEq, Eq, Clone, DeserializeFromStr, SerializeDisplay)]
pub struct PrevHash(BlockHash);

fn swab256(bytes: &[u8; 32]) -> [u8; 32] {
    let mut swapped = [0u8; 32];
    for (src, dst) in bytes.chunks_exact(4).zip(swapped.chunks_mut(4)) {
        let word = BigEndian::read_u32(src);
        LittleEndian::write_u32(dst, word);
    }
    swapped
}

impl FromStr for PrevHash {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(InternalError::InvalidLength {
                expected: 64,
                actual: s.len(),
            });
        }

        let bytes = <[u8; 32]>::from_hex(s).context(error::HexParseSnafu)?;

        Ok(PrevHash(BlockHash::from_byte_array(swab256(&bytes))))
    }
}

impl Display for PrevHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(swab256(self.0.as_byte_array())))
    }
}

impl From<BlockHash> for PrevHash {
    fn from(blockhash: BlockHash) -> Self {
        PrevHash(blockhash)
    }
}

impl From<PrevHash> for BlockHash {
    fn from(prevhash: PrevHash) -> Self {
        prevhash.0
    }
}
