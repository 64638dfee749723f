use super::*;

/// A node hash in internal byte order. Stratum sends merkle branches as hex
/// of the internal bytes, unlike Txid's reversed display convention.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct MerkleNode(sha256d::Hash);

impl MerkleNode {
    pub fn as_byte_array(&self) -> &[u8; 32] {
        self.0.as_byte_array()
    }

    pub fn from_byte_array(b: [u8; 32]) -> Self {
        Self(sha256d::Hash::from_byte_array(b))
    }

    pub fn to_raw_hash(self) -> sha256d::Hash {
        self.0
    }
}

impl Display for MerkleNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0.as_byte_array()))
    }
}

impl FromStr for MerkleNode {
    type Err = InternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 {
            return Err(InternalError::InvalidLength {
                expected: 64,
                actual: s.len(),
            });
        }
        let bytes = <[u8; 32]>::from_hex(s).context(error::HexParseSnafu)?;
        Ok(Self::from_byte_array(bytes))
    }
}

impl From<sha256d::Hash> for MerkleNode {
    fn from(h: sha256d::Hash) -> Self {
        Self(h)
    }
}

impl From<MerkleNode> for sha256d::Hash {
    fn from(n: MerkleNode) -> Self {
        n.0
    }
}

impl From<Txid> for MerkleNode {
    fn from(txid: Txid) -> Self {
        Self::from_byte_array(txid.to_byte_array())
    }
}

fn hash_pair(left: sha256d::Hash, right: sha256d::Hash) -> sha256d::Hash {
    let mut concat = Vec::with_capacity(64);
    concat.extend_from_slice(left.as_byte_array());
    concat.extend_from_slice(right.as_byte_array());
    sha256d::Hash::hash(&concat)
}

/// Recomputes the merkle root for a submission: reassemble the coinbase,
/// hash it, then fold in each sibling on the right.
pub fn merkle_root(
    coinb1: &str,
    coinb2: &str,
    extranonce1: &Extranonce,
    extranonce2: &Extranonce,
    merkle_branches: &[MerkleNode],
) -> Result<MerkleNode, InternalError> {
    let coinbase_bin = hex::decode(format!("{coinb1}{extranonce1}{extranonce2}{coinb2}"))
        .context(error::HexParseSnafu)?;

    let mut root = sha256d::Hash::hash(&coinbase_bin);
    for branch in merkle_branches {
        root = hash_pair(root, branch.to_raw_hash());
    }

    Ok(MerkleNode(root))
}

/// The ordered sibling hashes along the coinbase's path to the root, over
/// the leaves `[coinbase, tx1, tx2, …]`. An odd level duplicates its last
/// element before pairing. The coinbase leaf itself is a placeholder: the
/// sibling path never includes it, so any value works.
pub fn merkle_branches(non_coinbase_txids: Vec<Txid>) -> Vec<MerkleNode> {
    if non_coinbase_txids.is_empty() {
        return Vec::new();
    }

    let mut level: Vec<sha256d::Hash> = std::iter::once(sha256d::Hash::all_zeros())
        .chain(non_coinbase_txids.iter().map(|id| id.to_raw_hash()))
        .collect();

    let mut branches = Vec::new();
    let mut index = 0;

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(*level.last().expect("level is non-empty"));
        }

        branches.push(MerkleNode(level[index ^ 1]));

        level = level
            .chunks_exact(2)
            .map(|pair| hash_pair(pair[0], pair[1]))
            .collect();

        index /= 2;
    }

    branches
}
