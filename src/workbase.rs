use super::*;

/// Everything derived from one block template: the coinbase split, the
/// merkle branch for the coinbase path, and the expanded network target.
/// Computed once per refresh and shared by every job built from it.
#[derive(Debug, Clone)]
pub(crate) struct Workbase {
    template: BlockTemplate,
    coinb1: String,
    coinb2: String,
    merkle_branches: Vec<MerkleNode>,
    network_target: Target,
}

impl Workbase {
    pub(crate) fn new(template: BlockTemplate, address: &Address, tag: &[u8]) -> Result<Self> {
        let merkle_branches =
            stratum::merkle_branches(template.transactions.iter().map(|tx| tx.txid).collect());

        let (_coinbase, coinb1, coinb2) = CoinbaseBuilder::new(
            address.clone(),
            template.height,
            template.coinbase_value,
            template.default_witness_commitment.clone(),
        )
        .with_tag(tag)
        .build()?;

        let network_target = template.bits.to_target();

        Ok(Self {
            template,
            coinb1,
            coinb2,
            merkle_branches,
            network_target,
        })
    }

    pub(crate) fn template(&self) -> &BlockTemplate {
        &self.template
    }

    pub(crate) fn coinb1(&self) -> &str {
        &self.coinb1
    }

    pub(crate) fn coinb2(&self) -> &str {
        &self.coinb2
    }

    pub(crate) fn merkle_branches(&self) -> &[MerkleNode] {
        &self.merkle_branches
    }

    pub(crate) fn network_target(&self) -> Target {
        self.network_target
    }
}
