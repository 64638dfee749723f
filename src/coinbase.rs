use super::*;

/// Builds the coinbase transaction with a zeroed extranonce placeholder and
/// splits its serialization at the placeholder, yielding the `coinb1` and
/// `coinb2` halves sent to miners.
#[derive(Clone)]
pub(crate) struct CoinbaseBuilder {
    address: Address,
    height: u64,
    value: Amount,
    tag: Vec<u8>,
    witness_commitment: ScriptBuf,
}

impl CoinbaseBuilder {
    /// Consensus limit on the coinbase script sig.
    const MAX_COINBASE_SCRIPT_SIG_SIZE: usize = 100;

    const EXTRANONCE_SIZE: usize = EXTRANONCE1_SIZE + EXTRANONCE2_SIZE;

    pub(crate) fn new(
        address: Address,
        height: u64,
        value: Amount,
        witness_commitment: ScriptBuf,
    ) -> Self {
        Self {
            address,
            height,
            value,
            tag: Vec::new(),
            witness_commitment,
        }
    }

    pub(crate) fn with_tag(mut self, tag: &[u8]) -> Self {
        self.tag = tag.to_vec();
        self
    }

    /// Returns the coinbase transaction (zeroed extranonce) together with
    /// the hex halves before and after the extranonce region.
    pub(crate) fn build(self) -> Result<(Transaction, String, String)> {
        let mut script_sig: Vec<u8> = Vec::with_capacity(Self::MAX_COINBASE_SCRIPT_SIG_SIZE);

        // BIP34 height push
        let mut minimally_encoded = [0u8; 8];
        let height_len = write_scriptint(
            &mut minimally_encoded,
            self.height.try_into().context("height out of range")?,
        );
        script_sig.push(height_len as u8);
        script_sig.extend_from_slice(&minimally_encoded[..height_len]);

        // Pool tag push, clipped so the script sig stays within the limit.
        let room = Self::MAX_COINBASE_SCRIPT_SIG_SIZE
            .saturating_sub(script_sig.len() + 1 + Self::EXTRANONCE_SIZE);
        let mut tag = self.tag;
        tag.truncate(room);
        if !tag.is_empty() {
            script_sig.push(tag.len() as u8);
            script_sig.extend_from_slice(&tag);
        }

        let script_prefix_size = script_sig.len();

        script_sig.extend_from_slice(&[0u8; Self::EXTRANONCE_SIZE]);

        let script_sig = ScriptBuf::from_bytes(script_sig);
        let script_sig_size = script_sig.len();

        ensure!(
            script_sig_size <= Self::MAX_COINBASE_SCRIPT_SIG_SIZE,
            "Script sig too large: {script_sig_size} bytes (max {})",
            Self::MAX_COINBASE_SCRIPT_SIG_SIZE
        );

        let mut output = vec![TxOut {
            value: self.value,
            script_pubkey: self.address.script_pubkey(),
        }];

        if !self.witness_commitment.is_empty() {
            output.push(TxOut {
                value: Amount::ZERO,
                script_pubkey: self.witness_commitment,
            });
        }

        let coinbase = Transaction {
            version: bitcoin::transaction::Version::TWO,
            lock_time: LockTime::ZERO,
            input: vec![TxIn {
                previous_output: OutPoint::null(),
                script_sig,
                sequence: Sequence::MAX,
                witness: Witness::new(),
            }],
            output,
        };

        // offset = size of tx version
        //  + size of #inputs
        //  + size of coinbase outpoint
        //  + size of scriptSig length
        //  + size of everything before the extranonce placeholder
        let offset = 4
            + VarInt(coinbase.input.len().try_into().unwrap()).size()
            + 36
            + VarInt(script_sig_size.try_into().unwrap()).size()
            + script_prefix_size;

        let bin = consensus::serialize(&coinbase);
        let coinb1 = hex::encode(&bin[..offset]);
        let coinb2 = hex::encode(&bin[offset + Self::EXTRANONCE_SIZE..]);

        Ok((coinbase, coinb1, coinb2))
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*, bitcoin::address::NetworkUnchecked,
        pretty_assertions::assert_eq as pretty_assert_eq,
    };

    fn address() -> Address {
        "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4"
            .parse::<Address<NetworkUnchecked>>()
            .unwrap()
            .assume_checked()
    }

    fn reassemble(coinb1: &str, coinb2: &str, extranonce: &[u8]) -> Vec<u8> {
        let mut full = hex::decode(coinb1).unwrap();
        full.extend_from_slice(extranonce);
        full.extend_from_slice(&hex::decode(coinb2).unwrap());
        full
    }

    #[test]
    fn split_reassembles_with_zero_extranonce() {
        let (tx, coinb1, coinb2) = CoinbaseBuilder::new(
            address(),
            500_000,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .with_tag(b"/ingot/")
        .build()
        .unwrap();

        let full = reassemble(&coinb1, &coinb2, &[0u8; 8]);

        pretty_assert_eq!(full, consensus::serialize(&tx));
    }

    #[test]
    fn split_allows_custom_extranonce() {
        let (tx, coinb1, coinb2) = CoinbaseBuilder::new(
            address(),
            100,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .build()
        .unwrap();

        let custom = [0x11u8; 8];
        let joined = reassemble(&coinb1, &coinb2, &custom);
        let original = consensus::serialize(&tx);

        assert_eq!(joined.len(), original.len(), "length must match");
        assert_ne!(joined, original, "bytes differ when extranonce != zeros");
    }

    #[test]
    fn script_sig_length_byte_covers_pushes_and_extranonce() {
        let tag = b"solo";
        let (tx, _, _) = CoinbaseBuilder::new(
            address(),
            832_000,
            Amount::from_sat(625_000_000),
            ScriptBuf::new(),
        )
        .with_tag(tag)
        .build()
        .unwrap();

        let script_sig = tx.input[0].script_sig.as_bytes();

        let mut enc = [0u8; 8];
        let height_len = write_scriptint(&mut enc, 832_000);

        assert_eq!(
            script_sig.len(),
            1 + height_len + 1 + tag.len() + EXTRANONCE1_SIZE + EXTRANONCE2_SIZE
        );
    }

    #[test]
    fn deterministic_with_same_inputs() {
        let base = CoinbaseBuilder::new(
            address(),
            0,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        );

        let (tx1, c1_1, c1_2) = base.clone().build().unwrap();
        let (tx2, c2_1, c2_2) = base.build().unwrap();

        assert_eq!(consensus::serialize(&tx1), consensus::serialize(&tx2));
        assert_eq!(c1_1, c2_1);
        assert_eq!(c1_2, c2_2);
    }

    #[test]
    fn extranonce_boundary_occurs_once() {
        let (tx, coinb1, coinb2) = CoinbaseBuilder::new(
            address(),
            1_000_000,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .build()
        .unwrap();

        let extranonce = [0xde, 0xad, 0xbe, 0xef, 0x12, 0x34, 0x56, 0x78];
        let full = reassemble(&coinb1, &coinb2, &extranonce);
        assert_eq!(full.len(), consensus::serialize(&tx).len());

        let count = full
            .windows(extranonce.len())
            .filter(|window| *window == extranonce)
            .count();

        assert_eq!(count, 1, "extranonce bytes should appear exactly once");
    }

    #[test]
    fn offset_matches_varint_formula() {
        let height = 600_000u64;

        let (tx, coinb1, _coinb2) = CoinbaseBuilder::new(
            address(),
            height,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .with_tag(b"hey")
        .build()
        .unwrap();

        let script_sig_len = tx.input[0].script_sig.len();

        let mut enc = [0u8; 8];
        let height_len = write_scriptint(&mut enc, height.try_into().unwrap());
        let script_prefix_len = 1 + height_len + 1 + 3;

        let expected_offset =
            4 + VarInt(1).size() + 36 + VarInt(script_sig_len as u64).size() + script_prefix_len;

        assert_eq!(
            coinb1.len() / 2,
            expected_offset,
            "coinb1 byte length must equal the computed offset"
        );
    }

    #[test]
    fn oversized_tag_is_clipped_not_fatal() {
        let (tx, _, _) = CoinbaseBuilder::new(
            address(),
            1,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .with_tag(&[0x61; 200])
        .build()
        .unwrap();

        assert!(
            tx.input[0].script_sig.len() <= CoinbaseBuilder::MAX_COINBASE_SCRIPT_SIG_SIZE,
            "script sig must stay within the consensus limit"
        );
    }

    #[test]
    fn tag_resides_after_height_push_and_before_extranonce() {
        let tag = b"/ingot/";
        let (_tx, coinb1, coinb2) = CoinbaseBuilder::new(
            address(),
            0,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .with_tag(tag)
        .build()
        .unwrap();

        let tag_hex = hex::encode(tag);
        assert!(coinb1.contains(&tag_hex), "tag must be in coinb1");
        assert!(!coinb2.contains(&tag_hex), "tag must not be in coinb2");
    }

    #[test]
    fn witness_commitment_output_appended_when_present() {
        let commitment = ScriptBuf::from_bytes(
            hex::decode(
                "6a24aa21a9ede2f61c3f71d1defd3fa999dfa36953755c690689799962b48bebd836974e8cf9",
            )
            .unwrap(),
        );

        let (tx, _, _) = CoinbaseBuilder::new(
            address(),
            1,
            Amount::from_sat(50 * COIN_VALUE),
            commitment.clone(),
        )
        .build()
        .unwrap();

        assert_eq!(tx.output.len(), 2);
        assert_eq!(tx.output[1].value, Amount::ZERO);
        assert_eq!(tx.output[1].script_pubkey, commitment);
    }

    #[test]
    fn no_witness_commitment_output_when_absent() {
        let (tx, _, _) = CoinbaseBuilder::new(
            address(),
            1,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .build()
        .unwrap();

        assert_eq!(tx.output.len(), 1);
        assert_eq!(tx.output[0].script_pubkey, address().script_pubkey());
    }

    #[test]
    fn payout_script_follows_address_type() {
        let p2pkh = "1CPDJtMzuSyvnGi8o9ZAtAWPfqHZhjQQhB"
            .parse::<Address<NetworkUnchecked>>()
            .unwrap()
            .assume_checked();

        let (tx, _, _) = CoinbaseBuilder::new(
            p2pkh.clone(),
            1,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .build()
        .unwrap();

        assert!(tx.output[0].script_pubkey.is_p2pkh());
        assert_eq!(tx.output[0].script_pubkey, p2pkh.script_pubkey());

        let (tx, _, _) = CoinbaseBuilder::new(
            address(),
            1,
            Amount::from_sat(50 * COIN_VALUE),
            ScriptBuf::new(),
        )
        .build()
        .unwrap();

        assert!(tx.output[0].script_pubkey.is_p2wpkh());
    }
}
