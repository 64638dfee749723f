use super::*;

/// Snapshot of a `getblocktemplate` response. Immutable once captured and
/// replaced wholesale on refresh.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
pub struct BlockTemplate {
    pub bits: Nbits,
    #[serde(rename = "previousblockhash")]
    pub previous_block_hash: BlockHash,
    #[serde(rename = "curtime")]
    pub current_time: u64,
    pub height: u64,
    #[serde(deserialize_with = "version_from_i32")]
    pub version: Version,
    #[serde(default)]
    pub transactions: Vec<TemplateTransaction>,
    #[serde(default)]
    pub default_witness_commitment: ScriptBuf,
    #[serde(
        rename = "coinbasevalue",
        with = "bitcoin::amount::serde::as_sat",
        default
    )]
    pub coinbase_value: Amount,
}

#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
pub struct TemplateTransaction {
    pub txid: Txid,
    #[serde(rename = "data", deserialize_with = "tx_from_hex")]
    pub transaction: Transaction,
}

fn version_from_i32<'de, D>(d: D) -> Result<Version, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let version = i32::deserialize(d)?;
    Ok(Version::from(version))
}

fn tx_from_hex<'de, D>(d: D) -> Result<Transaction, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = <&str>::deserialize(d)?;
    encode::deserialize_hex(s).map_err(serde::de::Error::custom)
}

#[cfg(test)]
impl Default for BlockTemplate {
    fn default() -> Self {
        Self {
            bits: "1d00ffff".parse().unwrap(),
            previous_block_hash: BlockHash::all_zeros(),
            current_time: 1_700_000_000,
            height: 100,
            version: Version::from(0x2000_0000),
            transactions: Vec::new(),
            default_witness_commitment: ScriptBuf::new(),
            coinbase_value: Amount::from_sat(50 * COIN_VALUE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_node_response() {
        let json = r#"{
            "version": 536870912,
            "previousblockhash": "00000000440b921e1b77c6c0487ae5616de67f788f44ae2a5af6e2194d16b6f8",
            "transactions": [],
            "coinbasevalue": 5000000000,
            "curtime": 1700000000,
            "bits": "1d00ffff",
            "height": 101,
            "rules": ["segwit"],
            "mintime": 1699999000
        }"#;

        let template: BlockTemplate = serde_json::from_str(json).unwrap();

        assert_eq!(template.height, 101);
        assert_eq!(template.current_time, 1_700_000_000);
        assert_eq!(template.bits, "1d00ffff".parse().unwrap());
        assert_eq!(template.version, Version::from(0x2000_0000));
        assert_eq!(template.coinbase_value, Amount::from_sat(5_000_000_000));
        assert!(template.transactions.is_empty());
        assert!(template.default_witness_commitment.is_empty());
    }

    #[test]
    fn deserializes_transactions_and_witness_commitment() {
        // Coinbase-less 1-in/1-out legacy transaction.
        let tx_hex = "01000000016b490886c0198b03c7370ab52b7b0c75d0b2fcb21a2ed9c02b7d2d2fc9fe1dfb000000006a4730440220389bd2a42bb873b1b30c6c36b3334474d8ae131a9c1e9c9b0e0c7d7b26f70d2102202ea4f2a871a24e0f33ba4d34c9e3fe0928b0b7f947fee0dc70bc3c534febc6850121037d5e5ca0219b7a9ddd5fa64bf9eae270b0b9b27e0342b31a5e13bd5bbf9ba647ffffffff0100e1f505000000001976a914ab68025513c3dbd2f7b92a94e0581f5d50f654e788ac00000000";

        let json = format!(
            r#"{{
                "version": 536870912,
                "previousblockhash": "00000000440b921e1b77c6c0487ae5616de67f788f44ae2a5af6e2194d16b6f8",
                "transactions": [
                    {{
                        "data": "{tx_hex}",
                        "txid": "1111111111111111111111111111111111111111111111111111111111111111"
                    }}
                ],
                "default_witness_commitment": "6a24aa21a9ede2f61c3f71d1defd3fa999dfa36953755c690689799962b48bebd836974e8cf9",
                "coinbasevalue": 625000000,
                "curtime": 1700000000,
                "bits": "207fffff",
                "height": 1
            }}"#
        );

        let template: BlockTemplate = serde_json::from_str(&json).unwrap();

        assert_eq!(template.transactions.len(), 1);
        assert_eq!(template.transactions[0].transaction.input.len(), 1);
        assert_eq!(template.transactions[0].transaction.output.len(), 1);
        assert!(!template.default_witness_commitment.is_empty());
    }

    #[test]
    fn rejects_invalid_transaction_hex() {
        let json = r#"{
            "version": 1,
            "previousblockhash": "00000000440b921e1b77c6c0487ae5616de67f788f44ae2a5af6e2194d16b6f8",
            "transactions": [{"data": "zz", "txid": "1111111111111111111111111111111111111111111111111111111111111111"}],
            "coinbasevalue": 0,
            "curtime": 0,
            "bits": "1d00ffff",
            "height": 1
        }"#;

        assert!(serde_json::from_str::<BlockTemplate>(json).is_err());
    }
}
