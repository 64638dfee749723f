use {super::*, bitcoincore_rpc::RpcApi};

/// Thin wrapper over the node's JSON-RPC endpoint. The underlying client is
/// blocking; callers run it under `spawn_blocking`.
pub(crate) struct RpcClient {
    client: bitcoincore_rpc::Client,
    chain: Chain,
}

impl RpcClient {
    pub(crate) fn new(url: String, auth: Auth, chain: Chain) -> Result<Self> {
        let client = bitcoincore_rpc::Client::new(&url, auth)
            .with_context(|| format!("failed to create RPC client for {url}"))?;

        Ok(Self { client, chain })
    }

    pub(crate) fn get_block_template(&self) -> Result<BlockTemplate> {
        let mut rules = vec!["segwit"];
        if self.chain == Chain::Signet {
            rules.push("signet");
        }

        let params = json!({ "rules": rules });

        let template = self
            .client
            .call::<BlockTemplate>("getblocktemplate", &[params])
            .context("getblocktemplate failed")?;

        Ok(template)
    }

    /// `submitblock` returns null on acceptance and a reason string on
    /// rejection; the reason is surfaced verbatim.
    pub(crate) fn submit_block(&self, block: &Block) -> Result<Option<String>> {
        let block_hex = encode::serialize_hex(block);

        let result = self
            .client
            .call::<Value>("submitblock", &[json!(block_hex)])
            .context("submitblock failed")?;

        match result {
            Value::Null => Ok(None),
            Value::String(reason) => Ok(Some(reason)),
            other => bail!("unexpected submitblock result: {other}"),
        }
    }
}
