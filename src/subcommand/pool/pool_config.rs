use {super::*, bitcoin::address::NetworkUnchecked};

/// CLI arguments for the pool subcommand.
#[derive(Clone, Debug, Parser)]
pub(crate) struct PoolConfig {
    #[arg(long, help = "Listen at <ADDRESS>. [default: 0.0.0.0]")]
    pub(crate) address: Option<String>,

    #[arg(long, help = "Listen on <PORT>. [default: 3333]")]
    pub(crate) port: Option<u16>,

    #[arg(long, help = "Send block rewards to <POOL_ADDRESS>.")]
    pub(crate) pool_address: String,

    #[arg(long, help = "Embed <COINBASE_TAG> in the coinbase script sig.")]
    pub(crate) coinbase_tag: Option<String>,

    #[arg(
        long,
        help = "Poll the node for new block templates every <POLL_INTERVAL> seconds."
    )]
    pub(crate) poll_interval: Option<u64>,

    #[arg(
        long,
        help = "Rebroadcast work at least every <REFRESH_INTERVAL> seconds."
    )]
    pub(crate) refresh_interval: Option<u64>,

    #[arg(long, help = "Give <START_DIFF> to new clients.")]
    pub(crate) start_diff: Option<Difficulty>,

    #[arg(long, help = "Target <TARGET_SHARE_TIME> seconds between shares.")]
    pub(crate) target_share_time: Option<f64>,

    #[arg(long, help = "Never retarget below <MIN_DIFF>.")]
    pub(crate) min_diff: Option<f64>,

    #[arg(long, help = "Never retarget above <MAX_DIFF>.")]
    pub(crate) max_diff: Option<f64>,
}

impl PoolConfig {
    pub(crate) fn address(&self) -> String {
        self.address.clone().unwrap_or_else(|| "0.0.0.0".into())
    }

    pub(crate) fn port(&self) -> u16 {
        self.port.unwrap_or(3333)
    }

    pub(crate) fn pool_address(&self, chain: Chain) -> Result<Address> {
        self.pool_address
            .parse::<Address<NetworkUnchecked>>()
            .with_context(|| format!("invalid pool address '{}'", self.pool_address))?
            .require_network(chain.network())
            .with_context(|| {
                format!(
                    "pool address '{}' is not valid for {chain}",
                    self.pool_address
                )
            })
    }

    pub(crate) fn coinbase_tag(&self) -> String {
        self.coinbase_tag.clone().unwrap_or_else(|| "/ingot/".into())
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.unwrap_or(5))
    }

    pub(crate) fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.unwrap_or(30))
    }

    pub(crate) fn start_diff(&self) -> Difficulty {
        self.start_diff.unwrap_or(Difficulty::from(1.0))
    }

    pub(crate) fn target_share_time(&self) -> Duration {
        Duration::from_secs_f64(self.target_share_time.unwrap_or(10.0))
    }

    pub(crate) fn min_diff(&self) -> f64 {
        self.min_diff.unwrap_or(0.001)
    }

    pub(crate) fn max_diff(&self) -> f64 {
        self.max_diff.unwrap_or(1_000_000.0)
    }
}
