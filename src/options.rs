use super::*;

#[derive(Clone, Default, Debug, Parser)]
#[command(group(
    clap::ArgGroup::new("chains")
        .required(false)
        .args(&["chain", "signet", "regtest", "testnet"]),
))]
pub(crate) struct Options {
    #[arg(long = "chain", value_enum, help = "Use <CHAIN>. [default: mainnet]")]
    pub(crate) chain: Option<Chain>,

    #[arg(long, short = 's', help = "Use signet. Equivalent to `--chain signet`.")]
    pub(crate) signet: bool,

    #[arg(
        long,
        short = 'r',
        help = "Use regtest. Equivalent to `--chain regtest`."
    )]
    pub(crate) regtest: bool,

    #[arg(
        long,
        short = 't',
        help = "Use testnet. Equivalent to `--chain testnet`."
    )]
    pub(crate) testnet: bool,

    #[arg(long, help = "Load Bitcoin Core data dir from <BITCOIN_DATA_DIR>.")]
    pub(crate) bitcoin_data_dir: Option<PathBuf>,

    #[arg(long, help = "Connect to Bitcoin Core RPC at <BITCOIN_RPC_PORT>.")]
    pub(crate) bitcoin_rpc_port: Option<u16>,

    #[arg(
        long,
        help = "Authenticate to Bitcoin Core RPC as <BITCOIN_RPC_USERNAME>."
    )]
    pub(crate) bitcoin_rpc_username: Option<String>,

    #[arg(
        long,
        help = "Authenticate to Bitcoin Core RPC with <BITCOIN_RPC_PASSWORD>."
    )]
    pub(crate) bitcoin_rpc_password: Option<String>,

    #[arg(
        long,
        help = "Load Bitcoin Core RPC cookie file from <BITCOIN_RPC_COOKIE_FILE>."
    )]
    pub(crate) bitcoin_rpc_cookie_file: Option<PathBuf>,
}

impl Options {
    pub(crate) fn chain(&self) -> Chain {
        if self.signet {
            Chain::Signet
        } else if self.regtest {
            Chain::Regtest
        } else if self.testnet {
            Chain::Testnet
        } else {
            self.chain.unwrap_or_default()
        }
    }

    pub(crate) fn bitcoin_rpc_port(&self) -> u16 {
        self.bitcoin_rpc_port
            .unwrap_or_else(|| self.chain().default_rpc_port())
    }

    pub(crate) fn bitcoin_rpc_url(&self) -> String {
        format!("127.0.0.1:{}/", self.bitcoin_rpc_port())
    }

    pub(crate) fn cookie_file(&self) -> Result<PathBuf> {
        if let Some(cookie_file) = &self.bitcoin_rpc_cookie_file {
            return Ok(cookie_file.clone());
        }

        let data_dir = self
            .bitcoin_data_dir
            .clone()
            .ok_or_else(|| anyhow!("no Bitcoin Core cookie file or data dir configured"))?;

        Ok(self.chain().join_with_data_dir(data_dir).join(".cookie"))
    }

    pub(crate) fn bitcoin_credentials(&self) -> Result<Auth> {
        if let (Some(user), Some(pass)) = (
            self.bitcoin_rpc_username.clone(),
            self.bitcoin_rpc_password.clone(),
        ) {
            Ok(Auth::UserPass(user, pass))
        } else {
            Ok(Auth::CookieFile(self.cookie_file()?))
        }
    }
}
