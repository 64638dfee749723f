use {super::*, bitcoin::Network};

#[derive(Default, ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Chain {
    #[default]
    #[value(alias = "main")]
    Mainnet,
    #[value(alias = "test")]
    Testnet,
    Testnet4,
    Signet,
    Regtest,
}

impl Chain {
    pub(crate) fn network(self) -> Network {
        match self {
            Self::Mainnet => Network::Bitcoin,
            Self::Testnet => Network::Testnet,
            Self::Testnet4 => Network::Testnet4,
            Self::Signet => Network::Signet,
            Self::Regtest => Network::Regtest,
        }
    }

    pub(crate) fn default_rpc_port(self) -> u16 {
        match self {
            Self::Mainnet => 8332,
            Self::Testnet => 18332,
            Self::Testnet4 => 48332,
            Self::Signet => 38332,
            Self::Regtest => 18443,
        }
    }

    pub(crate) fn join_with_data_dir(self, data_dir: impl Into<PathBuf>) -> PathBuf {
        let data_dir = data_dir.into();
        match self {
            Self::Mainnet => data_dir,
            Self::Testnet => data_dir.join("testnet3"),
            Self::Testnet4 => data_dir.join("testnet4"),
            Self::Signet => data_dir.join("signet"),
            Self::Regtest => data_dir.join("regtest"),
        }
    }
}

impl Display for Chain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Testnet4 => "testnet4",
            Self::Signet => "signet",
            Self::Regtest => "regtest",
        };
        write!(f, "{name}")
    }
}
