use strum_macros::{Display, EnumString};

/// Short network token used in generated stack paths (`data/*<stack>-1/eth/...`)
/// and environment variable prefixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Network {
    #[strum(serialize = "eth")]
    Eth,
    #[strum(serialize = "bnb")]
    Bnb,
}

impl Network {
    pub fn blockchain(&self) -> Blockchain {
        match self {
            Network::Eth => Blockchain::Ethereum,
            Network::Bnb => Blockchain::BnbChain,
        }
    }

    /// Prefix for per-network variables such as `ETHEREUM_PRIVATE_KEY`.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Network::Eth => "ETHEREUM",
            Network::Bnb => "BNB_CHAIN",
        }
    }
}

/// Fully-qualified chain identifier as the client library knows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Blockchain {
    #[strum(serialize = "ethereum")]
    Ethereum,
    #[strum(serialize = "bnb_chain")]
    BnbChain,
}

impl Blockchain {
    /// Numeric chain id used by the service node's REST interface.
    pub fn id(&self) -> u64 {
        match self {
            Blockchain::Ethereum => 0,
            Blockchain::BnbChain => 1,
        }
    }
}
