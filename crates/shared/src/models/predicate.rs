use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

pub const STACKS_CHAIN: &str = "stacks";

/// Stacks network a predicate is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
        }
    }

    /// CAIP-2 chain id used by wallets for this network.
    pub fn chain_id(&self) -> &'static str {
        match self {
            Network::Mainnet => "stacks:1",
            Network::Testnet => "stacks:2147483648",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            _ => Err(format!("Invalid network: {s}. Use 'mainnet' or 'testnet'")),
        }
    }
}

/// A Chainhook predicate as accepted by `POST /v1/chainhooks`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Predicate {
    pub uuid: Uuid,
    pub name: String,
    pub version: u32,
    pub chain: String,
    pub networks: BTreeMap<Network, NetworkPredicate>,
}

impl Predicate {
    pub fn new(name: impl Into<String>, network: Network, predicate: NetworkPredicate) -> Self {
        let mut networks = BTreeMap::new();
        networks.insert(network, predicate);
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            version: 1,
            chain: STACKS_CHAIN.to_string(),
            networks,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkPredicate {
    pub if_this: IfThis,
    pub then_that: ThenThat,
    pub start_block: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum IfThis {
    ContractCall {
        contract_identifier: String,
        method: String,
    },
    PrintEvent {
        contract_identifier: String,
        contains: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThenThat {
    pub http_post: HttpPost,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpPost {
    pub url: String,
    pub authorization_header: String,
}

impl ThenThat {
    pub fn http_post(url: impl Into<String>, bearer_token: &str) -> Self {
        Self {
            http_post: HttpPost {
                url: url.into(),
                authorization_header: format!("Bearer {bearer_token}"),
            },
        }
    }
}
