use std::fmt;

use anyhow::{anyhow, Result};
use enum_iterator::Sequence;
use serde::{Serialize, Serializer};

/// Chains the data API is queried for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Sequence)]
pub enum Chain {
    Eth,
    Bsc,
    Matic,
}

impl Chain {
    pub fn from_id(id: u64) -> Result<Self> {
        match id {
            1 => Ok(Chain::Eth),
            56 => Ok(Chain::Bsc),
            137 => Ok(Chain::Matic),
            _ => Err(anyhow!("unsupported chain id: {}", id)),
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Chain::Eth => 1,
            Chain::Bsc => 56,
            Chain::Matic => 137,
        }
    }

    pub fn ticker(&self) -> &'static str {
        match self {
            Chain::Eth => "ETH",
            Chain::Bsc => "BSC",
            Chain::Matic => "MATIC",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.ticker())
    }
}

impl Serialize for Chain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.ticker())
    }
}

/// Parse the comma separated `--chain-ids` flag.
pub fn parse_chain_ids(input: &str) -> Result<Vec<Chain>> {
    input
        .split(',')
        .map(|part| {
            let id = part
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow!("invalid chain id: {}", part.trim()))?;
            Chain::from_id(id)
        })
        .collect()
}
