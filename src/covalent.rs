use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::env::APP_CONFIG;

#[derive(Deserialize)]
struct CovalentResponse<T> {
    data: T,
}

#[derive(Deserialize)]
struct TransactionsPage {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
struct BalancesData {
    #[serde(default)]
    items: Vec<BalanceItem>,
}

#[derive(Deserialize)]
struct BalanceItem {
    quote: Option<f64>,
}

/// A wallet with at least one transaction on a chain is alive.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Liveness {
    Alive,
    Dead,
}

impl Liveness {
    fn from_item_count(count: usize) -> Self {
        if count == 0 {
            Liveness::Dead
        } else {
            Liveness::Alive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Liveness::Alive => "ALIVE",
            Liveness::Dead => "DEAD",
        }
    }
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Token balances of a single wallet on a single chain, summed in USD.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BalanceSummary {
    pub transactions: usize,
    pub quote_sum: f64,
}

impl BalanceSummary {
    fn from_items(items: &[BalanceItem]) -> Self {
        Self {
            transactions: items.len(),
            quote_sum: items.iter().map(|item| item.quote.unwrap_or(0.0)).sum(),
        }
    }
}

#[derive(Clone)]
pub struct CovalentClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl CovalentClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            base_url: APP_CONFIG.covalent_api_url.clone(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Fetch the first page of transactions for a wallet. A single item is
    /// enough to classify, so the page size is pinned to one.
    pub async fn transaction_liveness(&self, chain: Chain, address: &str) -> Result<Liveness> {
        let url = format!(
            "{}/v1/{}/address/{}/transactions_v2/?quote-currency=USD&format=JSON&block-signed-at-asc=false&no-logs=false&page-number=1&page-size=1&key={}",
            self.base_url,
            chain.id(),
            address,
            self.api_key
        );
        let page = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<CovalentResponse<TransactionsPage>>()
            .await?;

        Ok(Liveness::from_item_count(page.data.items.len()))
    }

    pub async fn balance_summary(&self, chain: Chain, address: &str) -> Result<BalanceSummary> {
        let url = format!(
            "{}/v1/{}/address/{}/balances_v2/?quote-currency=USD&format=JSON&nft=false&no-nft-fetch=false&key={}",
            self.base_url,
            chain.id(),
            address,
            self.api_key
        );
        let balances = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<CovalentResponse<BalancesData>>()
            .await?;

        Ok(BalanceSummary::from_items(&balances.data.items))
    }
}
