use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{bail, Result};
use clap::Parser;
use futures::future;
use itertools::Itertools;
use serde::Serialize;
use tracing::info;

use crate::chain::{parse_chain_ids, Chain};
use crate::cli::{Mode, Options, OutputType};
use crate::covalent::{BalanceSummary, CovalentClient, Liveness};
use crate::output;
use crate::sheets::SheetsClient;

/// Bounds the number of simultaneous connections per batch.
pub const BATCH_SIZE: usize = 5;

#[derive(Clone, Debug)]
pub struct WalletStatus {
    pub address: String,
    pub chain: Chain,
    pub liveness: Liveness,
}

#[derive(Clone, Debug, Serialize)]
pub struct ContractBalance {
    pub address: String,
    pub chain: Chain,
    #[serde(flatten)]
    pub summary: BalanceSummary,
}

/// Per-address roll-up of balance results, keyed by ticker and pre-filled
/// with zeros so every chain shows up in the output.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AddressSummary {
    pub total_transactions: BTreeMap<String, usize>,
    pub sum_of_quotes: BTreeMap<String, f64>,
}

fn zeroed_summary() -> AddressSummary {
    let mut summary = AddressSummary::default();
    for chain in enum_iterator::all::<Chain>() {
        summary
            .total_transactions
            .insert(chain.ticker().to_string(), 0);
        summary.sum_of_quotes.insert(chain.ticker().to_string(), 0.0);
    }
    summary
}

pub fn split_batches<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size).map(|chunk| chunk.to_vec()).collect()
}

/// Drop addresses already recorded in the spreadsheet's first column.
pub fn dedupe(input: HashSet<String>, existing: &HashSet<String>) -> Vec<String> {
    let (fresh, skipped): (Vec<String>, Vec<String>) = input
        .into_iter()
        .partition(|address| !existing.contains(address));

    if !skipped.is_empty() {
        info!("skipping {} already processed addresses", skipped.len());
        for address in &skipped {
            info!("already processed: {}", address);
        }
    }

    fresh.into_iter().sorted().collect_vec()
}

pub async fn scan_wallet_status(
    client: &CovalentClient,
    addresses: &[String],
    chains: &[Chain],
    mode: Mode,
) -> Result<Vec<WalletStatus>> {
    match mode {
        Mode::Sync => {
            let mut records = Vec::with_capacity(addresses.len() * chains.len());
            for &chain in chains {
                info!("scanning {} addresses on {}", addresses.len(), chain);
                for address in addresses {
                    let liveness = client.transaction_liveness(chain, address).await?;
                    records.push(WalletStatus {
                        address: address.clone(),
                        chain,
                        liveness,
                    });
                }
            }
            Ok(records)
        }
        Mode::Async => {
            let mut records = Vec::new();
            for batch in split_batches(addresses, BATCH_SIZE) {
                let futs = chains
                    .iter()
                    .copied()
                    .cartesian_product(batch.iter())
                    .map(|(chain, address)| async move {
                        let liveness = client.transaction_liveness(chain, address).await?;
                        Ok::<_, anyhow::Error>(WalletStatus {
                            address: address.clone(),
                            chain,
                            liveness,
                        })
                    })
                    .collect_vec();

                records.extend(future::try_join_all(futs).await?);
                info!("scanned {} wallet status records", records.len());
            }
            Ok(records)
        }
    }
}

/// Unique addresses with at least one transaction on any chain.
pub fn alive_addresses(records: &[WalletStatus]) -> Vec<String> {
    records
        .iter()
        .filter(|record| record.liveness == Liveness::Alive)
        .map(|record| record.address.clone())
        .unique()
        .collect_vec()
}

pub async fn scan_balances(
    client: &CovalentClient,
    addresses: &[String],
    chains: &[Chain],
) -> Result<Vec<ContractBalance>> {
    let mut results = Vec::new();
    for batch in split_batches(addresses, BATCH_SIZE) {
        let futs = chains
            .iter()
            .copied()
            .cartesian_product(batch.iter())
            .map(|(chain, address)| async move {
                let summary = client.balance_summary(chain, address).await?;
                Ok::<_, anyhow::Error>(ContractBalance {
                    address: address.clone(),
                    chain,
                    summary,
                })
            })
            .collect_vec();

        results.extend(future::try_join_all(futs).await?);
        info!("fetched {} balance records", results.len());
    }
    Ok(results)
}

pub fn summarize(results: &[ContractBalance]) -> BTreeMap<String, AddressSummary> {
    let mut summaries: BTreeMap<String, AddressSummary> = BTreeMap::new();
    for result in results {
        let entry = summaries
            .entry(result.address.clone())
            .or_insert_with(zeroed_summary);
        entry
            .total_transactions
            .insert(result.chain.ticker().to_string(), result.summary.transactions);
        entry
            .sum_of_quotes
            .insert(result.chain.ticker().to_string(), result.summary.quote_sum);
    }
    summaries
}

pub async fn run() -> Result<()> {
    crate::log::init();

    let options = Options::parse();

    if !Path::new(&options.input_path).exists() {
        bail!("input file does not exist: {}", options.input_path);
    }

    let chains = parse_chain_ids(&options.chain_ids)?;

    let input_addresses: HashSet<String> = fs::read_to_string(&options.input_path)?
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    info!(
        "loaded {} addresses from {}",
        input_addresses.len(),
        options.input_path
    );

    let sheet = SheetsClient::connect().await?;
    let existing = sheet.existing_addresses().await?;
    let addresses = dedupe(input_addresses, &existing);

    info!("{} addresses left after deduplication", addresses.len());

    let client = CovalentClient::new(&options.covalent_key);
    let statuses = scan_wallet_status(&client, &addresses, &chains, options.mode).await?;

    match options.output_type {
        OutputType::WalletStatus => {
            let path = output::write_wallet_status_csv(&options.output_path, &statuses)?;
            info!("wallet status written to {}", path.display());
        }
        OutputType::ContractAddresses => {
            let alive = alive_addresses(&statuses);
            info!("{} alive wallets, fetching balances", alive.len());

            let balances = scan_balances(&client, &alive, &chains).await?;
            let summary = summarize(&balances);

            let raw_path = output::write_balances_json(&options.output_path, &balances)?;
            let summary_path = output::write_summary_json(&options.output_path, &summary)?;
            info!(
                "balances written to {} and {}",
                raw_path.display(),
                summary_path.display()
            );

            sheet.append_rows(output::sheet_rows(&summary)?).await?;
            info!("results appended to spreadsheet");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{
        alive_addresses, dedupe, split_batches, summarize, ContractBalance, WalletStatus,
    };
    use crate::chain::Chain;
    use crate::covalent::{BalanceSummary, Liveness};

    fn status(address: &str, chain: Chain, liveness: Liveness) -> WalletStatus {
        WalletStatus {
            address: address.to_string(),
            chain,
            liveness,
        }
    }

    #[test]
    fn splits_into_bounded_batches() {
        let items: Vec<u32> = (0..12).collect();
        let batches = split_batches(&items, 5);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 5);
        assert_eq!(batches[1].len(), 5);
        assert_eq!(batches[2].len(), 2);

        let rejoined: Vec<u32> = batches.into_iter().flatten().collect();
        assert_eq!(rejoined, items);
    }

    #[test]
    fn batch_count_is_ceil_of_input_size() {
        for n in 0..23 {
            let items: Vec<u32> = (0..n).collect();
            let batches = split_batches(&items, 5);
            assert_eq!(batches.len(), (n as usize + 4) / 5);
            assert!(batches.iter().all(|batch| batch.len() <= 5));
        }
    }

    #[test]
    fn dedupe_removes_already_processed_addresses() {
        let input: HashSet<String> = ["0xa", "0xb", "0xc"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let existing: HashSet<String> = ["0xb", "0xd"].iter().map(|s| s.to_string()).collect();

        let fresh = dedupe(input, &existing);

        assert_eq!(fresh, vec!["0xa".to_string(), "0xc".to_string()]);
    }

    #[test]
    fn dedupe_keeps_everything_when_sheet_is_empty() {
        let input: HashSet<String> = ["0xa", "0xb"].iter().map(|s| s.to_string()).collect();

        let fresh = dedupe(input, &HashSet::new());

        assert_eq!(fresh, vec!["0xa".to_string(), "0xb".to_string()]);
    }

    #[test]
    fn alive_filter_is_unique_across_chains() {
        let records = vec![
            status("0xa", Chain::Eth, Liveness::Alive),
            status("0xa", Chain::Bsc, Liveness::Alive),
            status("0xb", Chain::Eth, Liveness::Dead),
            status("0xc", Chain::Matic, Liveness::Alive),
            status("0xb", Chain::Bsc, Liveness::Dead),
        ];

        let alive = alive_addresses(&records);

        assert_eq!(alive, vec!["0xa".to_string(), "0xc".to_string()]);
    }

    #[test]
    fn summary_prefills_every_chain_with_zeros() {
        let results = vec![ContractBalance {
            address: "0xa".to_string(),
            chain: Chain::Eth,
            summary: BalanceSummary {
                transactions: 3,
                quote_sum: 4.0,
            },
        }];

        let summaries = summarize(&results);
        let summary = summaries.get("0xa").unwrap();

        assert_eq!(summary.total_transactions["ETH"], 3);
        assert_eq!(summary.total_transactions["BSC"], 0);
        assert_eq!(summary.total_transactions["MATIC"], 0);
        assert_eq!(summary.sum_of_quotes["ETH"], 4.0);
        assert_eq!(summary.sum_of_quotes["BSC"], 0.0);
    }

    #[test]
    fn summary_groups_chains_under_one_address() {
        let results = vec![
            ContractBalance {
                address: "0xa".to_string(),
                chain: Chain::Eth,
                summary: BalanceSummary {
                    transactions: 1,
                    quote_sum: 1.5,
                },
            },
            ContractBalance {
                address: "0xa".to_string(),
                chain: Chain::Bsc,
                summary: BalanceSummary {
                    transactions: 2,
                    quote_sum: 2.5,
                },
            },
        ];

        let summaries = summarize(&results);

        assert_eq!(summaries.len(), 1);
        let summary = summaries.get("0xa").unwrap();
        assert_eq!(summary.total_transactions["ETH"], 1);
        assert_eq!(summary.total_transactions["BSC"], 2);
        assert_eq!(summary.sum_of_quotes["ETH"], 1.5);
        assert_eq!(summary.sum_of_quotes["BSC"], 2.5);
    }
}
