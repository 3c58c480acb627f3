use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::scan::{AddressSummary, ContractBalance, WalletStatus};

pub fn write_wallet_status_csv(prefix: &str, records: &[WalletStatus]) -> Result<PathBuf> {
    let path = PathBuf::from(format!("{}_wallet_status.csv", prefix));
    let mut writer = csv::Writer::from_path(&path)?;

    writer.write_record(["Address", "Chain", "Remarks"])?;
    for record in records {
        writer.write_record([
            record.address.as_str(),
            record.chain.ticker(),
            record.liveness.as_str(),
        ])?;
    }
    writer.flush()?;

    Ok(path)
}

pub fn write_balances_json(prefix: &str, balances: &[ContractBalance]) -> Result<PathBuf> {
    write_json(format!("{}_contract_balances.json", prefix), balances)
}

pub fn write_summary_json(
    prefix: &str,
    summary: &BTreeMap<String, AddressSummary>,
) -> Result<PathBuf> {
    write_json(format!("{}_contract_balances_summary.json", prefix), summary)
}

fn write_json<T: Serialize + ?Sized>(path: String, value: &T) -> Result<PathBuf> {
    let path = PathBuf::from(path);
    let file = File::create(&path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(path)
}

/// Rows appended to the spreadsheet: address plus the per-chain transaction
/// count and quote sum maps rendered as JSON.
pub fn sheet_rows(summary: &BTreeMap<String, AddressSummary>) -> Result<Vec<Vec<String>>> {
    summary
        .iter()
        .map(|(address, entry)| {
            Ok(vec![
                address.clone(),
                serde_json::to_string(&entry.total_transactions)?,
                serde_json::to_string(&entry.sum_of_quotes)?,
            ])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{sheet_rows, write_balances_json, write_wallet_status_csv};
    use crate::chain::Chain;
    use crate::covalent::{BalanceSummary, Liveness};
    use crate::scan::{summarize, ContractBalance, WalletStatus};

    #[test]
    fn wallet_status_csv_has_expected_shape() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("scan").to_str().unwrap().to_string();
        let records = vec![
            WalletStatus {
                address: "0xabc".to_string(),
                chain: Chain::Eth,
                liveness: Liveness::Alive,
            },
            WalletStatus {
                address: "0xdef".to_string(),
                chain: Chain::Bsc,
                liveness: Liveness::Dead,
            },
        ];

        let path = write_wallet_status_csv(&prefix, &records).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();

        assert_eq!(
            contents,
            "Address,Chain,Remarks\n0xabc,ETH,ALIVE\n0xdef,BSC,DEAD\n"
        );
    }

    #[test]
    fn balances_json_serializes_chain_as_ticker() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("scan").to_str().unwrap().to_string();
        let balances = vec![ContractBalance {
            address: "0xabc".to_string(),
            chain: Chain::Matic,
            summary: BalanceSummary {
                transactions: 1,
                quote_sum: 2.5,
            },
        }];

        let path = write_balances_json(&prefix, &balances).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(parsed[0]["address"], "0xabc");
        assert_eq!(parsed[0]["chain"], "MATIC");
        assert_eq!(parsed[0]["transactions"], 1);
        assert_eq!(parsed[0]["quote_sum"], 2.5);
    }

    #[test]
    fn sheet_rows_render_per_chain_maps_as_json() {
        let results = vec![ContractBalance {
            address: "0xabc".to_string(),
            chain: Chain::Eth,
            summary: BalanceSummary {
                transactions: 3,
                quote_sum: 4.0,
            },
        }];

        let rows = sheet_rows(&summarize(&results)).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "0xabc");
        assert_eq!(rows[0][1], r#"{"BSC":0,"ETH":3,"MATIC":0}"#);
        assert_eq!(rows[0][2], r#"{"BSC":0.0,"ETH":4.0,"MATIC":0.0}"#);
    }
}
