use chrono::Local;
use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "token-scanner")]
#[command(about = "Check wallet liveness and aggregate token balances across chains")]
pub struct Options {
    /// Mode of operation, async fans requests out in batches
    #[arg(long, value_enum, default_value = "async")]
    pub mode: Mode,

    /// File with newline delimited wallet addresses
    #[arg(long)]
    pub input_path: String,

    /// Prefix for output files, defaults to a timestamp
    #[arg(long, default_value_t = default_output_path())]
    pub output_path: String,

    #[arg(long, value_enum, default_value = "contract-addresses")]
    pub output_type: OutputType,

    /// Comma separated numeric chain ids
    #[arg(long, default_value = "1,56,137")]
    pub chain_ids: String,

    /// Covalent API key
    #[arg(long)]
    pub covalent_key: String,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum Mode {
    Sync,
    Async,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum OutputType {
    WalletStatus,
    ContractAddresses,
}

fn default_output_path() -> String {
    Local::now().format("%Y_%m_%d-%H_%M_%S").to_string()
}
