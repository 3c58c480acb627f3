use std::sync::LazyLock;

use serde::{de::DeserializeOwned, Deserialize};
use tracing::error;

#[derive(Deserialize)]
pub struct AppConfig {
    /// Path to the Google service account key file used for spreadsheet access.
    #[serde(default = "default_service_account_path")]
    pub service_account_path: String,
    pub spreadsheet_id: String,
    #[serde(default = "default_worksheet")]
    pub worksheet: String,
    #[serde(default = "default_covalent_api_url")]
    pub covalent_api_url: String,
}

fn default_service_account_path() -> String {
    "creds.json".to_string()
}

fn default_worksheet() -> String {
    "Sheet1".to_string()
}

fn default_covalent_api_url() -> String {
    "https://api.covalenthq.com".to_string()
}

pub static APP_CONFIG: LazyLock<AppConfig> = LazyLock::new(get_app_config);

fn get_app_config<T: DeserializeOwned>() -> T {
    match envy::from_env::<T>() {
        Ok(config) => config,
        Err(err) => {
            error!("failed to parse config: {}", err);
            std::process::exit(1);
        }
    }
}
