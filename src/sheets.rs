use std::collections::HashSet;
use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::env::APP_CONFIG;

const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Deserialize)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    token_uri: String,
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct AppendRequest {
    values: Vec<Vec<String>>,
}

pub struct SheetsClient {
    client: reqwest::Client,
    access_token: String,
}

impl SheetsClient {
    /// Authenticate with the service account key and hold on to the access
    /// token. One token is plenty for a single run.
    pub async fn connect() -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(
            &fs::read_to_string(&APP_CONFIG.service_account_path).with_context(|| {
                format!(
                    "failed to read service account key at {}",
                    APP_CONFIG.service_account_path
                )
            })?,
        )?;

        let client = reqwest::Client::new();
        let access_token = fetch_access_token(&client, &key).await?;

        Ok(Self {
            client,
            access_token,
        })
    }

    /// Addresses already recorded in the worksheet's first column, header
    /// row excluded.
    pub async fn existing_addresses(&self) -> Result<HashSet<String>> {
        let url = format!(
            "{}/{}/values/{}!A2:A",
            SHEETS_API_URL, APP_CONFIG.spreadsheet_id, APP_CONFIG.worksheet
        );
        let range = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?
            .error_for_status()?
            .json::<ValueRange>()
            .await?;

        Ok(first_column(range.values))
    }

    pub async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()> {
        let url = format!(
            "{}/{}/values/{}!A1:append?valueInputOption=RAW",
            SHEETS_API_URL, APP_CONFIG.spreadsheet_id, APP_CONFIG.worksheet
        );
        self.client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&AppendRequest { values: rows })
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

async fn fetch_access_token(client: &reqwest::Client, key: &ServiceAccountKey) -> Result<String> {
    let iat = Utc::now().timestamp();
    let claims = Claims {
        iss: &key.client_email,
        scope: SHEETS_SCOPE,
        aud: &key.token_uri,
        iat,
        exp: iat + 3600,
    };

    let assertion = encode(
        &Header::new(Algorithm::RS256),
        &claims,
        &EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .context("service account private key is not valid RSA PEM")?,
    )?;

    let response = client
        .post(&key.token_uri)
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
            ("assertion", assertion.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json::<TokenResponse>()
        .await?;

    Ok(response.access_token)
}

fn first_column(values: Vec<Vec<String>>) -> HashSet<String> {
    values
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .collect()
}
