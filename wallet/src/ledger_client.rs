/// Ledger client for reading account balances from Horizon nodes
///
/// This module provides the REST lookups the session manager needs to show the
/// connected account's native balance on either network.
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config_store::NetworkEndpoints;
use crate::errors::{WalletError, WalletResult};
use crate::network::Network;

/// Asset type Horizon uses for the ledger's base currency.
pub const NATIVE_ASSET_TYPE: &str = "native";

/// One balance line of an account record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLine {
    pub asset_type: String,
    pub balance: String,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
}

/// Account record as returned by `GET /accounts/{id}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub balances: Vec<BalanceLine>,
}

impl AccountRecord {
    pub fn native_balance(&self) -> Option<&str> {
        self.balances
            .iter()
            .find(|line| line.asset_type == NATIVE_ASSET_TYPE)
            .map(|line| line.balance.as_str())
    }
}

/// Horizon problem document returned on non-2xx responses
#[derive(Debug, Deserialize)]
struct ProblemDetails {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: Option<String>,
}

#[async_trait]
pub trait LedgerService: Send + Sync {
    async fn load_account(&self, address: &str, network: Network) -> WalletResult<AccountRecord>;
}

/// HTTP client for Horizon REST communication
pub struct HorizonClient {
    client: Client,
    endpoints: NetworkEndpoints,
}

impl HorizonClient {
    /// Create a new Horizon client
    pub fn new(endpoints: NetworkEndpoints) -> WalletResult<Self> {
        let client = Client::builder()
            .timeout(endpoints.request_timeout())
            .build()
            .map_err(|e| {
                WalletError::NetworkError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(HorizonClient { client, endpoints })
    }

    pub fn endpoint(&self, network: Network) -> &str {
        self.endpoints.horizon_for(network).trim_end_matches('/')
    }

    fn account_url(&self, address: &str, network: Network) -> String {
        format!("{}/accounts/{}", self.endpoint(network), address)
    }
}

#[async_trait]
impl LedgerService for HorizonClient {
    async fn load_account(&self, address: &str, network: Network) -> WalletResult<AccountRecord> {
        let url = self.account_url(address, network);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WalletError::NetworkError(format!(
                "Account {} not found on {}",
                address, network
            )));
        }

        if !status.is_success() {
            let problem = response.json::<ProblemDetails>().await.ok();
            let reason = match problem {
                Some(ProblemDetails {
                    title,
                    detail: Some(detail),
                }) => format!("{}: {}", title, detail),
                Some(ProblemDetails { title, .. }) if !title.is_empty() => title,
                _ => status.to_string(),
            };
            return Err(WalletError::NetworkError(format!("HTTP error: {}", reason)));
        }

        response
            .json::<AccountRecord>()
            .await
            .map_err(|e| WalletError::NetworkError(format!("Failed to parse response: {}", e)))
    }
}

/// Resolve the native-asset balance for an account.
///
/// Returns `"0"` when the account carries no native entry. Any transport or
/// decoding failure is reported as `BalanceFetchFailed`.
pub async fn fetch_native_balance(
    ledger: &dyn LedgerService,
    address: &str,
    network: Network,
) -> WalletResult<String> {
    let account = ledger
        .load_account(address, network)
        .await
        .map_err(|e| WalletError::BalanceFetchFailed(e.to_string()))?;

    Ok(account.native_balance().unwrap_or("0").to_string())
}
