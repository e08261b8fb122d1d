//! Contract for the external signing agent (the Freighter browser extension).
//!
//! The agent reports most failures in-band through the `error` field of its
//! responses. `Err` is reserved for the bridge itself failing, for example when
//! the extension cannot be reached at all.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::WalletResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    pub is_connected: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDetails {
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub network_url: Option<String>,
    #[serde(default)]
    pub network_passphrase: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Address and network as currently selected in the agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentSnapshot {
    pub address: Option<String>,
    pub network_id: String,
}

#[async_trait]
pub trait SigningAgent: Send + Sync {
    /// Whether the agent is installed and enabled.
    async fn is_connected(&self) -> WalletResult<AgentStatus>;

    /// Ask the user to authorize this application and return the account.
    async fn request_access(&self) -> WalletResult<AccessResponse>;

    /// Currently selected account without prompting.
    async fn get_address(&self) -> WalletResult<AddressResponse>;

    async fn get_network(&self) -> WalletResult<NetworkDetails>;

    /// Poll the agent for its live address and network.
    ///
    /// An agent-reported error on the address side is treated as "no account"
    /// so the caller disconnects. A network query error propagates.
    async fn snapshot(&self) -> WalletResult<AgentSnapshot> {
        let address = self.get_address().await?;
        let network = self.get_network().await?;
        if let Some(error) = network.error {
            return Err(crate::errors::WalletError::NetworkQueryFailed(error));
        }

        let address = match address.error {
            Some(_) => None,
            None if address.address.is_empty() => None,
            None => Some(address.address),
        };

        Ok(AgentSnapshot {
            address,
            network_id: network.network,
        })
    }
}
