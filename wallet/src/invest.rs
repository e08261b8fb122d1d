//! Hand-off to the investment collaborator. Transaction construction and
//! signing live on the other side of [`InvestmentService`]; this side only
//! supplies the payer and network from the connected session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::WalletResult;
use crate::network::Network;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentRequest {
    pub project_id: String,
    pub payer_address: String,
    pub amount: String,
    pub network: Network,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentReceipt {
    pub success: bool,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl InvestmentReceipt {
    /// Short hash prefix suitable for a notification line.
    pub fn tx_hash_preview(&self, chars: usize) -> Option<String> {
        self.tx_hash
            .as_ref()
            .map(|hash| hash.chars().take(chars).collect())
    }
}

#[async_trait]
pub trait InvestmentService: Send + Sync {
    async fn invest(&self, request: InvestmentRequest) -> WalletResult<InvestmentReceipt>;
}
