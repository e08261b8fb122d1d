//! Network identity: the two ledger environments the marketplace settles on
//! and the mapping from identifiers reported by the signing agent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier the agent reports for the public production ledger.
pub const PUBLIC_NETWORK_ID: &str = "PUBLIC";

const EXPLORER_BASE: &str = "https://stellar.expert/explorer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Testnet,
    Mainnet,
}

impl Network {
    /// Map an agent network identifier onto the internal enum.
    ///
    /// Only the public ledger maps to mainnet. `TESTNET`, `FUTURENET`,
    /// `STANDALONE` and anything unrecognized fall back to testnet so an
    /// unmapped identifier never blocks a connection.
    pub fn from_agent_id(network_id: &str) -> Self {
        if network_id.trim().eq_ignore_ascii_case(PUBLIC_NETWORK_ID) {
            Network::Mainnet
        } else {
            Network::Testnet
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "mainnet",
        }
    }

    /// Human name used in user-facing messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Network::Testnet => "Testnet",
            Network::Mainnet => "Mainnet (PUBLIC)",
        }
    }

    fn explorer_segment(&self) -> &'static str {
        match self {
            Network::Testnet => "testnet",
            Network::Mainnet => "public",
        }
    }

    /// Block explorer link for an account, transaction or contract.
    pub fn explorer_url(&self, kind: ExplorerKind, id: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            EXPLORER_BASE,
            self.explorer_segment(),
            kind.as_str(),
            id
        )
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorerKind {
    Account,
    Transaction,
    Contract,
}

impl ExplorerKind {
    fn as_str(&self) -> &'static str {
        match self {
            ExplorerKind::Account => "account",
            ExplorerKind::Transaction => "tx",
            ExplorerKind::Contract => "contract",
        }
    }
}

/// Shorten an address for display, keeping `chars` characters on each side.
pub fn truncate_address(address: &str, chars: usize) -> String {
    let count = address.chars().count();
    if chars == 0 || count <= chars * 2 + 3 {
        return address.to_string();
    }
    let head: String = address.chars().take(chars).collect();
    let tail: String = address.chars().skip(count - chars).collect();
    format!("{}...{}", head, tail)
}
