// lib.rs - Wallet session core for the VoltStellar marketplace

pub mod agent;
pub mod app_state;
pub mod config_store;
pub mod connection;
pub mod errors;
pub mod invest;
pub mod ledger_client;
pub mod network;
pub mod session;
pub mod validation;
pub mod watcher;

// Re-export common types
pub use agent::{
    AccessResponse, AddressResponse, AgentSnapshot, AgentStatus, NetworkDetails, SigningAgent,
};
pub use app_state::WalletContext;
pub use config_store::{ConfigStore, NetworkEndpoints, WalletConfig, WatcherConfig};
pub use connection::ConnectionManager;
pub use errors::{WalletError, WalletResult};
pub use invest::{InvestmentReceipt, InvestmentRequest, InvestmentService};
pub use ledger_client::{
    fetch_native_balance, AccountRecord, BalanceLine, HorizonClient, LedgerService,
};
pub use network::{truncate_address, ExplorerKind, Network};
pub use session::{Operation, SessionStore, WalletSession};
pub use validation::InputValidator;
pub use watcher::ChangeWatcher;
