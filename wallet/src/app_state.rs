use std::sync::Arc;

use crate::agent::SigningAgent;
use crate::config_store::{ConfigStore, WalletConfig};
use crate::connection::ConnectionManager;
use crate::errors::WalletResult;
use crate::ledger_client::{HorizonClient, LedgerService};

/// Everything a host UI needs: the resolved configuration and the single
/// connection manager built from it.
pub struct WalletContext {
    config: WalletConfig,
    manager: ConnectionManager,
    environment: String,
}

impl WalletContext {
    /// Build a context talking to the configured Horizon endpoints.
    pub fn initialize(config: WalletConfig, agent: Arc<dyn SigningAgent>) -> WalletResult<Self> {
        config.validate()?;
        let ledger = Arc::new(HorizonClient::new(config.network.clone())?);
        Ok(Self::with_ledger(config, agent, ledger))
    }

    /// Load the persisted configuration (creating it on first run), apply
    /// environment overrides and initialize.
    pub fn from_store(store: &ConfigStore, agent: Arc<dyn SigningAgent>) -> WalletResult<Self> {
        let mut config = store.load_or_default(WalletConfig::environment_from_env())?;
        config.apply_env_overrides()?;
        log::info!(
            "Wallet configuration loaded from {} ({})",
            store.path().display(),
            config.environment
        );
        Self::initialize(config, agent)
    }

    pub fn with_ledger(
        config: WalletConfig,
        agent: Arc<dyn SigningAgent>,
        ledger: Arc<dyn LedgerService>,
    ) -> Self {
        let manager = ConnectionManager::new(agent, ledger, config.watcher.poll_interval());
        let environment = config.environment.clone();
        Self {
            config,
            manager,
            environment,
        }
    }

    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }
}
