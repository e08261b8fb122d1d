//! The connection manager: sole owner of the wallet session.
//!
//! UI code calls into [`ConnectionManager`] and observes the session through
//! [`ConnectionManager::subscribe`]. Every mutation, including the ones made
//! by the background watcher, funnels through here.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::agent::{AgentSnapshot, AgentStatus, NetworkDetails, SigningAgent};
use crate::errors::{WalletError, WalletResult};
use crate::invest::{InvestmentReceipt, InvestmentRequest, InvestmentService};
use crate::ledger_client::{fetch_native_balance, LedgerService};
use crate::network::{truncate_address, Network};
use crate::session::{Operation, SessionStore, WalletSession};
use crate::validation::InputValidator;
use crate::watcher::ChangeWatcher;

const AGENT_MISSING: &str = "Freighter wallet not found. Please install Freighter extension.";
const AGENT_DISABLED: &str = "Freighter is not connected. Please enable the extension.";
const NO_ACCOUNT_SHARED: &str = "Freighter did not share an account address.";

struct Shared {
    agent: Arc<dyn SigningAgent>,
    ledger: Arc<dyn LedgerService>,
    store: SessionStore,
    watcher: ChangeWatcher,
}

impl Shared {
    /// Lock order is watcher slot, then session store.
    fn disconnect(&self) {
        let mut watcher = self.watcher.lock();
        watcher.stop();
        self.store.reset();
    }

    fn apply_agent_change(&self, generation: u64, snapshot: AgentSnapshot) {
        self.watcher.apply_if_current(generation, |watcher| {
            let known = self.store.snapshot();
            let reported = snapshot.address.filter(|address| !address.is_empty());

            if reported != known.address {
                match reported {
                    Some(address) => {
                        log::info!("Wallet address changed: {}", truncate_address(&address, 4));
                        self.store.update(|session| {
                            session.address = Some(address);
                            session.connected = true;
                        });
                    }
                    None => {
                        log::info!("Wallet account no longer available, disconnecting");
                        watcher.stop();
                        self.store.reset();
                        return;
                    }
                }
            }

            let network = Network::from_agent_id(&snapshot.network_id);
            if network != known.network {
                log::info!("Network changed: {} ({})", network, snapshot.network_id);
                self.store.update(|session| session.network = network);
            }
        });
    }
}

/// Cheap to clone; clones share one session.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    pub fn new(
        agent: Arc<dyn SigningAgent>,
        ledger: Arc<dyn LedgerService>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                agent,
                ledger,
                store: SessionStore::new(),
                watcher: ChangeWatcher::new(poll_interval),
            }),
        }
    }

    pub fn snapshot(&self) -> WalletSession {
        self.shared.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
        self.shared.store.subscribe()
    }

    pub fn is_watching(&self) -> bool {
        self.shared.watcher.is_running()
    }

    pub fn clear_error(&self) {
        self.shared.store.update(|session| session.error = None);
    }

    /// Run the agent handshake and establish a session.
    ///
    /// On failure the session is left at the disconnected defaults with
    /// `error` describing the cause, and the same error is returned. A call
    /// made while another connect or network switch is pending is rejected
    /// with `OperationInProgress` and leaves the session alone. If
    /// `disconnect()` runs before the handshake finishes the attempt returns
    /// `Cancelled` and the session keeps the defaults with no `error` set.
    pub async fn connect(&self) -> WalletResult<WalletSession> {
        let guard = self.shared.store.begin(Operation::Connect)?;

        let (address, details) = match handshake(self.shared.agent.as_ref()).await {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!("Wallet connection failed: {}", err);
                let mut watcher = self.shared.watcher.lock();
                if guard.fail_connect(err.to_string()) {
                    watcher.stop();
                }
                return Err(err);
            }
        };

        let network = Network::from_agent_id(&details.network);
        let epoch = guard.commit_connected(address.clone(), network)?;
        log::info!(
            "Freighter wallet connected: {} on {} via {}",
            truncate_address(&address, 4),
            details.network,
            details.network_url.as_deref().unwrap_or("default endpoint")
        );

        self.refresh_balance().await;
        self.start_watcher(epoch);
        Ok(self.snapshot())
    }

    /// Stop watching and return to the disconnected defaults. Idempotent.
    pub fn disconnect(&self) {
        self.shared.disconnect();
        log::info!("Wallet disconnected");
    }

    /// The agent offers no programmatic switch, so anything other than the
    /// network it already reports yields `ManualSwitchRequired`. The session
    /// network itself is never changed here.
    pub async fn switch_network(&self, target: Network) -> WalletResult<()> {
        let guard = self.shared.store.begin(Operation::SwitchNetwork)?;

        let result = match self.shared.agent.get_network().await {
            Ok(NetworkDetails {
                error: Some(error), ..
            }) => Err(WalletError::NetworkQueryFailed(error)),
            Ok(details) if Network::from_agent_id(&details.network) == target => Ok(()),
            Ok(_) => Err(WalletError::ManualSwitchRequired(target)),
            Err(err) => Err(WalletError::NetworkQueryFailed(err.to_string())),
        };

        if let Err(err) = &result {
            log::warn!("Network switch to {} not performed: {}", target, err);
            guard.finish_with_error(err.to_string());
        }
        result
    }

    /// Fetch the native balance for the connected account.
    ///
    /// Returns the stored balance when it was updated. Failures are logged and
    /// otherwise ignored; the previous balance and `error` stay untouched.
    pub async fn refresh_balance(&self) -> Option<String> {
        let (epoch, address, network) = self.shared.store.connected_account()?;
        log::debug!(
            "Refreshing balance for {} on {}",
            truncate_address(&address, 4),
            network
        );

        let balance =
            match fetch_native_balance(self.shared.ledger.as_ref(), &address, network).await {
                Ok(balance) => balance,
                Err(err) => {
                    log::warn!("Failed to refresh balance: {}", err);
                    return None;
                }
            };

        let applied = self
            .shared
            .store
            .update_if_epoch(epoch, |session| {
                let same_account =
                    session.address.as_deref() == Some(address.as_str()) && session.network == network;
                if same_account {
                    session.balance = balance.clone();
                }
                same_account
            })
            .unwrap_or(false);

        if applied {
            log::info!("Balance refreshed: {} XLM", balance);
            Some(balance)
        } else {
            log::debug!("Discarding balance for a session that changed meanwhile");
            None
        }
    }

    /// Reconcile with the agent's live status, disconnecting when the agent
    /// is gone or can no longer name the account.
    pub async fn check_connection(&self) -> WalletSession {
        match self.shared.agent.is_connected().await {
            Ok(AgentStatus {
                is_connected: true,
                error: None,
            }) => {}
            Ok(status) => {
                log::info!(
                    "Freighter reports disconnected ({}), resetting session",
                    status.error.as_deref().unwrap_or("disabled")
                );
                self.disconnect();
                return self.snapshot();
            }
            Err(err) => {
                log::warn!("Connection check failed: {}", err);
                self.disconnect();
                return self.snapshot();
            }
        }

        let epoch = self.shared.store.epoch();
        let session = self.snapshot();
        if session.connected && session.address.is_none() {
            match self.shared.agent.get_address().await {
                Ok(response) if response.error.is_none() && !response.address.is_empty() => {
                    self.shared.store.update_if_epoch(epoch, |session| {
                        if session.connected {
                            session.address = Some(response.address);
                        }
                    });
                }
                Ok(_) | Err(_) => {
                    log::info!("Unable to recover wallet address, disconnecting");
                    self.disconnect();
                }
            }
        }

        log::debug!("Connection check completed");
        self.snapshot()
    }

    /// Forward an investment for the connected account to `service`.
    ///
    /// The payer must be a well-formed account id and the amount a positive
    /// native amount, at least `minimum` when one is given. A successful receipt triggers a balance refresh.
    pub async fn invest(
        &self,
        service: &dyn InvestmentService,
        project_id: &str,
        amount: &str,
        minimum: Option<f64>,
    ) -> WalletResult<InvestmentReceipt> {
        let session = self.snapshot();
        let payer_address = match (session.connected, session.address) {
            (true, Some(address)) => address,
            _ => return Err(WalletError::NotConnected),
        };

        let validator = InputValidator::new()?;
        validator.validate_address(&payer_address)?;
        validator.validate_project_id(project_id)?;
        let value = validator.validate_amount(amount)?;
        if let Some(minimum) = minimum {
            if value < minimum {
                return Err(WalletError::InvalidAmount(format!(
                    "Minimum investment is {} XLM",
                    minimum
                )));
            }
        }

        let request = InvestmentRequest {
            project_id: project_id.to_string(),
            payer_address,
            amount: amount.to_string(),
            network: session.network,
        };
        let receipt = service.invest(request).await?;

        if receipt.success {
            log::info!(
                "Invested {} XLM in {} (tx {})",
                amount,
                project_id,
                receipt.tx_hash_preview(20).unwrap_or_default()
            );
            self.refresh_balance().await;
        } else {
            log::warn!(
                "Investment in {} failed: {}",
                project_id,
                receipt.error.as_deref().unwrap_or("unknown error")
            );
        }

        Ok(receipt)
    }

    /// Start polling for the session established at `epoch`, replacing any
    /// previous watcher. Does nothing if that session is already gone.
    fn start_watcher(&self, epoch: u64) -> bool {
        let mut watcher = self.shared.watcher.lock();
        if self.shared.store.epoch() != epoch {
            return false;
        }

        let weak = Arc::downgrade(&self.shared);
        watcher.start(move |generation| {
            let weak = weak.clone();
            async move {
                let Some(shared) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                match shared.agent.snapshot().await {
                    Ok(snapshot) => shared.apply_agent_change(generation, snapshot),
                    Err(err) => log::warn!("Wallet watcher poll failed: {}", err),
                }
                ControlFlow::Continue(())
            }
        });
        true
    }
}

async fn handshake(agent: &dyn SigningAgent) -> WalletResult<(String, NetworkDetails)> {
    let status = agent.is_connected().await.map_err(|err| {
        log::debug!("Freighter availability query failed: {}", err);
        WalletError::AgentUnavailable(AGENT_MISSING.to_string())
    })?;
    if status.error.is_some() {
        return Err(WalletError::AgentUnavailable(AGENT_MISSING.to_string()));
    }
    if !status.is_connected {
        return Err(WalletError::AgentDisabled(AGENT_DISABLED.to_string()));
    }

    let access = agent
        .request_access()
        .await
        .map_err(|err| WalletError::AccessDenied(err.to_string()))?;
    if let Some(error) = access.error {
        return Err(WalletError::AccessDenied(error));
    }
    if access.address.is_empty() {
        return Err(WalletError::AccessDenied(NO_ACCOUNT_SHARED.to_string()));
    }

    let details = agent
        .get_network()
        .await
        .map_err(|err| WalletError::NetworkQueryFailed(err.to_string()))?;
    if let Some(error) = details.error {
        return Err(WalletError::NetworkQueryFailed(error));
    }

    Ok((access.address, details))
}
