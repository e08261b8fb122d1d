use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::errors::{WalletError, WalletResult};
use crate::network::Network;

/// Connection state shown to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    pub connected: bool,
    pub address: Option<String>,
    /// Native balance as the ledger formats it; `"0"` when unknown.
    pub balance: String,
    pub network: Network,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for WalletSession {
    fn default() -> Self {
        Self {
            connected: false,
            address: None,
            balance: "0".to_string(),
            network: Network::default(),
            loading: false,
            error: None,
        }
    }
}

impl WalletSession {
    /// `address` is present exactly when the session is connected.
    pub fn is_consistent(&self) -> bool {
        self.connected == self.address.is_some()
    }
}

/// Operations that hold the single in-flight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Connect,
    SwitchNetwork,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    token: u64,
    operation: Operation,
}

#[derive(Debug, Default)]
struct SessionState {
    session: WalletSession,
    epoch: u64,
    next_token: u64,
    in_flight: Option<InFlight>,
}

/// Owns the session and publishes every committed change to subscribers.
///
/// `epoch` advances whenever a session is established or torn down. Async
/// work captures it up front and applies its result only if it is unchanged.
#[derive(Debug)]
pub struct SessionStore {
    state: Mutex<SessionState>,
    notifier: watch::Sender<WalletSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (notifier, _) = watch::channel(WalletSession::default());
        Self {
            state: Mutex::new(SessionState::default()),
            notifier,
        }
    }

    pub fn snapshot(&self) -> WalletSession {
        self.state.lock().session.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<WalletSession> {
        self.notifier.subscribe()
    }

    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    pub fn in_flight(&self) -> Option<Operation> {
        self.state.lock().in_flight.map(|flight| flight.operation)
    }

    /// Epoch, address and network of a connected session, read atomically.
    pub(crate) fn connected_account(&self) -> Option<(u64, String, Network)> {
        let state = self.state.lock();
        match (&state.session.address, state.session.connected) {
            (Some(address), true) => Some((state.epoch, address.clone(), state.session.network)),
            _ => None,
        }
    }

    pub(crate) fn update<T>(&self, op: impl FnOnce(&mut WalletSession) -> T) -> T {
        let mut state = self.state.lock();
        let result = op(&mut state.session);
        self.publish(&state.session);
        result
    }

    pub(crate) fn update_if_epoch<T>(
        &self,
        epoch: u64,
        op: impl FnOnce(&mut WalletSession) -> T,
    ) -> Option<T> {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            return None;
        }
        let result = op(&mut state.session);
        self.publish(&state.session);
        Some(result)
    }

    /// Return to the disconnected defaults, abandoning any in-flight operation.
    pub(crate) fn reset(&self) {
        let mut state = self.state.lock();
        state.session = WalletSession::default();
        state.epoch += 1;
        state.in_flight = None;
        self.publish(&state.session);
    }

    /// Claim the in-flight slot, raise `loading` and clear the last error.
    pub(crate) fn begin(&self, operation: Operation) -> WalletResult<OperationGuard<'_>> {
        let mut state = self.state.lock();
        if state.in_flight.is_some() {
            return Err(WalletError::OperationInProgress);
        }

        state.next_token += 1;
        let token = state.next_token;
        state.in_flight = Some(InFlight { token, operation });
        state.session.loading = true;
        state.session.error = None;
        self.publish(&state.session);

        Ok(OperationGuard {
            store: self,
            token,
            epoch: state.epoch,
        })
    }

    fn publish(&self, session: &WalletSession) {
        self.notifier.send_if_modified(|current| {
            if *current == *session {
                false
            } else {
                *current = session.clone();
                true
            }
        });
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the in-flight slot; dropping it clears `loading` if the slot is
/// still ours.
#[derive(Debug)]
pub(crate) struct OperationGuard<'a> {
    store: &'a SessionStore,
    token: u64,
    epoch: u64,
}

impl OperationGuard<'_> {
    fn with_owned_state<T>(&self, op: impl FnOnce(&mut SessionState) -> T) -> Option<T> {
        let mut state = self.store.state.lock();
        let owned = matches!(state.in_flight, Some(flight) if flight.token == self.token);
        if !owned || state.epoch != self.epoch {
            return None;
        }
        state.in_flight = None;
        state.session.loading = false;
        let result = op(&mut *state);
        self.store.publish(&state.session);
        Some(result)
    }

    /// Establish a connected session in a single step. Returns the new epoch.
    pub fn commit_connected(self, address: String, network: Network) -> WalletResult<u64> {
        self.with_owned_state(|state| {
            state.session = WalletSession {
                connected: true,
                address: Some(address),
                balance: "0".to_string(),
                network,
                loading: false,
                error: None,
            };
            state.epoch += 1;
            state.epoch
        })
        .ok_or(WalletError::Cancelled)
    }

    /// Force the disconnected defaults carrying `message`. Returns false when
    /// the attempt was already superseded.
    pub fn fail_connect(self, message: String) -> bool {
        self.with_owned_state(|state| {
            state.session = WalletSession {
                error: Some(message),
                ..WalletSession::default()
            };
            state.epoch += 1;
        })
        .is_some()
    }

    /// Record `message` without touching the rest of the session.
    pub fn finish_with_error(self, message: String) -> bool {
        self.with_owned_state(|state| {
            state.session.error = Some(message);
        })
        .is_some()
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.store.state.lock();
        if matches!(state.in_flight, Some(flight) if flight.token == self.token) {
            state.in_flight = None;
            state.session.loading = false;
            self.store.publish(&state.session);
        }
    }
}
