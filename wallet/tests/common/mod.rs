#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use voltstellar_wallet_lib::{
    AccessResponse, AccountRecord, AddressResponse, AgentStatus, BalanceLine, ConnectionManager,
    InvestmentReceipt, InvestmentRequest, InvestmentService, LedgerService, Network,
    NetworkDetails, SigningAgent, WalletError, WalletResult, WalletSession,
};

pub const ADDRESS: &str = "GABCAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA2345";
pub const OTHER_ADDRESS: &str = "GXYZBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB6723";
pub const POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentCall {
    IsConnected,
    RequestAccess,
    GetAddress,
    GetNetwork,
}

#[derive(Debug, Clone)]
pub struct AgentScript {
    pub installed: bool,
    pub enabled: bool,
    pub access: Result<String, String>,
    pub network: String,
    pub network_error: Option<String>,
    /// Account currently selected in the extension; empty when locked.
    pub live_address: String,
    /// Call that fails at the transport level instead of answering.
    pub broken_call: Option<AgentCall>,
}

impl AgentScript {
    fn check(&self, call: AgentCall) -> WalletResult<()> {
        if self.broken_call == Some(call) {
            return Err(WalletError::NetworkError(format!(
                "{:?}: extension message port closed",
                call
            )));
        }
        Ok(())
    }
}

impl Default for AgentScript {
    fn default() -> Self {
        Self {
            installed: true,
            enabled: true,
            access: Ok(ADDRESS.to_string()),
            network: "TESTNET".to_string(),
            network_error: None,
            live_address: ADDRESS.to_string(),
            broken_call: None,
        }
    }
}

#[derive(Default)]
pub struct FakeAgent {
    pub script: Mutex<AgentScript>,
    /// When set, the next `request_access` waits for a notification before
    /// answering.
    pub access_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeAgent {
    pub fn with(script: AgentScript) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            access_gate: Mutex::new(None),
        })
    }

    pub fn edit(&self, op: impl FnOnce(&mut AgentScript)) {
        op(&mut self.script.lock());
    }

    pub fn gate_access(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.access_gate.lock() = Some(gate.clone());
        gate
    }
}

#[async_trait]
impl SigningAgent for FakeAgent {
    async fn is_connected(&self) -> WalletResult<AgentStatus> {
        let script = self.script.lock().clone();
        script.check(AgentCall::IsConnected)?;
        if !script.installed {
            return Ok(AgentStatus {
                is_connected: false,
                error: Some("Freighter not detected".into()),
            });
        }
        Ok(AgentStatus {
            is_connected: script.enabled,
            error: None,
        })
    }

    async fn request_access(&self) -> WalletResult<AccessResponse> {
        let gate = self.access_gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let script = self.script.lock().clone();
        script.check(AgentCall::RequestAccess)?;
        match script.access {
            Ok(address) => Ok(AccessResponse {
                address,
                error: None,
            }),
            Err(error) => Ok(AccessResponse {
                address: String::new(),
                error: Some(error),
            }),
        }
    }

    async fn get_address(&self) -> WalletResult<AddressResponse> {
        let script = self.script.lock().clone();
        script.check(AgentCall::GetAddress)?;
        Ok(AddressResponse {
            address: script.live_address,
            error: None,
        })
    }

    async fn get_network(&self) -> WalletResult<NetworkDetails> {
        let script = self.script.lock().clone();
        script.check(AgentCall::GetNetwork)?;
        Ok(NetworkDetails {
            network: script.network,
            network_url: None,
            network_passphrase: None,
            error: script.network_error,
        })
    }
}

pub struct FakeLedger {
    pub response: Mutex<WalletResult<AccountRecord>>,
    pub calls: AtomicUsize,
    pub last_network: Mutex<Option<Network>>,
}

impl FakeLedger {
    pub fn with_native(amount: &str) -> Arc<Self> {
        Self::with_lines(vec![BalanceLine {
            asset_type: "native".into(),
            balance: amount.into(),
            asset_code: None,
            asset_issuer: None,
        }])
    }

    pub fn with_lines(balances: Vec<BalanceLine>) -> Arc<Self> {
        Arc::new(Self {
            response: Mutex::new(Ok(AccountRecord {
                account_id: ADDRESS.into(),
                balances,
            })),
            calls: AtomicUsize::new(0),
            last_network: Mutex::new(None),
        })
    }

    pub fn edit_native(&self, amount: &str) {
        *self.response.lock() = Ok(AccountRecord {
            account_id: ADDRESS.into(),
            balances: vec![BalanceLine {
                asset_type: "native".into(),
                balance: amount.into(),
                asset_code: None,
                asset_issuer: None,
            }],
        });
    }

    pub fn fail_with(&self, message: &str) {
        *self.response.lock() = Err(WalletError::NetworkError(message.into()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerService for FakeLedger {
    async fn load_account(&self, _address: &str, network: Network) -> WalletResult<AccountRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_network.lock() = Some(network);
        self.response.lock().clone()
    }
}

#[derive(Default)]
pub struct RecordingInvestments {
    pub requests: Mutex<Vec<InvestmentRequest>>,
    pub receipt: Mutex<InvestmentReceipt>,
}

#[async_trait]
impl InvestmentService for RecordingInvestments {
    async fn invest(&self, request: InvestmentRequest) -> WalletResult<InvestmentReceipt> {
        self.requests.lock().push(request);
        Ok(self.receipt.lock().clone())
    }
}

pub fn manager(agent: Arc<FakeAgent>, ledger: Arc<FakeLedger>) -> ConnectionManager {
    ConnectionManager::new(agent, ledger, POLL)
}

/// Poll the session until `pred` holds, failing after two seconds.
pub async fn wait_until(
    manager: &ConnectionManager,
    pred: impl Fn(&WalletSession) -> bool,
) -> WalletSession {
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let session = manager.snapshot();
        if pred(&session) {
            return session;
        }
        assert!(
            Instant::now() < deadline,
            "condition not reached, last session: {:?}",
            session
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
