mod common;

use common::*;
use voltstellar_wallet_lib::{InvestmentReceipt, Network, WalletError};

#[tokio::test]
async fn invest_requires_connection() {
    let ledger = FakeLedger::with_native("100.0000000");
    let manager = manager(FakeAgent::with(AgentScript::default()), ledger);
    let service = RecordingInvestments::default();

    let err = manager
        .invest(&service, "solar-hub-1", "10", None)
        .await
        .unwrap_err();
    assert_eq!(err, WalletError::NotConnected);
    assert!(service.requests.lock().is_empty());
}

#[tokio::test]
async fn invest_rejects_amounts_below_minimum() {
    let manager = manager(
        FakeAgent::with(AgentScript::default()),
        FakeLedger::with_native("100.0000000"),
    );
    manager.connect().await.unwrap();
    let service = RecordingInvestments::default();

    let err = manager
        .invest(&service, "solar-hub-1", "5", Some(50.0))
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidAmount(msg) if msg.contains("50")));

    let err = manager
        .invest(&service, "solar-hub-1", "abc", None)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidAmount(_)));
    assert!(service.requests.lock().is_empty());
}

#[tokio::test]
async fn successful_investment_forwards_session_context_and_refreshes() {
    let agent = FakeAgent::with(AgentScript {
        network: "PUBLIC".into(),
        ..Default::default()
    });
    let ledger = FakeLedger::with_native("100.0000000");
    let manager = manager(agent, ledger.clone());
    manager.connect().await.unwrap();

    let service = RecordingInvestments::default();
    *service.receipt.lock() = InvestmentReceipt {
        success: true,
        tx_hash: Some("9f2c1a7e4b3d5c6e8f9a0b1c2d3e4f5a6b7c8d9e".into()),
        error: None,
    };
    ledger.edit_native("40.0000000");
    let calls_before = ledger.calls();

    let receipt = manager
        .invest(&service, "solar-hub-1", "60", Some(50.0))
        .await
        .unwrap();
    assert!(receipt.success);

    let requests = service.requests.lock().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].project_id, "solar-hub-1");
    assert_eq!(requests[0].payer_address, ADDRESS);
    assert_eq!(requests[0].amount, "60");
    assert_eq!(requests[0].network, Network::Mainnet);

    assert_eq!(ledger.calls(), calls_before + 1);
    assert_eq!(manager.snapshot().balance, "40.0000000");
}

#[tokio::test]
async fn failed_receipt_is_returned_without_refresh() {
    let ledger = FakeLedger::with_native("100.0000000");
    let manager = manager(FakeAgent::with(AgentScript::default()), ledger.clone());
    manager.connect().await.unwrap();

    let service = RecordingInvestments::default();
    *service.receipt.lock() = InvestmentReceipt {
        success: false,
        tx_hash: None,
        error: Some("insufficient funds".into()),
    };
    let calls_before = ledger.calls();

    let receipt = manager
        .invest(&service, "solar-hub-1", "10", None)
        .await
        .unwrap();
    assert!(!receipt.success);
    assert_eq!(receipt.error.as_deref(), Some("insufficient funds"));
    assert_eq!(ledger.calls(), calls_before);
    assert_eq!(manager.snapshot().error, None);
}

#[tokio::test]
async fn invest_rejects_malformed_payer_address() {
    let manager = manager(
        FakeAgent::with(AgentScript {
            access: Ok("GSHORT".into()),
            live_address: "GSHORT".into(),
            ..Default::default()
        }),
        FakeLedger::with_native("100.0000000"),
    );
    manager.connect().await.unwrap();
    let service = RecordingInvestments::default();

    let err = manager
        .invest(&service, "solar-hub-1", "10", None)
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidAddress(_)));
    assert!(service.requests.lock().is_empty());
}
