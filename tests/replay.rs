//! Orchestrator tests against an in-memory simulation backend.

use alloy::{
    primitives::{Address, Bytes, ChainId, U256, address},
    providers::{Provider, ProviderBuilder},
};
use async_trait::async_trait;
use gov_sentinel::{
    bridges::{BridgedMessage, bridge_for_target},
    config::{BackendConfig, SentinelConfig},
    constants::{ARBITRUM_INBOX, OPTIMISM_MESSENGER},
    error::SimulatorError,
    replay::{DestinationProviders, ProposalReplayOrchestrator, execute_with_value_retry},
    simulator::SimulationBackend,
    types::{
        Proposal, ProposalActions, SimulationPayload, SimulationResult, StateOverrideSet,
    },
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MockState {
    /// Results handed out by `simulate`, front first.
    results: Vec<SimulationResult>,
    simulate_calls: Vec<SimulationPayload>,
    bundle_calls: usize,
}

/// In-memory backend recording every request.
#[derive(Debug, Clone, Default)]
struct MockBackend(Arc<Mutex<MockState>>);

impl MockBackend {
    fn queue(&self, results: impl IntoIterator<Item = SimulationResult>) {
        self.0.lock().unwrap().results.extend(results);
    }

    fn simulate_calls(&self) -> Vec<SimulationPayload> {
        self.0.lock().unwrap().simulate_calls.clone()
    }

    fn bundle_calls(&self) -> usize {
        self.0.lock().unwrap().bundle_calls
    }
}

#[async_trait]
impl SimulationBackend for MockBackend {
    async fn simulate(
        &self,
        payload: SimulationPayload,
    ) -> Result<SimulationResult, SimulatorError> {
        let mut state = self.0.lock().unwrap();
        state.simulate_calls.push(payload);
        Ok(state.results.remove(0))
    }

    async fn simulate_bundle(
        &self,
        payloads: Vec<SimulationPayload>,
    ) -> Result<Vec<SimulationResult>, SimulatorError> {
        let mut state = self.0.lock().unwrap();
        state.bundle_calls += 1;
        Ok(payloads.iter().map(|_| succeeded()).collect())
    }

    async fn latest_block(&self, _chain_id: ChainId) -> Result<u64, SimulatorError> {
        Ok(1_000)
    }

    async fn encode_state_overrides(
        &self,
        _chain_id: ChainId,
        overrides: StateOverrideSet,
    ) -> Result<StateOverrideSet, SimulatorError> {
        Ok(overrides)
    }
}

fn succeeded() -> SimulationResult {
    SimulationResult { success: true, ..Default::default() }
}

fn failed(reason: &str) -> SimulationResult {
    SimulationResult { success: false, revert_reason: Some(reason.into()), ..Default::default() }
}

fn payload() -> SimulationPayload {
    SimulationPayload {
        chain_id: 1,
        block_number: 997,
        from: address!("0x000000000000000000000000000000000000dEaD"),
        to: address!("0x408ED6354d4973f66138C91495F2f2FCbd8724C3"),
        input: Bytes::new(),
        gas: 30_000_000,
        gas_price: None,
        value: U256::ZERO,
        block_header: None,
        overrides: None,
    }
}

fn orchestrator(backend: MockBackend, config: SentinelConfig) -> ProposalReplayOrchestrator<MockBackend> {
    // Lazy HTTP provider; the tests below never reach it.
    let provider = ProviderBuilder::new()
        .connect_http("http://127.0.0.1:1".parse().unwrap())
        .erased();
    ProposalReplayOrchestrator::new(backend, provider, DestinationProviders::default(), config)
}

fn config() -> SentinelConfig {
    SentinelConfig::new(
        1,
        address!("0x408ED6354d4973f66138C91495F2f2FCbd8724C3"),
        address!("0x1a9C8182C09F50C8318d769245beA52c32BE35BC"),
        BackendConfig::new("https://simulator.example.com/api".parse().unwrap(), "test-key"),
    )
}

fn bridge_message() -> BridgedMessage {
    BridgedMessage {
        receiver: address!("0x000000000000000000000000000000000000b00b"),
        actions: ProposalActions::new(
            vec![address!("0x00000000000000000000000000000000000000a1")],
            vec![U256::ZERO],
            vec!["setDelay(uint256)".into()],
            vec![Bytes::from(vec![0x01; 32])],
        )
        .unwrap(),
    }
}

fn proposal_targeting(target: Address, calldata: Bytes) -> Proposal {
    Proposal::new(
        U256::from(1),
        address!("0x0000000000000000000000000000000000000123"),
        ProposalActions::new(vec![target], vec![U256::ZERO], vec![String::new()], vec![calldata])
            .unwrap(),
        100,
        200,
        "bridge test".into(),
    )
    .unwrap()
}

#[tokio::test]
async fn value_retry_succeeds_with_topped_up_value() {
    let backend = MockBackend::default();
    backend.queue([failed("Timelock::executeTransaction: Transaction execution reverted."), succeeded()]);

    let total = U256::from(10);
    let governor_balance = U256::from(4);
    let result = execute_with_value_retry(&backend, payload(), total, governor_balance)
        .await
        .unwrap();

    assert!(result.success);
    let calls = backend.simulate_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].value, U256::ZERO);
    // Second attempt attaches total required minus the governor balance.
    assert_eq!(calls[1].value, U256::from(6));
    assert_eq!(
        calls[1].overrides.as_ref().unwrap().0[&calls[1].from].balance,
        Some(U256::from(6))
    );
}

#[tokio::test]
async fn genuine_revert_still_fails_after_both_retries() {
    let backend = MockBackend::default();
    backend.queue([
        failed("Comptroller: not an admin"),
        failed("Comptroller: not an admin"),
        failed("Comptroller: not an admin"),
    ]);

    let result = execute_with_value_retry(&backend, payload(), U256::from(10), U256::ZERO)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.revert_reason.as_deref(), Some("Comptroller: not an admin"));
    let calls = backend.simulate_calls();
    assert_eq!(calls.len(), 3);
    // With a zero governor balance both retries attach the full total.
    assert_eq!(calls[1].value, U256::from(10));
    assert_eq!(calls[2].value, U256::from(10));
}

#[tokio::test]
async fn zero_value_failures_are_not_retried() {
    let backend = MockBackend::default();
    backend.queue([failed("boom")]);

    let result = execute_with_value_retry(&backend, payload(), U256::ZERO, U256::ZERO)
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(backend.simulate_calls().len(), 1);
}

#[tokio::test]
async fn unsupported_destination_is_skipped_without_bundle_requests() {
    let backend = MockBackend::default();
    // Backend config declares no supported networks: every destination skips.
    let orchestrator = orchestrator(backend.clone(), config());

    let descriptor = bridge_for_target(OPTIMISM_MESSENGER).unwrap();
    let calldata = descriptor.encode_send(&bridge_message());
    let proposal = proposal_targeting(OPTIMISM_MESSENGER, calldata);

    let replays = orchestrator.replay_bridged(&proposal).await;

    assert_eq!(replays.len(), 1);
    let replay = &replays[0];
    assert!(replay.success);
    assert!(replay.skipped.as_deref().is_some_and(|reason| !reason.is_empty()));
    assert!(replay.error.is_none());
    assert_eq!(backend.bundle_calls(), 0);
}

#[tokio::test]
async fn decode_mismatch_fails_only_that_destination() {
    let backend = MockBackend::default();
    let orchestrator = orchestrator(backend.clone(), config());

    // Arbitrum-shaped calldata sent to the Optimism messenger cannot decode.
    let wrong_calldata =
        bridge_for_target(ARBITRUM_INBOX).unwrap().encode_send(&bridge_message());
    let good_calldata =
        bridge_for_target(OPTIMISM_MESSENGER).unwrap().encode_send(&bridge_message());

    let proposal = Proposal::new(
        U256::from(1),
        address!("0x0000000000000000000000000000000000000123"),
        ProposalActions::new(
            vec![OPTIMISM_MESSENGER, OPTIMISM_MESSENGER],
            vec![U256::ZERO, U256::ZERO],
            vec![String::new(), String::new()],
            vec![wrong_calldata, good_calldata],
        )
        .unwrap(),
        100,
        200,
        "bridge test".into(),
    )
    .unwrap();

    let replays = orchestrator.replay_bridged(&proposal).await;

    assert_eq!(replays.len(), 2);
    assert!(!replays[0].success);
    assert!(replays[0].error.as_deref().is_some_and(|err| err.contains("selector mismatch")));
    // The second, well-formed message is still processed (and skips, since
    // the backend supports no networks).
    assert!(replays[1].success);
    assert!(replays[1].skipped.is_some());
}
