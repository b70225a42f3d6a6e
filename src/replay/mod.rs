//! End-to-end proposal replay orchestration.
//!
//! Drives the full flow: builds storage overrides for the proposal's
//! lifecycle stage, issues the primary `execute` simulation (with the
//! value-insufficiency retry), detects bridged sub-messages among the
//! proposal targets and replays each on its destination chain as a two-step
//! create/execute bundle. Destinations are processed sequentially to respect
//! backend rate limits.

use crate::{
    bridges::{self, BridgeDescriptor, BridgedMessage, DestinationChain},
    config::SentinelConfig,
    constants::{BLOCK_LAG_MARGIN, EXECUTOR, RECEIVER_TIMELOCK_DELAY, SIMULATION_GAS_LIMIT},
    error::SentinelError,
    overrides::StateOverrideCalculator,
    simulator::SimulationBackend,
    types::{
        BlockHeaderOverride, BridgedSimulation, IBridgeReceiver, IGovernor, ITimelock, Proposal,
        ProposalActions, ProposalSimulation, SimulationConfig, SimulationPayload, SimulationResult,
        StateOverrideSet,
    },
};
use alloy::{
    consensus::Transaction as _,
    primitives::{Address, Bytes, U256},
    providers::{DynProvider, Provider},
    rpc::types::Filter,
    sol_types::{SolCall, SolEvent},
};
use eyre::eyre;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Read-only providers for bridged destination chains.
///
/// A destination without a provider here is treated as unsupported and its
/// bridged messages are skipped rather than replayed.
#[derive(Debug, Clone, Default)]
pub struct DestinationProviders(HashMap<DestinationChain, DynProvider>);

impl DestinationProviders {
    /// Adds a provider for a destination chain.
    pub fn with(mut self, chain: DestinationChain, provider: DynProvider) -> Self {
        self.0.insert(chain, provider);
        self
    }

    /// Provider for a destination chain, if configured.
    pub fn get(&self, chain: DestinationChain) -> Option<&DynProvider> {
        self.0.get(&chain)
    }
}

/// Orchestrates proposal replay against the simulation backend.
#[derive(Debug, Clone)]
pub struct ProposalReplayOrchestrator<B> {
    backend: B,
    provider: DynProvider,
    destinations: DestinationProviders,
    config: SentinelConfig,
}

impl<B: SimulationBackend> ProposalReplayOrchestrator<B> {
    /// Creates an orchestrator for a governor/timelock pair.
    pub fn new(
        backend: B,
        provider: DynProvider,
        destinations: DestinationProviders,
        config: SentinelConfig,
    ) -> Self {
        Self { backend, provider, destinations, config }
    }

    /// Simulates a proposal from the given lifecycle stage, including every
    /// bridged destination.
    pub async fn simulate(
        &self,
        sim_config: SimulationConfig,
    ) -> Result<ProposalSimulation, SentinelError> {
        let (proposal, result) = match sim_config {
            SimulationConfig::New { proposer, actions, description } => {
                self.simulate_new(proposer, actions, description).await?
            }
            SimulationConfig::Proposed { id } => self.simulate_proposed(id).await?,
            SimulationConfig::Executed { id } => self.simulate_executed(id).await?,
        };

        let bridged = self.replay_bridged(&proposal).await;
        Ok(ProposalSimulation { proposal, result, bridged })
    }

    /// Simulates a proposal that has not been submitted anywhere: fabricates
    /// the full proposal record as if it were proposed, queued and ready.
    async fn simulate_new(
        &self,
        proposer: Address,
        actions: ProposalActions,
        description: String,
    ) -> Result<(Proposal, SimulationResult), SentinelError> {
        actions.validate()?;

        let governor = IGovernor::new(self.config.governor, self.provider.clone());
        let count = governor.proposalCount().call().await?;
        let anchor = self.anchor_block().await?;

        // Voting is already over for a queued proposal.
        let proposal = Proposal::new(
            count + U256::from(1),
            proposer,
            actions,
            anchor.saturating_sub(2),
            anchor.saturating_sub(1),
            description,
        )?;
        info!(id = %proposal.id, "simulating new proposal");

        let window = self.execution_window(anchor).await?;
        let quorum = governor.quorumVotes().call().await?;
        let calculator = StateOverrideCalculator::new(self.config.governor, self.config.timelock);
        let overrides = calculator.for_new(&proposal, window.eta, quorum);

        self.run_execute(&proposal, anchor, window, overrides).await.map(|r| (proposal, r))
    }

    /// Simulates an on-chain, unexecuted proposal: reads it from its creation
    /// event and fakes only eta, flags and tallies.
    async fn simulate_proposed(
        &self,
        id: U256,
    ) -> Result<(Proposal, SimulationResult), SentinelError> {
        let proposal = self.fetch_proposal(id).await?;
        info!(id = %id, "simulating proposed proposal");

        let anchor = self.anchor_block().await?;
        let window = self.execution_window(anchor).await?;
        let governor = IGovernor::new(self.config.governor, self.provider.clone());
        let quorum = governor.quorumVotes().call().await?;
        let calculator = StateOverrideCalculator::new(self.config.governor, self.config.timelock);
        let overrides = calculator.for_proposed(&proposal, window.eta, quorum);

        self.run_execute(&proposal, anchor, window, overrides).await.map(|r| (proposal, r))
    }

    /// Replays an already-executed proposal's historical transaction with its
    /// original parameters and no overrides.
    async fn simulate_executed(
        &self,
        id: U256,
    ) -> Result<(Proposal, SimulationResult), SentinelError> {
        let proposal = self.fetch_proposal(id).await?;
        info!(id = %id, "replaying executed proposal");

        let filter = Filter::new()
            .address(self.config.governor)
            .event_signature(IGovernor::ProposalExecuted::SIGNATURE_HASH)
            .from_block(0u64);
        let logs = self.provider.get_logs(&filter).await?;
        let execution = logs
            .iter()
            .find(|log| {
                IGovernor::ProposalExecuted::decode_log(&log.inner)
                    .is_ok_and(|event| event.data.id == id)
            })
            .ok_or(SentinelError::ProposalNotFound(id))?;
        let tx_hash = execution
            .transaction_hash
            .ok_or_else(|| eyre!("execution log for proposal {id} has no transaction hash"))?;

        let tx = self
            .provider
            .get_transaction_by_hash(tx_hash)
            .await?
            .ok_or_else(|| eyre!("execution transaction {tx_hash} not found"))?;

        let payload = SimulationPayload {
            chain_id: self.config.chain_id,
            block_number: tx
                .block_number
                .ok_or_else(|| eyre!("execution transaction {tx_hash} is not mined"))?,
            from: tx.inner.signer(),
            to: tx.to().ok_or_else(|| eyre!("execution transaction has no recipient"))?,
            input: tx.input().clone(),
            gas: tx.gas_limit(),
            gas_price: tx.gas_price(),
            value: tx.value(),
            block_header: None,
            overrides: None,
        };

        let result = self.backend.simulate(payload).await?;
        Ok((proposal, result))
    }

    /// Replays every bridged sub-message among the proposal's targets, one
    /// entry per target matching a known bridge entrypoint.
    pub async fn replay_bridged(&self, proposal: &Proposal) -> Vec<BridgedSimulation> {
        let mut replays = Vec::new();
        for action in proposal.actions.iter() {
            let Some(descriptor) = bridges::bridge_for_target(action.target) else { continue };
            info!(chain = %descriptor.chain, "replaying bridged message");
            replays.push(self.replay_destination(descriptor, action.calldata).await);
        }
        replays
    }

    async fn replay_destination(
        &self,
        descriptor: &BridgeDescriptor,
        calldata: &Bytes,
    ) -> BridgedSimulation {
        let chain = descriptor.chain;

        let message = match descriptor.decode(calldata) {
            Ok(message) => message,
            Err(err) => {
                warn!(%chain, %err, "bridged message decode failed");
                return BridgedSimulation::failed(chain, err.to_string());
            }
        };

        if !self.config.backend.supports(chain.chain_id()) {
            let mut skip = BridgedSimulation::skipped(
                chain,
                format!("{chain} is not supported by the simulation backend; replay skipped"),
            );
            skip.receiver = Some(message.receiver);
            skip.actions = Some(message.actions);
            return skip;
        }
        let Some(provider) = self.destinations.get(chain) else {
            let mut skip = BridgedSimulation::skipped(
                chain,
                format!("no provider configured for {chain}; replay skipped"),
            );
            skip.receiver = Some(message.receiver);
            skip.actions = Some(message.actions);
            return skip;
        };

        match self.simulate_destination(descriptor, provider, &message).await {
            Ok(replay) => replay,
            Err(err) => {
                warn!(%chain, %err, "bridged replay failed");
                let mut failed = BridgedSimulation::failed(chain, err.to_string());
                failed.receiver = Some(message.receiver);
                failed.actions = Some(message.actions);
                failed
            }
        }
    }

    /// Issues the two-step create/execute bundle for one destination.
    async fn simulate_destination(
        &self,
        descriptor: &BridgeDescriptor,
        provider: &DynProvider,
        message: &BridgedMessage,
    ) -> Result<BridgedSimulation, SentinelError> {
        let chain = descriptor.chain;
        let anchor = self
            .backend
            .latest_block(chain.chain_id())
            .await?
            .saturating_sub(BLOCK_LAG_MARGIN);
        let block = provider
            .get_block_by_number(anchor.into())
            .await?
            .ok_or_else(|| eyre!("anchor block {anchor} not found on {chain}"))?;

        let receiver = IBridgeReceiver::new(message.receiver, provider.clone());
        let next_id = receiver.nextProposalId().call().await?;

        let create_timestamp = block.header.timestamp + 1;
        let execute_timestamp = create_timestamp + RECEIVER_TIMELOCK_DELAY + 1;

        let create = SimulationPayload {
            chain_id: chain.chain_id(),
            block_number: anchor,
            from: chain.cross_domain_sender(self.config.timelock),
            to: message.receiver,
            input: descriptor.delivery_payload(message, self.config.timelock),
            gas: SIMULATION_GAS_LIMIT,
            gas_price: None,
            value: U256::ZERO,
            block_header: Some(BlockHeaderOverride {
                number: Some(anchor + 1),
                timestamp: Some(create_timestamp),
            }),
            overrides: None,
        };
        let execute = SimulationPayload {
            chain_id: chain.chain_id(),
            block_number: anchor,
            from: EXECUTOR,
            to: message.receiver,
            input: IBridgeReceiver::executeProposalCall { proposalId: next_id }
                .abi_encode()
                .into(),
            gas: SIMULATION_GAS_LIMIT,
            gas_price: None,
            value: U256::ZERO,
            block_header: Some(BlockHeaderOverride {
                number: Some(anchor + 2),
                timestamp: Some(execute_timestamp),
            }),
            overrides: None,
        };

        let steps = self.backend.simulate_bundle(vec![create, execute]).await?;

        let mut replay = BridgedSimulation {
            chain,
            receiver: Some(message.receiver),
            actions: Some(message.actions.clone()),
            bundle: None,
            success: false,
            skipped: None,
            error: None,
        };

        if steps.len() != 2 {
            replay.error =
                Some(format!("bundle returned {} results, expected create + execute", steps.len()));
            replay.bundle = Some(steps);
            return Ok(replay);
        }

        replay.success = true;
        for (index, step) in steps.iter().enumerate() {
            if !step.success {
                replay.success = false;
                replay.error = Some(format!(
                    "bundle step {} failed: {}",
                    index + 1,
                    step.revert_reason.as_deref().unwrap_or("no revert reason")
                ));
                break;
            }
        }
        replay.bundle = Some(steps);
        Ok(replay)
    }

    /// Reads a proposal from its `ProposalCreated` event.
    async fn fetch_proposal(&self, id: U256) -> Result<Proposal, SentinelError> {
        let filter = Filter::new()
            .address(self.config.governor)
            .event_signature(IGovernor::ProposalCreated::SIGNATURE_HASH)
            .from_block(0u64);
        let logs = self.provider.get_logs(&filter).await?;

        for log in &logs {
            let Ok(event) = IGovernor::ProposalCreated::decode_log(&log.inner) else { continue };
            let event = event.data;
            if event.id != id {
                continue;
            }
            let actions = ProposalActions::new(
                event.targets,
                event.values,
                event.signatures,
                event.calldatas,
            )?;
            return Ok(Proposal::new(
                event.id,
                event.proposer,
                actions,
                event.startBlock.to::<u64>(),
                event.endBlock.to::<u64>(),
                event.description,
            )?);
        }
        Err(SentinelError::ProposalNotFound(id))
    }

    /// Latest backend block for the governor chain, minus the lag margin.
    async fn anchor_block(&self) -> Result<u64, SentinelError> {
        Ok(self
            .backend
            .latest_block(self.config.chain_id)
            .await?
            .saturating_sub(BLOCK_LAG_MARGIN))
    }

    /// Computes the simulated execution time: just past the timelock delay
    /// from the anchor block, with eta placed exactly at it so the queued
    /// transactions are ready but not expired.
    async fn execution_window(&self, anchor: u64) -> Result<ExecutionWindow, SentinelError> {
        let block = self
            .provider
            .get_block_by_number(anchor.into())
            .await?
            .ok_or_else(|| eyre!("anchor block {anchor} not found"))?;
        let timelock = ITimelock::new(self.config.timelock, self.provider.clone());
        let delay = timelock.delay().call().await?;

        let timestamp = block.header.timestamp + delay.to::<u64>() + 1;
        Ok(ExecutionWindow { eta: U256::from(timestamp), timestamp })
    }

    /// Runs the governor `execute` simulation with the value-insufficiency
    /// retry.
    async fn run_execute(
        &self,
        proposal: &Proposal,
        anchor: u64,
        window: ExecutionWindow,
        overrides: StateOverrideSet,
    ) -> Result<SimulationResult, SentinelError> {
        let overrides = self
            .backend
            .encode_state_overrides(self.config.chain_id, overrides)
            .await?;

        let payload = SimulationPayload {
            chain_id: self.config.chain_id,
            block_number: anchor,
            from: EXECUTOR,
            to: self.config.governor,
            input: IGovernor::executeCall { proposalId: proposal.id }.abi_encode().into(),
            gas: SIMULATION_GAS_LIMIT,
            gas_price: None,
            value: U256::ZERO,
            block_header: Some(BlockHeaderOverride {
                number: Some(anchor + 1),
                timestamp: Some(window.timestamp),
            }),
            overrides: Some(overrides),
        };

        let governor_balance = self.provider.get_balance(self.config.governor).await?;
        execute_with_value_retry(&self.backend, payload, proposal.total_value(), governor_balance)
            .await
    }
}

/// Simulated execution time for a queued proposal.
#[derive(Debug, Clone, Copy)]
struct ExecutionWindow {
    /// Timelock eta written into the overrides.
    eta: U256,
    /// Simulated block timestamp.
    timestamp: u64,
}

/// Runs an `execute` simulation, retrying with attached value when the first
/// attempt fails and the proposal requires native currency.
///
/// The first retry attaches `total required - governor balance`, the second
/// the full total. This distinguishes "caller needs to send funds" failures
/// from genuine reverts: a proposal failing for unrelated reasons still fails
/// after both retries and that final result is returned as-is.
pub async fn execute_with_value_retry<B: SimulationBackend>(
    backend: &B,
    mut payload: SimulationPayload,
    total_value: U256,
    governor_balance: U256,
) -> Result<SimulationResult, SentinelError> {
    let mut result = backend.simulate(payload.clone()).await?;
    if result.success || total_value.is_zero() {
        return Ok(result);
    }

    let top_up = total_value.saturating_sub(governor_balance);
    for value in [top_up, total_value] {
        if value.is_zero() {
            continue;
        }
        debug!(%value, "retrying execution with attached value");
        payload.value = value;
        payload
            .overrides
            .get_or_insert_with(StateOverrideSet::default)
            .set_balance(payload.from, value);
        result = backend.simulate(payload.clone()).await?;
        if result.success {
            return Ok(result);
        }
    }
    Ok(result)
}
