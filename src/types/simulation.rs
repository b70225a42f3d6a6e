//! Simulation payloads, results and override sets.

use crate::{
    bridges::DestinationChain,
    types::{Proposal, ProposalActions},
};
use alloy::primitives::{Address, B256, Bytes, ChainId, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which lifecycle stage the proposal is simulated from.
///
/// Determines the orchestrator code path and which storage overrides are
/// fabricated.
#[derive(Debug, Clone)]
pub enum SimulationConfig {
    /// The proposal has not been submitted anywhere; simulate it as if it had
    /// been proposed, queued and become executable.
    New {
        /// Account posing as the proposer.
        proposer: Address,
        /// The calls the proposal would perform.
        actions: ProposalActions,
        /// Free-text description.
        description: String,
    },
    /// The proposal exists on-chain and has not executed yet.
    Proposed {
        /// Proposal identifier assigned by the governor.
        id: U256,
    },
    /// The proposal already executed; replay the historical transaction.
    Executed {
        /// Proposal identifier assigned by the governor.
        id: U256,
    },
}

/// Block header fields substituted for a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeaderOverride {
    /// Simulated block number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    /// Simulated block timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

/// Storage and balance overrides for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOverride {
    /// Storage slots substituted for the simulation.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub storage: BTreeMap<B256, B256>,
    /// Balance substituted for the simulation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<U256>,
}

/// Address-keyed override map; purely derived, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateOverrideSet(pub BTreeMap<Address, AccountOverride>);

impl StateOverrideSet {
    /// Sets one storage slot for an account.
    pub fn set_slot(&mut self, account: Address, slot: B256, value: B256) -> &mut Self {
        self.0.entry(account).or_default().storage.insert(slot, value);
        self
    }

    /// Sets the balance for an account.
    pub fn set_balance(&mut self, account: Address, balance: U256) -> &mut Self {
        self.0.entry(account).or_default().balance = Some(balance);
        self
    }

    /// Whether the set contains no overrides at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Total number of overridden storage slots across all accounts.
    pub fn slot_count(&self) -> usize {
        self.0.values().map(|acc| acc.storage.len()).sum()
    }
}

/// A single simulation request, fully parameterized.
#[derive(Debug, Clone)]
pub struct SimulationPayload {
    /// Chain the call is simulated on.
    pub chain_id: ChainId,
    /// Anchor block number the simulation state is read from.
    pub block_number: u64,
    /// Caller.
    pub from: Address,
    /// Callee.
    pub to: Address,
    /// Calldata.
    pub input: Bytes,
    /// Gas limit.
    pub gas: u64,
    /// Gas price, if the backend should not pick one.
    pub gas_price: Option<u128>,
    /// Native currency sent with the call.
    pub value: U256,
    /// Simulated block header fields.
    pub block_header: Option<BlockHeaderOverride>,
    /// State overrides applied before execution.
    pub overrides: Option<StateOverrideSet>,
}

/// An event log emitted during a simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    /// Emitting contract.
    pub address: Address,
    /// Log topics.
    pub topics: Vec<B256>,
    /// Log data.
    pub data: Bytes,
    /// Event name, when the backend resolved the emitter's ABI.
    pub name: Option<String>,
}

/// One storage slot changed by a simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDiffEntry {
    /// Contract whose storage changed.
    pub address: Address,
    /// Slot key.
    pub slot: B256,
    /// Value before execution.
    pub original: B256,
    /// Value after execution.
    pub dirty: B256,
}

/// One frame of the simulated call stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    /// Caller.
    pub from: Address,
    /// Callee; `None` for contract creation.
    pub to: Option<Address>,
    /// Calldata.
    pub input: Bytes,
    /// Native currency sent with the call.
    pub value: Option<U256>,
    /// Failure reason, when the frame reverted.
    pub error: Option<String>,
    /// Nested calls.
    pub calls: Vec<CallFrame>,
}

/// Contract metadata resolved by the simulation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
    /// Contract address.
    pub address: Address,
    /// Verified contract name, if known to the backend.
    pub name: Option<String>,
}

/// The outcome of one simulated transaction.
#[derive(Debug, Clone, Default)]
pub struct SimulationResult {
    /// Whether execution succeeded.
    pub success: bool,
    /// Revert reason, when execution failed.
    pub revert_reason: Option<String>,
    /// Emitted event logs.
    pub logs: Vec<EventLog>,
    /// Storage slots changed by execution.
    pub state_diffs: Vec<StateDiffEntry>,
    /// Root of the call stack trace.
    pub call_trace: Option<CallFrame>,
    /// Every address touched by execution.
    pub addresses: Vec<Address>,
    /// Metadata for contracts the backend recognized.
    pub contracts: Vec<ContractInfo>,
}

impl SimulationResult {
    /// Contract name for an address, when the backend resolved it.
    pub fn contract_name(&self, address: Address) -> Option<&str> {
        self.contracts
            .iter()
            .find(|c| c.address == address)
            .and_then(|c| c.name.as_deref())
    }
}

/// Replay of one bridged sub-message on its destination chain.
///
/// Created at most once per proposal target matching a known bridge
/// entrypoint.
#[derive(Debug, Clone)]
pub struct BridgedSimulation {
    /// Destination chain.
    pub chain: DestinationChain,
    /// Receiver contract the message is delivered to.
    pub receiver: Option<Address>,
    /// The reconstructed destination-side action batch.
    pub actions: Option<ProposalActions>,
    /// The create + execute bundle results, in order, when the destination
    /// was simulated.
    pub bundle: Option<Vec<SimulationResult>>,
    /// Whether both bundle steps executed successfully.
    pub success: bool,
    /// Reason the destination was skipped instead of simulated.
    pub skipped: Option<String>,
    /// Decode or bundle failure detail.
    pub error: Option<String>,
}

impl BridgedSimulation {
    /// A skip entry for a destination that cannot be simulated.
    pub fn skipped(chain: DestinationChain, reason: impl Into<String>) -> Self {
        Self {
            chain,
            receiver: None,
            actions: None,
            bundle: None,
            success: true,
            skipped: Some(reason.into()),
            error: None,
        }
    }

    /// A failure entry for a destination whose message could not be replayed.
    pub fn failed(chain: DestinationChain, error: impl Into<String>) -> Self {
        Self {
            chain,
            receiver: None,
            actions: None,
            bundle: None,
            success: false,
            skipped: None,
            error: Some(error.into()),
        }
    }

    /// The destination-side execution step, when the bundle ran.
    pub fn execution(&self) -> Option<&SimulationResult> {
        self.bundle.as_ref().and_then(|steps| steps.get(1))
    }
}

/// The full outcome of replaying one proposal: the primary simulation plus
/// every bridged destination.
#[derive(Debug, Clone)]
pub struct ProposalSimulation {
    /// The proposal that was simulated.
    pub proposal: Proposal,
    /// Primary (source chain) simulation result.
    pub result: SimulationResult,
    /// One entry per bridged destination, in target order.
    pub bridged: Vec<BridgedSimulation>,
}
