//! Sentinel domain types.

mod governor;
pub use governor::{IBridgeReceiver, IGovernor, ITimelock};

mod proposal;
pub use proposal::{Proposal, ProposalAction, ProposalActions};

mod simulation;
pub use simulation::{
    AccountOverride, BlockHeaderOverride, BridgedSimulation, CallFrame, ContractInfo, EventLog,
    ProposalSimulation, SimulationConfig, SimulationPayload, SimulationResult, StateDiffEntry,
    StateOverrideSet,
};
