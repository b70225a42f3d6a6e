//! Sentinel error types.

use alloy::transports::TransportErrorKind;
use thiserror::Error;

mod bridge;
pub use bridge::BridgeError;

mod proposal;
pub use proposal::ValidationError;

mod simulator;
pub use simulator::SimulatorError;

/// The overarching error type returned by proposal analysis.
#[derive(Debug, Error)]
pub enum SentinelError {
    /// The proposal is structurally invalid.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Errors talking to the simulation backend.
    #[error(transparent)]
    Simulator(#[from] SimulatorError),
    /// Errors decoding or encoding a bridged message.
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    /// The proposal was not found on-chain.
    #[error("proposal {0} not found on-chain")]
    ProposalNotFound(alloy::primitives::U256),
    /// An error occurred during ABI encoding/decoding.
    #[error(transparent)]
    AbiError(#[from] alloy::sol_types::Error),
    /// An error occurred calling a contract.
    #[error(transparent)]
    ContractError(#[from] alloy::contract::Error),
    /// An error occurred talking to RPC.
    #[error(transparent)]
    RpcError(#[from] alloy::transports::RpcError<TransportErrorKind>),
    /// An internal error occurred.
    #[error(transparent)]
    InternalError(#[from] eyre::Error),
}
