use crate::bridges::DestinationChain;
use alloy::primitives::Selector;
use thiserror::Error;

/// Errors decoding or encoding a bridged governance message.
///
/// Fatal only for the affected destination chain's replay; the rest of the
/// proposal analysis continues.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The calldata sent to the bridge entrypoint does not start with the
    /// bridge-send selector expected for the destination chain.
    ///
    /// Either a non-bridge call was misclassified as one, or the bridge
    /// contract's interface changed.
    #[error("selector mismatch for {chain}: expected {expected}, got {got}")]
    SelectorMismatch {
        /// Destination chain being decoded.
        chain: DestinationChain,
        /// The bridge-send selector expected for the chain.
        expected: Selector,
        /// The selector found in the calldata.
        got: Selector,
    },
    /// The calldata is shorter than a function selector.
    #[error("bridge calldata for {chain} is too short ({len} bytes)")]
    CalldataTooShort {
        /// Destination chain being decoded.
        chain: DestinationChain,
        /// Calldata length.
        len: usize,
    },
    /// ABI decoding of the outer call or the inner payload failed.
    #[error(transparent)]
    Abi(#[from] alloy::sol_types::Error),
    /// The decoded action tuple is structurally invalid.
    #[error(transparent)]
    Payload(#[from] crate::error::ValidationError),
}
