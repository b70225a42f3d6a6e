//! Codec for OP Stack rollups (Optimism, Base, Blast, Zora).

use alloy::{
    primitives::{Address, Bytes},
    sol,
    sol_types::SolCall,
};

sol! {
    /// `L1CrossDomainMessenger` send entrypoint; the inner payload is the
    /// second argument.
    function sendMessage(address _target, bytes _message, uint32 _minGasLimit) external payable;
}

/// Gas forwarded to the destination receiver when constructing a send.
const MIN_GAS_LIMIT: u32 = 3_000_000;

pub(crate) const SELECTOR: [u8; 4] = sendMessageCall::SELECTOR;

pub(crate) fn decode(calldata: &[u8]) -> Result<(Address, Bytes), alloy::sol_types::Error> {
    let call = sendMessageCall::abi_decode(calldata)?;
    Ok((call._target, call._message))
}

pub(crate) fn encode(receiver: Address, inner: Bytes) -> Bytes {
    sendMessageCall { _target: receiver, _message: inner, _minGasLimit: MIN_GAS_LIMIT }
        .abi_encode()
        .into()
}
