//! Codec for the Scroll messenger.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

sol! {
    /// `L1ScrollMessenger` send entrypoint; the inner payload is the third
    /// argument.
    function sendMessage(address target, uint256 value, bytes message, uint256 gasLimit) external payable;
}

/// Gas forwarded to the destination receiver when constructing a send.
const GAS_LIMIT: u64 = 1_000_000;

pub(crate) const SELECTOR: [u8; 4] = sendMessageCall::SELECTOR;

pub(crate) fn decode(calldata: &[u8]) -> Result<(Address, Bytes), alloy::sol_types::Error> {
    let call = sendMessageCall::abi_decode(calldata)?;
    Ok((call.target, call.message))
}

pub(crate) fn encode(receiver: Address, inner: Bytes) -> Bytes {
    sendMessageCall {
        target: receiver,
        value: U256::ZERO,
        message: inner,
        gasLimit: U256::from(GAS_LIMIT),
    }
    .abi_encode()
    .into()
}
