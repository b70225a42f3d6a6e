//! Codec for Polygon PoS state sync.

use alloy::{
    primitives::{Address, Bytes, U256},
    sol,
    sol_types::SolCall,
};

sol! {
    /// `FxRoot` entrypoint forwarding a message to the child chain; the inner
    /// payload is the second argument.
    function sendMessageToChild(address _receiver, bytes _data) external;

    /// Delivery entrypoint `FxChild` invokes on the receiver. The receiver
    /// validates `rootMessageSender` against the L1 governance address, so an
    /// execute-side payload must carry it.
    function processMessageFromRoot(uint256 stateId, address rootMessageSender, bytes data) external;
}

pub(crate) const SELECTOR: [u8; 4] = sendMessageToChildCall::SELECTOR;

pub(crate) fn decode(calldata: &[u8]) -> Result<(Address, Bytes), alloy::sol_types::Error> {
    let call = sendMessageToChildCall::abi_decode(calldata)?;
    Ok((call._receiver, call._data))
}

pub(crate) fn encode(receiver: Address, inner: Bytes) -> Bytes {
    sendMessageToChildCall { _receiver: receiver, _data: inner }.abi_encode().into()
}

/// Wraps an encoded action tuple in the delivery call the receiver expects,
/// posing as the given root message sender.
pub(crate) fn wrap_delivery(root_sender: Address, inner: Bytes) -> Bytes {
    processMessageFromRootCall { stateId: U256::from(1), rootMessageSender: root_sender, data: inner }
        .abi_encode()
        .into()
}
