//! Codec for Arbitrum One retryable tickets.

use crate::constants::ARBITRUM_ALIAS_OFFSET;
use alloy::{
    primitives::{Address, Bytes, U160, U256},
    sol,
    sol_types::SolCall,
};

sol! {
    /// Delayed-inbox entrypoint creating an L2 retryable ticket; the inner
    /// payload is the last argument.
    function createRetryableTicket(
        address to,
        uint256 l2CallValue,
        uint256 maxSubmissionCost,
        address excessFeeRefundAddress,
        address callValueRefundAddress,
        uint256 gasLimit,
        uint256 maxFeePerGas,
        bytes data
    ) external payable returns (uint256);
}

pub(crate) const SELECTOR: [u8; 4] = createRetryableTicketCall::SELECTOR;

/// Applies the L1-to-L2 address alias: on Arbitrum, an L1 contract calling
/// through the inbox appears as `l1 + 0x1111...1111 (mod 2^160)`.
pub(crate) fn apply_l1_to_l2_alias(l1: Address) -> Address {
    let sum = U160::from_be_bytes(l1.0.0).wrapping_add(U160::from_be_bytes(ARBITRUM_ALIAS_OFFSET.0.0));
    Address::from(sum.to_be_bytes::<20>())
}

pub(crate) fn decode(calldata: &[u8]) -> Result<(Address, Bytes), alloy::sol_types::Error> {
    let call = createRetryableTicketCall::abi_decode(calldata)?;
    Ok((call.to, call.data))
}

pub(crate) fn encode(receiver: Address, inner: Bytes) -> Bytes {
    createRetryableTicketCall {
        to: receiver,
        l2CallValue: U256::ZERO,
        maxSubmissionCost: U256::ZERO,
        excessFeeRefundAddress: receiver,
        callValueRefundAddress: receiver,
        gasLimit: U256::ZERO,
        maxFeePerGas: U256::ZERO,
        data: inner,
    }
    .abi_encode()
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn alias_arithmetic() {
        assert_eq!(
            apply_l1_to_l2_alias(address!("0x1a9C8182C09F50C8318d769245beA52c32BE35BC")),
            address!("0x2bad8182c09f50c8318d769245bea52c32be46cd")
        );
    }

    #[test]
    fn alias_wraps_modulo_2_160() {
        let aliased = apply_l1_to_l2_alias(address!("0xffffffffffffffffffffffffffffffffffffffff"));
        assert_eq!(aliased, address!("0x1111000000000000000000000000000000001110"));
    }
}
