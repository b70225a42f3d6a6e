//! Per-destination-chain bridge message codecs.
//!
//! Each supported destination is one entry in a static dispatch table keyed
//! by its L1 entrypoint address; adding a chain is a table insertion. The
//! inner payload every bridge carries is the ABI-encoded action tuple
//! `(address[], uint256[], string[], bytes[])`.

use crate::{
    constants::{
        ARBITRUM_INBOX, BASE_MESSENGER, BLAST_MESSENGER, OP_L2_MESSENGER, OPTIMISM_MESSENGER,
        POLYGON_FX_CHILD, POLYGON_FX_ROOT, SCROLL_L2_MESSENGER, SCROLL_MESSENGER, ZORA_MESSENGER,
    },
    error::BridgeError,
    types::ProposalActions,
};
use alloy::{
    primitives::{Address, Bytes, ChainId, Selector, U256},
    sol_types::SolValue,
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub(crate) mod arb;
pub(crate) mod polygon;
pub(crate) mod rollup;
pub(crate) mod scroll;

/// A destination chain reachable through an L1 bridge entrypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DestinationChain {
    /// OP Mainnet.
    Optimism,
    /// Base.
    Base,
    /// Blast.
    Blast,
    /// Zora.
    Zora,
    /// Arbitrum One.
    ArbitrumOne,
    /// Polygon PoS.
    Polygon,
    /// Scroll.
    Scroll,
}

impl DestinationChain {
    /// Chain identifier.
    pub fn chain_id(&self) -> ChainId {
        match self {
            Self::Optimism => 10,
            Self::Base => 8453,
            Self::Blast => 81457,
            Self::Zora => 7777777,
            Self::ArbitrumOne => 42161,
            Self::Polygon => 137,
            Self::Scroll => 534352,
        }
    }

    /// Human-readable chain name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Optimism => "Optimism",
            Self::Base => "Base",
            Self::Blast => "Blast",
            Self::Zora => "Zora",
            Self::ArbitrumOne => "Arbitrum One",
            Self::Polygon => "Polygon PoS",
            Self::Scroll => "Scroll",
        }
    }

    /// Address the destination receiver sees as the sender of a relayed
    /// message, given the L1 timelock that sent it.
    pub fn cross_domain_sender(&self, l1_timelock: Address) -> Address {
        match self {
            Self::Optimism | Self::Base | Self::Blast | Self::Zora => OP_L2_MESSENGER,
            Self::ArbitrumOne => arb::apply_l1_to_l2_alias(l1_timelock),
            Self::Polygon => POLYGON_FX_CHILD,
            Self::Scroll => SCROLL_L2_MESSENGER,
        }
    }
}

impl fmt::Display for DestinationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The bridge-send codec family an entrypoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodecFamily {
    /// `sendMessage(address,bytes,uint32)`.
    CrossDomainMessenger,
    /// `createRetryableTicket(...)`.
    RetryableTicket,
    /// `sendMessageToChild(address,bytes)`.
    StateSync,
    /// `sendMessage(address,uint256,bytes,uint256)`.
    ScrollMessenger,
}

impl CodecFamily {
    fn selector(&self) -> Selector {
        match self {
            Self::CrossDomainMessenger => rollup::SELECTOR.into(),
            Self::RetryableTicket => arb::SELECTOR.into(),
            Self::StateSync => polygon::SELECTOR.into(),
            Self::ScrollMessenger => scroll::SELECTOR.into(),
        }
    }
}

/// One entry of the bridge dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct BridgeDescriptor {
    /// Destination chain the entrypoint bridges to.
    pub chain: DestinationChain,
    /// L1 entrypoint address proposals call to send a message.
    pub entrypoint: Address,
    family: CodecFamily,
}

/// Every known L1 bridge entrypoint.
pub static BRIDGES: &[BridgeDescriptor] = &[
    BridgeDescriptor {
        chain: DestinationChain::Optimism,
        entrypoint: OPTIMISM_MESSENGER,
        family: CodecFamily::CrossDomainMessenger,
    },
    BridgeDescriptor {
        chain: DestinationChain::Base,
        entrypoint: BASE_MESSENGER,
        family: CodecFamily::CrossDomainMessenger,
    },
    BridgeDescriptor {
        chain: DestinationChain::Blast,
        entrypoint: BLAST_MESSENGER,
        family: CodecFamily::CrossDomainMessenger,
    },
    BridgeDescriptor {
        chain: DestinationChain::Zora,
        entrypoint: ZORA_MESSENGER,
        family: CodecFamily::CrossDomainMessenger,
    },
    BridgeDescriptor {
        chain: DestinationChain::ArbitrumOne,
        entrypoint: ARBITRUM_INBOX,
        family: CodecFamily::RetryableTicket,
    },
    BridgeDescriptor {
        chain: DestinationChain::Polygon,
        entrypoint: POLYGON_FX_ROOT,
        family: CodecFamily::StateSync,
    },
    BridgeDescriptor {
        chain: DestinationChain::Scroll,
        entrypoint: SCROLL_MESSENGER,
        family: CodecFamily::ScrollMessenger,
    },
];

/// Looks a proposal target up in the bridge table.
pub fn bridge_for_target(target: Address) -> Option<&'static BridgeDescriptor> {
    BRIDGES.iter().find(|descriptor| descriptor.entrypoint == target)
}

/// A cross-chain instruction recovered from (or destined for) a bridge
/// entrypoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgedMessage {
    /// Destination-side contract the message is delivered to.
    pub receiver: Address,
    /// The action batch the receiver will store and later execute.
    pub actions: ProposalActions,
}

impl BridgeDescriptor {
    /// The bridge-send selector expected at this entrypoint.
    pub fn expected_selector(&self) -> Selector {
        self.family.selector()
    }

    /// Decodes the calldata a proposal sends to this entrypoint, recovering
    /// the destination receiver and the underlying action tuple.
    pub fn decode(&self, calldata: &[u8]) -> Result<BridgedMessage, BridgeError> {
        let Some(selector) = calldata.get(..4) else {
            return Err(BridgeError::CalldataTooShort { chain: self.chain, len: calldata.len() });
        };
        let expected = self.expected_selector();
        if selector != expected.as_slice() {
            return Err(BridgeError::SelectorMismatch {
                chain: self.chain,
                expected,
                got: Selector::try_from(selector).unwrap_or_default(),
            });
        }

        let (receiver, inner) = match self.family {
            CodecFamily::CrossDomainMessenger => rollup::decode(calldata)?,
            CodecFamily::RetryableTicket => arb::decode(calldata)?,
            CodecFamily::StateSync => polygon::decode(calldata)?,
            CodecFamily::ScrollMessenger => scroll::decode(calldata)?,
        };

        let (targets, values, signatures, calldatas) =
            <(Vec<Address>, Vec<U256>, Vec<String>, Vec<Bytes>)>::abi_decode_params(&inner)?;
        let actions = ProposalActions::new(targets, values, signatures, calldatas)?;
        Ok(BridgedMessage { receiver, actions })
    }

    /// Encodes the full bridge-send calldata for this entrypoint; the inverse
    /// of [`decode`](Self::decode).
    pub fn encode_send(&self, message: &BridgedMessage) -> Bytes {
        let inner = Bytes::from(encode_actions(&message.actions));
        match self.family {
            CodecFamily::CrossDomainMessenger => rollup::encode(message.receiver, inner),
            CodecFamily::RetryableTicket => arb::encode(message.receiver, inner),
            CodecFamily::StateSync => polygon::encode(message.receiver, inner),
            CodecFamily::ScrollMessenger => scroll::encode(message.receiver, inner),
        }
    }

    /// Encodes the calldata the destination receiver gets when the message is
    /// delivered.
    ///
    /// Symmetric with the decoded tuple for every family except Polygon,
    /// whose receiver expects to be invoked by its bridge relayer and
    /// therefore gets the tuple wrapped in a process-message-from-root call
    /// naming the L1 timelock as the root sender.
    pub fn delivery_payload(&self, message: &BridgedMessage, l1_timelock: Address) -> Bytes {
        let inner = Bytes::from(encode_actions(&message.actions));
        match self.family {
            CodecFamily::StateSync => polygon::wrap_delivery(l1_timelock, inner),
            _ => inner,
        }
    }
}

fn encode_actions(actions: &ProposalActions) -> Vec<u8> {
    (
        actions.targets.clone(),
        actions.values.clone(),
        actions.signatures.clone(),
        actions.calldatas.clone(),
    )
        .abi_encode_params()
}
