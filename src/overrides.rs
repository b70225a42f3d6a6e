//! Storage overrides faking a proposal's lifecycle stage.
//!
//! The remote simulator reads the governor and timelock state verbatim, so a
//! proposal that is not actually queued on-chain needs its storage fabricated:
//! the proposal record in the governor's namespaced storage region and the
//! queued-transaction flags in the timelock. All slot addresses follow
//! Solidity's storage layout rules; if the target contract deviates from the
//! assumed layout, the overrides land on wrong slots and the simulation
//! reverts downstream.

use crate::types::{Proposal, StateOverrideSet};
use alloy::{
    primitives::{Address, B256, U256, keccak256},
    sol_types::SolValue,
};

/// ERC-7201 namespace identifier of the governor's proposal storage region.
pub const GOVERNOR_STORAGE_NAMESPACE: &str = "governor.storage.Proposals";

/// Storage slot of the timelock's `queuedTransactions` mapping.
pub const QUEUED_TRANSACTIONS_SLOT: U256 = U256::from_limbs([3, 0, 0, 0]);

// Field order within the governor's namespaced region.
const PROPOSAL_COUNT_OFFSET: u64 = 0;
const PROPOSALS_MAPPING_OFFSET: u64 = 1;

// Field order within a proposal record.
const PROPOSER_OFFSET: u64 = 0;
const ETA_OFFSET: u64 = 1;
const TARGETS_OFFSET: u64 = 2;
const VALUES_OFFSET: u64 = 3;
const SIGNATURES_OFFSET: u64 = 4;
const CALLDATAS_OFFSET: u64 = 5;
const START_BLOCK_OFFSET: u64 = 6;
const END_BLOCK_OFFSET: u64 = 7;
const FOR_VOTES_OFFSET: u64 = 8;
const AGAINST_VOTES_OFFSET: u64 = 9;
const ABSTAIN_VOTES_OFFSET: u64 = 10;
// `canceled` and `executed` are consecutive bools packed into one word:
// `canceled` at byte 0, `executed` at byte 1.
const FLAGS_OFFSET: u64 = 11;

/// Derives an ERC-7201 namespaced base slot:
/// `keccak256(abi.encode(uint256(keccak256(id)) - 1)) & ~0xff`.
pub fn namespaced_base_slot(namespace: &str) -> U256 {
    let inner = U256::from_be_bytes(keccak256(namespace.as_bytes()).0) - U256::from(1);
    let mut outer = keccak256(B256::from(inner)).0;
    outer[31] = 0;
    U256::from_be_bytes(outer)
}

/// Solidity mapping rule: the value for `key` lives at
/// `keccak256(abi.encode(key, slot))`.
pub fn mapping_slot(key: U256, slot: U256) -> U256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&key.to_be_bytes::<32>());
    buf[32..].copy_from_slice(&slot.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(buf).0)
}

/// Data region of a dynamic array or long `bytes` value rooted at `slot`.
fn data_slot(slot: U256) -> U256 {
    U256::from_be_bytes(keccak256(B256::from(slot)).0)
}

/// Slot of the proposal record for `id` in the governor's namespaced region.
pub fn proposal_core_slot(id: U256) -> U256 {
    let base = namespaced_base_slot(GOVERNOR_STORAGE_NAMESPACE);
    mapping_slot(id, base + U256::from(PROPOSALS_MAPPING_OFFSET))
}

/// Transaction hash the timelock keys its queue by.
pub fn timelock_transaction_hash(
    target: Address,
    value: U256,
    signature: &str,
    calldata: &[u8],
    eta: U256,
) -> B256 {
    keccak256(
        (target, value, signature.to_string(), calldata.to_vec(), eta).abi_encode_params(),
    )
}

/// Computes the storage overrides faking a proposal's lifecycle stage for a
/// governor/timelock pair.
#[derive(Debug, Clone, Copy)]
pub struct StateOverrideCalculator {
    governor: Address,
    timelock: Address,
}

impl StateOverrideCalculator {
    /// Creates a calculator for a governor/timelock pair.
    pub fn new(governor: Address, timelock: Address) -> Self {
        Self { governor, timelock }
    }

    /// Overrides for a proposal that does not exist anywhere yet: fabricates
    /// the full proposal record as if it were simultaneously proposed, queued
    /// and ready.
    pub fn for_new(&self, proposal: &Proposal, eta: U256, quorum: U256) -> StateOverrideSet {
        let mut set = self.for_proposed(proposal, eta, quorum);
        let base = namespaced_base_slot(GOVERNOR_STORAGE_NAMESPACE);
        let record = proposal_core_slot(proposal.id);

        self.set_word(&mut set, base + U256::from(PROPOSAL_COUNT_OFFSET), B256::from(proposal.id));
        self.set_word(
            &mut set,
            record + U256::from(PROPOSER_OFFSET),
            proposal.proposer.into_word(),
        );
        self.set_word(
            &mut set,
            record + U256::from(START_BLOCK_OFFSET),
            B256::from(U256::from(proposal.start_block)),
        );
        self.set_word(
            &mut set,
            record + U256::from(END_BLOCK_OFFSET),
            B256::from(U256::from(proposal.end_block)),
        );

        let actions = &proposal.actions;
        self.write_word_array(
            &mut set,
            record + U256::from(TARGETS_OFFSET),
            actions.targets.iter().map(|t| t.into_word()),
        );
        self.write_word_array(
            &mut set,
            record + U256::from(VALUES_OFFSET),
            actions.values.iter().map(|v| B256::from(*v)),
        );
        self.write_bytes_array(
            &mut set,
            record + U256::from(SIGNATURES_OFFSET),
            actions.signatures.iter().map(|s| s.as_bytes()),
        );
        self.write_bytes_array(
            &mut set,
            record + U256::from(CALLDATAS_OFFSET),
            actions.calldatas.iter().map(|c| c.as_ref()),
        );

        set
    }

    /// Overrides for a proposal that exists on-chain but has not executed:
    /// only eta, the canceled/executed flags and the vote tallies are faked;
    /// the on-chain action fields stay untouched.
    pub fn for_proposed(&self, proposal: &Proposal, eta: U256, quorum: U256) -> StateOverrideSet {
        let mut set = StateOverrideSet::default();
        let record = proposal_core_slot(proposal.id);

        self.set_word(&mut set, record + U256::from(ETA_OFFSET), B256::from(eta));
        self.set_word(&mut set, record + U256::from(FOR_VOTES_OFFSET), B256::from(quorum));
        self.set_word(&mut set, record + U256::from(AGAINST_VOTES_OFFSET), B256::ZERO);
        self.set_word(&mut set, record + U256::from(ABSTAIN_VOTES_OFFSET), B256::ZERO);
        // Neither canceled nor executed.
        self.set_word(&mut set, record + U256::from(FLAGS_OFFSET), B256::ZERO);

        for action in proposal.actions.iter() {
            let hash = timelock_transaction_hash(
                action.target,
                action.value,
                action.signature,
                action.calldata,
                eta,
            );
            let slot = mapping_slot(U256::from_be_bytes(hash.0), QUEUED_TRANSACTIONS_SLOT);
            set.set_slot(self.timelock, B256::from(slot), B256::from(U256::from(1)));
        }

        set
    }

    /// Overrides for a historical replay: none.
    pub fn for_executed(&self) -> StateOverrideSet {
        StateOverrideSet::default()
    }

    fn set_word(&self, set: &mut StateOverrideSet, slot: U256, value: B256) {
        set.set_slot(self.governor, B256::from(slot), value);
    }

    /// Writes a dynamic array of single-word elements: length at the field
    /// slot, elements at consecutive slots in the data region.
    fn write_word_array(
        &self,
        set: &mut StateOverrideSet,
        slot: U256,
        words: impl ExactSizeIterator<Item = B256>,
    ) {
        self.set_word(set, slot, B256::from(U256::from(words.len())));
        let data = data_slot(slot);
        for (i, word) in words.enumerate() {
            self.set_word(set, data + U256::from(i as u64), word);
        }
    }

    /// Writes a dynamic array of `bytes`/`string` elements: length at the
    /// field slot, each element laid out as its own bytes value rooted at a
    /// consecutive slot in the data region.
    fn write_bytes_array<'a>(
        &self,
        set: &mut StateOverrideSet,
        slot: U256,
        items: impl ExactSizeIterator<Item = &'a [u8]>,
    ) {
        self.set_word(set, slot, B256::from(U256::from(items.len())));
        let data = data_slot(slot);
        for (i, item) in items.enumerate() {
            self.write_bytes(set, data + U256::from(i as u64), item);
        }
    }

    /// Writes one `bytes`/`string` value using Solidity's short/long storage
    /// forms.
    fn write_bytes(&self, set: &mut StateOverrideSet, slot: U256, data: &[u8]) {
        if data.len() < 32 {
            // Short form: data left-aligned in the slot word, `length * 2` in
            // the lowest byte.
            let mut word = [0u8; 32];
            word[..data.len()].copy_from_slice(data);
            word[31] = (data.len() * 2) as u8;
            self.set_word(set, slot, B256::from(word));
        } else {
            // Long form: `length * 2 + 1` in the slot word, data in 32-byte
            // chunks starting at the value's data region.
            self.set_word(set, slot, B256::from(U256::from(data.len() * 2 + 1)));
            let region = data_slot(slot);
            for (i, chunk) in data.chunks(32).enumerate() {
                let mut word = [0u8; 32];
                word[..chunk.len()].copy_from_slice(chunk);
                self.set_word(set, region + U256::from(i as u64), B256::from(word));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProposalActions;
    use alloy::primitives::{Bytes, address, b256};
    use std::collections::HashSet;

    fn calculator() -> StateOverrideCalculator {
        StateOverrideCalculator::new(
            address!("0x408ED6354d4973f66138C91495F2f2FCbd8724C3"),
            address!("0x1a9C8182C09F50C8318d769245beA52c32BE35BC"),
        )
    }

    fn proposal(actions: ProposalActions) -> Proposal {
        Proposal::new(
            U256::from(42),
            address!("0x0000000000000000000000000000000000000123"),
            actions,
            100,
            200,
            "test".into(),
        )
        .unwrap()
    }

    #[test]
    fn known_namespace_vector() {
        // Worked example from ERC-7201.
        assert_eq!(
            namespaced_base_slot("example.main"),
            U256::from_be_bytes(
                b256!("0x183a6125c38840424c4a85fa12bab2ab606c4b6d0e7cc73c0c06ba5300eab500").0
            )
        );
    }

    #[test]
    fn base_slot_is_page_aligned() {
        let slot = namespaced_base_slot(GOVERNOR_STORAGE_NAMESPACE);
        assert_eq!(slot.to_be_bytes::<32>()[31], 0);
    }

    #[test]
    fn core_slots_are_collision_free() {
        let mut ids = HashSet::with_capacity(10_000);
        while ids.len() < 10_000 {
            ids.insert(U256::from(rand::random::<u128>()));
        }
        let slots: HashSet<_> = ids.iter().map(|id| proposal_core_slot(*id)).collect();
        assert_eq!(slots.len(), ids.len());
    }

    #[test]
    fn core_slot_is_deterministic() {
        assert_eq!(proposal_core_slot(U256::from(7)), proposal_core_slot(U256::from(7)));
    }

    #[test]
    fn proposed_overrides_queue_each_action() {
        let actions = ProposalActions::new(
            vec![
                address!("0x00000000000000000000000000000000000000a1"),
                address!("0x00000000000000000000000000000000000000a2"),
            ],
            vec![U256::ZERO, U256::from(5)],
            vec!["setPendingAdmin(address)".into(), String::new()],
            vec![Bytes::from(vec![0x11; 32]), Bytes::new()],
        )
        .unwrap();
        let proposal = proposal(actions);
        let calc = calculator();

        let set = calc.for_proposed(&proposal, U256::from(1_700_000_000), U256::from(400_000));

        // 5 governor words + 2 timelock queue flags.
        assert_eq!(set.slot_count(), 7);
        let timelock_overrides = &set.0[&address!("0x1a9C8182C09F50C8318d769245beA52c32BE35BC")];
        assert_eq!(timelock_overrides.storage.len(), 2);
        assert!(
            timelock_overrides
                .storage
                .values()
                .all(|v| *v == B256::from(U256::from(1)))
        );
    }

    #[test]
    fn queue_hash_depends_on_eta() {
        let target = address!("0x00000000000000000000000000000000000000a1");
        let a = timelock_transaction_hash(target, U256::ZERO, "sig()", &[], U256::from(1));
        let b = timelock_transaction_hash(target, U256::ZERO, "sig()", &[], U256::from(2));
        assert_ne!(a, b);
    }

    #[test]
    fn new_overrides_fabricate_the_record() {
        let actions = ProposalActions::new(
            vec![address!("0x00000000000000000000000000000000000000a1")],
            vec![U256::from(1)],
            vec!["transfer(address,uint256)".into()],
            vec![Bytes::from(vec![0x22; 64])],
        )
        .unwrap();
        let proposal = proposal(actions);
        let calc = calculator();

        let set = calc.for_new(&proposal, U256::from(1_700_000_000), U256::from(400_000));
        let governor = &set.0[&address!("0x408ED6354d4973f66138C91495F2f2FCbd8724C3")];

        let record = proposal_core_slot(proposal.id);
        assert_eq!(
            governor.storage[&B256::from(record + U256::from(PROPOSER_OFFSET))],
            proposal.proposer.into_word()
        );

        // Array lengths land at the field slots.
        let targets_slot = record + U256::from(TARGETS_OFFSET);
        assert_eq!(
            governor.storage[&B256::from(targets_slot)],
            B256::from(U256::from(1))
        );

        // The 64-byte calldata element uses the long form: header word holds
        // `len * 2 + 1`.
        let calldatas_slot = record + U256::from(CALLDATAS_OFFSET);
        let element_slot = data_slot(calldatas_slot);
        assert_eq!(
            governor.storage[&B256::from(element_slot)],
            B256::from(U256::from(64 * 2 + 1))
        );
        let chunk_region = data_slot(element_slot);
        assert_eq!(
            governor.storage[&B256::from(chunk_region)],
            B256::from([0x22; 32])
        );
        assert_eq!(
            governor.storage[&B256::from(chunk_region + U256::from(1))],
            B256::from([0x22; 32])
        );
    }

    #[test]
    fn short_strings_are_stored_in_place() {
        let actions = ProposalActions::new(
            vec![address!("0x00000000000000000000000000000000000000a1")],
            vec![U256::ZERO],
            vec!["f()".into()],
            vec![Bytes::new()],
        )
        .unwrap();
        let proposal = proposal(actions);
        let set = calculator().for_new(&proposal, U256::ZERO, U256::ZERO);
        let governor = &set.0[&address!("0x408ED6354d4973f66138C91495F2f2FCbd8724C3")];

        let signatures_slot = proposal_core_slot(proposal.id) + U256::from(SIGNATURES_OFFSET);
        let element = governor.storage[&B256::from(data_slot(signatures_slot))];
        // "f()" left-aligned, length * 2 in the low byte.
        assert_eq!(&element.0[..3], b"f()");
        assert_eq!(element.0[31], 6);
    }

    #[test]
    fn executed_produces_no_overrides() {
        assert!(calculator().for_executed().is_empty());
    }
}
