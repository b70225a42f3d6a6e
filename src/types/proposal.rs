//! Governance proposal value objects.

use crate::error::ValidationError;
use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// The parallel action sequences of a proposal.
///
/// Index `i` across all four sequences describes one call: `targets[i]` is
/// invoked with `values[i]` wei and the calldata derived from `signatures[i]`
/// and `calldatas[i]`. An empty signature means `calldatas[i]` is the full
/// input of a plain call or transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalActions {
    /// Call targets.
    pub targets: Vec<Address>,
    /// Native-currency amounts sent with each call.
    pub values: Vec<U256>,
    /// Function signatures, or empty strings for plain calls.
    pub signatures: Vec<String>,
    /// Encoded arguments (or full calldata when the signature is empty).
    pub calldatas: Vec<Bytes>,
}

impl ProposalActions {
    /// Creates a new action set, enforcing the equal-length invariant.
    pub fn new(
        targets: Vec<Address>,
        values: Vec<U256>,
        signatures: Vec<String>,
        calldatas: Vec<Bytes>,
    ) -> Result<Self, ValidationError> {
        let actions = Self { targets, values, signatures, calldatas };
        actions.validate()?;
        Ok(actions)
    }

    /// Checks that all four parallel sequences have equal length.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let len = self.targets.len();
        if self.values.len() != len || self.signatures.len() != len || self.calldatas.len() != len {
            return Err(ValidationError::LengthMismatch {
                targets: self.targets.len(),
                values: self.values.len(),
                signatures: self.signatures.len(),
                calldatas: self.calldatas.len(),
            });
        }
        Ok(())
    }

    /// Number of actions.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the proposal performs no calls at all.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Total native currency the executor must be able to forward.
    pub fn total_value(&self) -> U256 {
        self.values.iter().fold(U256::ZERO, |acc, v| acc.saturating_add(*v))
    }

    /// Iterates over the per-index action tuples.
    pub fn iter(&self) -> impl Iterator<Item = ProposalAction<'_>> {
        (0..self.len()).map(|i| ProposalAction {
            target: self.targets[i],
            value: self.values[i],
            signature: &self.signatures[i],
            calldata: &self.calldatas[i],
        })
    }
}

/// One call of a proposal, borrowed from its [`ProposalActions`].
#[derive(Debug, Clone, Copy)]
pub struct ProposalAction<'a> {
    /// Call target.
    pub target: Address,
    /// Native-currency amount sent with the call.
    pub value: U256,
    /// Function signature, or empty for a plain call.
    pub signature: &'a str,
    /// Encoded arguments.
    pub calldata: &'a Bytes,
}

/// A governance proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposal identifier assigned by the governor.
    pub id: U256,
    /// Account that submitted the proposal.
    pub proposer: Address,
    /// The calls the proposal performs when executed.
    pub actions: ProposalActions,
    /// First block at which voting is open.
    pub start_block: u64,
    /// Last block at which voting is open.
    pub end_block: u64,
    /// Free-text description.
    pub description: String,
}

impl Proposal {
    /// Creates a proposal, enforcing the action-length invariant.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: U256,
        proposer: Address,
        actions: ProposalActions,
        start_block: u64,
        end_block: u64,
        description: String,
    ) -> Result<Self, ValidationError> {
        actions.validate()?;
        Ok(Self { id, proposer, actions, start_block, end_block, description })
    }

    /// Total native currency required to execute every action.
    pub fn total_value(&self) -> U256 {
        self.actions.total_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn mismatched_lengths_rejected() {
        let err = ProposalActions::new(
            vec![address!("0x0000000000000000000000000000000000000001")],
            vec![U256::ZERO, U256::from(1)],
            vec![String::new()],
            vec![Bytes::new()],
        )
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::LengthMismatch { targets: 1, values: 2, signatures: 1, calldatas: 1 }
        );
    }

    #[test]
    fn total_value_saturates() {
        let actions = ProposalActions::new(
            vec![Address::ZERO, Address::ZERO],
            vec![U256::MAX, U256::from(5)],
            vec![String::new(), String::new()],
            vec![Bytes::new(), Bytes::new()],
        )
        .unwrap();
        assert_eq!(actions.total_value(), U256::MAX);
    }

    #[test]
    fn empty_proposal_is_valid() {
        let actions = ProposalActions::default();
        assert!(actions.validate().is_ok());
        assert!(actions.is_empty());
        assert_eq!(actions.total_value(), U256::ZERO);
    }
}
