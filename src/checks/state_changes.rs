use super::{CheckInput, CheckResult, ProposalCheck};
use crate::types::StateDiffEntry;
use alloy::primitives::Address;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Reports every storage slot the execution changes, grouped by contract.
///
/// Also the place a reverted simulation surfaces: a failed execution is
/// reported as an error finding carrying the revert reason.
#[derive(Debug, Clone, Copy)]
pub struct StateChangesCheck;

#[async_trait]
impl ProposalCheck for StateChangesCheck {
    fn name(&self) -> &'static str {
        "state-changes"
    }

    async fn run(&self, input: &CheckInput<'_>) -> CheckResult {
        let mut result = CheckResult::default();

        if !input.result.success {
            result.error(format!(
                "simulation reverted: {}",
                input.result.revert_reason.as_deref().unwrap_or("no revert reason")
            ));
            return result;
        }

        if input.result.state_diffs.is_empty() {
            result.warn("execution changes no on-chain state");
            return result;
        }

        let mut by_contract: BTreeMap<Address, Vec<&StateDiffEntry>> = BTreeMap::new();
        for diff in &input.result.state_diffs {
            by_contract.entry(diff.address).or_default().push(diff);
        }

        for (address, diffs) in by_contract {
            let label = input
                .result
                .contract_name(address)
                .map_or_else(|| address.to_string(), |name| format!("{name} ({address})"));
            result.info(format!("{label}: {} storage slot(s) changed", diffs.len()));
            for diff in diffs {
                result.info(format!("  {}: {} -> {}", diff.slot, diff.original, diff.dirty));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{checks::test_support, types::SimulationResult};
    use alloy::primitives::{B256, U256, address};

    #[tokio::test]
    async fn revert_becomes_an_error() {
        let deps = test_support::dependencies();
        let proposal = test_support::proposal();
        let result = SimulationResult {
            success: false,
            revert_reason: Some("Timelock::executeTransaction: Transaction hasn't been queued.".into()),
            ..Default::default()
        };

        let out = StateChangesCheck
            .run(&CheckInput { chain_id: 1, proposal: &proposal, result: &result, deps: &deps })
            .await;

        assert_eq!(out.errors.len(), 1);
        assert!(out.errors[0].contains("hasn't been queued"));
    }

    #[tokio::test]
    async fn no_changes_is_a_warning() {
        let deps = test_support::dependencies();
        let proposal = test_support::proposal();
        let result = SimulationResult { success: true, ..Default::default() };

        let out = StateChangesCheck
            .run(&CheckInput { chain_id: 1, proposal: &proposal, result: &result, deps: &deps })
            .await;

        assert_eq!(out.warnings.len(), 1);
        assert!(out.errors.is_empty());
    }

    #[tokio::test]
    async fn changes_are_grouped_by_contract() {
        let deps = test_support::dependencies();
        let proposal = test_support::proposal();
        let contract = address!("0x00000000000000000000000000000000000000c1");
        let result = SimulationResult {
            success: true,
            state_diffs: vec![
                StateDiffEntry {
                    address: contract,
                    slot: B256::ZERO,
                    original: B256::ZERO,
                    dirty: B256::from(U256::from(1)),
                },
                StateDiffEntry {
                    address: contract,
                    slot: B256::from(U256::from(2)),
                    original: B256::ZERO,
                    dirty: B256::from(U256::from(3)),
                },
            ],
            ..Default::default()
        };

        let out = StateChangesCheck
            .run(&CheckInput { chain_id: 1, proposal: &proposal, result: &result, deps: &deps })
            .await;

        assert!(out.info[0].contains("2 storage slot(s)"));
        assert_eq!(out.info.len(), 3);
    }
}
