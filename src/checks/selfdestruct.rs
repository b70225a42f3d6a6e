use super::{CheckInput, CheckResult, ProposalCheck};
use crate::scanner::{self, CodeClassification};
use alloy::primitives::Address;
use async_trait::async_trait;
use futures_util::future::join_all;
use std::collections::BTreeSet;

/// Classifies every touched contract's bytecode, failing the proposal when a
/// reachable `SELFDESTRUCT` is found.
///
/// Per-address code lookups run concurrently.
#[derive(Debug, Clone, Copy)]
pub struct SelfdestructCheck;

#[async_trait]
impl ProposalCheck for SelfdestructCheck {
    fn name(&self) -> &'static str {
        "no-selfdestruct"
    }

    async fn run(&self, input: &CheckInput<'_>) -> CheckResult {
        let mut result = CheckResult::default();

        let Some(provider) = input.deps.provider(input.chain_id) else {
            result.info(format!("no provider for chain {}; bytecode not inspected", input.chain_id));
            return result;
        };

        // Targets first, then the remaining touched addresses.
        let mut seen = BTreeSet::new();
        let addresses: Vec<Address> = input
            .unique_targets()
            .into_iter()
            .chain(input.touched_addresses())
            .filter(|address| seen.insert(*address))
            .collect();

        let classifications = join_all(
            addresses
                .iter()
                .map(|address| scanner::classify_address(provider, *address, &input.deps.trusted)),
        )
        .await;

        let mut safe = 0usize;
        for (address, classification) in addresses.iter().zip(classifications) {
            match classification {
                Ok(CodeClassification::Selfdestruct) => {
                    result.error(format!("{address}: code contains a reachable SELFDESTRUCT"));
                }
                Ok(CodeClassification::Delegatecall) => {
                    result.warn(format!("{address}: code contains a reachable DELEGATECALL"));
                }
                Ok(CodeClassification::Empty) => {
                    result.warn(format!(
                        "{address}: no code and no transactions; code may be deployed here later"
                    ));
                }
                Ok(
                    CodeClassification::Safe
                    | CodeClassification::Trusted
                    | CodeClassification::Eoa,
                ) => safe += 1,
                Err(err) => result.warn(format!("{address}: code lookup failed: {err}")),
            }
        }

        if !addresses.is_empty() {
            result.info(format!("{safe}/{} touched addresses look safe", addresses.len()));
        }
        result
    }
}
