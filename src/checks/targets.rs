use super::{CheckInput, CheckResult, ProposalCheck};
use async_trait::async_trait;
use futures_util::future::join_all;

/// Resolves each unique proposal target through the injected metadata
/// resolver; an unverified target is a warning.
///
/// Per-target lookups have no ordering dependency on each other and run
/// concurrently.
#[derive(Debug, Clone, Copy)]
pub struct TargetsVerifiedCheck;

#[async_trait]
impl ProposalCheck for TargetsVerifiedCheck {
    fn name(&self) -> &'static str {
        "targets-verified"
    }

    async fn run(&self, input: &CheckInput<'_>) -> CheckResult {
        let mut result = CheckResult::default();
        let targets = input.unique_targets();

        let lookups = join_all(
            targets.iter().map(|target| input.deps.resolver.resolve(input.chain_id, *target)),
        )
        .await;

        for (target, lookup) in targets.iter().zip(lookups) {
            match lookup {
                Ok(Some(meta)) => result.info(format!("{target}: verified as {}", meta.name)),
                Ok(None) => result.warn(format!("{target}: contract source is not verified")),
                Err(err) => result.warn(format!("{target}: metadata lookup failed: {err}")),
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        checks::{ContractMeta, ContractResolver, test_support},
        types::{ProposalActions, SimulationResult},
    };
    use alloy::primitives::{Address, Bytes, ChainId, U256, address};
    use std::sync::Arc;

    #[derive(Debug)]
    struct OneKnown;

    #[async_trait]
    impl ContractResolver for OneKnown {
        async fn resolve(
            &self,
            _chain_id: ChainId,
            address: Address,
        ) -> eyre::Result<Option<ContractMeta>> {
            if address == address!("0x00000000000000000000000000000000000000a1") {
                Ok(Some(ContractMeta { name: "Comptroller".into() }))
            } else {
                Ok(None)
            }
        }
    }

    #[tokio::test]
    async fn unverified_targets_warn() {
        let mut deps = test_support::dependencies();
        deps.resolver = Arc::new(OneKnown);

        let mut proposal = test_support::proposal();
        proposal.actions = ProposalActions::new(
            vec![
                address!("0x00000000000000000000000000000000000000a1"),
                address!("0x00000000000000000000000000000000000000a2"),
                // Duplicate targets resolve once.
                address!("0x00000000000000000000000000000000000000a1"),
            ],
            vec![U256::ZERO; 3],
            vec![String::new(); 3],
            vec![Bytes::new(); 3],
        )
        .unwrap();
        let result = SimulationResult { success: true, ..Default::default() };

        let out = TargetsVerifiedCheck
            .run(&CheckInput { chain_id: 1, proposal: &proposal, result: &result, deps: &deps })
            .await;

        assert_eq!(out.info.len(), 1);
        assert!(out.info[0].contains("Comptroller"));
        assert_eq!(out.warnings.len(), 1);
    }
}
