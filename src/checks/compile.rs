use super::{CheckInput, CheckResult, ProposalCheck};
use async_trait::async_trait;

/// Compiles each unique target's verified source through the injected
/// compiler collaborator.
///
/// Invocation failures become per-target warnings so one bad contract does
/// not abort the whole check. Targets run sequentially: the toolchain writes
/// shared on-disk artifacts.
#[derive(Debug, Clone, Copy)]
pub struct CompileCheck;

#[async_trait]
impl ProposalCheck for CompileCheck {
    fn name(&self) -> &'static str {
        "compile"
    }

    async fn run(&self, input: &CheckInput<'_>) -> CheckResult {
        let mut result = CheckResult::default();

        for target in input.unique_targets() {
            match input.deps.compiler.run(input.chain_id, target).await {
                Ok(outcome) if outcome.success => {
                    result.info(format!("{target}: compiled"));
                    result.warnings.extend(
                        outcome.warnings.into_iter().map(|warning| format!("{target}: {warning}")),
                    );
                }
                Ok(outcome) => {
                    result.warn(format!("{target}: compilation failed"));
                    result.warnings.extend(
                        outcome.warnings.into_iter().map(|warning| format!("{target}: {warning}")),
                    );
                }
                Err(err) => result.warn(format!("{target}: compiler invocation failed: {err}")),
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        checks::{ContractCompiler, ToolOutcome, test_support},
        types::{ProposalActions, SimulationResult},
    };
    use alloy::primitives::{Address, Bytes, ChainId, U256, address};
    use std::sync::Arc;

    #[derive(Debug)]
    struct FailingCompiler;

    #[async_trait]
    impl ContractCompiler for FailingCompiler {
        async fn run(&self, _chain_id: ChainId, _address: Address) -> eyre::Result<ToolOutcome> {
            eyre::bail!("solc exited with status 1")
        }
    }

    #[tokio::test]
    async fn invocation_failure_is_a_warning_not_an_abort() {
        let mut deps = test_support::dependencies();
        deps.compiler = Arc::new(FailingCompiler);

        let mut proposal = test_support::proposal();
        proposal.actions = ProposalActions::new(
            vec![address!("0x00000000000000000000000000000000000000a1")],
            vec![U256::ZERO],
            vec![String::new()],
            vec![Bytes::new()],
        )
        .unwrap();
        let result = SimulationResult { success: true, ..Default::default() };

        let out = CompileCheck
            .run(&CheckInput { chain_id: 1, proposal: &proposal, result: &result, deps: &deps })
            .await;

        assert!(out.errors.is_empty());
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].contains("solc exited"));
    }
}
