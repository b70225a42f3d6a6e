use super::{CheckInput, CheckResult, ProposalCheck};
use async_trait::async_trait;

/// Runs the injected static analyzer over each unique target.
///
/// Consumes the on-disk artifacts [`CompileCheck`](super::CompileCheck)
/// leaves behind, so the registry must order it after compilation. Invocation
/// failures become per-target warnings.
#[derive(Debug, Clone, Copy)]
pub struct StaticAnalysisCheck;

#[async_trait]
impl ProposalCheck for StaticAnalysisCheck {
    fn name(&self) -> &'static str {
        "static-analysis"
    }

    async fn run(&self, input: &CheckInput<'_>) -> CheckResult {
        let mut result = CheckResult::default();

        for target in input.unique_targets() {
            match input.deps.analyzer.run(input.chain_id, target).await {
                Ok(outcome) => {
                    if outcome.success && outcome.warnings.is_empty() {
                        result.info(format!("{target}: no findings"));
                    }
                    result.warnings.extend(
                        outcome.warnings.into_iter().map(|warning| format!("{target}: {warning}")),
                    );
                }
                Err(err) => result.warn(format!("{target}: analyzer invocation failed: {err}")),
            }
        }
        result
    }
}
