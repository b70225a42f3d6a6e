use super::{CheckInput, CheckResult, ProposalCheck};
use alloy::primitives::{U256, utils::format_ether};
use async_trait::async_trait;

/// Reports the native value the executor must be able to forward.
#[derive(Debug, Clone, Copy)]
pub struct ValueRequiredCheck;

#[async_trait]
impl ProposalCheck for ValueRequiredCheck {
    fn name(&self) -> &'static str {
        "value-required"
    }

    async fn run(&self, input: &CheckInput<'_>) -> CheckResult {
        let mut result = CheckResult::default();
        let total = input.proposal.total_value();

        if total.is_zero() {
            result.info("no native value is required to execute the proposal");
        } else {
            let actions =
                input.proposal.actions.values.iter().filter(|value| **value > U256::ZERO).count();
            result.info(format!(
                "execution requires {} ETH ({total} wei) across {actions} action(s)",
                format_ether(total)
            ));
        }
        result
    }
}
