use super::{CheckInput, CheckResult, ProposalCheck};
use crate::types::EventLog;
use alloy::primitives::Address;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Lists the events execution emits, grouped by emitter.
#[derive(Debug, Clone, Copy)]
pub struct EventsCheck;

#[async_trait]
impl ProposalCheck for EventsCheck {
    fn name(&self) -> &'static str {
        "events"
    }

    async fn run(&self, input: &CheckInput<'_>) -> CheckResult {
        let mut result = CheckResult::default();

        if input.result.logs.is_empty() {
            result.warn("execution emits no events");
            return result;
        }

        let mut by_emitter: BTreeMap<Address, Vec<&EventLog>> = BTreeMap::new();
        for log in &input.result.logs {
            by_emitter.entry(log.address).or_default().push(log);
        }

        for (address, logs) in by_emitter {
            let label = input
                .result
                .contract_name(address)
                .map_or_else(|| address.to_string(), |name| format!("{name} ({address})"));
            for log in logs {
                let event = log
                    .name
                    .clone()
                    .or_else(|| log.topics.first().map(|topic| topic.to_string()))
                    .unwrap_or_else(|| "anonymous event".into());
                result.info(format!("{label}: {event}"));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{checks::test_support, types::SimulationResult};
    use alloy::primitives::{Bytes, address};

    #[tokio::test]
    async fn no_events_is_a_warning() {
        let deps = test_support::dependencies();
        let proposal = test_support::proposal();
        let result = SimulationResult { success: true, ..Default::default() };

        let out = EventsCheck
            .run(&CheckInput { chain_id: 1, proposal: &proposal, result: &result, deps: &deps })
            .await;

        assert_eq!(out.warnings.len(), 1);
    }

    #[tokio::test]
    async fn named_events_are_listed() {
        let deps = test_support::dependencies();
        let proposal = test_support::proposal();
        let result = SimulationResult {
            success: true,
            logs: vec![EventLog {
                address: address!("0x00000000000000000000000000000000000000c1"),
                topics: vec![],
                data: Bytes::new(),
                name: Some("NewAdmin".into()),
            }],
            ..Default::default()
        };

        let out = EventsCheck
            .run(&CheckInput { chain_id: 1, proposal: &proposal, result: &result, deps: &deps })
            .await;

        assert_eq!(out.info.len(), 1);
        assert!(out.info[0].contains("NewAdmin"));
        assert!(out.warnings.is_empty());
    }
}
