//! Pluggable read-only checks over a proposal simulation.
//!
//! A check is a named analysis over the orchestrator's output; the framework
//! runs an explicitly ordered registry sequentially, mirrors every check over
//! the bridged destination replays, and aggregates the results keyed by check
//! name. A check never fails past the framework boundary: collaborator
//! failures become per-target warnings, failed replays become per-chain
//! error entries.

use crate::{
    bridges::DestinationChain,
    types::{BridgedSimulation, Proposal, ProposalSimulation, SimulationResult},
};
use alloy::{
    primitives::{Address, ChainId, U256},
    providers::DynProvider,
};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    sync::Arc,
};
use tracing::debug;

mod compile;
pub use compile::CompileCheck;

mod events;
pub use events::EventsCheck;

mod selfdestruct;
pub use selfdestruct::SelfdestructCheck;

mod state_changes;
pub use state_changes::StateChangesCheck;

mod static_analysis;
pub use static_analysis::StaticAnalysisCheck;

mod targets;
pub use targets::TargetsVerifiedCheck;

mod value;
pub use value::ValueRequiredCheck;

/// Contract metadata resolved through the injected resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractMeta {
    /// Verified contract name.
    pub name: String,
}

/// Capability resolving contract metadata, with caching as the
/// implementation's concern.
#[async_trait]
pub trait ContractResolver: Send + Sync {
    /// Resolves metadata for an address; `None` means the contract is not
    /// verified.
    async fn resolve(
        &self,
        chain_id: ChainId,
        address: Address,
    ) -> eyre::Result<Option<ContractMeta>>;
}

/// Outcome of an external compiler or analyzer invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolOutcome {
    /// Whether the tool ran to completion without findings of its own.
    pub success: bool,
    /// Tool warnings, one per line.
    pub warnings: Vec<String>,
}

/// Capability compiling a contract's verified source.
#[async_trait]
pub trait ContractCompiler: Send + Sync {
    /// Compiles the contract at `address`, leaving artifacts for downstream
    /// tools.
    async fn run(&self, chain_id: ChainId, address: Address) -> eyre::Result<ToolOutcome>;
}

/// Capability running a static analyzer over a contract's compiled artifacts.
#[async_trait]
pub trait StaticAnalyzer: Send + Sync {
    /// Analyzes the contract at `address`.
    async fn run(&self, chain_id: ChainId, address: Address) -> eyre::Result<ToolOutcome>;
}

/// Capabilities shared by every check invocation.
#[derive(Clone)]
pub struct CheckDependencies {
    /// Contract metadata resolver.
    pub resolver: Arc<dyn ContractResolver>,
    /// External compiler collaborator.
    pub compiler: Arc<dyn ContractCompiler>,
    /// External static-analyzer collaborator.
    pub analyzer: Arc<dyn StaticAnalyzer>,
    /// Read-only providers keyed by chain id.
    pub providers: HashMap<ChainId, DynProvider>,
    /// Addresses exempt from bytecode safety classification.
    pub trusted: BTreeSet<Address>,
}

impl CheckDependencies {
    /// Provider for a chain, if configured.
    pub fn provider(&self, chain_id: ChainId) -> Option<&DynProvider> {
        self.providers.get(&chain_id)
    }
}

impl fmt::Debug for CheckDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckDependencies")
            .field("providers", &self.providers.keys())
            .field("trusted", &self.trusted)
            .finish_non_exhaustive()
    }
}

/// Input to one check invocation.
#[derive(Debug, Clone, Copy)]
pub struct CheckInput<'a> {
    /// Chain the simulation ran on.
    pub chain_id: ChainId,
    /// The proposal under analysis.
    pub proposal: &'a Proposal,
    /// The simulation result being checked.
    pub result: &'a SimulationResult,
    /// Injected capabilities.
    pub deps: &'a CheckDependencies,
}

impl CheckInput<'_> {
    /// Unique proposal targets, in first-appearance order.
    pub fn unique_targets(&self) -> Vec<Address> {
        let mut seen = BTreeSet::new();
        self.proposal
            .actions
            .targets
            .iter()
            .copied()
            .filter(|target| seen.insert(*target))
            .collect()
    }

    /// Unique touched addresses, in first-appearance order.
    pub fn touched_addresses(&self) -> Vec<Address> {
        let mut seen = BTreeSet::new();
        self.result.addresses.iter().copied().filter(|address| seen.insert(*address)).collect()
    }
}

/// Findings of one check invocation; fresh per call, never mutated after
/// return.
#[derive(Debug, Clone, Default)]
pub struct CheckResult {
    /// Informational findings.
    pub info: Vec<String>,
    /// Findings that warrant review but do not fail the proposal.
    pub warnings: Vec<String>,
    /// Findings that fail the proposal.
    pub errors: Vec<String>,
    /// Per-destination findings mirroring the bridged replays.
    pub bridged: Vec<ChainCheckResult>,
}

impl CheckResult {
    /// Adds an informational finding.
    pub fn info(&mut self, message: impl Into<String>) {
        self.info.push(message.into());
    }

    /// Adds a warning finding.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Adds an error finding.
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Whether this result or any per-chain sub-result carries errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty() || self.bridged.iter().any(|chain| chain.result.has_errors())
    }

    /// Whether this result or any per-chain sub-result carries warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty() || self.bridged.iter().any(|chain| chain.result.has_warnings())
    }
}

/// Findings for one bridged destination.
#[derive(Debug, Clone)]
pub struct ChainCheckResult {
    /// Destination chain.
    pub chain: DestinationChain,
    /// Findings for the destination replay.
    pub result: CheckResult,
}

/// A named, read-only analysis over a proposal simulation.
#[async_trait]
pub trait ProposalCheck: Send + Sync {
    /// Stable name the aggregated results are keyed by.
    fn name(&self) -> &'static str;

    /// Runs the check. Must not fail: collaborator failures are converted
    /// into warning findings.
    async fn run(&self, input: &CheckInput<'_>) -> CheckResult;
}

/// The standard check registry, in execution order.
///
/// Ordering matters for exactly one pair: [`CompileCheck`] must run before
/// [`StaticAnalysisCheck`], which consumes the artifacts compilation leaves
/// behind.
pub fn registry() -> Vec<Box<dyn ProposalCheck>> {
    vec![
        Box::new(ValueRequiredCheck),
        Box::new(StateChangesCheck),
        Box::new(EventsCheck),
        Box::new(TargetsVerifiedCheck),
        Box::new(SelfdestructCheck),
        Box::new(CompileCheck),
        Box::new(StaticAnalysisCheck),
    ]
}

/// Overall proposal verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProposalStatus {
    /// No check reported warnings or errors.
    Passed,
    /// At least one check reported a warning, none reported errors.
    Warned,
    /// At least one check reported an error.
    Failed,
}

/// Aggregated findings for a full proposal analysis.
#[derive(Debug, Clone)]
pub struct ProposalReport {
    /// Overall verdict.
    pub status: ProposalStatus,
    /// Findings keyed by check name.
    pub results: BTreeMap<String, CheckResult>,
}

/// Runs every check in order over the simulation, mirroring each over the
/// bridged destination replays, and aggregates the verdict.
///
/// Checks run sequentially by design to respect third-party rate limits.
pub async fn run_checks(
    checks: &[Box<dyn ProposalCheck>],
    chain_id: ChainId,
    simulation: &ProposalSimulation,
    deps: &CheckDependencies,
) -> ProposalReport {
    let mut results = BTreeMap::new();

    for check in checks {
        let input = CheckInput {
            chain_id,
            proposal: &simulation.proposal,
            result: &simulation.result,
            deps,
        };
        let mut result = check.run(&input).await;

        for bridged in &simulation.bridged {
            result.bridged.push(bridged_check(check.as_ref(), bridged, deps).await);
        }

        debug!(
            check = check.name(),
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "check finished"
        );
        results.insert(check.name().to_string(), result);
    }

    let status = if results.values().any(CheckResult::has_errors) {
        ProposalStatus::Failed
    } else if results.values().any(CheckResult::has_warnings) {
        ProposalStatus::Warned
    } else {
        ProposalStatus::Passed
    };

    ProposalReport { status, results }
}

/// Runs one check over one bridged destination.
///
/// Skipped destinations yield an informational entry, failed replays an error
/// entry; only a successful two-step replay actually re-runs the check
/// against the destination's execution step.
async fn bridged_check(
    check: &dyn ProposalCheck,
    bridged: &BridgedSimulation,
    deps: &CheckDependencies,
) -> ChainCheckResult {
    let mut result = CheckResult::default();

    if let Some(reason) = &bridged.skipped {
        result.info(reason.clone());
        return ChainCheckResult { chain: bridged.chain, result };
    }
    if !bridged.success {
        result.error(
            bridged.error.clone().unwrap_or_else(|| "bridged replay failed".into()),
        );
        return ChainCheckResult { chain: bridged.chain, result };
    }
    let (Some(actions), Some(execution)) = (&bridged.actions, bridged.execution()) else {
        result.error("bridged replay produced no execution result");
        return ChainCheckResult { chain: bridged.chain, result };
    };

    let proposal = Proposal {
        id: U256::ZERO,
        proposer: Address::ZERO,
        actions: actions.clone(),
        start_block: 0,
        end_block: 0,
        description: format!("bridged batch on {}", bridged.chain),
    };
    let input = CheckInput {
        chain_id: bridged.chain.chain_id(),
        proposal: &proposal,
        result: execution,
        deps,
    };
    ChainCheckResult { chain: bridged.chain, result: check.run(&input).await }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Resolver that knows no contracts.
    #[derive(Debug)]
    pub(crate) struct NullResolver;

    #[async_trait]
    impl ContractResolver for NullResolver {
        async fn resolve(
            &self,
            _chain_id: ChainId,
            _address: Address,
        ) -> eyre::Result<Option<ContractMeta>> {
            Ok(None)
        }
    }

    /// Tool that always succeeds without warnings.
    #[derive(Debug)]
    pub(crate) struct NullTool;

    #[async_trait]
    impl ContractCompiler for NullTool {
        async fn run(&self, _chain_id: ChainId, _address: Address) -> eyre::Result<ToolOutcome> {
            Ok(ToolOutcome { success: true, warnings: Vec::new() })
        }
    }

    #[async_trait]
    impl StaticAnalyzer for NullTool {
        async fn run(&self, _chain_id: ChainId, _address: Address) -> eyre::Result<ToolOutcome> {
            Ok(ToolOutcome { success: true, warnings: Vec::new() })
        }
    }

    pub(crate) fn dependencies() -> CheckDependencies {
        CheckDependencies {
            resolver: Arc::new(NullResolver),
            compiler: Arc::new(NullTool),
            analyzer: Arc::new(NullTool),
            providers: HashMap::new(),
            trusted: BTreeSet::new(),
        }
    }

    pub(crate) fn proposal() -> Proposal {
        use crate::types::ProposalActions;
        Proposal {
            id: U256::from(1),
            proposer: Address::ZERO,
            actions: ProposalActions::default(),
            start_block: 0,
            end_block: 0,
            description: "test".into(),
        }
    }
}
