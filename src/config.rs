//! Sentinel configuration.

use crate::simulator::backoff::RetryPolicy;
use alloy::primitives::{Address, ChainId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

/// Simulation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the backend API.
    pub url: Url,
    /// Access key sent with every request.
    #[serde(skip_serializing)]
    pub access_key: String,
    /// Chains the backend can simulate; bridged replays to any other chain
    /// are skipped.
    #[serde(default)]
    pub supported_networks: BTreeSet<ChainId>,
    /// Backoff policy for rate-limited requests.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl BackendConfig {
    /// Creates a backend config with the default retry policy and no
    /// supported networks.
    pub fn new(url: Url, access_key: impl Into<String>) -> Self {
        Self {
            url,
            access_key: access_key.into(),
            supported_networks: BTreeSet::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// Sets the chains the backend can simulate.
    pub fn with_supported_networks(
        mut self,
        networks: impl IntoIterator<Item = ChainId>,
    ) -> Self {
        self.supported_networks = networks.into_iter().collect();
        self
    }

    /// Sets the backoff policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Whether the backend can simulate a chain.
    pub fn supports(&self, chain_id: ChainId) -> bool {
        self.supported_networks.contains(&chain_id)
    }
}

/// Sentinel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Chain the governor lives on.
    pub chain_id: ChainId,
    /// The governor contract tracking proposal lifecycle.
    pub governor: Address,
    /// The timelock holding queued transactions.
    pub timelock: Address,
    /// Simulation backend configuration.
    pub backend: BackendConfig,
    /// Addresses exempt from bytecode safety classification.
    #[serde(default)]
    pub trusted: BTreeSet<Address>,
}

impl SentinelConfig {
    /// Creates a config for a governor/timelock pair.
    pub fn new(chain_id: ChainId, governor: Address, timelock: Address, backend: BackendConfig) -> Self {
        Self { chain_id, governor, timelock, backend, trusted: BTreeSet::new() }
    }

    /// Adds addresses exempt from bytecode safety classification.
    pub fn with_trusted(mut self, trusted: impl IntoIterator<Item = Address>) -> Self {
        self.trusted.extend(trusted);
        self
    }
}
