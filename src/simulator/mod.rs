//! Remote EVM simulation client.

use crate::{
    config::BackendConfig,
    error::SimulatorError,
    types::{AccountOverride, SimulationPayload, SimulationResult, StateOverrideSet},
};
use alloy::primitives::ChainId;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use tracing::debug;

pub(crate) mod api;
pub mod backoff;

use api::{
    BlockNumberResponse, BundleRequest, BundleResponse, EncodeStateEntry, EncodeStateRequest,
    EncodeStateResponse, SimulateRequest, SimulateResponse,
};

/// Capability interface over the remote simulation backend.
///
/// Implemented by [`SimulatorClient`]; checks and the orchestrator depend on
/// this trait so they can be exercised against in-memory fakes.
#[async_trait]
pub trait SimulationBackend: Send + Sync {
    /// Simulates a single transaction.
    async fn simulate(&self, payload: SimulationPayload) -> Result<SimulationResult, SimulatorError>;

    /// Simulates an ordered bundle; result `i` corresponds to request `i`,
    /// and later steps see the state produced by earlier ones.
    async fn simulate_bundle(
        &self,
        payloads: Vec<SimulationPayload>,
    ) -> Result<Vec<SimulationResult>, SimulatorError>;

    /// Latest block the backend has indexed for a chain.
    async fn latest_block(&self, chain_id: ChainId) -> Result<u64, SimulatorError>;

    /// Normalizes a raw override map into the slot-indexed form the backend
    /// expects attached to payloads.
    async fn encode_state_overrides(
        &self,
        chain_id: ChainId,
        overrides: StateOverrideSet,
    ) -> Result<StateOverrideSet, SimulatorError>;
}

/// HTTP client for the simulation backend.
///
/// All requests share the bounded-backoff retry policy from the backend
/// config; only rate-limit responses are retried.
#[derive(Debug, Clone)]
pub struct SimulatorClient {
    http: reqwest::Client,
    config: BackendConfig,
}

impl SimulatorClient {
    /// Creates a new client for the configured backend.
    pub fn new(config: BackendConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.url.as_str().trim_end_matches('/'), path)
    }

    async fn post<Req: Serialize + Sync, Resp: DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp, SimulatorError> {
        backoff::retry_rate_limited(&self.config.retry, || self.post_once(path, body)).await
    }

    async fn post_once<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp, SimulatorError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .header("X-Access-Key", &self.config.access_key)
            .json(body)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn get<Resp: DeserializeOwned>(&self, path: &str) -> Result<Resp, SimulatorError> {
        backoff::retry_rate_limited(&self.config.retry, || async {
            let response = self
                .http
                .get(self.endpoint(path))
                .header("X-Access-Key", &self.config.access_key)
                .send()
                .await?;
            Self::parse(response).await
        })
        .await
    }

    async fn parse<Resp: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<Resp, SimulatorError> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SimulatorError::RateLimited { attempts: 1 });
        }
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(512);
            return Err(SimulatorError::Unavailable { status: status.as_u16(), body });
        }
        response
            .json()
            .await
            .map_err(|err| SimulatorError::UnexpectedResponse(err.to_string()))
    }
}

#[async_trait]
impl SimulationBackend for SimulatorClient {
    async fn simulate(&self, payload: SimulationPayload) -> Result<SimulationResult, SimulatorError> {
        debug!(
            chain_id = payload.chain_id,
            block_number = payload.block_number,
            to = %payload.to,
            "simulating transaction"
        );
        let response: SimulateResponse =
            self.post("simulate", &SimulateRequest::from(payload)).await?;
        response.into_result()
    }

    async fn simulate_bundle(
        &self,
        payloads: Vec<SimulationPayload>,
    ) -> Result<Vec<SimulationResult>, SimulatorError> {
        let expected = payloads.len();
        debug!(steps = expected, "simulating bundle");
        let request =
            BundleRequest { simulations: payloads.into_iter().map(SimulateRequest::from).collect() };
        let response: BundleResponse = self.post("simulate-bundle", &request).await?;
        if response.simulation_results.len() != expected {
            return Err(SimulatorError::BundleLengthMismatch {
                expected,
                got: response.simulation_results.len(),
            });
        }
        response.simulation_results.into_iter().map(SimulateResponse::into_result).collect()
    }

    async fn latest_block(&self, chain_id: ChainId) -> Result<u64, SimulatorError> {
        let response: BlockNumberResponse =
            self.get(&format!("network/{chain_id}/block-number")).await?;
        Ok(response.block_number)
    }

    async fn encode_state_overrides(
        &self,
        chain_id: ChainId,
        overrides: StateOverrideSet,
    ) -> Result<StateOverrideSet, SimulatorError> {
        // Balances are payload-level, not storage; only slots go through the
        // remote encoder.
        let balances: BTreeMap<_, _> = overrides
            .0
            .iter()
            .filter_map(|(address, account)| account.balance.map(|b| (*address, b)))
            .collect();

        let request = EncodeStateRequest {
            network_id: chain_id.to_string(),
            state_overrides: overrides
                .0
                .into_iter()
                .filter(|(_, account)| !account.storage.is_empty())
                .map(|(address, account)| (address, EncodeStateEntry { value: account.storage }))
                .collect(),
        };
        let response: EncodeStateResponse = self.post("encode-states", &request).await?;

        let mut normalized = StateOverrideSet::default();
        for (address, entry) in response.state_overrides {
            normalized.0.insert(
                address,
                AccountOverride { storage: entry.value, balance: balances.get(&address).copied() },
            );
        }
        for (address, balance) in balances {
            normalized.0.entry(address).or_default().balance = Some(balance);
        }
        Ok(normalized)
    }
}
