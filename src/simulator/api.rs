//! Wire types for the simulation backend's REST API.

use crate::{
    error::SimulatorError,
    types::{
        CallFrame, ContractInfo, EventLog, SimulationPayload, SimulationResult, StateDiffEntry,
    },
};
use alloy::primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn hex_quantity(n: u64) -> String {
    format!("{n:#x}")
}

/// Body of a single-simulation request.
#[derive(Debug, Serialize)]
pub(crate) struct SimulateRequest {
    pub(crate) network_id: String,
    pub(crate) block_number: u64,
    pub(crate) from: Address,
    pub(crate) to: Address,
    pub(crate) input: Bytes,
    pub(crate) gas: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) gas_price: Option<String>,
    pub(crate) value: U256,
    pub(crate) save: bool,
    pub(crate) save_if_fails: bool,
    pub(crate) simulation_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) block_header: Option<BlockHeaderWire>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) state_objects: Option<BTreeMap<Address, StateObjectWire>>,
}

/// Simulated block header fields, as hex quantities.
#[derive(Debug, Serialize)]
pub(crate) struct BlockHeaderWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) timestamp: Option<String>,
}

/// Per-account override attached to a request.
#[derive(Debug, Serialize)]
pub(crate) struct StateObjectWire {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) storage: Option<BTreeMap<B256, B256>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) balance: Option<U256>,
}

impl From<SimulationPayload> for SimulateRequest {
    fn from(payload: SimulationPayload) -> Self {
        Self {
            network_id: payload.chain_id.to_string(),
            block_number: payload.block_number,
            from: payload.from,
            to: payload.to,
            input: payload.input,
            gas: payload.gas,
            gas_price: payload.gas_price.map(|p| p.to_string()),
            value: payload.value,
            save: false,
            save_if_fails: false,
            simulation_type: "full",
            block_header: payload.block_header.map(|header| BlockHeaderWire {
                number: header.number.map(hex_quantity),
                timestamp: header.timestamp.map(hex_quantity),
            }),
            state_objects: payload.overrides.map(|set| {
                set.0
                    .into_iter()
                    .map(|(address, account)| {
                        (
                            address,
                            StateObjectWire {
                                storage: (!account.storage.is_empty()).then_some(account.storage),
                                balance: account.balance,
                            },
                        )
                    })
                    .collect()
            }),
        }
    }
}

/// Body of a bundle request; steps execute in order, later steps seeing the
/// state produced by earlier ones.
#[derive(Debug, Serialize)]
pub(crate) struct BundleRequest {
    pub(crate) simulations: Vec<SimulateRequest>,
}

/// Response to a single simulation.
#[derive(Debug, Deserialize)]
pub(crate) struct SimulateResponse {
    pub(crate) transaction: Option<TransactionWire>,
    #[serde(default)]
    pub(crate) contracts: Vec<ContractWire>,
}

/// Response to a bundle request.
#[derive(Debug, Deserialize)]
pub(crate) struct BundleResponse {
    #[serde(default)]
    pub(crate) simulation_results: Vec<SimulateResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionWire {
    pub(crate) status: bool,
    #[serde(default)]
    pub(crate) addresses: Vec<Address>,
    #[serde(default)]
    pub(crate) error_message: Option<String>,
    pub(crate) transaction_info: Option<TransactionInfoWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionInfoWire {
    pub(crate) call_trace: Option<CallFrameWire>,
    #[serde(default)]
    pub(crate) logs: Option<Vec<LogWire>>,
    #[serde(default)]
    pub(crate) state_diff: Option<Vec<StateDiffWire>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CallFrameWire {
    pub(crate) from: Address,
    pub(crate) to: Option<Address>,
    #[serde(default)]
    pub(crate) input: Option<Bytes>,
    #[serde(default)]
    pub(crate) value: Option<U256>,
    #[serde(default)]
    pub(crate) error: Option<String>,
    #[serde(default)]
    pub(crate) error_reason: Option<String>,
    #[serde(default)]
    pub(crate) calls: Option<Vec<CallFrameWire>>,
}

impl CallFrameWire {
    fn into_frame(self) -> CallFrame {
        CallFrame {
            from: self.from,
            to: self.to,
            input: self.input.unwrap_or_default(),
            value: self.value,
            error: self.error_reason.or(self.error),
            calls: self.calls.unwrap_or_default().into_iter().map(Self::into_frame).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LogWire {
    #[serde(default)]
    pub(crate) name: Option<String>,
    pub(crate) raw: RawLogWire,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawLogWire {
    pub(crate) address: Address,
    #[serde(default)]
    pub(crate) topics: Vec<B256>,
    #[serde(default)]
    pub(crate) data: Bytes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StateDiffWire {
    #[serde(default)]
    pub(crate) raw: Vec<RawStateDiffWire>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStateDiffWire {
    pub(crate) address: Address,
    pub(crate) key: B256,
    pub(crate) original: U256,
    pub(crate) dirty: U256,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContractWire {
    pub(crate) address: Address,
    #[serde(default)]
    pub(crate) contract_name: Option<String>,
}

/// Response of the block-number endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct BlockNumberResponse {
    pub(crate) block_number: u64,
}

/// Body of a storage-override encode request.
#[derive(Debug, Serialize)]
pub(crate) struct EncodeStateRequest {
    pub(crate) network_id: String,
    pub(crate) state_overrides: BTreeMap<Address, EncodeStateEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct EncodeStateEntry {
    pub(crate) value: BTreeMap<B256, B256>,
}

/// Response of a storage-override encode request: the same map in
/// slot-indexed form.
#[derive(Debug, Deserialize)]
pub(crate) struct EncodeStateResponse {
    pub(crate) state_overrides: BTreeMap<Address, EncodeStateEntry>,
}

/// Searches the call trace for the deepest frame that carries a failure
/// reason; inner frames are closer to the actual revert site.
fn deepest_error(frame: &CallFrameWire) -> Option<String> {
    for call in frame.calls.as_deref().unwrap_or_default() {
        if let Some(reason) = deepest_error(call) {
            return Some(reason);
        }
    }
    frame.error_reason.clone().or_else(|| frame.error.clone())
}

impl SimulateResponse {
    /// Converts a wire response into the domain result.
    ///
    /// A response without a transaction body never carries a usable trace and
    /// is treated as malformed.
    pub(crate) fn into_result(self) -> Result<SimulationResult, SimulatorError> {
        let tx = self.transaction.ok_or_else(|| {
            SimulatorError::UnexpectedResponse("response is missing the transaction body".into())
        })?;

        let revert_reason = (!tx.status).then(|| {
            tx.transaction_info
                .as_ref()
                .and_then(|info| info.call_trace.as_ref())
                .and_then(deepest_error)
                .or_else(|| tx.error_message.clone())
                .unwrap_or_else(|| "execution reverted".into())
        });

        let (call_trace, logs, state_diffs) = match tx.transaction_info {
            Some(info) => (
                info.call_trace.map(CallFrameWire::into_frame),
                info.logs
                    .unwrap_or_default()
                    .into_iter()
                    .map(|log| EventLog {
                        address: log.raw.address,
                        topics: log.raw.topics,
                        data: log.raw.data,
                        name: log.name,
                    })
                    .collect(),
                info.state_diff
                    .unwrap_or_default()
                    .into_iter()
                    .flat_map(|diff| diff.raw)
                    .map(|raw| StateDiffEntry {
                        address: raw.address,
                        slot: raw.key,
                        original: B256::from(raw.original),
                        dirty: B256::from(raw.dirty),
                    })
                    .collect(),
            ),
            None => (None, Vec::new(), Vec::new()),
        };

        Ok(SimulationResult {
            success: tx.status,
            revert_reason,
            logs,
            state_diffs,
            call_trace,
            addresses: tx.addresses,
            contracts: self
                .contracts
                .into_iter()
                .map(|c| ContractInfo { address: c.address, name: c.contract_name })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revert_reason_prefers_deepest_frame() {
        let response: SimulateResponse = serde_json::from_value(serde_json::json!({
            "transaction": {
                "status": false,
                "addresses": [],
                "error_message": "outer failure",
                "transaction_info": {
                    "call_trace": {
                        "from": "0x0000000000000000000000000000000000000001",
                        "to": "0x0000000000000000000000000000000000000002",
                        "error": "execution reverted",
                        "calls": [{
                            "from": "0x0000000000000000000000000000000000000002",
                            "to": "0x0000000000000000000000000000000000000003",
                            "error": "execution reverted",
                            "error_reason": "Timelock::executeTransaction: Transaction hasn't been queued."
                        }]
                    }
                }
            }
        }))
        .unwrap();

        let result = response.into_result().unwrap();
        assert!(!result.success);
        assert_eq!(
            result.revert_reason.as_deref(),
            Some("Timelock::executeTransaction: Transaction hasn't been queued.")
        );
    }

    #[test]
    fn missing_transaction_is_unexpected_response() {
        let response: SimulateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(
            response.into_result(),
            Err(SimulatorError::UnexpectedResponse(_))
        ));
    }
}
