//! Linear EVM bytecode scanner classifying contracts as safe or unsafe.
//!
//! A single left-to-right pass over deployed code, skipping PUSH immediates so
//! data bytes are never misread as opcodes, and tracking reachability so dead
//! bytes between a terminator and the next jump destination (e.g. Solidity
//! metadata) cannot produce false positives.

use alloy::{
    primitives::Address,
    providers::Provider,
};
use std::collections::BTreeSet;

const OP_STOP: u8 = 0x00;
const OP_JUMPDEST: u8 = 0x5b;
const OP_PUSH1: u8 = 0x60;
const OP_PUSH32: u8 = 0x7f;
const OP_RETURN: u8 = 0xf3;
const OP_DELEGATECALL: u8 = 0xf4;
const OP_REVERT: u8 = 0xfd;
const OP_INVALID: u8 = 0xfe;
const OP_SELFDESTRUCT: u8 = 0xff;

/// Classification of an account's code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeClassification {
    /// The address is on the caller's trusted list; code was not inspected.
    Trusted,
    /// No code, and the account has sent at least one transaction.
    Eoa,
    /// No code and no transactions; the account might receive code later.
    Empty,
    /// Code with no reachable `SELFDESTRUCT` or `DELEGATECALL`.
    Safe,
    /// Code with a reachable `DELEGATECALL` but no reachable `SELFDESTRUCT`.
    Delegatecall,
    /// Code with a reachable `SELFDESTRUCT`.
    Selfdestruct,
}

impl CodeClassification {
    /// Short lowercase label for report strings.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Trusted => "trusted",
            Self::Eoa => "eoa",
            Self::Empty => "empty",
            Self::Safe => "safe",
            Self::Delegatecall => "delegatecall",
            Self::Selfdestruct => "selfdestruct",
        }
    }
}

/// Scans deployed bytecode for reachable `SELFDESTRUCT` and `DELEGATECALL`
/// opcodes.
///
/// A reachable `SELFDESTRUCT` short-circuits the scan; a reachable
/// `DELEGATECALL` is remembered but scanning continues, since a later
/// self-destruct is the stronger verdict.
pub fn scan_bytecode(code: &[u8]) -> CodeClassification {
    let mut delegatecall = false;
    let mut halted = false;

    let mut i = 0;
    while i < code.len() {
        let op = code[i];
        match op {
            OP_PUSH1..=OP_PUSH32 => {
                // Immediate data, not opcodes.
                i += (op - OP_PUSH1) as usize + 1;
            }
            OP_SELFDESTRUCT if !halted => return CodeClassification::Selfdestruct,
            OP_DELEGATECALL if !halted => delegatecall = true,
            OP_JUMPDEST => halted = false,
            OP_STOP | OP_RETURN | OP_REVERT | OP_INVALID | OP_SELFDESTRUCT => halted = true,
            _ => {}
        }
        i += 1;
    }

    if delegatecall { CodeClassification::Delegatecall } else { CodeClassification::Safe }
}

/// Classifies an account by its deployed code.
///
/// Trusted addresses are never inspected. Codeless accounts split into
/// [`CodeClassification::Eoa`] and [`CodeClassification::Empty`] by whether
/// they have ever sent a transaction.
pub async fn classify_address<P: Provider>(
    provider: &P,
    address: Address,
    trusted: &BTreeSet<Address>,
) -> Result<CodeClassification, alloy::transports::RpcError<alloy::transports::TransportErrorKind>>
{
    if trusted.contains(&address) {
        return Ok(CodeClassification::Trusted);
    }

    let code = provider.get_code_at(address).await?;
    if code.is_empty() {
        let nonce = provider.get_transaction_count(address).await?;
        return Ok(if nonce > 0 { CodeClassification::Eoa } else { CodeClassification::Empty });
    }

    Ok(scan_bytecode(&code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_data_is_skipped() {
        // PUSH1 0xFF STOP: the immediate byte equals the SELFDESTRUCT opcode
        // and must not be read as one.
        assert_eq!(scan_bytecode(&[OP_PUSH1, 0xff, OP_STOP]), CodeClassification::Safe);
    }

    #[test]
    fn push32_data_is_skipped() {
        let mut code = vec![OP_PUSH32];
        code.extend([OP_SELFDESTRUCT; 32]);
        code.push(OP_STOP);
        assert_eq!(scan_bytecode(&code), CodeClassification::Safe);
    }

    #[test]
    fn lone_selfdestruct() {
        assert_eq!(scan_bytecode(&[OP_SELFDESTRUCT]), CodeClassification::Selfdestruct);
    }

    #[test]
    fn reachable_delegatecall() {
        assert_eq!(
            scan_bytecode(&[OP_JUMPDEST, OP_DELEGATECALL, OP_STOP]),
            CodeClassification::Delegatecall
        );
    }

    #[test]
    fn opcodes_after_terminator_are_unreachable() {
        // Metadata after RETURN must not count.
        assert_eq!(
            scan_bytecode(&[OP_PUSH1, 0x00, OP_RETURN, OP_SELFDESTRUCT, OP_DELEGATECALL]),
            CodeClassification::Safe
        );
    }

    #[test]
    fn jumpdest_resets_reachability() {
        assert_eq!(
            scan_bytecode(&[OP_RETURN, OP_JUMPDEST, OP_SELFDESTRUCT]),
            CodeClassification::Selfdestruct
        );
    }

    #[test]
    fn selfdestruct_wins_over_delegatecall() {
        assert_eq!(
            scan_bytecode(&[OP_DELEGATECALL, OP_SELFDESTRUCT]),
            CodeClassification::Selfdestruct
        );
    }

    #[test]
    fn truncated_push_does_not_panic() {
        // PUSH32 with fewer than 32 trailing bytes: the scan just ends.
        assert_eq!(scan_bytecode(&[OP_DELEGATECALL, OP_PUSH32, 0x01]), CodeClassification::Delegatecall);
    }

    #[test]
    fn empty_code_is_safe() {
        assert_eq!(scan_bytecode(&[]), CodeClassification::Safe);
    }
}
