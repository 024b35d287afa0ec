//! Pay-to-view unlock gate.
//!
//! The contract itself is third-party chain infrastructure; this module
//! consumes it through a small capability interface so nothing else in the
//! crate depends on a chain library. The adapter speaks raw JSON-RPC:
//! `eth_call` for the two reads and `eth_sendTransaction` (node-managed
//! account) for the payable unlock, followed by a bounded receipt poll.
//! There is no retry or queuing beyond reflecting transaction status.

use serde::Deserialize;
use serde_json::{json, Value};
use sha3::{Digest, Keccak256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockStatus {
    /// Submitted but not yet mined within the poll budget.
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum UnlockError {
    #[error("Wallet not connected")]
    NotConnected,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Capability interface for the on-chain gate. `owner` is the entry owner's
/// wallet address; `entry_id` is the `(user, date)` key in string form.
#[allow(async_fn_in_trait)]
pub trait UnlockGate {
    /// Current unlock price in wei.
    async fn price(&self) -> Result<u128, UnlockError>;

    /// Whether the caller has already paid to view this entry.
    async fn is_unlocked(&self, owner: &str, entry_id: &str) -> Result<bool, UnlockError>;

    /// Pay exactly the current price to mark the pair unlocked.
    async fn unlock(&self, owner: &str, entry_id: &str) -> Result<UnlockStatus, UnlockError>;
}

const SIG_UNLOCK_PRICE: &str = "unlockPrice()";
const SIG_IS_ENTRY_UNLOCKED: &str = "isEntryUnlocked(address,string)";
const SIG_UNLOCK_ENTRY: &str = "unlockEntry(address,string)";

const RECEIPT_POLL_ATTEMPTS: u32 = 10;
const RECEIPT_POLL_INTERVAL_MS: u64 = 500;

pub struct EvmUnlockGate {
    http: reqwest::Client,
    rpc_url: String,
    contract: String,
    /// The viewer's wallet address; `None` until a wallet is connected.
    caller: Option<String>,
}

impl EvmUnlockGate {
    pub fn new(rpc_url: impl Into<String>, contract: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
            contract: contract.into(),
            caller: None,
        }
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, UnlockError> {
        #[derive(Deserialize)]
        struct RpcResponse {
            result: Option<Value>,
            error: Option<RpcErrorBody>,
        }

        #[derive(Deserialize)]
        struct RpcErrorBody {
            message: String,
        }

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let resp: RpcResponse = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = resp.error {
            return Err(UnlockError::Rpc(err.message));
        }
        // A pending receipt legitimately comes back as null.
        Ok(resp.result.unwrap_or(Value::Null))
    }

    async fn eth_call(&self, data: String) -> Result<String, UnlockError> {
        let result = self
            .rpc(
                "eth_call",
                json!([{ "to": self.contract, "data": data }, "latest"]),
            )
            .await?;
        result
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| UnlockError::Rpc("non-string eth_call result".into()))
    }
}

impl UnlockGate for EvmUnlockGate {
    async fn price(&self) -> Result<u128, UnlockError> {
        let data = format!("0x{}", hex::encode(selector(SIG_UNLOCK_PRICE)));
        let result = self.eth_call(data).await?;
        parse_quantity(&result)
    }

    async fn is_unlocked(&self, owner: &str, entry_id: &str) -> Result<bool, UnlockError> {
        let data = encode_owner_entry(SIG_IS_ENTRY_UNLOCKED, owner, entry_id)?;
        let result = self.eth_call(data).await?;
        Ok(parse_bool_word(&result))
    }

    async fn unlock(&self, owner: &str, entry_id: &str) -> Result<UnlockStatus, UnlockError> {
        let caller = self.caller.as_deref().ok_or(UnlockError::NotConnected)?;

        let price = self.price().await?;
        let data = encode_owner_entry(SIG_UNLOCK_ENTRY, owner, entry_id)?;

        let tx_hash = self
            .rpc(
                "eth_sendTransaction",
                json!([{
                    "from": caller,
                    "to": self.contract,
                    "value": format!("{:#x}", price),
                    "data": data,
                }]),
            )
            .await?;
        let tx_hash = tx_hash
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| UnlockError::Rpc("non-string transaction hash".into()))?;

        tracing::info!(tx = %tx_hash, owner = %owner, entry = %entry_id, "Unlock submitted");

        for _ in 0..RECEIPT_POLL_ATTEMPTS {
            let receipt = self
                .rpc("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if let Some(status) = receipt.get("status").and_then(Value::as_str) {
                return Ok(receipt_status(status));
            }
            tokio::time::sleep(std::time::Duration::from_millis(RECEIPT_POLL_INTERVAL_MS))
                .await;
        }

        Ok(UnlockStatus::Pending)
    }
}

/// First four bytes of the Keccak-256 hash of a Solidity signature.
fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

/// ABI-encode a call taking `(address, string)`.
fn encode_owner_entry(signature: &str, owner: &str, entry_id: &str) -> Result<String, UnlockError> {
    let mut data = Vec::with_capacity(4 + 32 * 3 + entry_id.len());
    data.extend_from_slice(&selector(signature));
    data.extend_from_slice(&encode_address(owner)?);
    // Dynamic string: offset to the tail, then length + padded bytes.
    data.extend_from_slice(&encode_word(0x40));
    data.extend_from_slice(&encode_word(entry_id.len() as u64));
    data.extend_from_slice(entry_id.as_bytes());
    let rem = entry_id.len() % 32;
    if rem != 0 {
        data.extend(std::iter::repeat(0u8).take(32 - rem));
    }
    Ok(format!("0x{}", hex::encode(data)))
}

fn encode_address(addr: &str) -> Result<[u8; 32], UnlockError> {
    let stripped = addr.strip_prefix("0x").unwrap_or(addr);
    let bytes =
        hex::decode(stripped).map_err(|_| UnlockError::InvalidAddress(addr.to_string()))?;
    if bytes.len() != 20 {
        return Err(UnlockError::InvalidAddress(addr.to_string()));
    }
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&bytes);
    Ok(word)
}

fn encode_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Parse a hex quantity (`0x...`) into wei.
fn parse_quantity(hex_str: &str) -> Result<u128, UnlockError> {
    let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let trimmed = stripped.trim_start_matches('0');
    if trimmed.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(trimmed, 16)
        .map_err(|_| UnlockError::Rpc(format!("bad quantity: {}", hex_str)))
}

/// A returned bool is a 32-byte word; nonzero means true.
fn parse_bool_word(hex_str: &str) -> bool {
    let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    stripped.bytes().any(|b| b != b'0')
}

fn receipt_status(status: &str) -> UnlockStatus {
    if parse_bool_word(status) {
        UnlockStatus::Confirmed
    } else {
        UnlockStatus::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn test_selector_matches_known_value() {
        // transfer(address,uint256) is the canonical fixture for selector
        // derivation.
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
    }

    #[test]
    fn test_encode_owner_entry_layout() {
        let data = encode_owner_entry(SIG_IS_ENTRY_UNLOCKED, OWNER, "2026-03-14").unwrap();
        let bytes = hex::decode(data.strip_prefix("0x").unwrap()).unwrap();

        // selector + address word + offset word + length word + one data word
        assert_eq!(bytes.len(), 4 + 32 * 4);
        assert_eq!(&bytes[..4], &selector(SIG_IS_ENTRY_UNLOCKED));
        // Address is right-aligned in its word.
        assert_eq!(&bytes[4..16], &[0u8; 12]);
        assert_eq!(&bytes[16..36], &[0x11u8; 20]);
        // Offset points past the two head words.
        assert_eq!(bytes[4 + 63], 0x40);
        // String length, then the bytes zero-padded to a word.
        assert_eq!(bytes[4 + 95], 10);
        assert_eq!(&bytes[4 + 96..4 + 106], b"2026-03-14");
        assert_eq!(&bytes[4 + 106..], &[0u8; 22]);
    }

    #[test]
    fn test_encode_address_rejects_garbage() {
        assert!(matches!(
            encode_address("0xnot-an-address"),
            Err(UnlockError::InvalidAddress(_))
        ));
        assert!(matches!(
            encode_address("0x1234"),
            Err(UnlockError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert_eq!(parse_quantity("0x00").unwrap(), 0);
        // 0.001 ether
        assert_eq!(parse_quantity("0x38d7ea4c68000").unwrap(), 1_000_000_000_000_000);
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_bool_word_and_receipt_status() {
        let true_word = format!("0x{}1", "0".repeat(63));
        let false_word = format!("0x{}", "0".repeat(64));
        assert!(parse_bool_word(&true_word));
        assert!(!parse_bool_word(&false_word));

        assert_eq!(receipt_status("0x1"), UnlockStatus::Confirmed);
        assert_eq!(receipt_status("0x0"), UnlockStatus::Failed);
    }
}
