//! JSON-RPC `eth_call` accessor implementation.

use super::{AccessorError, FundAccessor};
use alloy_primitives::{keccak256, Address, U256};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Accessor backed by an Ethereum JSON-RPC endpoint.
///
/// Calls are made against the latest block. A contract revert surfaces as
/// [`AccessorError::Revert`]; transient transport failures are retried with
/// exponential backoff before giving up.
#[derive(Debug, Clone)]
pub struct RpcAccessor {
    client: Client,
    url: String,
}

impl RpcAccessor {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }

    /// 4-byte function selector for a Solidity signature.
    fn selector(signature: &str) -> [u8; 4] {
        let hash = keccak256(signature.as_bytes());
        [hash[0], hash[1], hash[2], hash[3]]
    }

    fn calldata(signature: &str, args: &[[u8; 32]]) -> String {
        let mut data = Vec::with_capacity(4 + args.len() * 32);
        data.extend_from_slice(&Self::selector(signature));
        for arg in args {
            data.extend_from_slice(arg);
        }
        format!("0x{}", hex::encode(data))
    }

    fn encode_address(address: Address) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(address.as_slice());
        word
    }

    async fn eth_call(&self, to: Address, data: String) -> Result<Vec<u8>, AccessorError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_call",
            "params": [{"to": format!("{to:#x}"), "data": data}, "latest"],
        });

        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(15)),
            ..Default::default()
        };

        let body = retry(backoff, || async {
            let response = self
                .client
                .post(&self.url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(AccessorError::Network(e.to_string())))?;

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(backoff::Error::transient(AccessorError::Http {
                    status: status.as_u16(),
                    message: "retryable".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(AccessorError::Http {
                    status: status.as_u16(),
                    message: "client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(AccessorError::Parse(e.to_string())))
        })
        .await?;

        if let Some(error) = body.get("error") {
            return Err(AccessorError::Revert(error.to_string()));
        }

        let result = body
            .get("result")
            .and_then(|r| r.as_str())
            .ok_or_else(|| AccessorError::Parse("missing result field".to_string()))?;
        let bytes = hex::decode(result.trim_start_matches("0x"))
            .map_err(|e| AccessorError::Parse(e.to_string()))?;
        if bytes.is_empty() {
            // eth_call on a reverting view function returns empty data
            return Err(AccessorError::Revert("empty return data".to_string()));
        }
        debug!(%to, len = bytes.len(), "eth_call returned");
        Ok(bytes)
    }

    async fn call_u256(
        &self,
        to: Address,
        signature: &str,
        args: &[[u8; 32]],
    ) -> Result<U256, AccessorError> {
        let bytes = self.eth_call(to, Self::calldata(signature, args)).await?;
        decode_u256(&bytes)
    }

    async fn call_string(&self, to: Address, signature: &str) -> Result<String, AccessorError> {
        let bytes = self.eth_call(to, Self::calldata(signature, &[])).await?;
        decode_string(&bytes)
    }
}

fn decode_u256(bytes: &[u8]) -> Result<U256, AccessorError> {
    if bytes.len() < 32 {
        return Err(AccessorError::Parse(format!(
            "expected 32-byte word, got {} bytes",
            bytes.len()
        )));
    }
    Ok(U256::from_be_slice(&bytes[..32]))
}

fn decode_address(bytes: &[u8]) -> Result<Address, AccessorError> {
    if bytes.len() < 32 {
        return Err(AccessorError::Parse(format!(
            "expected 32-byte word, got {} bytes",
            bytes.len()
        )));
    }
    Ok(Address::from_slice(&bytes[12..32]))
}

/// Decode an ABI-encoded dynamic string: offset word, length word, data.
fn decode_string(bytes: &[u8]) -> Result<String, AccessorError> {
    let offset = decode_u256(bytes)?;
    let offset = usize::try_from(offset)
        .map_err(|_| AccessorError::Parse("string offset overflow".to_string()))?;
    if bytes.len() < offset + 32 {
        return Err(AccessorError::Parse("truncated string header".to_string()));
    }
    let len = decode_u256(&bytes[offset..])?;
    let len =
        usize::try_from(len).map_err(|_| AccessorError::Parse("string length overflow".to_string()))?;
    let start = offset + 32;
    if bytes.len() < start + len {
        return Err(AccessorError::Parse("truncated string body".to_string()));
    }
    String::from_utf8(bytes[start..start + len].to_vec())
        .map_err(|e| AccessorError::Parse(e.to_string()))
}

#[async_trait]
impl FundAccessor for RpcAccessor {
    async fn total_value_locked(&self, fund: Address) -> Result<U256, AccessorError> {
        self.call_u256(fund, "totalValueLocked()", &[]).await
    }

    async fn total_supply(&self, fund: Address) -> Result<U256, AccessorError> {
        self.call_u256(fund, "totalSupply()", &[]).await
    }

    async fn price_per_share(&self, fund: Address) -> Result<U256, AccessorError> {
        self.call_u256(fund, "getPricePerShare()", &[]).await
    }

    async fn decimals(&self, token: Address) -> Result<u8, AccessorError> {
        let value = self.call_u256(token, "decimals()", &[]).await?;
        u8::try_from(value).map_err(|_| AccessorError::Parse("decimals out of range".to_string()))
    }

    async fn balance_of(&self, fund: Address, account: Address) -> Result<U256, AccessorError> {
        self.call_u256(fund, "balanceOf(address)", &[Self::encode_address(account)])
            .await
    }

    async fn symbol(&self, token: Address) -> Result<String, AccessorError> {
        self.call_string(token, "symbol()").await
    }

    async fn name(&self, token: Address) -> Result<String, AccessorError> {
        self.call_string(token, "name()").await
    }

    async fn underlying(&self, fund: Address) -> Result<Address, AccessorError> {
        let bytes = self
            .eth_call(fund, Self::calldata("underlying()", &[]))
            .await?;
        decode_address(&bytes)
    }

    async fn withdrawal_fee_bps(&self, fund: Address) -> Result<u32, AccessorError> {
        let value = self.call_u256(fund, "withdrawalFee()", &[]).await?;
        u32::try_from(value)
            .map_err(|_| AccessorError::Parse("withdrawalFee out of range".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_matches_known_value() {
        // keccak("totalSupply()")[0..4] == 18160ddd
        assert_eq!(RpcAccessor::selector("totalSupply()"), [0x18, 0x16, 0x0d, 0xdd]);
        // keccak("balanceOf(address)")[0..4] == 70a08231
        assert_eq!(
            RpcAccessor::selector("balanceOf(address)"),
            [0x70, 0xa0, 0x82, 0x31]
        );
    }

    #[test]
    fn test_calldata_appends_padded_args() {
        let account = Address::repeat_byte(0x11);
        let data = RpcAccessor::calldata("balanceOf(address)", &[RpcAccessor::encode_address(
            account,
        )]);
        assert_eq!(data.len(), 2 + 8 + 64);
        assert!(data.starts_with("0x70a08231"));
        assert!(data.ends_with(&"11".repeat(20)));
    }

    #[test]
    fn test_decode_u256_word() {
        let mut word = [0u8; 32];
        word[31] = 42;
        assert_eq!(decode_u256(&word).unwrap(), U256::from(42u64));
    }

    #[test]
    fn test_decode_string_abi_layout() {
        // offset=0x20, len=4, "vETH"
        let mut bytes = vec![0u8; 96];
        bytes[31] = 0x20;
        bytes[63] = 4;
        bytes[64..68].copy_from_slice(b"vETH");
        assert_eq!(decode_string(&bytes).unwrap(), "vETH");
    }

    #[test]
    fn test_decode_string_truncated_is_error() {
        let mut bytes = vec![0u8; 64];
        bytes[31] = 0x20;
        bytes[63] = 10; // claims 10 bytes that are not there
        assert!(decode_string(&bytes).is_err());
    }

    #[test]
    fn test_decode_address_from_word() {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(&[0x22u8; 20]);
        assert_eq!(decode_address(&word).unwrap(), Address::repeat_byte(0x22));
    }
}
