//! MinimalForwarder JSON-RPC client.
//!
//! Reads the forwarder state the signing pipeline depends on: the sender's
//! nonce, and the chain id and contract code used to check a configured
//! domain against the live deployment.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::encoding::{encode_call, CallArg, FunctionSignature, WORD_SIZE};
use crate::signing::{SignedRequest, SigningDomain};
use crate::{Error, Result};

/// Canonical signature of the forwarder's nonce getter.
pub const GET_NONCE_SIGNATURE: &str = "getNonce(address)";

mod abi {
    alloy_sol_types::sol! {
        struct ForwardRequest {
            address from;
            address to;
            uint256 value;
            uint256 gas;
            uint256 nonce;
            bytes data;
        }

        function verify(ForwardRequest req, bytes signature) external view returns (bool);
    }
}

/// Source of the authoritative forwarder nonce for a sender.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NonceSource: Send + Sync {
    /// Current forwarder nonce of `from`.
    async fn nonce(&self, from: Address) -> Result<U256>;
}

/// JSON-RPC client bound to one forwarder deployment.
pub struct ForwarderClient {
    rpc_url: String,
    forwarder: Address,
    http_client: reqwest::Client,
}

impl ForwarderClient {
    /// Create a client for the forwarder at `forwarder`.
    pub fn new(rpc_url: impl Into<String>, forwarder: Address) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            forwarder,
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a client whose requests fail after `timeout`.
    pub fn with_timeout(
        rpc_url: impl Into<String>,
        forwarder: Address,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            rpc_url: rpc_url.into(),
            forwarder,
            http_client,
        })
    }

    pub fn forwarder(&self) -> Address {
        self.forwarder
    }

    /// `getNonce(from)` on the forwarder.
    pub async fn get_nonce(&self, from: Address) -> Result<U256> {
        let output = self.eth_call(get_nonce_calldata(from)?.as_ref()).await?;
        let nonce = decode_uint_word(&output)?;
        debug!(sender = %from, nonce = %nonce, "Fetched forwarder nonce");
        Ok(nonce)
    }

    /// Chain id reported by the node.
    pub async fn chain_id(&self) -> Result<u64> {
        let hex: String = self.rpc_call("eth_chainId", serde_json::json!([])).await?;
        parse_quantity(&hex)
    }

    /// Deployed bytecode at `address` (empty for accounts without code).
    pub async fn code_at(&self, address: Address) -> Result<Bytes> {
        let hex: String = self
            .rpc_call(
                "eth_getCode",
                serde_json::json!([format!("{:?}", address), "latest"]),
            )
            .await?;
        decode_hex_data(&hex)
    }

    /// Check that `domain` describes the forwarder this client talks to.
    pub async fn validate_domain(&self, domain: &SigningDomain) -> Result<()> {
        if domain.verifying_contract != self.forwarder {
            return Err(Error::configuration(format!(
                "domain verifying contract {} is not the forwarder {}",
                domain.verifying_contract, self.forwarder
            )));
        }

        let chain_id = self.chain_id().await?;
        if domain.chain_id != U256::from(chain_id) {
            return Err(Error::configuration(format!(
                "domain chain id {} does not match node chain id {}",
                domain.chain_id, chain_id
            )));
        }

        let code = self.code_at(self.forwarder).await?;
        if code.is_empty() {
            return Err(Error::configuration(format!(
                "no contract deployed at forwarder address {} on chain {}",
                self.forwarder, chain_id
            )));
        }

        info!(
            forwarder = %self.forwarder,
            chain_id = chain_id,
            "Signing domain matches deployed forwarder"
        );
        Ok(())
    }

    /// Dry-run the forwarder's `verify(req, signature)`.
    ///
    /// A revert or RPC error is returned verbatim as [`Error::Rpc`].
    pub async fn verify(&self, signed: &SignedRequest) -> Result<bool> {
        let output = self.eth_call(&verify_calldata(signed)).await?;
        decode_bool_word(&output)
    }

    async fn eth_call(&self, data: &[u8]) -> Result<Vec<u8>> {
        let params = serde_json::json!([
            {
                "to": format!("{:?}", self.forwarder),
                "data": format!("0x{}", hex::encode(data)),
            },
            "latest"
        ]);

        let hex: String = self.rpc_call("eth_call", params).await?;
        Ok(decode_hex_data(&hex)?.to_vec())
    }

    async fn rpc_call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Rpc {
                message: format!("RPC request failed: {}", response.status()),
                code: Some(i64::from(response.status().as_u16())),
            });
        }

        let body: JsonRpcResponse<T> = response.json().await?;
        body.into_result(method)
    }
}

impl std::fmt::Debug for ForwarderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // RPC URLs commonly embed provider API keys
        f.debug_struct("ForwarderClient")
            .field("forwarder", &self.forwarder)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl NonceSource for ForwarderClient {
    async fn nonce(&self, from: Address) -> Result<U256> {
        self.get_nonce(from).await
    }
}

/// Calldata for `getNonce(from)`.
pub fn get_nonce_calldata(from: Address) -> Result<crate::encoding::CallPayload> {
    let signature = FunctionSignature::parse(GET_NONCE_SIGNATURE)?;
    encode_call(&signature, &[CallArg::Address(from)])
}

/// Calldata for `verify(req, signature)`.
pub fn verify_calldata(signed: &SignedRequest) -> Vec<u8> {
    let request = signed.request();
    abi::verifyCall {
        req: abi::ForwardRequest {
            from: request.from(),
            to: request.to(),
            value: request.value(),
            gas: U256::from(request.gas()),
            nonce: request.nonce(),
            data: request.data().as_bytes().clone(),
        },
        signature: Bytes::from(signed.signature().as_bytes().to_vec()),
    }
    .abi_encode()
}

fn decode_uint_word(output: &[u8]) -> Result<U256> {
    if output.len() < WORD_SIZE {
        return Err(Error::Rpc {
            message: format!(
                "expected a 32-byte uint256 return value, got {} bytes",
                output.len()
            ),
            code: None,
        });
    }
    Ok(U256::from_be_slice(&output[..WORD_SIZE]))
}

fn decode_bool_word(output: &[u8]) -> Result<bool> {
    Ok(decode_uint_word(output)? != U256::ZERO)
}

fn parse_quantity(hex: &str) -> Result<u64> {
    u64::from_str_radix(hex.trim_start_matches("0x"), 16).map_err(|e| Error::Rpc {
        message: format!("invalid quantity `{}`: {}", hex, e),
        code: None,
    })
}

fn decode_hex_data(hex: &str) -> Result<Bytes> {
    hex::decode(hex.trim_start_matches("0x"))
        .map(Bytes::from)
        .map_err(|e| Error::Rpc {
            message: format!("invalid hex data `{}`: {}", hex, e),
            code: None,
        })
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl<T> JsonRpcResponse<T> {
    /// The result, or the node's error message and revert data unchanged.
    fn into_result(self, method: &str) -> Result<T> {
        if let Some(err) = self.error {
            let message = match err.data {
                Some(serde_json::Value::String(data)) => format!("{} ({})", err.message, data),
                _ => err.message,
            };
            return Err(Error::Rpc {
                message,
                code: Some(err.code),
            });
        }

        self.result.ok_or_else(|| Error::Rpc {
            message: format!("No result in {} response", method),
            code: None,
        })
    }
}
