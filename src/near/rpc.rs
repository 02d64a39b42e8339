//! JSON-RPC transport to the contract node.
//!
//! Views go through the node's `query`/`call_function` endpoint. Change calls
//! are wrapped in a function-call envelope, signed with the account's ed25519
//! key, and awaited to completion; the node is otherwise opaque to the
//! gateway, and its wire shapes stay confined to this module.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use data_encoding::{BASE64, HEXLOWER};
use ed25519_dalek::{Signer, SigningKey};
use log::debug;
use reqwest::header;
use rocket::serde::json::serde_json;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::serde_string;

pub struct NearRpcClient {
    client: reqwest::Client,
    node_url: String,
    account_id: String,
    signing_key: SigningKey,
    next_request_id: AtomicU64,
}

impl NearRpcClient {
    pub fn new(node_url: String, account_id: String, signing_key: SigningKey) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            node_url,
            account_id,
            signing_key,
            next_request_id: AtomicU64::new(1),
        })
    }

    /// Read-only contract call against the final block. Returns the call's
    /// raw return bytes (JSON produced by the contract).
    pub async fn view_call(
        &self,
        contract_id: &str,
        method_name: &str,
        args: &impl Serialize,
    ) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct Params<'a> {
            request_type: &'static str,
            finality: &'static str,
            account_id: &'a str,
            method_name: &'a str,
            args_base64: String,
        }

        let result: CallFunctionResult = self
            .post(
                "query",
                &Params {
                    request_type: "call_function",
                    finality: "final",
                    account_id: contract_id,
                    method_name,
                    args_base64: BASE64.encode(&serde_json::to_vec(args)?),
                },
            )
            .await?;
        Ok(result.result)
    }

    /// State-changing contract call, signed as the account and awaited to
    /// completion. Returns the call's return bytes on success and the
    /// execution failure unchanged otherwise.
    pub async fn function_call(
        &self,
        contract_id: &str,
        method_name: &str,
        args: &impl Serialize,
        gas: u64,
        deposit: u128,
    ) -> Result<Vec<u8>> {
        let transaction = FunctionCallTransaction {
            signer_id: &self.account_id,
            public_key: encode_key(self.signing_key.verifying_key().as_bytes()),
            // Nonces must increase per key; wall-clock nanoseconds satisfy
            // that without tracking contract-side state.
            nonce: Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64,
            receiver_id: contract_id,
            method_name,
            args_base64: BASE64.encode(&serde_json::to_vec(args)?),
            gas,
            deposit,
        };
        let signature = self.signing_key.sign(&serde_json::to_vec(&transaction)?);

        let outcome: ExecutionOutcome = self
            .post(
                "send_tx",
                &SignedTransaction {
                    transaction,
                    signature: format!("ed25519:{}", BASE64.encode(&signature.to_bytes())),
                },
            )
            .await?;
        match outcome.status {
            ExecutionStatus::SuccessValue(value) => BASE64
                .decode(value.as_bytes())
                .map_err(|err| Error::Response(format!("return value is not valid base64: {err}"))),
            ExecutionStatus::Failure(cause) => Err(Error::Contract(cause.to_string())),
        }
    }

    async fn post<R>(&self, method: &'static str, params: &impl Serialize) -> Result<R>
    where
        R: for<'de> Deserialize<'de>,
    {
        let request = JrpcRequest {
            jsonrpc: "2.0",
            id: self.next_request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        debug!("-> rpc {method} #{}", request.id);
        let response = self
            .client
            .post(&self.node_url)
            .json(&request)
            .send()
            .await?;
        let response: JrpcResponse<R> = response.json().await?;
        match (response.result, response.error) {
            (_, Some(error)) => Err(Error::Contract(error.into_message())),
            (Some(result), None) => Ok(result),
            (None, None) => Err(Error::Response(
                "response carries neither result nor error".to_string(),
            )),
        }
    }
}

/// `ed25519:<hex>`, the textual key encoding used across config and wire.
fn encode_key(key: &[u8]) -> String {
    format!("ed25519:{}", HEXLOWER.encode(key))
}

#[derive(Serialize)]
struct JrpcRequest<'a, T> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a T,
}

#[derive(Deserialize)]
struct JrpcResponse<T> {
    result: Option<T>,
    error: Option<JrpcError>,
}

#[derive(Debug, Deserialize)]
struct JrpcError {
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

impl JrpcError {
    fn into_message(self) -> String {
        match self.data {
            Some(data) => format!("{} ({data})", self.message),
            None => self.message,
        }
    }
}

/// Result of a `call_function` query: the contract's return value as bytes.
#[derive(Deserialize)]
struct CallFunctionResult {
    result: Vec<u8>,
}

#[derive(Deserialize)]
struct ExecutionOutcome {
    status: ExecutionStatus,
}

#[derive(Deserialize)]
enum ExecutionStatus {
    SuccessValue(String),
    Failure(serde_json::Value),
}

/// The envelope submitted for change calls. The deposit keeps its
/// decimal-string encoding like every other oversized integer on the wire.
#[derive(Serialize)]
struct FunctionCallTransaction<'a> {
    signer_id: &'a str,
    public_key: String,
    nonce: u64,
    receiver_id: &'a str,
    method_name: &'a str,
    args_base64: String,
    gas: u64,
    #[serde(with = "serde_string")]
    deposit: u128,
}

#[derive(Serialize)]
struct SignedTransaction<'a> {
    transaction: FunctionCallTransaction<'a>,
    signature: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parsing() {
        let json = r#"{"jsonrpc":"2.0","id":1,"result":42}"#;
        let response: JrpcResponse<i32> = serde_json::from_str(json).unwrap();
        assert_eq!(response.result, Some(42));

        let json = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"unknown method"}}"#;
        let response: JrpcResponse<i32> = serde_json::from_str(json).unwrap();
        assert_eq!(response.error.unwrap().into_message(), "unknown method");

        let json = r#"{"jsonrpc":"2.0","id":1,"error":{"message":"oops","data":{"cause":"why"}}}"#;
        let response: JrpcResponse<i32> = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.error.unwrap().into_message(),
            r#"oops ({"cause":"why"})"#
        );
    }

    #[test]
    fn execution_status_parsing() {
        let json = r#"{"status":{"SuccessValue":"IjAi"}}"#;
        let outcome: ExecutionOutcome = serde_json::from_str(json).unwrap();
        match outcome.status {
            ExecutionStatus::SuccessValue(value) => {
                assert_eq!(BASE64.decode(value.as_bytes()).unwrap(), br#""0""#)
            }
            ExecutionStatus::Failure(_) => panic!("expected success"),
        }

        let json = r#"{"status":{"Failure":{"error":"Smart contract panicked"}}}"#;
        let outcome: ExecutionOutcome = serde_json::from_str(json).unwrap();
        assert!(matches!(outcome.status, ExecutionStatus::Failure(_)));
    }

    #[test]
    fn envelope_keeps_string_deposit() {
        let transaction = FunctionCallTransaction {
            signer_id: "org.testnet",
            public_key: encode_key(&[7; 32]),
            nonce: 1,
            receiver_id: "elections.testnet",
            method_name: "create_election",
            args_base64: BASE64.encode(b"{}"),
            gas: 300_000_000_000_000,
            deposit: 1_000_000_000_000_000_000_000_000,
        };
        let value = serde_json::to_value(&transaction).unwrap();
        assert_eq!(value["deposit"], "1000000000000000000000000");
        assert_eq!(value["gas"], 300_000_000_000_000u64);
        assert!(value["public_key"]
            .as_str()
            .unwrap()
            .starts_with("ed25519:"));
    }
}
