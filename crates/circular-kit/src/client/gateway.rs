//! Network Access Gateway client.
//!
//! Stateless and cheap to clone. Every call is a single request: there are
//! no retries here, callers decide whether a failure is worth repeating
//! (see [`GatewayError::is_retryable`]).

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::transport::{Method, Transport};
use crate::encoding::strip_prefix;
use crate::error::GatewayError;
use crate::types::{AddTransactionRequest, Address, GatewayTarget};

const GET_WALLET_NONCE: &str = "Circular_GetWalletNonce_";
const ADD_TRANSACTION: &str = "Circular_AddTransaction_";
const GET_TRANSACTION_BY_ID: &str = "Circular_GetTransactionbyID_";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct WalletNonceRequest<'a> {
    blockchain: String,
    address: &'a str,
    version: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TransactionLookupRequest<'a> {
    blockchain: String,
    #[serde(rename = "ID")]
    id: String,
    start: String,
    end: String,
    version: &'a str,
}

/// Client for the gateway's JSON endpoints.
#[derive(Clone)]
pub struct GatewayClient {
    transport: Arc<dyn Transport>,
}

impl GatewayClient {
    /// Create a client over any transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `GET url`, decoding the body as JSON.
    pub async fn get(&self, url: &str) -> Result<Value, GatewayError> {
        self.execute(Method::Get, url, None).await
    }

    /// `POST url` with a JSON body, decoding the response as JSON.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        payload: &T,
    ) -> Result<Value, GatewayError> {
        let body = serde_json::to_value(payload).map_err(|e| {
            GatewayError::invalid_response(format!("failed to encode request: {e}"))
        })?;
        self.execute(Method::Post, url, Some(&body)).await
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, GatewayError> {
        debug!(method = method.as_str(), url, "gateway request");

        let response = self
            .transport
            .request(method, url, body)
            .await
            .map_err(|source| GatewayError::Network {
                url: url.to_string(),
                source,
            })?;

        debug!(url, status = response.status, "gateway response");

        if !response.is_success() {
            let parsed = serde_json::from_str::<Value>(&response.body).ok();
            let message = parsed
                .as_ref()
                .and_then(error_message)
                .unwrap_or_else(|| format!("HTTP status {}", response.status));
            return Err(GatewayError::Api {
                status_code: i64::from(response.status),
                message,
                response: parsed,
            });
        }

        serde_json::from_str(&response.body)
            .map_err(|e| GatewayError::invalid_response(format!("failed to decode response: {e}")))
    }

    /// Fetch the last confirmed nonce for `address`.
    pub async fn wallet_nonce(
        &self,
        target: &GatewayTarget,
        blockchain: &str,
        address: &Address,
        version: &str,
    ) -> Result<u64, GatewayError> {
        let request = WalletNonceRequest {
            blockchain: strip_prefix(blockchain),
            address: address.as_hex(),
            version,
        };
        let body = self
            .post_json(&target.endpoint(GET_WALLET_NONCE), &request)
            .await?;

        let code = result_code(&body)?;
        debug!(result = code, "wallet nonce result");
        match code {
            200 => body
                .get("Response")
                .and_then(|r| r.get("Nonce"))
                .ok_or_else(|| GatewayError::invalid_response("missing Nonce field"))?
                .as_u64()
                .ok_or_else(|| GatewayError::invalid_response("Nonce is not a non-negative integer")),
            114 => Err(rejected(code, "Rejected: Invalid Blockchain", body)),
            115 => Err(rejected(code, "Rejected: Insufficient balance", body)),
            _ => {
                let message = body
                    .get("Response")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error response")
                    .to_string();
                Err(rejected(code, message, body))
            }
        }
    }

    /// Submit a signed transaction. Returns the full response on `Result` 200.
    pub async fn add_transaction(
        &self,
        target: &GatewayTarget,
        request: &AddTransactionRequest,
    ) -> Result<Value, GatewayError> {
        let body = self
            .post_json(&target.endpoint(ADD_TRANSACTION), request)
            .await?;

        let code = result_code(&body)?;
        debug!(result = code, tx_id = %request.id, "add transaction result");
        if code == 200 {
            return Ok(body);
        }
        let message = body
            .get("Response")
            .and_then(Value::as_str)
            .unwrap_or("certificate submission failed with non-200 result code")
            .to_string();
        Err(rejected(code, message, body))
    }

    /// Look up a transaction in the block range `start..=end`.
    ///
    /// `Result` 404 is a normal "not in this range" answer and is returned
    /// like a 200.
    pub async fn transaction_by_id(
        &self,
        target: &GatewayTarget,
        blockchain: &str,
        tx_id: &str,
        start: u64,
        end: u64,
        version: &str,
    ) -> Result<Value, GatewayError> {
        let request = TransactionLookupRequest {
            blockchain: strip_prefix(blockchain),
            id: strip_prefix(tx_id),
            start: start.to_string(),
            end: end.to_string(),
            version,
        };
        let body = self
            .post_json(&target.endpoint(GET_TRANSACTION_BY_ID), &request)
            .await?;

        let code = result_code(&body)?;
        debug!(result = code, tx_id, "transaction lookup result");
        match code {
            200 | 404 => Ok(body),
            _ => {
                let message = body
                    .get("Response")
                    .and_then(Value::as_str)
                    .unwrap_or("transaction lookup failed")
                    .to_string();
                Err(rejected(code, message, body))
            }
        }
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient").finish_non_exhaustive()
    }
}

fn result_code(body: &Value) -> Result<i64, GatewayError> {
    body.get("Result")
        .and_then(Value::as_i64)
        .ok_or_else(|| GatewayError::invalid_response("missing Result field"))
}

fn rejected(code: i64, message: impl Into<String>, body: Value) -> GatewayError {
    GatewayError::Api {
        status_code: code,
        message: message.into(),
        response: Some(body),
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &Value) -> Option<String> {
    ["message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::transport::TransportResponse;
    use crate::error::TransportError;
    use futures::future::BoxFuture;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A request seen by [`ScriptedTransport`].
    #[derive(Clone, Debug)]
    pub(crate) struct Recorded {
        pub method: Method,
        pub url: String,
        pub body: Option<Value>,
    }

    /// Replays canned responses in order and records every request.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<TransportResponse, String>>>,
        pub requests: Mutex<Vec<Recorded>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn reply(&self, status: u16, body: impl Into<String>) {
            self.replies
                .lock()
                .unwrap()
                .push_back(Ok(TransportResponse::new(status, body)));
        }

        pub fn reply_json(&self, body: Value) {
            self.reply(200, body.to_string());
        }

        pub fn fail(&self, message: &str) {
            self.replies
                .lock()
                .unwrap()
                .push_back(Err(message.to_string()));
        }

        pub fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for ScriptedTransport {
        fn request<'a>(
            &'a self,
            method: Method,
            url: &'a str,
            body: Option<&'a Value>,
        ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
            self.requests.lock().unwrap().push(Recorded {
                method,
                url: url.to_string(),
                body: body.cloned(),
            });
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("no scripted reply".to_string()));
            Box::pin(async move { reply.map_err(TransportError::from) })
        }
    }

    const ADDRESS: &str = "0x1234567890abcdef1234567890abcdef12345678";

    fn client(transport: &Arc<ScriptedTransport>) -> GatewayClient {
        GatewayClient::new(transport.clone())
    }

    fn target() -> GatewayTarget {
        GatewayTarget::new("http://nag.test/?cep=", "testnet")
    }

    // ========================================================================
    // Error mapping
    // ========================================================================

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let transport = ScriptedTransport::new();
        transport.fail("connection refused");

        let err = client(&transport).get("http://nag.test/x").await.unwrap_err();
        match err {
            GatewayError::Network { url, source } => {
                assert_eq!(url, "http://nag.test/x");
                assert_eq!(source.to_string(), "connection refused");
            }
            other => panic!("expected Network, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_uses_message_field() {
        let transport = ScriptedTransport::new();
        transport.reply(503, r#"{"message":"maintenance"}"#);
        transport.reply(400, r#"{"error":"bad input"}"#);
        transport.reply(500, "<html>oops</html>");

        let gateway = client(&transport);
        let err = gateway.get("http://nag.test/").await.unwrap_err();
        assert!(matches!(
            &err,
            GatewayError::Api { status_code: 503, message, .. } if message == "maintenance"
        ));
        assert!(err.is_retryable());

        let err = gateway.get("http://nag.test/").await.unwrap_err();
        assert!(matches!(
            &err,
            GatewayError::Api { status_code: 400, message, .. } if message == "bad input"
        ));

        let err = gateway.get("http://nag.test/").await.unwrap_err();
        match err {
            GatewayError::Api {
                status_code,
                message,
                response,
            } => {
                assert_eq!(status_code, 500);
                assert_eq!(message, "HTTP status 500");
                assert!(response.is_none());
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_undecodable_body_is_invalid_response() {
        let transport = ScriptedTransport::new();
        transport.reply(200, "not json");

        let err = client(&transport).get("http://nag.test/").await.unwrap_err();
        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_post_json_sends_body() {
        let transport = ScriptedTransport::new();
        transport.reply_json(json!({ "ok": true }));

        let body = client(&transport)
            .post_json("http://nag.test/p", &json!({ "a": 1 }))
            .await
            .unwrap();
        assert_eq!(body, json!({ "ok": true }));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].body, Some(json!({ "a": 1 })));
    }

    // ========================================================================
    // Wallet nonce
    // ========================================================================

    #[tokio::test]
    async fn test_wallet_nonce() {
        let transport = ScriptedTransport::new();
        transport.reply_json(json!({ "Result": 200, "Response": { "Nonce": 99 } }));

        let address = ADDRESS.parse().unwrap();
        let nonce = client(&transport)
            .wallet_nonce(&target(), "0xABCD", &address, "1.0.13")
            .await
            .unwrap();
        assert_eq!(nonce, 99);

        let request = &transport.requests()[0];
        assert_eq!(
            request.url,
            "http://nag.test/?cep=Circular_GetWalletNonce_testnet"
        );
        assert_eq!(
            request.body,
            Some(json!({
                "Blockchain": "abcd",
                "Address": "1234567890abcdef1234567890abcdef12345678",
                "Version": "1.0.13",
            }))
        );
    }

    #[tokio::test]
    async fn test_wallet_nonce_result_codes() {
        let transport = ScriptedTransport::new();
        transport.reply_json(json!({ "Result": 114, "Response": "x" }));
        transport.reply_json(json!({ "Result": 115, "Response": "x" }));
        transport.reply_json(json!({ "Result": 500, "Response": "Server busy" }));
        transport.reply_json(json!({ "Result": 500, "Response": { "a": 1 } }));

        let gateway = client(&transport);
        let address: Address = ADDRESS.parse().unwrap();
        let mut messages = Vec::new();
        for _ in 0..4 {
            match gateway
                .wallet_nonce(&target(), "00", &address, "1.0.13")
                .await
            {
                Err(GatewayError::Api {
                    message, response, ..
                }) => {
                    assert!(response.is_some());
                    messages.push(message);
                }
                other => panic!("expected Api, got {other:?}"),
            }
        }
        assert_eq!(
            messages,
            [
                "Rejected: Invalid Blockchain",
                "Rejected: Insufficient balance",
                "Server busy",
                "unknown error response",
            ]
        );
    }

    #[tokio::test]
    async fn test_wallet_nonce_malformed() {
        let transport = ScriptedTransport::new();
        transport.reply_json(json!({ "Result": 200, "Response": {} }));
        transport.reply_json(json!({ "Result": 200, "Response": { "Nonce": "7" } }));
        transport.reply_json(json!({ "Result": 200, "Response": { "Nonce": -1 } }));
        transport.reply_json(json!({ "Response": { "Nonce": 1 } }));

        let gateway = client(&transport);
        let address: Address = ADDRESS.parse().unwrap();
        for _ in 0..4 {
            let err = gateway
                .wallet_nonce(&target(), "00", &address, "1.0.13")
                .await
                .unwrap_err();
            assert!(matches!(err, GatewayError::InvalidResponse(_)), "{err:?}");
        }
    }

    // ========================================================================
    // Submission and lookup
    // ========================================================================

    #[tokio::test]
    async fn test_add_transaction_rejection_keeps_response() {
        let transport = ScriptedTransport::new();
        transport.reply_json(json!({ "Result": 108, "Response": "Duplicate Nonce" }));

        let request = AddTransactionRequest {
            id: "aa".to_string(),
            from: "bb".to_string(),
            to: "bb".to_string(),
            timestamp: "2024:01:01-00:00:00".to_string(),
            payload: "cc".to_string(),
            nonce: "1".to_string(),
            signature: "dd".to_string(),
            blockchain: "ee".to_string(),
            tx_type: "C_TYPE_CERTIFICATE".to_string(),
            version: "1.0.13".to_string(),
        };
        let err = client(&transport)
            .add_transaction(&target(), &request)
            .await
            .unwrap_err();
        assert!(matches!(
            &err,
            GatewayError::Api { status_code: 108, message, .. } if message == "Duplicate Nonce"
        ));
        assert_eq!(err.response().unwrap()["Result"], 108);
        assert_eq!(
            transport.requests()[0].url,
            "http://nag.test/?cep=Circular_AddTransaction_testnet"
        );
    }

    #[tokio::test]
    async fn test_transaction_by_id_request_and_404() {
        let transport = ScriptedTransport::new();
        transport.reply_json(json!({ "Result": 404, "Response": null }));
        transport.reply_json(json!({ "Result": 500, "Response": "boom" }));

        let gateway = client(&transport);
        let body = gateway
            .transaction_by_id(&target(), "0x0A", "0xFF", 0, 10, "1.0.13")
            .await
            .unwrap();
        assert_eq!(body["Result"], 404);

        let request = &transport.requests()[0];
        assert_eq!(
            request.url,
            "http://nag.test/?cep=Circular_GetTransactionbyID_testnet"
        );
        assert_eq!(
            request.body,
            Some(json!({
                "Blockchain": "0a",
                "ID": "ff",
                "Start": "0",
                "End": "10",
                "Version": "1.0.13",
            }))
        );

        let err = gateway
            .transaction_by_id(&target(), "0a", "ff", 5, 5, "1.0.13")
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Api { status_code: 500, .. }));
    }
}
