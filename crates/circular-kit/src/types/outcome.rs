//! Transaction lookup outcomes.

use std::fmt;

use serde_json::Value;

use crate::error::GatewayError;

/// The `Response` string the gateway uses for an unknown transaction.
pub const TRANSACTION_NOT_FOUND: &str = "Transaction Not Found";

/// Status of a transaction as reported by a lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TxStatus {
    /// Known to the gateway but not final yet.
    Pending,
    /// Not visible yet in the searched block range.
    NotFound,
    Confirmed,
    Executed,
    Failed,
    /// Any other final status string.
    Other(String),
}

impl TxStatus {
    fn from_status(status: &str) -> Self {
        match status {
            "Pending" => TxStatus::Pending,
            "Confirmed" => TxStatus::Confirmed,
            "Executed" => TxStatus::Executed,
            "Failed" => TxStatus::Failed,
            other => TxStatus::Other(other.to_string()),
        }
    }

    /// Terminal statuses end polling. `Pending` and `NotFound` do not.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TxStatus::Pending | TxStatus::NotFound)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::Pending => f.write_str("Pending"),
            TxStatus::NotFound => f.write_str(TRANSACTION_NOT_FOUND),
            TxStatus::Confirmed => f.write_str("Confirmed"),
            TxStatus::Executed => f.write_str("Executed"),
            TxStatus::Failed => f.write_str("Failed"),
            TxStatus::Other(s) => f.write_str(s),
        }
    }
}

/// A classified transaction lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct Outcome {
    pub status: TxStatus,
    /// The `Response` member of the lookup, `null` when absent.
    pub response: Value,
}

impl Outcome {
    /// Classify a raw `Circular_GetTransactionbyID_` body.
    ///
    /// `Result` 404, a `null` response and the "Transaction Not Found"
    /// string all mean [`TxStatus::NotFound`]. A response object is classified
    /// by its `Status` member. Anything else is a malformed response.
    pub fn from_lookup(body: &Value) -> Result<Self, GatewayError> {
        let result = body
            .get("Result")
            .and_then(Value::as_i64)
            .ok_or_else(|| GatewayError::invalid_response("missing Result field"))?;
        let response = body.get("Response").cloned().unwrap_or(Value::Null);

        match result {
            200 => {}
            404 => {
                return Ok(Self {
                    status: TxStatus::NotFound,
                    response,
                });
            }
            code => {
                let message = response
                    .as_str()
                    .unwrap_or("transaction lookup failed")
                    .to_string();
                return Err(GatewayError::Api {
                    status_code: code,
                    message,
                    response: Some(body.clone()),
                });
            }
        }

        let status = match &response {
            Value::Null => TxStatus::NotFound,
            Value::String(s) if s == TRANSACTION_NOT_FOUND => TxStatus::NotFound,
            Value::Object(map) => match map.get("Status").and_then(Value::as_str) {
                Some(status) => TxStatus::from_status(status),
                None => {
                    return Err(GatewayError::invalid_response(
                        "transaction response has no Status",
                    ));
                }
            },
            other => {
                return Err(GatewayError::invalid_response(format!(
                    "unexpected transaction response: {other}"
                )));
            }
        };

        Ok(Self { status, response })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_found_string() {
        let body = json!({ "Result": 200, "Response": "Transaction Not Found" });
        let outcome = Outcome::from_lookup(&body).unwrap();
        assert_eq!(outcome.status, TxStatus::NotFound);
        assert!(!outcome.is_terminal());
    }

    #[test]
    fn test_result_404_is_not_an_error() {
        let body = json!({ "Result": 404, "Response": null });
        let outcome = Outcome::from_lookup(&body).unwrap();
        assert_eq!(outcome.status, TxStatus::NotFound);
        assert_eq!(outcome.response, Value::Null);
    }

    #[test]
    fn test_pending() {
        let body = json!({ "Result": 200, "Response": { "Status": "Pending" } });
        let outcome = Outcome::from_lookup(&body).unwrap();
        assert_eq!(outcome.status, TxStatus::Pending);
        assert!(!outcome.is_terminal());
    }

    #[test]
    fn test_terminal_statuses() {
        for (status, expected) in [
            ("Confirmed", TxStatus::Confirmed),
            ("Executed", TxStatus::Executed),
            ("Failed", TxStatus::Failed),
            ("Rejected", TxStatus::Other("Rejected".to_string())),
        ] {
            let body = json!({
                "Result": 200,
                "Response": { "Status": status, "BlockID": "12" }
            });
            let outcome = Outcome::from_lookup(&body).unwrap();
            assert_eq!(outcome.status, expected);
            assert!(outcome.is_terminal());
            assert_eq!(outcome.response["BlockID"], "12");
        }
    }

    #[test]
    fn test_malformed_responses() {
        let cases = [
            json!({ "Response": "Transaction Not Found" }),
            json!({ "Result": "200", "Response": null }),
            json!({ "Result": 200, "Response": { "ID": "abc" } }),
            json!({ "Result": 200, "Response": "something else" }),
            json!({ "Result": 200, "Response": 5 }),
        ];
        for body in cases {
            assert!(
                matches!(
                    Outcome::from_lookup(&body),
                    Err(GatewayError::InvalidResponse(_))
                ),
                "body {body}"
            );
        }
    }

    #[test]
    fn test_other_result_is_api_error() {
        let body = json!({ "Result": 500, "Response": "Internal failure" });
        match Outcome::from_lookup(&body) {
            Err(GatewayError::Api {
                status_code,
                message,
                response,
            }) => {
                assert_eq!(status_code, 500);
                assert_eq!(message, "Internal failure");
                assert_eq!(response, Some(body));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_status_display() {
        assert_eq!(TxStatus::Pending.to_string(), "Pending");
        assert_eq!(TxStatus::NotFound.to_string(), "Transaction Not Found");
        assert_eq!(TxStatus::Other("Odd".to_string()).to_string(), "Odd");
    }
}
