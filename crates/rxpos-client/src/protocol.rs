//! # Wire Protocol
//!
//! Request parameters and response envelopes of the pharmacy REST backend.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Method  Path               Request                 Response            │
//! │  ──────  ─────────────────  ──────────────────────  ─────────────────── │
//! │  GET     inventory/stock    search, limit, branch   { data: [StockRow]} │
//! │  GET     customers          search, limit           { data: [Customer]} │
//! │  GET     sales              HistoryQuery            { data: [Summary] } │
//! │  POST    sales              SaleOrder               { data: Receipt }   │
//! │  POST    face/identify      FaceIdentifyRequest     FaceIdentifyResp.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Listing endpoints are decoded row by row: a row that does not parse is
//! skipped and logged, the rest of the page is kept.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use rxpos_core::types::{Customer, EntityId, FaceMatch};

use crate::error::{ClientError, ClientResult};

pub const STOCK_PATH: &str = "inventory/stock";
pub const CUSTOMERS_PATH: &str = "customers";
pub const SALES_PATH: &str = "sales";
pub const FACE_IDENTIFY_PATH: &str = "face/identify";

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StockSearchParams<'a> {
    pub search: &'a str,
    pub limit: u32,
    pub branch_id: &'a EntityId,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerSearchParams<'a> {
    pub search: &'a str,
    pub limit: u32,
}

/// Body of the face identify call.
#[derive(Debug, Clone, Serialize)]
pub struct FaceIdentifyRequest {
    #[serde(rename = "imageBase64")]
    pub image_base64: String,
    pub org_id: Option<EntityId>,
    pub store_id: EntityId,
}

impl FaceIdentifyRequest {
    pub fn new(image: &[u8], org_id: Option<EntityId>, store_id: EntityId) -> Self {
        FaceIdentifyRequest {
            image_base64: STANDARD.encode(image),
            org_id,
            store_id,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Answer of the face matcher.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaceIdentifyResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub recognition_log_id: Option<Value>,
}

impl From<FaceIdentifyResponse> for FaceMatch {
    fn from(resp: FaceIdentifyResponse) -> Self {
        match (resp.ok, resp.customer) {
            (true, Some(customer)) => FaceMatch::Matched {
                customer,
                recognition_log_id: resp.recognition_log_id.and_then(|v| match v {
                    Value::String(s) if !s.is_empty() => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                }),
            },
            _ => FaceMatch::NoMatch,
        }
    }
}

/// Takes the `data` member of an envelope, or the body itself when the
/// backend answered without one.
pub fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decodes a listing, skipping rows that do not parse.
pub fn decode_rows<T: DeserializeOwned>(body: Value) -> ClientResult<Vec<T>> {
    match unwrap_envelope(body) {
        Value::Array(rows) => Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<T>(row) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    debug!(error = %e, "Skipping unparseable row");
                    None
                }
            })
            .collect()),
        Value::Null => Ok(Vec::new()),
        other => Err(ClientError::Decode(format!(
            "expected a list, got {}",
            kind_of(&other)
        ))),
    }
}

/// Decodes a single enveloped record.
pub fn decode_record<T: DeserializeOwned>(body: Value) -> ClientResult<T> {
    Ok(serde_json::from_value(unwrap_envelope(body))?)
}

/// Best-effort human message from an error body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "error"]
                .iter()
                .find_map(|key| v.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_default()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxpos_core::types::StockRow;
    use rxpos_core::submission::SaleReceipt;
    use serde_json::json;

    #[test]
    fn test_listing_envelope_and_bad_rows() {
        let body = json!({"data": [
            {"id": 1, "first_name": "Asha"},
            {"first_name": "no id"},
            {"id": "c-3"}
        ]});
        let customers: Vec<Customer> = decode_rows(body).unwrap();
        assert_eq!(customers.len(), 2);
        assert_eq!(customers[1].id, EntityId::Text("c-3".into()));
    }

    #[test]
    fn test_listing_without_envelope() {
        let rows: Vec<StockRow> = decode_rows(json!([{"stock_id": 4}])).unwrap();
        assert_eq!(rows[0].stock_id, Some(EntityId::Int(4)));

        let none: Vec<StockRow> = decode_rows(json!({"data": null})).unwrap();
        assert!(none.is_empty());

        assert!(decode_rows::<StockRow>(json!({"data": "oops"})).is_err());
    }

    #[test]
    fn test_record_envelope() {
        let receipt: SaleReceipt =
            decode_record(json!({"data": {"invoice_number": "INV-12", "id": 12}})).unwrap();
        assert_eq!(receipt.invoice_number.as_deref(), Some("INV-12"));
    }

    #[test]
    fn test_face_response_mapping() {
        let matched: FaceIdentifyResponse = serde_json::from_value(json!({
            "ok": true,
            "customer": {"id": 9, "first_name": "Ravi"},
            "recognition_log_id": 314
        }))
        .unwrap();
        match FaceMatch::from(matched) {
            FaceMatch::Matched {
                customer,
                recognition_log_id,
            } => {
                assert_eq!(customer.id, EntityId::Int(9));
                assert_eq!(recognition_log_id.as_deref(), Some("314"));
            }
            FaceMatch::NoMatch => panic!("expected a match"),
        }

        let ok_without_customer: FaceIdentifyResponse =
            serde_json::from_value(json!({"ok": true})).unwrap();
        assert_eq!(FaceMatch::from(ok_without_customer), FaceMatch::NoMatch);

        let no: FaceIdentifyResponse =
            serde_json::from_value(json!({"ok": false, "customer": {"id": 1}})).unwrap();
        assert_eq!(FaceMatch::from(no), FaceMatch::NoMatch);
    }

    #[test]
    fn test_face_request_encodes_image() {
        let req = FaceIdentifyRequest::new(b"jpeg", Some(EntityId::Int(1)), EntityId::Int(3));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"imageBase64": "anBlZw==", "org_id": 1, "store_id": 3})
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"message":"Insufficient stock"}"#), "Insufficient stock");
        assert_eq!(error_message(r#"{"error":"Unauthorized"}"#), "Unauthorized");
        assert_eq!(error_message("<html>502</html>"), "");
    }
}
