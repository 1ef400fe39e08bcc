/*
[INPUT]:  Raw text frames and outbound request objects
[OUTPUT]: Parsed inbound envelopes and queued outbound messages
[POS]:    WebSocket layer - wire envelope parsing and validation
[UPDATE]: When the envelope discriminator or correlation rules change
*/

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::schema::SchemaRegistry;

/// Discriminator of heartbeat replies
pub const HEARTBEAT_MSG_TYPE: &str = "ping";

const META_KEYS: &[&str] = &["req_id", "passthrough", "subscribe"];

/// Outbound message waiting for (or written to) the socket
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Wire method, for logs
    pub method: String,
    pub payload: Value,
    pub req_id: Option<u64>,
    pub queued_at: DateTime<Utc>,
}

impl OutboundMessage {
    pub fn new(payload: Value) -> Self {
        let method = wire_method_of(&payload).unwrap_or("unknown").to_string();
        let req_id = payload.get("req_id").and_then(Value::as_u64);
        Self {
            method,
            payload,
            req_id,
            queued_at: Utc::now(),
        }
    }

    pub fn to_text(&self) -> String {
        self.payload.to_string()
    }
}

/// Why an inbound frame was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeRejection {
    NotJson,
    NotObject,
    MissingMsgType,
    NonNumericReqId,
}

/// Inbound message that passed envelope checks
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEnvelope {
    msg_type: String,
    req_id: Option<u64>,
    body: Value,
}

impl InboundEnvelope {
    /// Parse a text frame. It must be an object with a string `msg_type`;
    /// a `req_id`, when present, must be a non-negative integer (`7.0` counts).
    pub fn parse(text: &str) -> Result<Self, EnvelopeRejection> {
        let body: Value = serde_json::from_str(text).map_err(|_| EnvelopeRejection::NotJson)?;
        Self::from_value(body)
    }

    pub fn from_value(body: Value) -> Result<Self, EnvelopeRejection> {
        let object = body.as_object().ok_or(EnvelopeRejection::NotObject)?;
        let msg_type = object
            .get("msg_type")
            .and_then(Value::as_str)
            .filter(|msg_type| !msg_type.is_empty())
            .ok_or(EnvelopeRejection::MissingMsgType)?
            .to_string();
        let req_id = match object.get("req_id") {
            None | Some(Value::Null) => None,
            Some(value) => Some(req_id_from(value).ok_or(EnvelopeRejection::NonNumericReqId)?),
        };
        Ok(Self {
            msg_type,
            req_id,
            body,
        })
    }

    pub fn msg_type(&self) -> &str {
        &self.msg_type
    }

    pub fn req_id(&self) -> Option<u64> {
        self.req_id
    }

    /// Server-assigned stream id, present on subscription replies
    pub fn subscription_id(&self) -> Option<&str> {
        self.body
            .get("subscription")
            .and_then(|subscription| subscription.get("id"))
            .and_then(Value::as_str)
    }

    /// Server-reported error object
    pub fn error(&self) -> Option<&Value> {
        self.body.get("error").filter(|error| error.is_object())
    }

    pub fn is_heartbeat(&self) -> bool {
        self.msg_type == HEARTBEAT_MSG_TYPE
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}

/// Integer `req_id`; integral floats such as `7.0` are accepted.
fn req_id_from(value: &Value) -> Option<u64> {
    if let Some(req_id) = value.as_u64() {
        return Some(req_id);
    }
    let raw = value.as_f64()?;
    (raw >= 0.0 && raw.fract() == 0.0 && raw <= u64::MAX as f64).then_some(raw as u64)
}

/// Wire method named by an outbound request object: the first key that is a
/// registered endpoint, else the first key that is not envelope metadata.
pub fn wire_method_of(payload: &Value) -> Option<&str> {
    let object = payload.as_object()?;
    let registry = SchemaRegistry::standard();
    object
        .keys()
        .find(|key| registry.contains(key))
        .or_else(|| object.keys().find(|key| !META_KEYS.contains(&key.as_str())))
        .map(String::as_str)
}

/// Stream type accepted by `forget_all` for a subscribe request.
///
/// History subscriptions stream as `ticks` or `candles` depending on `style`.
pub fn stream_type_of(payload: &Value) -> Option<String> {
    let method = wire_method_of(payload)?;
    if method == "ticks_history" {
        let style = payload.get("style").and_then(Value::as_str);
        return Some(if style == Some("candles") { "candles" } else { "ticks" }.to_string());
    }
    Some(method.to_string())
}

/// Insert `req_id` into a request object.
pub fn with_req_id(mut payload: Value, req_id: u64) -> Value {
    if let Some(object) = payload.as_object_mut() {
        object.insert("req_id".to_string(), Value::from(req_id));
    }
    payload
}

/// Heartbeat request
pub fn heartbeat_request() -> Value {
    let mut object = Map::new();
    object.insert("ping".to_string(), Value::from(1));
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn test_parse_valid_envelope() {
        let envelope = InboundEnvelope::parse(
            r#"{"msg_type":"tick","req_id":7,"subscription":{"id":"abc"},"tick":{"quote":1.5}}"#,
        )
        .unwrap();
        assert_eq!(envelope.msg_type(), "tick");
        assert_eq!(envelope.req_id(), Some(7));
        assert_eq!(envelope.subscription_id(), Some("abc"));
        assert!(envelope.error().is_none());
        assert!(!envelope.is_heartbeat());
    }

    #[rstest]
    #[case("not json", EnvelopeRejection::NotJson)]
    #[case("[1,2]", EnvelopeRejection::NotObject)]
    #[case(r#"{"tick":{}}"#, EnvelopeRejection::MissingMsgType)]
    #[case(r#"{"msg_type":""}"#, EnvelopeRejection::MissingMsgType)]
    #[case(r#"{"msg_type":"tick","req_id":"7"}"#, EnvelopeRejection::NonNumericReqId)]
    #[case(r#"{"msg_type":"tick","req_id":-1}"#, EnvelopeRejection::NonNumericReqId)]
    #[case(r#"{"msg_type":"tick","req_id":7.5}"#, EnvelopeRejection::NonNumericReqId)]
    fn test_parse_rejections(#[case] raw: &str, #[case] expected: EnvelopeRejection) {
        assert_eq!(InboundEnvelope::parse(raw).unwrap_err(), expected);
    }

    #[rstest]
    #[case(r#"{"msg_type":"tick","req_id":7}"#)]
    #[case(r#"{"msg_type":"tick","req_id":7.0}"#)]
    fn test_integral_req_id(#[case] raw: &str) {
        assert_eq!(InboundEnvelope::parse(raw).unwrap().req_id(), Some(7));
    }

    #[test]
    fn test_heartbeat_and_error() {
        let pong = InboundEnvelope::parse(r#"{"msg_type":"ping","ping":"pong"}"#).unwrap();
        assert!(pong.is_heartbeat());

        let failed = InboundEnvelope::parse(
            r#"{"msg_type":"authorize","error":{"code":"InvalidToken","message":"bad"}}"#,
        )
        .unwrap();
        assert_eq!(failed.error().unwrap()["code"], "InvalidToken");
    }

    #[test]
    fn test_outbound_message_metadata() {
        let message = OutboundMessage::new(with_req_id(json!({"balance": 1}), 12));
        assert_eq!(message.method, "balance");
        assert_eq!(message.req_id, Some(12));
        assert_eq!(
            serde_json::from_str::<Value>(&message.to_text()).unwrap(),
            json!({"balance": 1, "req_id": 12})
        );
    }

    #[test]
    fn test_wire_method_ignores_key_order() {
        let request = json!({"end": "latest", "req_id": 1, "subscribe": 1, "ticks_history": "R_100"});
        assert_eq!(wire_method_of(&request), Some("ticks_history"));
        assert_eq!(wire_method_of(&json!({"req_id": 1, "custom": 1})), Some("custom"));
        assert_eq!(wire_method_of(&json!("text")), None);
    }

    #[rstest]
    #[case(json!({"ticks": "R_100"}), "ticks")]
    #[case(json!({"ticks_history": "R_100", "style": "ticks"}), "ticks")]
    #[case(json!({"ticks_history": "R_100", "style": "candles"}), "candles")]
    #[case(json!({"proposal": 1, "amount": 10}), "proposal")]
    fn test_stream_type(#[case] request: Value, #[case] expected: &str) {
        assert_eq!(stream_type_of(&request).as_deref(), Some(expected));
    }

    #[test]
    fn test_heartbeat_request() {
        assert_eq!(heartbeat_request(), json!({"ping": 1}));
    }
}
