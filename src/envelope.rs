#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::error::BridgeError;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One JSON document per CLI invocation.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    pub rid: String,
    pub t: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Box<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<Box<EnvelopeError>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnvelopeError {
    pub code: String,
    pub msg: String,
}

impl Envelope {
    #[must_use]
    pub fn success(rid: String, data: Value) -> Self {
        Self {
            ok: true,
            rid,
            t: Utc::now().timestamp_millis(),
            ms: None,
            d: Some(Box::new(data)),
            err: None,
            fix: None,
        }
    }

    #[must_use]
    pub fn error(rid: String, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            rid,
            t: Utc::now().timestamp_millis(),
            ms: None,
            d: None,
            err: Some(Box::new(EnvelopeError {
                code: code.into(),
                msg: msg.into(),
            })),
            fix: None,
        }
    }

    #[must_use]
    pub fn from_error(rid: String, error: &BridgeError) -> Self {
        let envelope = Self::error(rid, error.code(), error.to_string());
        match crate::error::get_error_info(error.code()) {
            Some((_, fix)) => envelope.with_fix(fix.to_string()),
            None => envelope,
        }
    }

    /// A completed command whose remote part did not succeed: data is kept,
    /// `ok` is false.
    #[must_use]
    pub fn unsuccessful(rid: String, data: Value, code: &str, msg: impl Into<String>) -> Self {
        let mut envelope = Self::error(rid, code, msg);
        envelope.d = Some(Box::new(data));
        envelope
    }

    #[must_use]
    pub const fn with_ms(mut self, ms: i64) -> Self {
        self.ms = Some(ms);
        self
    }

    #[must_use]
    pub fn with_fix(mut self, fix: String) -> Self {
        self.fix = Some(fix);
        self
    }
}

#[must_use]
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::{new_request_id, Envelope};
    use crate::error::BridgeError;
    use serde_json::json;

    #[test]
    fn success_envelope_omits_error_fields() -> Result<(), String> {
        let value = serde_json::to_value(Envelope::success("r1".to_string(), json!({"a": 1})))
            .map_err(|e| e.to_string())?;
        assert_eq!(value["ok"], true);
        assert_eq!(value["d"]["a"], 1);
        assert!(value.get("err").is_none());
        Ok(())
    }

    #[test]
    fn error_envelope_carries_code_and_fix() -> Result<(), String> {
        let error = BridgeError::MissingCredential("no key".to_string());
        let value = serde_json::to_value(Envelope::from_error("r2".to_string(), &error).with_ms(3))
            .map_err(|e| e.to_string())?;
        assert_eq!(value["ok"], false);
        assert_eq!(value["err"]["code"], "MISSING_CREDENTIAL");
        assert_eq!(value["ms"], 3);
        assert!(value["fix"].is_string());
        Ok(())
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(new_request_id(), new_request_id());
    }
}
