//! Failure envelope encoders.
//!
//! Both encoders take the same [`ErrorEnvelope`] and yield a camelCase JSON
//! object with identical fields. [`TypedEncoder`] fixes the names with serde
//! attributes on a wire type; [`NamingPolicyEncoder`] serializes the canonical
//! PascalCase shape and rewrites every key through a camelCase policy.

use std::sync::Arc;

use common::ErrorEnvelope;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SerializerKind;

/// Writes a failure envelope as a response body.
pub trait ErrorEncoder: Send + Sync {
    fn name(&self) -> &'static str;

    fn encode(&self, envelope: &ErrorEnvelope) -> serde_json::Result<Vec<u8>>;
}

/// Wire shape of a failure body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub succeeded: bool,
    pub status_code: u16,
    pub exception: String,
    pub error_id: String,
    pub support_message: String,
    pub source: Option<String>,
    #[serde(rename = "remoteIP")]
    pub remote_ip: String,
    pub messages: Vec<String>,
}

impl From<&ErrorEnvelope> for ErrorBody {
    fn from(envelope: &ErrorEnvelope) -> Self {
        Self {
            succeeded: envelope.succeeded,
            status_code: envelope.status_code,
            exception: envelope.exception.clone(),
            error_id: envelope.error_id.clone(),
            support_message: envelope.support_message.clone(),
            source: envelope.source.clone(),
            remote_ip: envelope.remote_ip.clone(),
            messages: envelope.messages.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TypedEncoder;

impl ErrorEncoder for TypedEncoder {
    fn name(&self) -> &'static str {
        "typed"
    }

    fn encode(&self, envelope: &ErrorEnvelope) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&ErrorBody::from(envelope))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NamingPolicyEncoder;

impl ErrorEncoder for NamingPolicyEncoder {
    fn name(&self) -> &'static str {
        "policy"
    }

    fn encode(&self, envelope: &ErrorEnvelope) -> serde_json::Result<Vec<u8>> {
        let value = serde_json::to_value(envelope)?;
        serde_json::to_vec(&rename_keys(value))
    }
}

/// Returns the encoder selected by configuration.
pub fn encoder_for(kind: SerializerKind) -> Arc<dyn ErrorEncoder> {
    match kind {
        SerializerKind::Typed => Arc::new(TypedEncoder),
        SerializerKind::Policy => Arc::new(NamingPolicyEncoder),
    }
}

fn rename_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (camel_case(&key), rename_keys(value)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(rename_keys).collect()),
        other => other,
    }
}

/// Lowercases the leading run of capitals, keeping the last capital of a run
/// that starts the next word (`RemoteIP` -> `remoteIP`, `IPAddress` -> `ipAddress`).
pub(crate) fn camel_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len());
    let mut lowering = true;

    for (i, c) in chars.iter().enumerate() {
        if lowering && c.is_uppercase() {
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if i > 0 && next_is_lower {
                lowering = false;
                out.push(*c);
            } else {
                out.extend(c.to_lowercase());
            }
        } else {
            lowering = false;
            out.push(*c);
        }
    }
    out
}
