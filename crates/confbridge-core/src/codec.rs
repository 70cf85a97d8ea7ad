// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payload codec: every argument that crosses the runtime boundary travels as
// a single UTF-8 JSON text ("stringified params").
//
// Decoding never panics.  Malformed text surfaces as
// `BridgeError::PayloadDecode` carrying the text that failed, so the caller
// can drop the call and report it as an event.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{BridgeError, Result};
use crate::types::EventBody;

/// Encode any serializable value as JSON text.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode JSON text into a typed value.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| BridgeError::payload(text, e))
}

/// Decode JSON text into an untyped value tree.
pub fn decode_value(text: &str) -> Result<Value> {
    decode(text)
}

/// Encode positional arguments as a JSON array.
pub fn encode_params(params: &[Value]) -> Result<String> {
    encode(params)
}

/// Decode positional arguments.
///
/// Empty text and `null` both mean "no arguments".  Anything else must be a
/// JSON array.
pub fn decode_params(text: &str) -> Result<Vec<Value>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    match decode_value(text)? {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        other => Err(BridgeError::payload(
            text,
            format!("expected a JSON array of arguments, got {}", kind_of(&other)),
        )),
    }
}

/// Decode an event body.  Empty text is an empty body; anything else must be
/// a JSON object.
pub fn decode_body(text: &str) -> Result<EventBody> {
    if text.trim().is_empty() {
        return Ok(EventBody::new());
    }

    match decode_value(text)? {
        Value::Null => Ok(EventBody::new()),
        Value::Object(map) => Ok(map),
        other => Err(BridgeError::payload(
            text,
            format!("expected a JSON object, got {}", kind_of(&other)),
        )),
    }
}

/// Render a result value the way native listeners receive it: objects and
/// arrays as JSON text, scalars unchanged.
pub fn stringify_compound(value: Value) -> Result<Value> {
    match value {
        Value::Object(_) | Value::Array(_) => Ok(Value::String(encode(&value)?)),
        scalar => Ok(scalar),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
