//! Classification of unpacked MessagePack values.
//!
//! Payloads are converted to JSON one IPC entry at a time. `bin` becomes
//! an array of byte values, the timestamp extension (-1) becomes epoch
//! milliseconds, extension 0 (the renderer's `undefined`) becomes `null`,
//! and any other extension becomes `{"ext": type, "data": [bytes]}`.
//! An entry that still cannot be converted (a string that is not UTF-8,
//! a map key that is not a scalar) is skipped on its own.

use lotus_common::{DecodeError, WindowId};
use rmpv::Value;
use serde_json::Value as Json;
use tracing::debug;

use crate::events::{AppReadyInfo, DecodedMessage, IpcPair, LoadStatus, WindowEventKind};

/// Extension type the renderer uses for `undefined`.
const EXT_UNDEFINED: i8 = 0;
/// MessagePack timestamp extension.
const EXT_TIMESTAMP: i8 = -1;

/// Turn an unpacked value into a message.
pub fn classify(value: Value) -> Result<DecodedMessage, DecodeError> {
    match value {
        Value::Map(entries) => classify_event(&entries),
        Value::Array(items) => classify_array(items),
        Value::Nil => Err(DecodeError::UnexpectedShape("nil")),
        Value::Boolean(_) => Err(DecodeError::UnexpectedShape("boolean")),
        Value::Integer(_) | Value::F32(_) | Value::F64(_) => {
            Err(DecodeError::UnexpectedShape("number"))
        }
        Value::String(_) => Err(DecodeError::UnexpectedShape("string")),
        Value::Binary(_) => Err(DecodeError::UnexpectedShape("binary")),
        Value::Ext(..) => Err(DecodeError::UnexpectedShape("extension")),
    }
}

fn classify_event(map: &[(Value, Value)]) -> Result<DecodedMessage, DecodeError> {
    let event = field(map, "event")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingEvent)?;

    let kind = match event {
        "app-ready" => {
            return Ok(DecodedMessage::AppReady(AppReadyInfo {
                ipc_port: field(map, "ipc_port")
                    .and_then(Value::as_u64)
                    .and_then(|p| u16::try_from(p).ok()),
                ipc_token: field(map, "ipc_token")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            }));
        }
        "ready" => WindowEventKind::Ready,
        "load-status" => WindowEventKind::LoadStatus(LoadStatus::from_wire(
            field(map, "status").and_then(Value::as_str).unwrap_or_default(),
        )),
        "frame-ready" => WindowEventKind::FrameReady,
        "window-closed" => WindowEventKind::Closed,
        "resized" => WindowEventKind::Resized {
            width: field_u32(map, "width"),
            height: field_u32(map, "height"),
        },
        "moved" => WindowEventKind::Moved {
            x: field_i32(map, "x"),
            y: field_i32(map, "y"),
        },
        "focused" => WindowEventKind::Focused,
        "unfocused" => WindowEventKind::Unfocused,
        other => return Err(DecodeError::UnknownEvent(other.to_string())),
    };

    Ok(DecodedMessage::WindowEvent {
        window_id: field(map, "window_id").and_then(Value::as_u64).map(WindowId),
        kind,
    })
}

fn classify_array(items: Vec<Value>) -> Result<DecodedMessage, DecodeError> {
    if let [Value::String(_), _] = items.as_slice() {
        return ipc_entry(items)
            .map(DecodedMessage::IpcPair)
            .ok_or(DecodeError::UnexpectedShape("ipc payload"));
    }

    let total = items.len();
    let pairs: Vec<IpcPair> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::Array(inner) => ipc_entry(inner),
            _ => None,
        })
        .collect();

    if pairs.len() != total {
        debug!(
            total,
            kept = pairs.len(),
            "skipped malformed entries in IPC batch"
        );
    }
    Ok(DecodedMessage::IpcBatch(pairs))
}

/// `[channel, payload]`. A scalar channel is stringified the way the
/// renderer would key it.
fn ipc_entry(items: Vec<Value>) -> Option<IpcPair> {
    let [channel, payload] = <[Value; 2]>::try_from(items).ok()?;
    Some(IpcPair {
        channel: scalar_key(channel)?,
        payload: to_json(payload)?,
    })
}

/// Convert a MessagePack value to JSON. `None` if some part of it has no
/// JSON form.
pub fn to_json(value: Value) -> Option<Json> {
    Some(match value {
        Value::Nil => Json::Null,
        Value::Boolean(b) => Json::Bool(b),
        Value::Integer(n) => match n.as_u64() {
            Some(u) => Json::from(u),
            None => Json::from(n.as_i64()?),
        },
        Value::F32(f) => float(f64::from(f)),
        Value::F64(f) => float(f),
        Value::String(s) => Json::String(s.into_str()?),
        Value::Binary(bytes) => Json::Array(bytes.into_iter().map(Json::from).collect()),
        Value::Array(items) => Json::Array(
            items
                .into_iter()
                .map(to_json)
                .collect::<Option<Vec<_>>>()?,
        ),
        Value::Map(entries) => Json::Object(
            entries
                .into_iter()
                .map(|(k, v)| Some((scalar_key(k)?, to_json(v)?)))
                .collect::<Option<serde_json::Map<_, _>>>()?,
        ),
        Value::Ext(EXT_UNDEFINED, _) => Json::Null,
        Value::Ext(EXT_TIMESTAMP, data) => timestamp_millis(&data).map_or(Json::Null, float),
        Value::Ext(tag, data) => serde_json::json!({ "ext": tag, "data": data }),
    })
}

/// Strings as-is; numbers, booleans and nil as their text.
fn scalar_key(value: Value) -> Option<String> {
    match value {
        Value::String(s) => s.into_str(),
        Value::Integer(n) => n
            .as_u64()
            .map(|u| u.to_string())
            .or_else(|| n.as_i64().map(|i| i.to_string())),
        Value::F32(f) => Some(f64::from(f).to_string()),
        Value::F64(f) => Some(f.to_string()),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Nil => Some("null".to_string()),
        Value::Binary(_) | Value::Array(_) | Value::Map(_) | Value::Ext(..) => None,
    }
}

/// Non-finite floats have no JSON form and become `null`.
fn float(f: f64) -> Json {
    serde_json::Number::from_f64(f).map_or(Json::Null, Json::Number)
}

/// Decode the 32, 64 and 96-bit timestamp layouts.
fn timestamp_millis(data: &[u8]) -> Option<f64> {
    let (secs, nanos) = match data.len() {
        4 => (i64::from(u32::from_be_bytes(data.try_into().ok()?)), 0u32),
        8 => {
            let raw = u64::from_be_bytes(data.try_into().ok()?);
            // 30-bit nanoseconds over a 34-bit seconds field
            ((raw & 0x3_ffff_ffff) as i64, (raw >> 34) as u32)
        }
        12 => (
            i64::from_be_bytes(data[4..].try_into().ok()?),
            u32::from_be_bytes(data[..4].try_into().ok()?),
        ),
        _ => return None,
    };
    Some(secs as f64 * 1000.0 + f64::from(nanos) / 1_000_000.0)
}

fn field<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

fn field_u32(map: &[(Value, Value)], key: &str) -> u32 {
    field(map, key)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

fn field_i32(map: &[(Value, Value)], key: &str) -> i32 {
    field(map, key)
        .and_then(Value::as_i64)
        .and_then(|v| i32::try_from(v).ok())
        .unwrap_or(0)
}
