// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incoming message classification.
//!
//! The database speaks plain JSON-RPC 1.0: a reply carries `id` and one
//! of `result`/`error`; a notification carries `"id":null` and a
//! `method`. Only the two shapes the supervisor cares about are
//! recognized: a `list-commands`/`monitor` response and the `update`
//! notification.

use serde_json::Value;

/// The `id` member of an incoming message.
///
/// `Null` is what distinguishes a notification from a response, so the
/// explicit-null case is kept apart from plain absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcId {
    /// No `id` member, or one that is not an integer.
    NotFound,
    /// `"id": null`.
    Null,
    /// A numeric id.
    Num(i64),
}

/// Presence of a well-known top-level member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    /// The member does not appear in the object.
    Absent,
    /// The member appears with an explicit `null` value.
    Null,
    /// The member appears with a non-null value.
    Value(Value),
}

impl Field {
    /// The member's value, when present and non-null.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the member appears at all (null included).
    pub fn is_present(&self) -> bool {
        !matches!(self, Field::Absent)
    }

    fn bind(value: &Value) -> Field {
        if value.is_null() {
            Field::Null
        } else {
            Field::Value(value.clone())
        }
    }
}

/// Classification of an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Carries a `result` member: a reply to one of our requests.
    Response,
    /// `method` is `"update"`: a monitor notification.
    Update,
    /// Anything else; logged and skipped.
    Unknown,
}

/// Parsed view of one top-level JSON-RPC object.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub id: RpcId,
    pub result: Field,
    pub error: Field,
    pub method: Field,
    pub params: Field,
    pub kind: MessageKind,
}

impl Envelope {
    fn from_object(object: &serde_json::Map<String, Value>) -> Self {
        let mut envelope = Envelope {
            id: RpcId::NotFound,
            result: Field::Absent,
            error: Field::Absent,
            method: Field::Absent,
            params: Field::Absent,
            kind: MessageKind::Unknown,
        };

        // Only depth-1 members are examined; anything unrecognized is
        // skipped.
        for (key, value) in object {
            match key.as_str() {
                "id" => {
                    envelope.id = match value {
                        Value::Null => RpcId::Null,
                        Value::Number(n) => n.as_i64().map_or(RpcId::NotFound, RpcId::Num),
                        _ => RpcId::NotFound,
                    };
                }
                "result" => envelope.result = Field::bind(value),
                "error" => envelope.error = Field::bind(value),
                "method" => envelope.method = Field::bind(value),
                "params" => envelope.params = Field::bind(value),
                _ => {}
            }
        }

        envelope.kind = if envelope.result.is_present() {
            MessageKind::Response
        } else if envelope.method.value().and_then(Value::as_str) == Some("update") {
            MessageKind::Update
        } else {
            MessageKind::Unknown
        };

        envelope
    }

    /// Whether this is a response to the request with the given id.
    pub fn is_response_to(&self, id: i64) -> bool {
        self.kind == MessageKind::Response && self.id == RpcId::Num(id)
    }

    /// Whether this is an `update` notification.
    pub fn is_update(&self) -> bool {
        self.kind == MessageKind::Update && self.id == RpcId::Null
    }
}

/// Parse one top-level JSON object from the start of `buf`.
///
/// Returns the envelope and the byte offset just past the object's end,
/// leaving any pipelined bytes after it untouched; the caller slides
/// its receive buffer by the offset and parses again. Returns `None`
/// for incomplete or malformed input, and for a top-level value that is
/// not an object; the caller keeps receiving.
pub fn parse_frame(buf: &[u8]) -> Option<(Envelope, usize)> {
    let mut stream = serde_json::Deserializer::from_slice(buf).into_iter::<Value>();

    let value = match stream.next() {
        Some(Ok(value)) => value,
        Some(Err(_)) | None => return None,
    };
    let end = stream.byte_offset();

    let object = value.as_object()?;
    Some((Envelope::from_object(object), end))
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
