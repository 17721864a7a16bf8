//! Wire formats.
//!
//! Rows come from an untrusted server, so parsing is deliberately lenient: a
//! row is read field by field and every field is optional. Shape checks happen
//! afterwards in [`WireMessage::validate`], where a bad row becomes a
//! row-level [`SyncError::Format`] instead of failing the whole batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use veilroom_crypto::{EncryptedEnvelope, IV_SIZE, RoomKey, TAG_SIZE, encrypt};

use crate::{RoomId, SyncError};

/// Hex length of a 12-byte IV.
pub const IV_HEX_LEN: usize = IV_SIZE * 2;

/// Minimum hex length of an encrypted field (the tag alone).
pub const MIN_CIPHER_HEX_LEN: usize = TAG_SIZE * 2;

/// Largest page the server will return.
pub const MAX_PAGE_LIMIT: u32 = 1000;

/// A message row as stored by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Server-assigned, strictly increasing id
    #[serde(default)]
    pub id: Option<u64>,
    /// Room the row belongs to
    #[serde(default)]
    pub room: Option<String>,
    /// Encrypted author name (hex)
    #[serde(default)]
    pub user: Option<String>,
    /// IV of the author envelope (hex)
    #[serde(default)]
    pub user_iv: Option<String>,
    /// Encrypted body (hex)
    #[serde(default)]
    pub content: Option<String>,
    /// IV of the body envelope (hex)
    #[serde(default)]
    pub iv: Option<String>,
    /// ISO-8601 server timestamp
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl WireMessage {
    /// Read a row from arbitrary JSON, keeping whatever fields are usable.
    ///
    /// Returns `None` only if the value is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |name: &str| object.get(name).and_then(Value::as_str).map(str::to_owned);

        Some(Self {
            id: object.get("id").and_then(Value::as_u64),
            room: text("room"),
            user: text("user"),
            user_iv: text("user_iv"),
            content: text("content"),
            iv: text("iv"),
            timestamp: text("timestamp"),
        })
    }

    /// Check that the row belongs to `room` and has a decryptable shape.
    ///
    /// # Errors
    ///
    /// - `Format` if the id is missing, the room differs, an IV is not 24 hex
    ///   chars, or an encrypted field is shorter than a bare tag
    pub fn validate(&self, room: &RoomId) -> Result<SealedRow, SyncError> {
        let id = self.id.ok_or_else(|| SyncError::format("missing id"))?;

        match self.room.as_deref() {
            Some(r) if room.matches(r) => {},
            other => {
                return Err(SyncError::format(format!("row for room {other:?}, expected {room}")));
            },
        }

        let user = envelope("user", self.user.as_deref(), self.user_iv.as_deref())?;
        let content = envelope("content", self.content.as_deref(), self.iv.as_deref())?;

        Ok(SealedRow { id, user, content, timestamp: self.timestamp.clone() })
    }
}

fn envelope(
    field: &str,
    cipher: Option<&str>,
    iv: Option<&str>,
) -> Result<EncryptedEnvelope, SyncError> {
    let iv = iv.unwrap_or_default();
    if iv.len() != IV_HEX_LEN {
        return Err(SyncError::format(format!(
            "{field} iv is {} hex chars, expected {IV_HEX_LEN}",
            iv.len()
        )));
    }

    let cipher = cipher.unwrap_or_default();
    if cipher.len() < MIN_CIPHER_HEX_LEN {
        return Err(SyncError::format(format!(
            "{field} ciphertext is {} hex chars, need at least {MIN_CIPHER_HEX_LEN}",
            cipher.len()
        )));
    }

    Ok(EncryptedEnvelope { cipher_hex: cipher.to_owned(), iv_hex: iv.to_owned() })
}

/// A row that passed shape validation but is still encrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedRow {
    /// Server id
    pub id: u64,
    /// Encrypted author name
    pub user: EncryptedEnvelope,
    /// Encrypted body
    pub content: EncryptedEnvelope,
    /// Server timestamp, if the row had one
    pub timestamp: Option<String>,
}

/// Parse a JSON array of rows, skipping non-object entries.
pub fn parse_rows(values: &[Value]) -> Vec<WireMessage> {
    values
        .iter()
        .filter_map(|value| {
            let row = WireMessage::from_value(value);
            if row.is_none() {
                tracing::debug!("skipping non-object row");
            }
            row
        })
        .collect()
}

/// Body of a send request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessage {
    /// Encrypted author name (hex)
    pub user: String,
    /// IV of the author envelope (hex)
    pub user_iv: String,
    /// Encrypted body (hex)
    pub content: String,
    /// IV of the body envelope (hex)
    pub iv: String,
}

impl NewMessage {
    /// Encrypt author and body under the room key with their own IVs.
    pub fn seal(
        user: &str,
        content: &str,
        key: &RoomKey,
        user_iv: [u8; IV_SIZE],
        content_iv: [u8; IV_SIZE],
    ) -> Self {
        let user = encrypt(user, key, user_iv);
        let content = encrypt(content, key, content_iv);
        Self {
            user: user.cipher_hex,
            user_iv: user.iv_hex,
            content: content.cipher_hex,
            iv: content.iv_hex,
        }
    }
}

/// Client-to-server request on the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    /// Always `"fetch"`
    pub action: &'static str,
    /// Only rows after this id; omitted for full history
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_id: Option<u64>,
}

impl FetchRequest {
    /// History request resuming after `cursor` (full history when zero).
    pub fn since(cursor: u64) -> Self {
        Self { action: "fetch", since_id: (cursor > 0).then_some(cursor) }
    }
}

/// Server-to-client event on the push channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// Backlog sent once in answer to a fetch
    History {
        /// Raw rows, parsed leniently
        #[serde(default)]
        messages: Vec<Value>,
    },
    /// One newly stored row
    Message {
        /// Raw row, parsed leniently
        message: Value,
    },
    /// Every message in the room was deleted
    RoomNuked {
        /// Room that was cleared
        #[serde(default)]
        room: Option<String>,
        /// Number of rows removed
        #[serde(default)]
        deleted_count: u64,
    },
    /// Any event type this client does not know
    #[serde(other)]
    Unknown,
}

impl PushEvent {
    /// Rows carried by this event, in order.
    pub fn rows(&self) -> Vec<WireMessage> {
        match self {
            Self::History { messages } => parse_rows(messages),
            Self::Message { message } => WireMessage::from_value(message).into_iter().collect(),
            Self::RoomNuked { .. } | Self::Unknown => Vec::new(),
        }
    }
}
