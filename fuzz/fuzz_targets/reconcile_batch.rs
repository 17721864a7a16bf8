//! Fuzz target for batch reconciliation
//!
//! # Strategy
//!
//! - Mix of well-formed sealed rows and arbitrary JSON values
//! - Repeated, reordered and foreign-room ids
//! - Pending local messages that may or may not be echoed
//!
//! # Invariants
//!
//! - NEVER panic on any batch
//! - Server ids are never shared by two records
//! - Cursor equals the highest id observed
//! - Reapplying a batch creates nothing

#![no_main]

use std::collections::HashSet;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use veilroom_client::{Cursor, MessageIndex, reconcile};
use veilroom_core::{
    DecryptedMessage, MessageState, RoomId,
    wire::{NewMessage, WireMessage, parse_rows},
};
use veilroom_crypto::{KEY_SIZE, RoomKey};

const ROOM: &str = "0123456789abcdef";

#[derive(Debug, Arbitrary)]
enum Row {
    Sealed { id: u8, user: u8, content: u8, foreign: bool },
    Json(String),
}

#[derive(Debug, Arbitrary)]
struct Input {
    pending: Vec<(u8, u8)>,
    rows: Vec<Row>,
}

fn sealed(id: u8, user: u8, content: u8, foreign: bool, key: &RoomKey) -> WireMessage {
    let body = NewMessage::seal(&format!("user{user}"), &format!("msg {content}"), key, [id; 12], [!id; 12]);
    WireMessage {
        id: Some(u64::from(id)),
        room: Some(if foreign { "fedcba9876543210".to_owned() } else { ROOM.to_owned() }),
        user: Some(body.user),
        user_iv: Some(body.user_iv),
        content: Some(body.content),
        iv: Some(body.iv),
        timestamp: Some(format!("2025-01-01T00:00:{:02}Z", id % 60)),
    }
}

fuzz_target!(|input: Input| {
    let Some(room) = RoomId::parse(ROOM) else {
        return;
    };
    let key = RoomKey::from_bytes([1; KEY_SIZE]);

    let mut rows = Vec::new();
    for row in input.rows {
        match row {
            Row::Sealed { id, user, content, foreign } => {
                rows.push(sealed(id, user, content, foreign, &key));
            },
            Row::Json(text) => {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                    rows.extend(parse_rows(&[value]));
                }
            },
        }
    }

    let mut index = MessageIndex::new();
    for (user, content) in input.pending {
        index.insert(DecryptedMessage {
            server_id: None,
            user: format!("user{user}"),
            content: format!("msg  {content}"),
            timestamp: "2025-01-01T00:00:00.000Z".to_owned(),
            state: MessageState::Pending,
        });
    }

    let mut cursor = Cursor::default();
    reconcile(&mut index, &mut cursor, &room, &key, &rows);
    let len = index.len();
    let again = reconcile(&mut index, &mut cursor, &room, &key, &rows);

    assert!(again.created.is_empty());
    assert_eq!(index.len(), len);
    assert_eq!(cursor.last_seen_id(), rows.iter().filter_map(|r| r.id).max().unwrap_or(0));

    let ids: Vec<_> = index.iter().filter_map(|(_, m)| m.server_id).collect();
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(ids.len(), unique.len());
});
