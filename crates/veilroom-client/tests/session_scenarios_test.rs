//! End-to-end session scenarios.
//!
//! Drive a [`SyncSession`] with rows produced by the simulated server and
//! check the actions it emits: optimistic sends, promotion, failure,
//! malformed rows and notification rules.

use veilroom_client::{
    ClientAction, ClientError, ClientEvent, MessageEntry, MessageState, Notification, Permission,
    Presence, ScrollIntent, SessionConfig, SyncSession, Viewport,
};
use veilroom_core::{RoomId, wire::WireMessage};
use veilroom_crypto::{KEY_SIZE, RoomKey};
use veilroom_harness::{SimEnv, SimServer};

const ROOM: &str = "0123456789abcdef";

fn room() -> RoomId {
    RoomId::parse(ROOM).unwrap()
}

fn key() -> RoomKey {
    RoomKey::from_hex(&"00".repeat(KEY_SIZE)).unwrap()
}

fn open(env: &SimEnv) -> SyncSession<SimEnv> {
    SyncSession::open(env.clone(), room(), key(), SessionConfig::default())
}

fn at_bottom() -> Viewport {
    Viewport { scroll_top: 0.0, scroll_height: 100.0, client_height: 300.0 }
}

fn away() -> Presence {
    Presence { focused: false, permission: Permission::Granted }
}

fn batch(session: &mut SyncSession<SimEnv>, rows: Vec<WireMessage>) -> Vec<ClientAction> {
    session
        .handle(ClientEvent::BatchReceived { rows, viewport: at_bottom(), presence: away() })
        .unwrap()
}

fn inserted(actions: &[ClientAction]) -> Vec<&MessageEntry> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::Insert(entry) => Some(entry),
            _ => None,
        })
        .collect()
}

fn refreshed(actions: &[ClientAction]) -> Vec<&MessageEntry> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::Refresh(entry) => Some(entry),
            _ => None,
        })
        .collect()
}

fn notifications(actions: &[ClientAction]) -> Vec<&Notification> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::Notify(n) => Some(n),
            _ => None,
        })
        .collect()
}

#[test]
fn send_then_poll_confirms_without_duplicate() {
    let env = SimEnv::with_seed(1);
    let mut server = SimServer::new(env.clone());
    let mut session = open(&env);

    let actions = session.send("alice", "hello").unwrap();

    // Pending bubble first, then input cleared, then the request
    assert!(matches!(&actions[0], ClientAction::Insert(e) if e.message.state == MessageState::Pending));
    assert_eq!(actions[1], ClientAction::ClearInput);
    assert_eq!(actions[2], ClientAction::Scroll(ScrollIntent::StickToBottom));
    let ClientAction::Transmit(outgoing) = &actions[3] else {
        panic!("expected transmit, got {:?}", actions[3]);
    };
    let pending_id = inserted(&actions)[0].id;

    env.advance(std::time::Duration::from_millis(250));
    server.post(&room(), &outgoing.body).unwrap();
    let actions = batch(&mut session, server.fetch(&room(), 0, 1000));

    assert!(inserted(&actions).is_empty());
    let updated = refreshed(&actions);
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].id, pending_id);
    assert_eq!(updated[0].message.state, MessageState::Confirmed);
    assert_eq!(updated[0].message.server_id, Some(1));
    assert_eq!(session.index().len(), 1);
    assert_eq!(session.cursor().last_seen_id(), 1);
}

#[test]
fn pending_timestamp_is_iso_millis_utc() {
    let env = SimEnv::with_seed(2);
    let mut session = open(&env);

    let actions = session.send("alice", "hi").unwrap();
    let entry = inserted(&actions)[0];
    assert_eq!(entry.message.timestamp, "2025-01-01T00:00:00.000Z");
}

#[test]
fn echo_from_send_response_confirms_immediately() {
    let env = SimEnv::with_seed(3);
    let mut server = SimServer::new(env.clone());
    let mut session = open(&env);

    let actions = session.send("alice", "hi").unwrap();
    let Some(ClientAction::Transmit(outgoing)) = actions.last() else {
        panic!("expected transmit");
    };
    let echo = server.post(&room(), &outgoing.body).unwrap();

    let actions = session
        .handle(ClientEvent::SendAccepted {
            plaintext_key: outgoing.plaintext_key.clone(),
            echo: Some(echo),
            viewport: at_bottom(),
            presence: away(),
        })
        .unwrap();

    assert_eq!(refreshed(&actions).len(), 1);
    assert!(notifications(&actions).is_empty());

    // The regular poll that follows changes nothing
    let again = batch(&mut session, server.fetch(&room(), 0, 1000));
    assert!(inserted(&again).is_empty());
    assert_eq!(session.index().len(), 1);
}

#[test]
fn send_failure_marks_exact_entry_and_allows_retry() {
    let env = SimEnv::with_seed(4);
    let mut session = open(&env);

    let first = session.send("alice", "hi").unwrap();
    let Some(ClientAction::Transmit(outgoing)) = first.last() else {
        panic!("expected transmit");
    };

    assert_eq!(session.send("alice", "hi"), Err(ClientError::DuplicateSend));

    let actions = session
        .handle(ClientEvent::SendFailed {
            plaintext_key: outgoing.plaintext_key.clone(),
            reason: "status 500".into(),
        })
        .unwrap();
    let failed = refreshed(&actions);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].message.state, MessageState::Failed);

    // Manual retry is a new pending message
    env.advance(std::time::Duration::from_secs(1));
    let retry = session.send("alice", "hi").unwrap();
    assert_eq!(inserted(&retry).len(), 1);
    assert_eq!(session.index().len(), 2);
}

#[test]
fn failed_message_is_promoted_by_late_echo() {
    let env = SimEnv::with_seed(5);
    let mut server = SimServer::new(env.clone());
    let mut session = open(&env);

    let actions = session.send("alice", "late").unwrap();
    let Some(ClientAction::Transmit(outgoing)) = actions.last() else {
        panic!("expected transmit");
    };
    server.post(&room(), &outgoing.body).unwrap();
    session.send_failed(&outgoing.plaintext_key, "timeout");

    let actions = batch(&mut session, server.fetch(&room(), 0, 1000));
    let updated = refreshed(&actions);
    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].message.state, MessageState::Confirmed);
}

#[test]
fn empty_message_is_rejected_before_any_work() {
    let env = SimEnv::with_seed(6);
    let mut session = open(&env);
    assert_eq!(session.send("alice", "   \n"), Err(ClientError::EmptyMessage));
    assert!(session.index().is_empty());
}

#[test]
fn short_iv_row_is_dropped_and_cursor_advances() {
    let env = SimEnv::with_seed(7);
    let mut server = SimServer::new(env.clone());
    let mut session = open(&env);

    let actions = session.send("bob", "ok").unwrap();
    let Some(ClientAction::Transmit(outgoing)) = actions.last() else {
        panic!("expected transmit");
    };
    let good = server.post(&room(), &outgoing.body).unwrap();
    let bad = server.inject_raw(WireMessage {
        iv: Some("0".repeat(20)),
        id: None,
        ..good.clone()
    });

    let actions = batch(&mut session, server.fetch(&room(), 0, 1000));

    assert_eq!(refreshed(&actions).len(), 1);
    assert!(inserted(&actions).is_empty());
    assert_eq!(session.cursor().last_seen_id(), bad.id.unwrap());
}

#[test]
fn rows_for_other_rooms_are_ignored() {
    let env = SimEnv::with_seed(8);
    let mut server = SimServer::new(env.clone());
    let mut session = open(&env);
    let other = RoomId::parse("fedcba9876543210").unwrap();

    let mut sender = SyncSession::open(env.clone(), other.clone(), key(), SessionConfig::default());
    let actions = sender.send("eve", "elsewhere").unwrap();
    let Some(ClientAction::Transmit(outgoing)) = actions.last() else {
        panic!("expected transmit");
    };
    let stored = server.post(&other, &outgoing.body).unwrap();

    let actions = batch(&mut session, vec![stored]);
    assert!(actions.is_empty());
    assert!(session.index().is_empty());
}

#[test]
fn initial_history_does_not_notify_but_later_rows_do() {
    let env = SimEnv::with_seed(9);
    let mut server = SimServer::new(env.clone());
    let mut writer = SyncSession::open(env.clone(), room(), key(), SessionConfig::default());
    let mut reader = open(&env);

    for text in ["one", "two"] {
        let actions = writer.send("bob", text).unwrap();
        let Some(ClientAction::Transmit(outgoing)) = actions.last() else {
            panic!("expected transmit");
        };
        server.post(&room(), &outgoing.body).unwrap();
    }

    let history = batch(&mut reader, server.fetch(&room(), 0, 1000));
    assert_eq!(inserted(&history).len(), 2);
    assert!(notifications(&history).is_empty());

    let actions = writer.send("bob", "<b>three</b>").unwrap();
    let Some(ClientAction::Transmit(outgoing)) = actions.last() else {
        panic!("expected transmit");
    };
    server.post(&room(), &outgoing.body).unwrap();

    let cursor = reader.cursor().last_seen_id();
    let live = batch(&mut reader, server.fetch(&room(), cursor, 1000));
    let raised = notifications(&live);
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].title, "bob");
    assert_eq!(raised[0].body, "three");
    assert_eq!(raised[0].tag, format!("chat-{ROOM}"));
    assert!(!raised[0].renotify);
}

#[test]
fn notifications_respect_focus_and_permission() {
    let env = SimEnv::with_seed(10);
    let mut server = SimServer::new(env.clone());
    let config = SessionConfig { notify_history: true, ..SessionConfig::default() };
    let mut writer = SyncSession::open(env.clone(), room(), key(), config);
    let mut reader = SyncSession::open(env.clone(), room(), key(), config);

    let cases = [
        ("focused", Presence { focused: true, permission: Permission::Granted }),
        ("denied", Presence { focused: false, permission: Permission::Denied }),
        ("undecided", Presence { focused: false, permission: Permission::Default }),
    ];
    for (text, presence) in cases {
        let actions = writer.send("bob", text).unwrap();
        let Some(ClientAction::Transmit(outgoing)) = actions.last() else {
            panic!("expected transmit");
        };
        server.post(&room(), &outgoing.body).unwrap();

        let cursor = reader.cursor().last_seen_id();
        let actions = reader
            .handle(ClientEvent::BatchReceived {
                rows: server.fetch(&room(), cursor, 1000),
                viewport: at_bottom(),
                presence,
            })
            .unwrap();
        assert_eq!(inserted(&actions).len(), 1, "{text}");
        assert!(notifications(&actions).is_empty(), "{text}");
    }
    assert_eq!(reader.index().len(), 3);
}

#[test]
fn closed_session_rejects_work() {
    let env = SimEnv::with_seed(11);
    let mut session = open(&env);
    session.send("alice", "hi").unwrap();

    session.close();

    assert!(!session.is_open());
    assert!(session.index().is_empty());
    assert_eq!(session.send("alice", "again"), Err(ClientError::MissingKey));
    let result = session.handle(ClientEvent::BatchReceived {
        rows: Vec::new(),
        viewport: at_bottom(),
        presence: away(),
    });
    assert_eq!(result, Err(ClientError::MissingKey));
}

#[test]
fn scrolled_up_reader_gets_offset_anchor() {
    let env = SimEnv::with_seed(12);
    let mut server = SimServer::new(env.clone());
    let mut writer = open(&env);
    let mut reader = open(&env);

    let actions = writer.send("bob", "news").unwrap();
    let Some(ClientAction::Transmit(outgoing)) = actions.last() else {
        panic!("expected transmit");
    };
    server.post(&room(), &outgoing.body).unwrap();

    let reading_history = Viewport { scroll_top: 0.0, scroll_height: 2000.0, client_height: 300.0 };
    let actions = reader
        .handle(ClientEvent::BatchReceived {
            rows: server.fetch(&room(), 0, 1000),
            viewport: reading_history,
            presence: away(),
        })
        .unwrap();

    let anchor = actions
        .iter()
        .find_map(|a| match a {
            ClientAction::Anchor(anchor) => Some(*anchor),
            _ => None,
        })
        .unwrap();
    assert!(!anchor.was_near_bottom());
    assert_eq!(anchor.resolve(2040.0), ScrollIntent::PreserveOffset { delta: 40.0 });
}

#[test]
fn empty_batch_emits_nothing() {
    let env = SimEnv::with_seed(13);
    let mut session = open(&env);
    assert!(batch(&mut session, Vec::new()).is_empty());
}

fn post_as(writer: &mut SyncSession<SimEnv>, server: &mut SimServer, text: &str) {
    let actions = writer.send("bob", text).unwrap();
    let Some(ClientAction::Transmit(outgoing)) = actions.last() else {
        panic!("expected transmit");
    };
    server.post(&room(), &outgoing.body).unwrap();
}

#[test]
fn echo_before_first_fetch_keeps_history_silent() {
    let env = SimEnv::with_seed(14);
    let mut server = SimServer::new(env.clone());
    let mut writer = SyncSession::open(env.clone(), room(), key(), SessionConfig::default());
    for text in ["one", "two", "three"] {
        post_as(&mut writer, &mut server, text);
    }

    let mut reader = open(&env);
    let actions = reader.send("alice", "hello").unwrap();
    let Some(ClientAction::Transmit(outgoing)) = actions.last() else {
        panic!("expected transmit");
    };
    let echo = server.post(&room(), &outgoing.body).unwrap();
    reader
        .handle(ClientEvent::SendAccepted {
            plaintext_key: outgoing.plaintext_key.clone(),
            echo: Some(echo),
            viewport: at_bottom(),
            presence: away(),
        })
        .unwrap();

    let history = batch(&mut reader, server.fetch(&room(), 0, 1000));
    assert_eq!(inserted(&history).len(), 3);
    assert!(notifications(&history).is_empty());
}

#[test]
fn paged_history_stays_silent_until_a_short_page() {
    let env = SimEnv::with_seed(15);
    let mut server = SimServer::new(env.clone());
    let mut writer = SyncSession::open(env.clone(), room(), key(), SessionConfig::default());
    for text in ["one", "two", "three"] {
        post_as(&mut writer, &mut server, text);
    }

    let config = SessionConfig { page_limit: 2, ..SessionConfig::default() };
    let mut reader = SyncSession::open(env.clone(), room(), key(), config);

    let first = batch(&mut reader, server.fetch(&room(), 0, 2));
    assert_eq!(inserted(&first).len(), 2);
    assert!(notifications(&first).is_empty());

    let cursor = reader.cursor().last_seen_id();
    let second = batch(&mut reader, server.fetch(&room(), cursor, 2));
    assert_eq!(inserted(&second).len(), 1);
    assert!(notifications(&second).is_empty());

    post_as(&mut writer, &mut server, "four");
    let cursor = reader.cursor().last_seen_id();
    let live = batch(&mut reader, server.fetch(&room(), cursor, 2));
    assert_eq!(notifications(&live).len(), 1);
}

#[test]
fn redelivered_row_notifies_once() {
    let env = SimEnv::with_seed(16);
    let mut server = SimServer::new(env.clone());
    let mut writer = SyncSession::open(env.clone(), room(), key(), SessionConfig::default());
    let mut reader = open(&env);
    assert!(batch(&mut reader, Vec::new()).is_empty());

    post_as(&mut writer, &mut server, "ping");
    let rows = server.fetch(&room(), 0, 1000);

    let created = batch(&mut reader, rows.clone());
    assert_eq!(inserted(&created).len(), 1);
    assert_eq!(notifications(&created).len(), 1);

    let updated = batch(&mut reader, rows);
    assert!(inserted(&updated).is_empty());
    assert!(notifications(&updated).is_empty());
    assert_eq!(reader.index().len(), 1);
}
