//! Local message index.
//!
//! Every stored message lives once in an arena and is reachable through up to
//! three key maps. A [`LocalId`] is the arena slot and stays valid for the
//! lifetime of the index.
//!
//! # Invariants
//!
//! - At most one record holds a given server id, and a record's server id
//!   never changes once set
//! - Fingerprint and plaintext lookups only return records that have not yet
//!   acquired a server id, so identical text sent twice binds to two records

use std::collections::HashMap;

use veilroom_core::{DecryptedMessage, IdentityKey, IdentityKeys, MessageState};

/// Stable handle of a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(usize);

impl LocalId {
    /// Arena position, which is also insertion order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Arena of messages addressed by server, fingerprint and plaintext keys.
#[derive(Debug, Clone, Default)]
pub struct MessageIndex {
    records: Vec<DecryptedMessage>,
    by_server: HashMap<IdentityKey, LocalId>,
    by_fingerprint: HashMap<IdentityKey, Vec<LocalId>>,
    by_plaintext: HashMap<IdentityKey, Vec<LocalId>>,
}

impl MessageIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored messages.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no message is stored.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Message at `id`.
    pub fn get(&self, id: LocalId) -> Option<&DecryptedMessage> {
        self.records.get(id.0)
    }

    /// All messages in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (LocalId, &DecryptedMessage)> {
        self.records.iter().enumerate().map(|(i, m)| (LocalId(i), m))
    }

    /// Resolve a message by server key, then fingerprint, then plaintext key.
    pub fn find(&self, keys: &IdentityKeys) -> Option<LocalId> {
        if let Some(server) = &keys.server
            && let Some(&id) = self.by_server.get(server)
        {
            return Some(id);
        }

        self.first_unclaimed(self.by_fingerprint.get(&keys.fingerprint))
            .or_else(|| self.first_unclaimed(self.by_plaintext.get(&keys.plaintext)))
    }

    /// Record originally indexed under `key` that is still in `state`.
    pub fn find_plaintext(&self, key: &IdentityKey, state: MessageState) -> Option<LocalId> {
        self.by_plaintext
            .get(key)
            .into_iter()
            .flatten()
            .copied()
            .find(|id| self.records[id.0].state == state)
    }

    /// Store a new message and index it under every computable key.
    pub fn insert(&mut self, message: DecryptedMessage) -> LocalId {
        let id = LocalId(self.records.len());
        let keys = IdentityKeys::of(&message);
        self.records.push(message);
        self.index_keys(id, &keys);
        id
    }

    /// Overwrite a stored message with its confirmed server form.
    ///
    /// Keys the record was indexed under before stay valid, so a send failure
    /// can still find it by the plaintext key it was sent with.
    pub fn confirm(&mut self, id: LocalId, incoming: DecryptedMessage) {
        let Some(record) = self.records.get_mut(id.0) else {
            return;
        };

        debug_assert!(
            record.server_id.is_none() || record.server_id == incoming.server_id,
            "server id must never be reassigned"
        );

        record.server_id = record.server_id.or(incoming.server_id);
        record.user = incoming.user;
        record.content = incoming.content;
        record.timestamp = incoming.timestamp;
        record.state = MessageState::Confirmed;

        let keys = IdentityKeys::of(record);
        self.index_keys(id, &keys);
    }

    /// Move a pending message to `Failed`. Returns false if it was not pending.
    pub fn mark_failed(&mut self, id: LocalId) -> bool {
        match self.records.get_mut(id.0) {
            Some(record) if record.state == MessageState::Pending => {
                record.state = MessageState::Failed;
                true
            },
            _ => false,
        }
    }

    /// Oldest candidate without a server id, pending records before failed
    /// ones so a manual retry is confirmed instead of the failure it replaced.
    fn first_unclaimed(&self, candidates: Option<&Vec<LocalId>>) -> Option<LocalId> {
        let candidates = candidates.map(Vec::as_slice).unwrap_or_default();
        let mut unclaimed =
            candidates.iter().copied().filter(|id| self.records[id.0].server_id.is_none());
        let oldest = unclaimed.next()?;
        if self.records[oldest.0].state == MessageState::Pending {
            return Some(oldest);
        }
        unclaimed.find(|id| self.records[id.0].state == MessageState::Pending).or(Some(oldest))
    }

    fn index_keys(&mut self, id: LocalId, keys: &IdentityKeys) {
        if let Some(server) = &keys.server {
            self.by_server.entry(server.clone()).or_insert(id);
        }

        for (map, key) in [
            (&mut self.by_fingerprint, &keys.fingerprint),
            (&mut self.by_plaintext, &keys.plaintext),
        ] {
            let ids = map.entry(key.clone()).or_default();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
    }
}
