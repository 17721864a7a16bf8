//! Standard invariant checks.

use std::collections::{HashMap, HashSet};

use veilroom_core::MessageState;

use super::{Invariant, InvariantResult, SessionSnapshot, Violation};

/// At most one stored message claims any server id.
pub struct UniqueServerIds;

impl Invariant for UniqueServerIds {
    fn name(&self) -> &'static str {
        "unique_server_ids"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let mut seen = HashMap::new();
        for (id, message) in &state.messages {
            if let Some(server_id) = message.server_id
                && let Some(previous) = seen.insert(server_id, *id)
            {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "server id {server_id} held by {previous:?} and {id:?}"
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Confirmed messages have a server id; pending ones do not.
///
/// Failed messages may have either: a late echo can confirm them.
pub struct ConfirmedHaveServerIds;

impl Invariant for ConfirmedHaveServerIds {
    fn name(&self) -> &'static str {
        "confirmed_have_server_ids"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for (id, message) in &state.messages {
            let consistent = match message.state {
                MessageState::Confirmed => message.server_id.is_some(),
                MessageState::Pending => message.server_id.is_none(),
                MessageState::Failed => true,
            };
            if !consistent {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "{id:?} is {:?} with server id {:?}",
                        message.state, message.server_id
                    ),
                });
            }
        }
        Ok(())
    }
}

/// The cursor is at least every server id that was stored.
pub struct CursorCoversMessages;

impl Invariant for CursorCoversMessages {
    fn name(&self) -> &'static str {
        "cursor_covers_messages"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let max = state.messages.iter().filter_map(|(_, m)| m.server_id).max().unwrap_or(0);
        if state.cursor < max {
            return Err(Violation {
                invariant: self.name(),
                message: format!("cursor {} behind stored server id {max}", state.cursor),
            });
        }
        Ok(())
    }
}

/// The timeline shows every stored message exactly once, in its stored state.
pub struct TimelineMatchesIndex;

impl Invariant for TimelineMatchesIndex {
    fn name(&self) -> &'static str {
        "timeline_matches_index"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let Some(rendered) = &state.rendered else {
            return Ok(());
        };

        let mut seen = HashSet::new();
        for entry in rendered {
            if !seen.insert(entry.id) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{:?} rendered twice", entry.id),
                });
            }
        }

        if rendered.len() != state.messages.len() {
            return Err(Violation {
                invariant: self.name(),
                message: format!(
                    "{} rendered entries for {} stored messages",
                    rendered.len(),
                    state.messages.len()
                ),
            });
        }

        let stored: HashMap<_, _> = state.messages.iter().map(|(id, m)| (*id, m)).collect();
        for entry in rendered {
            let matches = stored
                .get(&entry.id)
                .is_some_and(|m| m.state == entry.state && m.server_id == entry.server_id);
            if !matches {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("{:?} rendered out of sync with the index", entry.id),
                });
            }
        }
        Ok(())
    }
}
