//! Display-safe text.
//!
//! Decrypted fields are attacker-controlled (anyone with the link can post),
//! so author names and notification bodies are stripped of markup before they
//! reach a view or the OS notification center.

use crate::{StorageError, location::Storage};

/// Fallback author name.
pub const ANONYMOUS: &str = "Anonymous";

/// Maximum author name length in characters.
pub const MAX_USERNAME_CHARS: usize = 64;

/// Maximum message body length in characters.
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// Fallback notification body.
pub const EMPTY_BODY: &str = "(no content)";

/// Storage key holding the nickname.
pub const NICKNAME_STORAGE_KEY: &str = "nickname";

/// Older storage key read when no nickname is stored.
pub const LEGACY_USERNAME_STORAGE_KEY: &str = "username";

/// Remove every `<...>` tag. An unclosed `<` swallows the rest of the text.
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match (in_tag, c) {
            (false, '<') => in_tag = true,
            (false, c) => out.push(c),
            (true, '>') => in_tag = false,
            (true, _) => {},
        }
    }
    out
}

/// Author name safe for display: no tags, trimmed, non-empty, bounded.
pub fn sanitize_username(input: &str) -> String {
    let stripped = strip_tags(input);
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return ANONYMOUS.to_owned();
    }
    trimmed.chars().take(MAX_USERNAME_CHARS).collect()
}

/// Notification body: no tags, trimmed, with a placeholder when empty.
pub fn notification_body(content: &str) -> String {
    let stripped = strip_tags(content);
    let trimmed = stripped.trim();
    if trimmed.is_empty() { EMPTY_BODY.to_owned() } else { trimmed.to_owned() }
}

/// Trim and cap an outgoing message body.
pub fn clamp_content(content: &str) -> String {
    content.trim().chars().take(MAX_CONTENT_CHARS).collect()
}

/// Pick the nickname for this session and persist it.
///
/// An explicitly provided name wins and is stored. Otherwise the stored
/// nickname (or legacy username) is used, falling back to [`ANONYMOUS`].
pub fn resolve_nickname<S: Storage>(
    storage: &mut S,
    provided: Option<&str>,
) -> Result<String, StorageError> {
    if let Some(name) = provided {
        let name = sanitize_username(name);
        storage.set(NICKNAME_STORAGE_KEY, &name)?;
        return Ok(name);
    }

    let stored = storage
        .get(NICKNAME_STORAGE_KEY)
        .or_else(|| storage.get(LEGACY_USERNAME_STORAGE_KEY))
        .unwrap_or_default();
    Ok(sanitize_username(&stored))
}
