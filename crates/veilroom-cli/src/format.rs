//! Plain-text rendering of timeline lines.

use chrono::{DateTime, Local};
use veilroom_app::{ConnectionStatus, TimelineEntry};
use veilroom_client::Notification;
use veilroom_core::MessageState;

/// One chat line: `[HH:MM:SS] user: content`, with a state marker while the
/// message is not confirmed.
pub fn entry_line(entry: &TimelineEntry) -> String {
    let marker = match entry.state {
        MessageState::Pending => " (sending)",
        MessageState::Failed => " (failed to send)",
        MessageState::Confirmed => "",
    };
    format!("[{}] {}: {}{marker}", clock(&entry.timestamp), entry.user, entry.content)
}

/// Status line shown when the transport state changes.
pub fn status_line(status: &ConnectionStatus) -> String {
    match status {
        ConnectionStatus::Connecting => "* connecting".to_owned(),
        ConnectionStatus::Live => "* connected".to_owned(),
        ConnectionStatus::Unavailable { reason } => format!("* connection lost, retrying ({reason})"),
    }
}

/// Line for a notification.
pub fn notification_line(notification: &Notification) -> String {
    format!("! {}: {}", notification.title, notification.body)
}

/// Local time of day for an ISO-8601 timestamp, or the raw text if it does
/// not parse.
fn clock(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(at) => at.with_timezone(&Local).format("%H:%M:%S").to_string(),
        Err(_) => timestamp.to_owned(),
    }
}
