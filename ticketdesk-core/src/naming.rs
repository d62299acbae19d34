//! Channel names and topics for ticket channels.

use crate::ids::UserId;
use crate::request::RequestType;

/// Longest channel name the platform accepts.
pub const MAX_CHANNEL_NAME_LEN: usize = 100;

/// Build a channel name like `support-alice` from the request type and the
/// requester's username.
///
/// The result is lower-case and only contains `[a-z0-9-]`, without leading,
/// trailing or repeated dashes.
pub fn channel_name(request_type: RequestType, username: &str) -> String {
    let raw = format!("{}-{}", request_type.as_str(), username).to_lowercase();

    let mut name = String::with_capacity(raw.len());
    for c in raw.chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' && (name.is_empty() || name.ends_with('-')) {
            continue;
        }
        name.push(c);
    }

    name.truncate(MAX_CHANNEL_NAME_LEN);
    while name.ends_with('-') {
        name.pop();
    }
    name
}

/// Topic recording who opened the ticket and why.
pub fn channel_topic(request_type: RequestType, requester_tag: &str, requester: UserId) -> String {
    format!(
        "User: {} ({}) | Type: {}",
        requester_tag, requester, request_type
    )
}

/// Requester and type recovered from a ticket channel's topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketTopic {
    pub requester: UserId,
    pub request_type: RequestType,
}

/// Parse a topic written by [`channel_topic`].
pub fn parse_topic(topic: &str) -> Option<TicketTopic> {
    let (user_part, type_part) = topic.rsplit_once(" | Type: ")?;
    let request_type = type_part.trim().parse().ok()?;
    let id = user_part
        .strip_prefix("User: ")?
        .rsplit_once(" (")?
        .1
        .strip_suffix(')')?;
    Some(TicketTopic {
        requester: id.parse().ok()?,
        request_type,
    })
}
