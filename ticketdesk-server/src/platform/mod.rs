//! Outbound seam to the chat platform.
//!
//! The ticket engine only ever talks to the platform through
//! [`ChatPlatform`]. Production uses the REST client in [`discord`]; tests
//! use the recording mock.

pub mod discord;
#[cfg(test)]
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use ticketdesk_core::{ChannelId, MessageId, PermissionOverwrite, RoleId, TicketError, UserId};

pub use discord::DiscordClient;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("platform API error: {status} - {body}")]
    Api { status: u16, body: String },
    #[error("request failed: {0}")]
    Transport(String),
}

impl PlatformError {
    /// Map onto the ticket taxonomy, naming the object involved.
    pub fn into_ticket_error(self, what: impl Into<String>) -> TicketError {
        match self {
            PlatformError::NotFound(_) => TicketError::not_found(what),
            other => TicketError::PlatformFailure {
                what: what.into(),
                reason: other.to_string(),
            },
        }
    }
}

/// Where a message goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    Channel(ChannelId),
    /// The user's direct messages.
    User(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub label: String,
    pub value: String,
}

/// An interactive control attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Button {
        id: String,
        label: String,
        style: ButtonStyle,
    },
    Menu {
        id: String,
        placeholder: String,
        options: Vec<MenuOption>,
        max_values: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: String,
    pub components: Vec<Component>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            components: Vec::new(),
        }
    }

    pub fn with_components(mut self, components: Vec<Component>) -> Self {
        self.components = components;
        self
    }
}

/// A message the platform has accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHandle {
    pub channel: ChannelId,
    pub message: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChannelRequest {
    pub name: String,
    pub parent: Option<ChannelId>,
    pub overwrites: Vec<PermissionOverwrite>,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub user: UserId,
    pub roles: Vec<RoleId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Name shown to other members, falling back to the username.
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
}

/// Side-effecting operations the engine needs from the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Find a category channel by case-insensitive name, creating it if absent.
    async fn ensure_category(&self, name: &str) -> Result<ChannelId, PlatformError>;

    async fn create_channel(
        &self,
        request: &CreateChannelRequest,
    ) -> Result<ChannelId, PlatformError>;

    async fn send_message(
        &self,
        target: MessageTarget,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, PlatformError>;

    /// Strip every interactive component from a message.
    async fn disable_components(&self, message: MessageHandle) -> Result<(), PlatformError>;

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), PlatformError>;

    /// Add a role to a member. Granting a role the member already holds succeeds.
    async fn grant_role(&self, user: UserId, role: RoleId) -> Result<(), PlatformError>;

    async fn fetch_member(&self, user: UserId) -> Result<Member, PlatformError>;

    async fn fetch_user(&self, user: UserId) -> Result<User, PlatformError>;

    async fn fetch_role(&self, role: RoleId) -> Result<Role, PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_stays_not_found() {
        let error = PlatformError::NotFound("user 5".to_string()).into_ticket_error("user 5");
        assert_eq!(error, TicketError::not_found("user 5"));
        assert_eq!(error.user_message(), "❌ Could not find user 5.");
    }

    #[test]
    fn test_api_and_transport_errors_are_platform_failures() {
        let api = PlatformError::Api {
            status: 500,
            body: "Internal Server Error".to_string(),
        }
        .into_ticket_error("review channel 300");
        let transport =
            PlatformError::Transport("connection reset".to_string()).into_ticket_error("user 5");

        assert_eq!(
            api,
            TicketError::PlatformFailure {
                what: "review channel 300".to_string(),
                reason: "platform API error: 500 - Internal Server Error".to_string(),
            }
        );
        assert!(matches!(
            transport,
            TicketError::PlatformFailure { ref reason, .. } if reason.contains("connection reset")
        ));
        assert!(!api.user_message().contains("Could not find"));
    }
}
