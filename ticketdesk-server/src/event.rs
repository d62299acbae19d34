//! Inbound events from the gateway relay and the acknowledgements sent back.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use ticketdesk_core::{ChannelId, RoleId, UserId};

/// The member who triggered an event, with their guild context.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Actor {
    pub id: UserId,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    /// Whether the member holds administrator rights in the guild.
    #[serde(default)]
    pub is_admin: bool,
}

impl Actor {
    pub fn has_role(&self, role: Option<RoleId>) -> bool {
        role.is_some_and(|r| self.roles.contains(&r))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    ButtonPressed {
        actor: Actor,
        button_id: String,
        channel_id: ChannelId,
        #[serde(default)]
        channel_topic: Option<String>,
    },
    FormSubmitted {
        actor: Actor,
        form_id: String,
        #[serde(default)]
        channel_id: Option<ChannelId>,
        #[serde(default)]
        fields: HashMap<String, String>,
    },
    MessagePosted {
        author: Actor,
        channel_id: ChannelId,
        text: String,
        #[serde(default)]
        is_bot: bool,
    },
    MenuSelected {
        actor: Actor,
        menu_id: String,
        channel_id: ChannelId,
        #[serde(default)]
        values: Vec<String>,
    },
    /// A channel was deleted, by the engine or by anyone else.
    ChannelDeleted { channel_id: ChannelId },
}

impl InboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::ButtonPressed { .. } => "button_pressed",
            InboundEvent::FormSubmitted { .. } => "form_submitted",
            InboundEvent::MessagePosted { .. } => "message_posted",
            InboundEvent::MenuSelected { .. } => "menu_selected",
            InboundEvent::ChannelDeleted { .. } => "channel_deleted",
        }
    }
}

/// Reply to the originator of an event, rendered by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Acknowledgement {
    /// Nothing to say.
    None,
    /// Visible only to the originator.
    Ephemeral { content: String },
    /// Visible to the whole channel.
    Public { content: String },
    /// Open a form for the originator to fill in.
    Form { form: FormSpec },
}

impl Acknowledgement {
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self::Ephemeral {
            content: content.into(),
        }
    }

    pub fn public(content: impl Into<String>) -> Self {
        Self::Public {
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSpec {
    pub id: String,
    pub title: String,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormField {
    pub id: String,
    pub label: String,
    pub required: bool,
    /// Multi-line input.
    pub paragraph: bool,
}
