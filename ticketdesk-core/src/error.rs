//! Error taxonomy shared by every component of the ticket engine.

use thiserror::Error;

use crate::decision::DecisionId;
use crate::ids::{ChannelId, UserId};
use crate::request::RequestType;

/// Errors a ticket operation can end in.
///
/// Every variant is recoverable: the dispatcher turns it into a message for
/// whoever triggered the operation and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TicketError {
    /// An interview is already running for this channel or applicant.
    #[error("an interview is already active in channel {channel}")]
    AlreadyActive { channel: ChannelId },

    /// The actor may not perform this action.
    #[error("user {actor} is not allowed to {action}")]
    Forbidden { actor: UserId, action: String },

    /// A channel, category, role, member or session is missing.
    #[error("{what} not found")]
    NotFound { what: String },

    /// The platform failed or refused a request for something that exists.
    #[error("platform request for {what} failed: {reason}")]
    PlatformFailure { what: String, reason: String },

    /// The platform refused to create the ticket channel.
    #[error("failed to provision {request_type} ticket: {reason}")]
    ProvisioningFailed {
        request_type: RequestType,
        reason: String,
    },

    /// A verdict was already recorded for this decision request.
    #[error("decision request {id} was already {status}")]
    AlreadyDecided { id: DecisionId, status: &'static str },

    /// Every question of the interview has already been answered.
    #[error("the interview in channel {channel} is already complete")]
    InterviewComplete { channel: ChannelId },

    #[error("unknown request type `{0}`")]
    UnknownRequestType(String),
}

impl TicketError {
    pub fn forbidden(actor: UserId, action: impl Into<String>) -> Self {
        Self::Forbidden {
            actor,
            action: action.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Text shown to the member whose action failed.
    pub fn user_message(&self) -> String {
        match self {
            Self::AlreadyActive { channel } => format!(
                "❌ You already have an application open in {}.",
                channel.mention()
            ),
            Self::Forbidden { action, .. } => format!("❌ You are not allowed to {}.", action),
            Self::NotFound { what } => format!("❌ Could not find {}.", what),
            Self::PlatformFailure { what, .. } => format!(
                "⚠️ Something went wrong while reaching {}. Please try again later.",
                what
            ),
            Self::ProvisioningFailed { request_type, .. } => format!(
                "❌ Could not create your {} ticket. Please try again later.",
                request_type.display_name()
            ),
            Self::AlreadyDecided { status, .. } => {
                format!("⚠️ This application was already {}.", status)
            }
            Self::InterviewComplete { .. } => {
                "⚠️ This application has already been submitted.".to_string()
            }
            Self::UnknownRequestType(_) => "❌ Unknown ticket type.".to_string(),
        }
    }
}
