//! Ticket request categories.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TicketError;

/// The closed set of things a member can open a ticket for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    PurchaseBot,
    PurchaseWebsite,
    Support,
    ContactOwner,
    ApplyStaff,
    JoinTeam,
}

impl RequestType {
    /// All request types, in panel order.
    pub const ALL: [RequestType; 6] = [
        RequestType::PurchaseBot,
        RequestType::PurchaseWebsite,
        RequestType::Support,
        RequestType::ContactOwner,
        RequestType::ApplyStaff,
        RequestType::JoinTeam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PurchaseBot => "purchase_bot",
            Self::PurchaseWebsite => "purchase_website",
            Self::Support => "support",
            Self::ContactOwner => "contact_owner",
            Self::ApplyStaff => "apply_staff",
            Self::JoinTeam => "join_team",
        }
    }

    /// Human-readable name, also used as the name of the category channel
    /// tickets of this type are filed under.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PurchaseBot => "Purchase Bot",
            Self::PurchaseWebsite => "Purchase Website",
            Self::Support => "Support",
            Self::ContactOwner => "Contact Owner",
            Self::ApplyStaff => "Moderator Application",
            Self::JoinTeam => "Join Team",
        }
    }

    pub fn is_purchase(&self) -> bool {
        matches!(self, Self::PurchaseBot | Self::PurchaseWebsite)
    }

    /// Whether opening this ticket starts a structured interview.
    pub fn is_interview(&self) -> bool {
        matches!(self, Self::ApplyStaff)
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = TicketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TicketError::UnknownRequestType(s.to_string()))
    }
}
