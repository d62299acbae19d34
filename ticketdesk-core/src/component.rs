//! Identifiers carried by interactive components (buttons, menus, forms).
//!
//! The platform echoes a component's id back verbatim when it is used, so
//! everything needed to route the interaction is encoded in the id itself.

use std::fmt;

use crate::decision::DecisionId;
use crate::ids::ChannelId;
use crate::request::RequestType;

const CLOSE_TICKET: &str = "close_ticket";
const CLAIM_TICKET: &str = "claim_ticket";
const DENY_PREFIX: &str = "app_deny:";
const ACCEPT_PREFIX: &str = "app_accept:";
const PURCHASE_PREFIX: &str = "purchase:";

/// Field ids of the purchase form.
pub const PRODUCT_FIELD: &str = "product";
pub const DETAILS_FIELD: &str = "details";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentId {
    /// Panel button opening a ticket of this type.
    OpenTicket(RequestType),
    CloseTicket,
    ClaimTicket,
    /// Reviewer button denying an application.
    DenyApplication(DecisionId),
    /// Reviewer role menu accepting an application.
    AcceptApplication(DecisionId),
    /// Purchase details form for the ticket in `channel`.
    PurchaseForm {
        request_type: RequestType,
        channel: ChannelId,
    },
}

impl ComponentId {
    /// Parse an id produced by [`ComponentId::fmt`]; `None` for ids we did
    /// not issue.
    pub fn parse(id: &str) -> Option<Self> {
        match id {
            CLOSE_TICKET => return Some(Self::CloseTicket),
            CLAIM_TICKET => return Some(Self::ClaimTicket),
            _ => {}
        }

        if let Some(rest) = id.strip_prefix(DENY_PREFIX) {
            return rest.parse().ok().map(Self::DenyApplication);
        }
        if let Some(rest) = id.strip_prefix(ACCEPT_PREFIX) {
            return rest.parse().ok().map(Self::AcceptApplication);
        }
        if let Some(rest) = id.strip_prefix(PURCHASE_PREFIX) {
            let (request_type, channel) = rest.split_once(':')?;
            let request_type: RequestType = request_type.parse().ok()?;
            if !request_type.is_purchase() {
                return None;
            }
            return Some(Self::PurchaseForm {
                request_type,
                channel: channel.parse().ok()?,
            });
        }

        id.parse().ok().map(Self::OpenTicket)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenTicket(request_type) => write!(f, "{}", request_type),
            Self::CloseTicket => f.write_str(CLOSE_TICKET),
            Self::ClaimTicket => f.write_str(CLAIM_TICKET),
            Self::DenyApplication(id) => write!(f, "{}{}", DENY_PREFIX, id),
            Self::AcceptApplication(id) => write!(f, "{}{}", ACCEPT_PREFIX, id),
            Self::PurchaseForm {
                request_type,
                channel,
            } => write!(f, "{}{}:{}", PURCHASE_PREFIX, request_type, channel),
        }
    }
}
