//! Effects (side effects as data).
//!
//! Components decide what should happen and return effects; the
//! interpreter carries them out against the platform. Keeping the decision
//! pure lets the interview and review logic be tested without a platform.

use std::time::Duration;

use crate::platform::{ButtonStyle, Component, MenuOption, MessageTarget, OutgoingMessage, Role};
use ticketdesk_core::{ChannelId, ComponentId, DecisionId, RequestType, RoleId, UserId};

/// Longest message content the platform accepts, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Most options a select menu may offer.
pub const MAX_MENU_OPTIONS: usize = 25;

/// Everything the engine can ask the interpreter to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Post interview question `index` into `channel`.
    AskQuestion { channel: ChannelId, index: usize },

    /// Post question `index` after `delay`, if the session still expects it.
    ScheduleQuestion {
        channel: ChannelId,
        index: usize,
        delay: Duration,
    },

    /// Cancel pending question timers for `channel`.
    CancelTimers { channel: ChannelId },

    /// Send the interview completed in `channel` to the review channel;
    /// produces `Event::ApplicationPublished` or `Event::PublishFailed`.
    PublishDecision {
        channel: ChannelId,
        applicant: UserId,
        answers: Vec<String>,
    },

    SendMessage {
        target: MessageTarget,
        content: MessageContent,
    },

    /// Delete `channel` after `delay`. Best effort: failures are logged.
    ScheduleChannelDeletion { channel: ChannelId, delay: Duration },

    /// Grant roles to an accepted applicant; produces `Event::RolesGranted`.
    GrantRoles {
        decision: DecisionId,
        applicant: UserId,
        roles: Vec<RoleId>,
    },

    /// Remove the reviewer controls from a decided request's message.
    DisableDecisionControls { decision: DecisionId },

    Log { level: LogLevel, message: String },
}

/// Events produced by executing effects, fed back to the owning component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    RolesGranted(GrantReport),
    ApplicationPublished {
        channel: ChannelId,
        applicant: UserId,
        decision: DecisionId,
    },
    PublishFailed {
        channel: ChannelId,
        applicant: UserId,
        reason: String,
    },
}

/// Outcome of granting roles to an accepted applicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantReport {
    pub decision: DecisionId,
    pub applicant: UserId,
    pub granted: Vec<Role>,
    pub failed: Vec<(RoleId, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Content of every message the engine sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    /// One interview question.
    Question { heading: String, text: String },

    ApplicationSubmitted,

    /// The review channel could not take a completed interview.
    SubmissionFailed { applicant: UserId },

    /// First message in a new ticket, with close/claim controls.
    TicketOpened {
        requester: UserId,
        request_type: RequestType,
    },

    /// The panel of open-ticket buttons.
    TicketPanel,

    TicketClaimed { by: UserId },

    OpenLog {
        request_type: RequestType,
        channel: ChannelId,
    },

    CloseLog {
        channel: ChannelId,
        closed_by: UserId,
        requester: Option<UserId>,
    },

    PurchaseRequest {
        requester: UserId,
        request_type: RequestType,
        product: String,
        details: String,
    },

    PurchaseStatus { status: String, user: UserId },

    ScammerReport {
        user: UserId,
        reported_by: UserId,
        reason: String,
    },

    Help,

    ApplicationDenied,

    ApplicationAccepted { role_names: Vec<String> },
}

impl MessageContent {
    pub fn render(&self) -> OutgoingMessage {
        match self {
            MessageContent::Question { heading, text } => OutgoingMessage::text(format!(
                "💼 **{}**\n{}\n\n_Reply with your answer._",
                heading, text
            )),

            MessageContent::ApplicationSubmitted => {
                OutgoingMessage::text("✅ Your application has been submitted for review.")
            }

            MessageContent::SubmissionFailed { applicant } => OutgoingMessage::text(format!(
                "⚠️ {} Your application could not be submitted for review. \
                This channel stays open with your answers; a staff member will follow up.",
                applicant.mention()
            )),

            MessageContent::TicketOpened {
                requester,
                request_type,
            } => OutgoingMessage::text(format!(
                "{}\n**{} Ticket**\n👤 User: {}\n📁 Type: {}",
                requester.mention(),
                request_type.display_name(),
                requester.mention(),
                request_type.display_name()
            ))
            .with_components(vec![
                button(ComponentId::CloseTicket, "Close Ticket", ButtonStyle::Danger),
                button(ComponentId::ClaimTicket, "Claim Ticket", ButtonStyle::Primary),
            ]),

            MessageContent::TicketPanel => OutgoingMessage::text(
                "**Open a Ticket**\nClick a button to open a ticket.",
            )
            .with_components(
                RequestType::ALL
                    .into_iter()
                    .map(|t| {
                        button(
                            ComponentId::OpenTicket(t),
                            t.display_name(),
                            panel_style(t),
                        )
                    })
                    .collect(),
            ),

            MessageContent::TicketClaimed { by } => {
                OutgoingMessage::text(format!("🔖 Ticket claimed by {}", by.mention()))
            }

            MessageContent::OpenLog {
                request_type,
                channel,
            } => OutgoingMessage::text(format!(
                "🎫 **Ticket Opened**\nType: **{}**\nChannel: {}",
                request_type.display_name(),
                channel.mention()
            )),

            MessageContent::CloseLog {
                channel,
                closed_by,
                requester,
            } => {
                let opened_by = requester
                    .map(|r| format!("\nOpened by: {}", r.mention()))
                    .unwrap_or_default();
                OutgoingMessage::text(format!(
                    "🗑️ **Ticket Closed**\nChannel: {}\nClosed by: {}{}",
                    channel.mention(),
                    closed_by.mention(),
                    opened_by
                ))
            }

            MessageContent::PurchaseRequest {
                requester,
                request_type,
                product,
                details,
            } => OutgoingMessage::text(format!(
                "💎 **Purchase Request**\nUser: {}\nProduct: {}\nExtra Info: {}\nType: {}",
                requester.mention(),
                product,
                details,
                request_type.display_name()
            )),

            MessageContent::PurchaseStatus { status, user } => {
                let icon = if status.eq_ignore_ascii_case("success") {
                    "🟢"
                } else {
                    "🔴"
                };
                OutgoingMessage::text(format!(
                    "💎 **Purchase Update** {}\n**Status:** {}\n**User:** {}",
                    icon,
                    status.to_uppercase(),
                    user.mention()
                ))
            }

            MessageContent::ScammerReport {
                user,
                reported_by,
                reason,
            } => OutgoingMessage::text(format!(
                "⚠️ **Scammer Report**\nUser: {}\nReported By: {}\nReason: {}",
                user.mention(),
                reported_by.mention(),
                reason
            )),

            MessageContent::Help => OutgoingMessage::text(
                "📖 **Bot Commands**\n\
                `!ticketpanel` - Admin only. Sends the ticket panel with all ticket buttons.\n\
                `!purchase <status> <userID>` - Admin only. Logs purchase status for a user.\n\
                `!scammer <userID> <reason>` - Admin only. Marks a user as a scammer with optional reason.\n\
                `!help` - Shows this help message.",
            ),

            MessageContent::ApplicationDenied => OutgoingMessage::text(
                "❌ Thank you for applying. Unfortunately your application was not accepted this time.",
            ),

            MessageContent::ApplicationAccepted { role_names } => {
                let roles = if role_names.is_empty() {
                    String::new()
                } else {
                    format!(" You have been given: {}.", role_names.join(", "))
                };
                OutgoingMessage::text(format!(
                    "🎉 Congratulations, your application was accepted!{}",
                    roles
                ))
            }
        }
    }
}

/// A completed interview with reviewer controls.
///
/// Answers are unbounded, so the request is rendered as a run of messages
/// that each fit the platform limit. The controls ride on the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequestMessage {
    pub decision: DecisionId,
    pub applicant: UserId,
    pub title: String,
    pub answers: Vec<(String, String)>,
    pub assignable: Vec<Role>,
}

impl DecisionRequestMessage {
    pub fn render_pages(&self) -> Vec<OutgoingMessage> {
        let header = format!("📋 **{}** from {}", self.title, self.applicant.mention());
        let blocks = std::iter::once(header).chain(self.answers.iter().enumerate().map(
            |(i, (question, answer))| format!("**Q{}. {}**\n{}", i + 1, question, answer),
        ));

        let mut pages: Vec<OutgoingMessage> = paginate(blocks, MAX_MESSAGE_CHARS)
            .into_iter()
            .map(OutgoingMessage::text)
            .collect();
        if let Some(last) = pages.last_mut() {
            last.components = self.controls();
        }
        pages
    }

    fn controls(&self) -> Vec<Component> {
        let mut components = vec![button(
            ComponentId::DenyApplication(self.decision),
            "Deny",
            ButtonStyle::Danger,
        )];
        if !self.assignable.is_empty() {
            let options: Vec<MenuOption> = self
                .assignable
                .iter()
                .take(MAX_MENU_OPTIONS)
                .map(|role| MenuOption {
                    label: role.name.clone(),
                    value: role.id.to_string(),
                })
                .collect();
            components.push(Component::Menu {
                id: ComponentId::AcceptApplication(self.decision).to_string(),
                placeholder: "Accept with role(s)...".to_string(),
                max_values: options.len(),
                options,
            });
        }
        components
    }
}

/// Join `blocks` with blank lines into pages of at most `limit` characters.
/// A block longer than `limit` is cut across pages.
fn paginate(blocks: impl IntoIterator<Item = String>, limit: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for block in blocks {
        for piece in split_chars(&block, limit) {
            let piece_len = piece.chars().count();
            if !current.is_empty() && current_len + 2 + piece_len > limit {
                pages.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if !current.is_empty() {
                current.push_str("\n\n");
                current_len += 2;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
    }

    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

fn split_chars(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars.chunks(limit).map(|chunk| chunk.iter().collect()).collect()
}

fn button(id: ComponentId, label: &str, style: ButtonStyle) -> Component {
    Component::Button {
        id: id.to_string(),
        label: label.to_string(),
        style,
    }
}

fn panel_style(request_type: RequestType) -> ButtonStyle {
    match request_type {
        RequestType::PurchaseBot | RequestType::ApplyStaff => ButtonStyle::Primary,
        RequestType::PurchaseWebsite => ButtonStyle::Success,
        RequestType::Support | RequestType::JoinTeam => ButtonStyle::Secondary,
        RequestType::ContactOwner => ButtonStyle::Danger,
    }
}
