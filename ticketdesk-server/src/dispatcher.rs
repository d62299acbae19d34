//! Dispatcher: routes inbound events to the ticket components.
//!
//! The dispatcher holds no state of its own. It decodes the component id or
//! command carried by an event, calls the component that owns it, runs the
//! resulting effects and turns the outcome into an acknowledgement. Every
//! `TicketError` ends here as an ephemeral message to the originator.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::effect::{Effect, Event, LogLevel, MessageContent};
use crate::event::{Acknowledgement, Actor, FormField, FormSpec, InboundEvent};
use crate::interpreter::run_effects;
use crate::platform::MessageTarget;
use crate::AppState;
use ticketdesk_core::component::{DETAILS_FIELD, PRODUCT_FIELD};
use ticketdesk_core::{
    parse_command, parse_topic, BotCommand, ChannelId, ComponentId, DecisionId, ParseResult,
    RequestType, RoleId, TicketError,
};

/// Stored when a purchase form leaves the details field empty.
pub const NO_DETAILS: &str = "(No details)";

pub struct Dispatcher {
    app: Arc<AppState>,
}

impl Dispatcher {
    pub fn new(app: Arc<AppState>) -> Self {
        Self { app }
    }

    pub fn app(&self) -> &Arc<AppState> {
        &self.app
    }

    pub async fn dispatch(&self, event: InboundEvent) -> Acknowledgement {
        let kind = event.kind();
        match self.route(event).await {
            Ok(ack) => ack,
            Err(e) => {
                warn!("Handling {} event failed: {}", kind, e);
                Acknowledgement::ephemeral(e.user_message())
            }
        }
    }

    async fn route(&self, event: InboundEvent) -> Result<Acknowledgement, TicketError> {
        match event {
            InboundEvent::ButtonPressed {
                actor,
                button_id,
                channel_id,
                channel_topic,
            } => match ComponentId::parse(&button_id) {
                Some(ComponentId::OpenTicket(request_type)) => {
                    self.open_ticket(&actor, request_type).await
                }
                Some(ComponentId::CloseTicket) => {
                    self.close_ticket(&actor, channel_id, channel_topic.as_deref())
                        .await
                }
                Some(ComponentId::ClaimTicket) => Ok(self.claim_ticket(&actor)),
                Some(ComponentId::DenyApplication(id)) => self.deny_application(&actor, id).await,
                _ => {
                    debug!("Ignoring unknown button {}", button_id);
                    Ok(Acknowledgement::None)
                }
            },

            InboundEvent::FormSubmitted {
                actor,
                form_id,
                fields,
                ..
            } => match ComponentId::parse(&form_id) {
                Some(ComponentId::PurchaseForm {
                    request_type,
                    channel,
                }) => {
                    self.submit_purchase(&actor, request_type, channel, &fields)
                        .await
                }
                _ => {
                    debug!("Ignoring unknown form {}", form_id);
                    Ok(Acknowledgement::None)
                }
            },

            InboundEvent::MessagePosted {
                author,
                channel_id,
                text,
                is_bot,
            } => {
                if is_bot {
                    return Ok(Acknowledgement::None);
                }
                self.message_posted(&author, channel_id, &text).await
            }

            InboundEvent::MenuSelected {
                actor,
                menu_id,
                values,
                ..
            } => match ComponentId::parse(&menu_id) {
                Some(ComponentId::AcceptApplication(id)) => {
                    self.accept_application(&actor, id, &values).await
                }
                _ => {
                    debug!("Ignoring unknown menu {}", menu_id);
                    Ok(Acknowledgement::None)
                }
            },

            InboundEvent::ChannelDeleted { channel_id } => {
                let mut effects = self.app.interview.end(channel_id).await;
                effects.push(Effect::CancelTimers {
                    channel: channel_id,
                });
                run_effects(&self.app, effects).await;
                Ok(Acknowledgement::None)
            }
        }
    }

    async fn open_ticket(
        &self,
        actor: &Actor,
        request_type: RequestType,
    ) -> Result<Acknowledgement, TicketError> {
        let app = &self.app;
        if request_type.is_interview() {
            if let Some(channel) = app.interview.sessions().find_by_applicant(actor.id).await {
                return Err(TicketError::AlreadyActive { channel });
            }
        }

        let requester = app
            .platform
            .fetch_user(actor.id)
            .await
            .map_err(|e| e.into_ticket_error(format!("user {}", actor.id)))?;
        let channel = app
            .provisioner
            .provision(app.platform.as_ref(), request_type, &requester)
            .await?;

        let mut effects = vec![Effect::SendMessage {
            target: MessageTarget::Channel(channel),
            content: MessageContent::TicketOpened {
                requester: actor.id,
                request_type,
            },
        }];
        if let Some(log) = app.config.log_channels.open {
            effects.push(Effect::SendMessage {
                target: MessageTarget::Channel(log),
                content: MessageContent::OpenLog {
                    request_type,
                    channel,
                },
            });
        }

        if request_type.is_interview() {
            match app.interview.begin(channel, actor.id).await {
                Ok(interview) => effects.extend(interview),
                Err(e) => {
                    // Lost a race with a concurrent application; drop the new channel.
                    if let Err(delete_err) = app.platform.delete_channel(channel).await {
                        warn!("Failed to remove unused channel {}: {}", channel, delete_err);
                    }
                    return Err(e);
                }
            }
        }

        run_effects(app, effects).await;
        info!(
            "Opened {} ticket {} for {}",
            request_type, channel, actor.id
        );

        if request_type.is_purchase() {
            return Ok(Acknowledgement::Form {
                form: purchase_form(request_type, channel),
            });
        }
        Ok(Acknowledgement::ephemeral(format!(
            "✅ Ticket created: {}",
            channel.mention()
        )))
    }

    async fn close_ticket(
        &self,
        actor: &Actor,
        channel: ChannelId,
        topic: Option<&str>,
    ) -> Result<Acknowledgement, TicketError> {
        let app = &self.app;
        let requester = topic.and_then(parse_topic).map(|t| t.requester);
        let delay = app.config.timing.close_delay;

        let mut effects = app.interview.end(channel).await;
        if let Some(log) = app.config.log_channels.close {
            effects.push(Effect::SendMessage {
                target: MessageTarget::Channel(log),
                content: MessageContent::CloseLog {
                    channel,
                    closed_by: actor.id,
                    requester,
                },
            });
        }
        effects.push(Effect::ScheduleChannelDeletion { channel, delay });
        effects.push(Effect::Log {
            level: LogLevel::Info,
            message: format!("Ticket {} closed by {}", channel, actor.id),
        });

        run_effects(app, effects).await;
        Ok(Acknowledgement::public(format!(
            "🔒 Closing ticket in {}s...",
            delay.as_secs()
        )))
    }

    fn claim_ticket(&self, actor: &Actor) -> Acknowledgement {
        if !actor.has_role(self.app.config.support_role) {
            debug!("{} may not claim tickets", actor.id);
            return Acknowledgement::ephemeral("❌ Cannot claim ticket.");
        }
        Acknowledgement::public(MessageContent::TicketClaimed { by: actor.id }.render().content)
    }

    async fn deny_application(
        &self,
        actor: &Actor,
        id: DecisionId,
    ) -> Result<Acknowledgement, TicketError> {
        let effects = self.app.review.deny(id, actor).await?;
        run_effects(&self.app, effects).await;
        Ok(Acknowledgement::ephemeral(
            "❌ Application denied. The applicant has been notified.",
        ))
    }

    async fn accept_application(
        &self,
        actor: &Actor,
        id: DecisionId,
        values: &[String],
    ) -> Result<Acknowledgement, TicketError> {
        let roles = values
            .iter()
            .map(|v| {
                v.parse::<RoleId>()
                    .map_err(|_| TicketError::not_found(format!("role {}", v)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let effects = self.app.review.accept(id, actor, roles).await?;
        let events = run_effects(&self.app, effects).await;

        let report = events.into_iter().find_map(|event| match event {
            Event::RolesGranted(report) if report.decision == id => Some(report),
            _ => None,
        });
        let Some(report) = report else {
            return Ok(Acknowledgement::ephemeral("✅ Application accepted."));
        };

        let granted: Vec<&str> = report.granted.iter().map(|r| r.name.as_str()).collect();
        let mut content = if granted.is_empty() {
            "✅ Application accepted, but no roles could be granted.".to_string()
        } else {
            format!("✅ Application accepted. Granted: {}.", granted.join(", "))
        };
        if !report.failed.is_empty() {
            let failed: Vec<String> = report
                .failed
                .iter()
                .map(|(role, reason)| format!("{} ({})", role.mention(), reason))
                .collect();
            content.push_str(&format!("\n⚠️ Failed: {}", failed.join(", ")));
        }
        Ok(Acknowledgement::ephemeral(content))
    }

    async fn submit_purchase(
        &self,
        actor: &Actor,
        request_type: RequestType,
        channel: ChannelId,
        fields: &HashMap<String, String>,
    ) -> Result<Acknowledgement, TicketError> {
        let field = |id: &str| {
            fields
                .get(id)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let product = field(PRODUCT_FIELD).ok_or_else(|| TicketError::not_found("product"))?;
        let details = field(DETAILS_FIELD).unwrap_or_else(|| NO_DETAILS.to_string());

        let content = MessageContent::PurchaseRequest {
            requester: actor.id,
            request_type,
            product,
            details,
        };
        let mut effects = Vec::new();
        if let Some(log) = self.app.config.log_channels.purchase {
            effects.push(Effect::SendMessage {
                target: MessageTarget::Channel(log),
                content: content.clone(),
            });
        }
        effects.push(Effect::SendMessage {
            target: MessageTarget::Channel(channel),
            content,
        });

        run_effects(&self.app, effects).await;
        Ok(Acknowledgement::ephemeral(
            "✅ Your purchase request has been submitted!",
        ))
    }

    async fn message_posted(
        &self,
        author: &Actor,
        channel: ChannelId,
        text: &str,
    ) -> Result<Acknowledgement, TicketError> {
        // Anything the applicant posts in their interview channel is an
        // answer, even when it also reads as a command.
        let effects = self.app.interview.on_answer(channel, author.id, text).await;
        run_effects(&self.app, effects).await;

        match parse_command(text) {
            ParseResult::Command(command) => {
                if command.requires_admin() && !author.is_admin {
                    debug!("Ignoring {} from non-administrator {}", command, author.id);
                    return Ok(Acknowledgement::None);
                }
                self.run_command(author, channel, command).await
            }
            ParseResult::Malformed { attempted } => {
                if !author.is_admin {
                    return Ok(Acknowledgement::None);
                }
                Ok(Acknowledgement::ephemeral(usage(&attempted)))
            }
            ParseResult::NotACommand => Ok(Acknowledgement::None),
        }
    }

    async fn run_command(
        &self,
        author: &Actor,
        channel: ChannelId,
        command: BotCommand,
    ) -> Result<Acknowledgement, TicketError> {
        let logs = &self.app.config.log_channels;
        let (effects, ack) = match command {
            BotCommand::TicketPanel => (
                vec![Effect::SendMessage {
                    target: MessageTarget::Channel(channel),
                    content: MessageContent::TicketPanel,
                }],
                Acknowledgement::None,
            ),
            BotCommand::Purchase { status, user } => {
                let ack =
                    Acknowledgement::public(format!("✅ Logged purchase status: {}", status));
                let effects = logs
                    .purchase
                    .map(|log| Effect::SendMessage {
                        target: MessageTarget::Channel(log),
                        content: MessageContent::PurchaseStatus { status, user },
                    })
                    .into_iter()
                    .collect();
                (effects, ack)
            }
            BotCommand::Scammer { user, reason } => {
                let ack = Acknowledgement::public(format!(
                    "✅ Marked {} as a scammer. Reason: {}",
                    user.mention(),
                    reason
                ));
                let effects = logs
                    .scam
                    .map(|log| Effect::SendMessage {
                        target: MessageTarget::Channel(log),
                        content: MessageContent::ScammerReport {
                            user,
                            reported_by: author.id,
                            reason,
                        },
                    })
                    .into_iter()
                    .collect();
                (effects, ack)
            }
            BotCommand::Help => (
                vec![],
                Acknowledgement::public(MessageContent::Help.render().content),
            ),
        };

        run_effects(&self.app, effects).await;
        Ok(ack)
    }
}

fn purchase_form(request_type: RequestType, channel: ChannelId) -> FormSpec {
    FormSpec {
        id: ComponentId::PurchaseForm {
            request_type,
            channel,
        }
        .to_string(),
        title: "Purchase Request".to_string(),
        fields: vec![
            FormField {
                id: PRODUCT_FIELD.to_string(),
                label: "What are you buying?".to_string(),
                required: true,
                paragraph: false,
            },
            FormField {
                id: DETAILS_FIELD.to_string(),
                label: "Any extra details?".to_string(),
                required: false,
                paragraph: true,
            },
        ],
    }
}

fn usage(attempted: &str) -> String {
    let word = attempted.split_whitespace().next().unwrap_or_default();
    let syntax = match word {
        "!purchase" => "!purchase <status> <userID>",
        "!scammer" => "!scammer <userID> [reason]",
        _ => "!help",
    };
    format!("❌ Usage: `{}`", syntax)
}
