//! Effect interpreter that executes effects against the chat platform.
//!
//! The interpreter is the boundary between the components that decide what
//! should happen and the platform I/O. Result events are fed back to the
//! component that owns them until no effects remain.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::effect::{Effect, Event, GrantReport, LogLevel};
use crate::platform::{MessageTarget, PlatformError};
use crate::review::role_or_placeholder;
use crate::AppState;
use ticketdesk_core::{ChannelId, DecisionId, RoleId, UserId};

/// Result of executing an effect.
#[derive(Debug)]
pub enum EffectResult {
    /// Effect completed, produced result events.
    Ok(Vec<Event>),
    /// Effect failed with an error.
    Err(String),
}

impl EffectResult {
    pub fn single(event: Event) -> Self {
        Self::Ok(vec![event])
    }

    pub fn none() -> Self {
        Self::Ok(vec![])
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self::Err(msg.into())
    }
}

/// Execute `effects` and every effect their result events lead to.
///
/// Returns all result events produced along the way so the caller can
/// report on them.
pub async fn run_effects(app: &Arc<AppState>, effects: Vec<Effect>) -> Vec<Event> {
    let mut pending = effects;
    let mut produced = Vec::new();

    while !pending.is_empty() {
        let events = execute_effects(app, std::mem::take(&mut pending)).await;
        for event in events {
            pending.extend(handle_event(app, &event));
            produced.push(event);
        }
    }

    produced
}

fn handle_event(app: &AppState, event: &Event) -> Vec<Effect> {
    match event {
        Event::RolesGranted(report) => app.review.on_roles_granted(report),
        Event::ApplicationPublished {
            channel, applicant, ..
        } => app.interview.on_published(*channel, *applicant),
        Event::PublishFailed {
            channel,
            applicant,
            reason,
        } => app.interview.on_publish_failed(*channel, *applicant, reason),
    }
}

/// Execute a list of effects and collect result events.
///
/// Effects are executed sequentially. If an effect fails, execution continues
/// with remaining effects, and the error is logged.
pub async fn execute_effects(app: &Arc<AppState>, effects: Vec<Effect>) -> Vec<Event> {
    let mut result_events = Vec::new();

    for effect in effects {
        match execute_effect(app, effect).await {
            EffectResult::Ok(events) => result_events.extend(events),
            EffectResult::Err(err) => {
                error!("Effect execution failed: {}", err);
            }
        }
    }

    result_events
}

async fn execute_effect(app: &Arc<AppState>, effect: Effect) -> EffectResult {
    match effect {
        Effect::AskQuestion { channel, index } => ask_question(app, channel, index).await,

        Effect::ScheduleQuestion {
            channel,
            index,
            delay,
        } => {
            let task_app = app.clone();
            app.scheduler
                .schedule(channel, delay, async move {
                    if let EffectResult::Err(err) = ask_question(&task_app, channel, index).await {
                        error!("Scheduled question failed: {}", err);
                    }
                })
                .await;
            EffectResult::none()
        }

        Effect::CancelTimers { channel } => {
            app.scheduler.cancel(channel).await;
            EffectResult::none()
        }

        Effect::PublishDecision {
            channel,
            applicant,
            answers,
        } => {
            match app
                .review
                .publish(app.platform.as_ref(), applicant, answers)
                .await
            {
                Ok(decision) => EffectResult::single(Event::ApplicationPublished {
                    channel,
                    applicant,
                    decision,
                }),
                Err(e) => EffectResult::single(Event::PublishFailed {
                    channel,
                    applicant,
                    reason: e.to_string(),
                }),
            }
        }

        Effect::SendMessage { target, content } => {
            match app.platform.send_message(target, &content.render()).await {
                Ok(_) => EffectResult::none(),
                Err(e) => EffectResult::err(format!(
                    "Failed to send message to {}: {}",
                    describe_target(target),
                    e
                )),
            }
        }

        Effect::ScheduleChannelDeletion { channel, delay } => {
            schedule_channel_deletion(app, channel, delay);
            EffectResult::none()
        }

        Effect::GrantRoles {
            decision,
            applicant,
            roles,
        } => execute_grant_roles(app, decision, applicant, roles).await,

        Effect::DisableDecisionControls { decision } => {
            let Some(message) = app.review.message_for(decision).await else {
                debug!("Application {} has no rendered controls", decision);
                return EffectResult::none();
            };
            match app.platform.disable_components(message).await {
                Ok(()) => EffectResult::none(),
                Err(e) => EffectResult::err(format!(
                    "Failed to disable controls for application {}: {}",
                    decision, e
                )),
            }
        }

        Effect::Log { level, message } => {
            match level {
                LogLevel::Debug => debug!("{}", message),
                LogLevel::Info => info!("{}", message),
                LogLevel::Warn => warn!("{}", message),
                LogLevel::Error => error!("{}", message),
            }
            EffectResult::none()
        }
    }
}

/// Post question `index` if the session in `channel` is still waiting on it.
async fn ask_question(app: &AppState, channel: ChannelId, index: usize) -> EffectResult {
    let Some(content) = app.interview.question_due(channel, index).await else {
        debug!(
            "Question {} for channel {} is no longer due, skipping",
            index, channel
        );
        return EffectResult::none();
    };

    match app
        .platform
        .send_message(MessageTarget::Channel(channel), &content.render())
        .await
    {
        Ok(_) => EffectResult::none(),
        Err(e) => EffectResult::err(format!(
            "Failed to ask question {} in channel {}: {}",
            index, channel, e
        )),
    }
}

/// Delete `channel` after `delay`. Not cancellable; failures are swallowed.
fn schedule_channel_deletion(app: &Arc<AppState>, channel: ChannelId, delay: Duration) {
    let platform = app.platform.clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        match platform.delete_channel(channel).await {
            Ok(()) => info!("Deleted channel {}", channel),
            Err(PlatformError::NotFound(_)) => {
                debug!("Channel {} was already gone", channel)
            }
            Err(e) => warn!("Failed to delete channel {}: {}", channel, e),
        }
    });
}

/// Grant each role in turn, carrying on past failures.
async fn execute_grant_roles(
    app: &AppState,
    decision: DecisionId,
    applicant: UserId,
    roles: Vec<RoleId>,
) -> EffectResult {
    let platform = app.platform.as_ref();
    let mut report = GrantReport {
        decision,
        applicant,
        granted: Vec::new(),
        failed: Vec::new(),
    };

    let held = match platform.fetch_member(applicant).await {
        Ok(member) => member.roles,
        Err(e) => {
            warn!("Could not fetch member {}: {}", applicant, e);
            report.failed = roles.into_iter().map(|r| (r, e.to_string())).collect();
            return EffectResult::single(Event::RolesGranted(report));
        }
    };

    for role in roles {
        let result = if held.contains(&role) {
            Ok(())
        } else {
            platform.grant_role(applicant, role).await
        };
        match result {
            Ok(()) => report.granted.push(role_or_placeholder(platform, role).await),
            Err(e) => {
                warn!("Failed to grant role {} to {}: {}", role, applicant, e);
                report.failed.push((role, e.to_string()));
            }
        }
    }

    info!(
        "Granted {} of {} role(s) to {} for application {}",
        report.granted.len(),
        report.granted.len() + report.failed.len(),
        applicant,
        decision
    );
    EffectResult::single(Event::RolesGranted(report))
}

fn describe_target(target: MessageTarget) -> String {
    match target {
        MessageTarget::Channel(channel) => format!("channel {}", channel),
        MessageTarget::User(user) => format!("user {}", user),
    }
}
