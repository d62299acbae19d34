//! Review workflow: publishes completed interviews and applies verdicts.
//!
//! Each published request gets its own id, embedded in the reviewer
//! controls, so any number of applications can be pending at once. A
//! request accepts exactly one verdict; later clicks are rejected with
//! `AlreadyDecided`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::effect::{DecisionRequestMessage, Effect, GrantReport, LogLevel, MessageContent};
use crate::event::Actor;
use crate::platform::{ChatPlatform, MessageHandle, MessageTarget, Role};
use crate::store::DecisionStore;
use ticketdesk_core::{
    ChannelId, DecisionId, DecisionRequest, Questionnaire, RoleId, TicketError, UserId, Verdict,
};

pub struct ReviewWorkflow {
    decisions: DecisionStore,
    questionnaire: Arc<Questionnaire>,
    review_channel: ChannelId,
    reviewer_role: Option<RoleId>,
    assignable_roles: Vec<RoleId>,
}

impl ReviewWorkflow {
    pub fn new(
        questionnaire: Arc<Questionnaire>,
        review_channel: ChannelId,
        reviewer_role: Option<RoleId>,
        assignable_roles: Vec<RoleId>,
    ) -> Self {
        Self {
            decisions: DecisionStore::new(),
            questionnaire,
            review_channel,
            reviewer_role,
            assignable_roles,
        }
    }

    pub fn decisions(&self) -> &DecisionStore {
        &self.decisions
    }

    /// Post a decision request for `applicant` to the review channel.
    pub async fn publish(
        &self,
        platform: &dyn ChatPlatform,
        applicant: UserId,
        answers: Vec<String>,
    ) -> Result<DecisionId, TicketError> {
        let request = DecisionRequest::new(applicant, answers);
        let id = request.id();

        let mut assignable = Vec::with_capacity(self.assignable_roles.len());
        for &role in &self.assignable_roles {
            assignable.push(role_or_placeholder(platform, role).await);
        }

        let message = DecisionRequestMessage {
            decision: id,
            applicant,
            title: self.questionnaire.title().to_string(),
            answers: self
                .questionnaire
                .questions()
                .map(str::to_string)
                .zip(request.answers().iter().cloned())
                .collect(),
            assignable,
        };

        // The request is only stored once its controls are on screen.
        let mut controls = None;
        for page in message.render_pages() {
            let handle = platform
                .send_message(MessageTarget::Channel(self.review_channel), &page)
                .await
                .map_err(|e| {
                    e.into_ticket_error(format!("review channel {}", self.review_channel))
                })?;
            controls = Some(handle);
        }
        let Some(controls) = controls else {
            return Err(TicketError::not_found(format!(
                "review message for application {}",
                id
            )));
        };
        self.decisions.insert(request, controls).await;

        info!("Published application {} from {} for review", id, applicant);
        Ok(id)
    }

    /// Where the controls of request `id` were rendered.
    pub async fn message_for(&self, id: DecisionId) -> Option<MessageHandle> {
        self.decisions.get(id).await.ok().map(|d| d.message)
    }

    pub async fn deny(&self, id: DecisionId, reviewer: &Actor) -> Result<Vec<Effect>, TicketError> {
        self.authorize(reviewer, "deny applications")?;
        let decided = self.decisions.decide(id, reviewer.id, Verdict::Deny).await?;
        let applicant = decided.request.applicant();

        Ok(vec![
            Effect::DisableDecisionControls { decision: id },
            Effect::SendMessage {
                target: MessageTarget::User(applicant),
                content: MessageContent::ApplicationDenied,
            },
            Effect::Log {
                level: LogLevel::Info,
                message: format!(
                    "Application {} from {} denied by {}",
                    id, applicant, reviewer.id
                ),
            },
        ])
    }

    /// Accept request `id`, granting `roles` to the applicant.
    ///
    /// Every role must come from the assignable set; otherwise nothing is
    /// decided and `Forbidden` is returned.
    pub async fn accept(
        &self,
        id: DecisionId,
        reviewer: &Actor,
        roles: Vec<RoleId>,
    ) -> Result<Vec<Effect>, TicketError> {
        self.authorize(reviewer, "accept applications")?;
        if roles.is_empty() {
            return Err(TicketError::forbidden(
                reviewer.id,
                "accept an application without choosing a role",
            ));
        }
        if let Some(role) = roles.iter().find(|r| !self.assignable_roles.contains(r)) {
            return Err(TicketError::forbidden(
                reviewer.id,
                format!("assign role {}", role),
            ));
        }

        let mut roles = roles;
        roles.sort();
        roles.dedup();

        let decided = self
            .decisions
            .decide(
                id,
                reviewer.id,
                Verdict::Accept {
                    roles: roles.clone(),
                },
            )
            .await?;
        let applicant = decided.request.applicant();

        Ok(vec![
            Effect::DisableDecisionControls { decision: id },
            Effect::GrantRoles {
                decision: id,
                applicant,
                roles,
            },
            Effect::Log {
                level: LogLevel::Info,
                message: format!(
                    "Application {} from {} accepted by {}",
                    id, applicant, reviewer.id
                ),
            },
        ])
    }

    /// Notify the applicant once their roles have been granted.
    pub fn on_roles_granted(&self, report: &GrantReport) -> Vec<Effect> {
        let mut effects = vec![Effect::SendMessage {
            target: MessageTarget::User(report.applicant),
            content: MessageContent::ApplicationAccepted {
                role_names: report.granted.iter().map(|r| r.name.clone()).collect(),
            },
        }];

        if !report.failed.is_empty() {
            let failed: Vec<String> = report
                .failed
                .iter()
                .map(|(role, reason)| format!("{} ({})", role, reason))
                .collect();
            effects.push(Effect::Log {
                level: LogLevel::Warn,
                message: format!(
                    "Application {}: could not grant {} to {}",
                    report.decision,
                    failed.join(", "),
                    report.applicant
                ),
            });
        }
        effects
    }

    fn authorize(&self, reviewer: &Actor, action: &str) -> Result<(), TicketError> {
        if reviewer.is_admin || reviewer.has_role(self.reviewer_role) {
            Ok(())
        } else {
            Err(TicketError::forbidden(reviewer.id, action))
        }
    }
}

/// Resolve a role's name, falling back to its id if it cannot be fetched.
pub async fn role_or_placeholder(platform: &dyn ChatPlatform, role: RoleId) -> Role {
    match platform.fetch_role(role).await {
        Ok(role) => role,
        Err(e) => {
            warn!("Could not fetch role {}: {}", role, e);
            Role {
                id: role,
                name: role.to_string(),
            }
        }
    }
}
