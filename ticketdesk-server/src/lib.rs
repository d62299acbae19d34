pub mod config;
pub mod dispatcher;
pub mod effect;
pub mod event;
pub mod ingress;
pub mod interpreter;
pub mod interview;
pub mod platform;
pub mod provisioner;
pub mod review;
pub mod scheduler;
pub mod store;

use std::sync::Arc;

use config::Config;
use interview::InterviewEngine;
use platform::ChatPlatform;
use provisioner::ChannelProvisioner;
use review::ReviewWorkflow;
use scheduler::Scheduler;
use ticketdesk_core::Questionnaire;

pub use dispatcher::Dispatcher;
pub use event::{Acknowledgement, InboundEvent};

/// Everything an event handler needs, shared across requests.
pub struct AppState {
    pub config: Config,
    pub platform: Arc<dyn ChatPlatform>,
    pub interview: InterviewEngine,
    pub provisioner: ChannelProvisioner,
    pub review: ReviewWorkflow,
    pub scheduler: Scheduler,
}

impl AppState {
    pub fn new(config: Config, platform: Arc<dyn ChatPlatform>) -> Self {
        Self::with_questionnaire(config, platform, Questionnaire::staff_application())
    }

    pub fn with_questionnaire(
        config: Config,
        platform: Arc<dyn ChatPlatform>,
        questionnaire: Questionnaire,
    ) -> Self {
        let questionnaire = Arc::new(questionnaire);
        Self {
            interview: InterviewEngine::new(questionnaire.clone(), &config.timing),
            provisioner: ChannelProvisioner::new(config.access_roles()),
            review: ReviewWorkflow::new(
                questionnaire,
                config.review_channel,
                config.reviewer_role,
                config.assignable_roles.clone(),
            ),
            scheduler: Scheduler::new(),
            config,
            platform,
        }
    }
}
