//! Channel provisioner: creates permission-scoped ticket channels.

use tracing::{error, info};

use crate::platform::{ChatPlatform, CreateChannelRequest, User};
use ticketdesk_core::{
    channel_name, channel_topic, resolve_visibility, AccessRoles, ChannelId, RequestType,
    TicketError, UserId, Visibility,
};

pub struct ChannelProvisioner {
    roles: AccessRoles,
}

impl ChannelProvisioner {
    pub fn new(roles: AccessRoles) -> Self {
        Self { roles }
    }

    pub fn roles(&self) -> &AccessRoles {
        &self.roles
    }

    pub fn resolve_visibility(&self, request_type: RequestType, requester: UserId) -> Visibility {
        resolve_visibility(request_type, requester, &self.roles)
    }

    /// Create the ticket channel for `requester`, filed under the category
    /// named after the request type.
    ///
    /// Only structure is created; posting the ticket message is up to the
    /// caller.
    pub async fn provision(
        &self,
        platform: &dyn ChatPlatform,
        request_type: RequestType,
        requester: &User,
    ) -> Result<ChannelId, TicketError> {
        let failed = |reason: String| {
            error!(
                "Failed to provision {} ticket for {}: {}",
                request_type, requester.id, reason
            );
            TicketError::ProvisioningFailed {
                request_type,
                reason,
            }
        };

        let category = platform
            .ensure_category(request_type.display_name())
            .await
            .map_err(|e| failed(format!("category unavailable: {}", e)))?;

        let request = CreateChannelRequest {
            name: channel_name(request_type, &requester.display_name),
            parent: Some(category),
            overwrites: self
                .resolve_visibility(request_type, requester.id)
                .into_overwrites(),
            topic: channel_topic(request_type, &requester.username, requester.id),
        };

        let channel = platform
            .create_channel(&request)
            .await
            .map_err(|e| failed(e.to_string()))?;

        info!(
            "Provisioned {} ticket channel {} ({}) for {}",
            request_type, request.name, channel, requester.id
        );
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{Call, MockPlatform};
    use ticketdesk_core::{
        parse_topic, GuildId, OverwriteTarget, Permissions, RoleId, TicketTopic,
    };

    const SUPPORT: RoleId = RoleId(50);
    const ADMIN: RoleId = RoleId(51);

    fn provisioner() -> ChannelProvisioner {
        ChannelProvisioner::new(AccessRoles {
            support: Some(SUPPORT),
            admin: Some(ADMIN),
            ..AccessRoles::new(GuildId(1))
        })
    }

    fn requester() -> User {
        User {
            id: UserId(5),
            username: "alice".to_string(),
            display_name: "Alice Smith!".to_string(),
        }
    }

    #[tokio::test]
    async fn test_provision_creates_scoped_channel() {
        let platform = MockPlatform::new();
        let channel = provisioner()
            .provision(&platform, RequestType::Support, &requester())
            .await
            .unwrap();

        assert_eq!(
            platform.calls()[0],
            Call::EnsureCategory("Support".to_string())
        );
        let created = platform.created_channels();
        assert_eq!(created.len(), 1);
        let request = &created[0];
        assert_eq!(request.name, "support-alice-smith");
        assert_eq!(request.parent, Some(ChannelId(1)));
        assert_eq!(
            parse_topic(&request.topic),
            Some(TicketTopic {
                requester: UserId(5),
                request_type: RequestType::Support,
            })
        );
        assert!(request
            .overwrites
            .iter()
            .any(|o| o.target == OverwriteTarget::Role(SUPPORT)
                && o.allow.contains(Permissions::READ_WRITE)));
        assert_eq!(
            request.overwrites.last().map(|o| o.target),
            Some(OverwriteTarget::Role(ADMIN))
        );
        assert!(channel.0 > 1000);
    }

    #[tokio::test]
    async fn test_creation_failure_is_provisioning_failed() {
        let platform = MockPlatform::new().failing_channel_creation();
        let result = provisioner()
            .provision(&platform, RequestType::ContactOwner, &requester())
            .await;

        assert!(matches!(
            result,
            Err(TicketError::ProvisioningFailed {
                request_type: RequestType::ContactOwner,
                ..
            })
        ));
    }
}
