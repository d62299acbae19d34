//! Recording in-memory platform for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    ChatPlatform, CreateChannelRequest, Member, MessageHandle, MessageTarget, OutgoingMessage,
    PlatformError, Role, User,
};
use ticketdesk_core::{ChannelId, MessageId, RoleId, UserId};

/// Every outbound call the engine made, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    EnsureCategory(String),
    CreateChannel(CreateChannelRequest),
    SendMessage(MessageTarget, OutgoingMessage),
    DisableComponents(MessageHandle),
    DeleteChannel(ChannelId),
    GrantRole(UserId, RoleId),
}

#[derive(Default)]
struct MockState {
    calls: Vec<Call>,
    next_id: u64,
    users: HashMap<UserId, User>,
    members: HashMap<UserId, Vec<RoleId>>,
    roles: HashMap<RoleId, String>,
    failing_grants: HashSet<RoleId>,
    fail_create_channel: bool,
    deleted: HashSet<ChannelId>,
    last_handle: Option<MessageHandle>,
}

#[derive(Default)]
pub struct MockPlatform {
    state: Mutex<MockState>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_id: 1000,
                ..MockState::default()
            }),
        }
    }

    pub fn with_user(self, id: UserId, username: &str) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.users.insert(
                id,
                User {
                    id,
                    username: username.to_string(),
                    display_name: username.to_string(),
                },
            );
            state.members.entry(id).or_default();
        }
        self
    }

    pub fn with_role(self, id: RoleId, name: &str) -> Self {
        self.state.lock().unwrap().roles.insert(id, name.to_string());
        self
    }

    pub fn with_member_role(self, user: UserId, role: RoleId) -> Self {
        self.state
            .lock()
            .unwrap()
            .members
            .entry(user)
            .or_default()
            .push(role);
        self
    }

    pub fn failing_grant(self, role: RoleId) -> Self {
        self.state.lock().unwrap().failing_grants.insert(role);
        self
    }

    pub fn failing_channel_creation(self) -> Self {
        self.state.lock().unwrap().fail_create_channel = true;
        self
    }

    /// Treat `channel` as gone: sends to it fail with `NotFound`.
    pub fn unavailable_channel(self, channel: ChannelId) -> Self {
        self.state.lock().unwrap().deleted.insert(channel);
        self
    }

    pub fn last_message_handle(&self) -> Option<MessageHandle> {
        self.state.lock().unwrap().last_handle
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Messages sent to `target`, oldest first.
    pub fn messages_to(&self, target: MessageTarget) -> Vec<OutgoingMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SendMessage(t, message) if t == target => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn created_channels(&self) -> Vec<CreateChannelRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::CreateChannel(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn granted(&self) -> Vec<(UserId, RoleId)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::GrantRole(user, role) => Some((user, role)),
                _ => None,
            })
            .collect()
    }

    pub fn was_deleted(&self, channel: ChannelId) -> bool {
        self.state.lock().unwrap().deleted.contains(&channel)
    }

    pub fn member_roles(&self, user: UserId) -> Vec<RoleId> {
        self.state
            .lock()
            .unwrap()
            .members
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    fn next_id(state: &mut MockState) -> u64 {
        state.next_id += 1;
        state.next_id
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn ensure_category(&self, name: &str) -> Result<ChannelId, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::EnsureCategory(name.to_string()));
        Ok(ChannelId(1))
    }

    async fn create_channel(
        &self,
        request: &CreateChannelRequest,
    ) -> Result<ChannelId, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::CreateChannel(request.clone()));
        if state.fail_create_channel {
            return Err(PlatformError::Api {
                status: 403,
                body: "Missing Permissions".to_string(),
            });
        }
        Ok(ChannelId(Self::next_id(&mut state)))
    }

    async fn send_message(
        &self,
        target: MessageTarget,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, PlatformError> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::SendMessage(target, message.clone()));
        let channel = match target {
            MessageTarget::Channel(channel) => {
                if state.deleted.contains(&channel) {
                    return Err(PlatformError::NotFound(format!("channel {}", channel)));
                }
                channel
            }
            MessageTarget::User(user) => ChannelId(user.0),
        };
        let handle = MessageHandle {
            channel,
            message: MessageId(Self::next_id(&mut state)),
        };
        state.last_handle = Some(handle);
        Ok(handle)
    }

    async fn disable_components(&self, message: MessageHandle) -> Result<(), PlatformError> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(Call::DisableComponents(message));
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::DeleteChannel(channel));
        if !state.deleted.insert(channel) {
            return Err(PlatformError::NotFound(format!("channel {}", channel)));
        }
        Ok(())
    }

    async fn grant_role(&self, user: UserId, role: RoleId) -> Result<(), PlatformError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GrantRole(user, role));
        if state.failing_grants.contains(&role) {
            return Err(PlatformError::Api {
                status: 403,
                body: "Missing Permissions".to_string(),
            });
        }
        let roles = state
            .members
            .get_mut(&user)
            .ok_or_else(|| PlatformError::NotFound(format!("member {}", user)))?;
        if !roles.contains(&role) {
            roles.push(role);
        }
        Ok(())
    }

    async fn fetch_member(&self, user: UserId) -> Result<Member, PlatformError> {
        let state = self.state.lock().unwrap();
        state
            .members
            .get(&user)
            .map(|roles| Member {
                user,
                roles: roles.clone(),
            })
            .ok_or_else(|| PlatformError::NotFound(format!("member {}", user)))
    }

    async fn fetch_user(&self, user: UserId) -> Result<User, PlatformError> {
        let state = self.state.lock().unwrap();
        state
            .users
            .get(&user)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("user {}", user)))
    }

    async fn fetch_role(&self, role: RoleId) -> Result<Role, PlatformError> {
        let state = self.state.lock().unwrap();
        state
            .roles
            .get(&role)
            .map(|name| Role {
                id: role,
                name: name.clone(),
            })
            .ok_or_else(|| PlatformError::NotFound(format!("role {}", role)))
    }
}
