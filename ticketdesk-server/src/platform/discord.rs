//! Discord REST API implementation of [`ChatPlatform`].

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::{
    ButtonStyle, ChatPlatform, Component, CreateChannelRequest, Member, MessageHandle,
    MessageTarget, OutgoingMessage, PlatformError, Role, User,
};
use ticketdesk_core::{
    ChannelId, GuildId, MessageId, OverwriteTarget, PermissionOverwrite, RoleId, UserId,
};

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/ticketdesk/ticketdesk, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

const TEXT_CHANNEL: u8 = 0;
const CATEGORY_CHANNEL: u8 = 4;

/// Buttons per action row allowed by the platform.
const MAX_BUTTONS_PER_ROW: usize = 5;

#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    token: String,
    guild: GuildId,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct RawChannel {
    id: ChannelId,
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: MessageId,
    channel_id: ChannelId,
}

#[derive(Debug, Deserialize)]
struct RawUser {
    id: UserId,
    username: String,
    #[serde(default)]
    global_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    user: RawUser,
    roles: Vec<RoleId>,
}

#[derive(Debug, Deserialize)]
struct RawRole {
    id: RoleId,
    name: String,
}

impl DiscordClient {
    pub fn new(token: impl Into<String>, guild: GuildId) -> Self {
        Self {
            client: Client::new(),
            token: token.into(),
            guild,
            base_url: DEFAULT_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<reqwest::Response, PlatformError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, path);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", format!("Bot {}", self.token))
            .header("User-Agent", USER_AGENT);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(PlatformError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlatformError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, PlatformError> {
        self.request(method, path, body)
            .await?
            .json::<T>()
            .await
            .map_err(|e| PlatformError::Transport(format!("invalid response body: {}", e)))
    }

    async fn dm_channel(&self, user: UserId) -> Result<ChannelId, PlatformError> {
        let channel: RawChannel = self
            .request_json(
                Method::POST,
                "/users/@me/channels",
                Some(json!({ "recipient_id": user })),
            )
            .await?;
        Ok(channel.id)
    }
}

#[async_trait]
impl ChatPlatform for DiscordClient {
    async fn ensure_category(&self, name: &str) -> Result<ChannelId, PlatformError> {
        let channels: Vec<RawChannel> = self
            .request_json(Method::GET, &format!("/guilds/{}/channels", self.guild), None)
            .await?;

        if let Some(existing) = channels.iter().find(|c| {
            c.kind == CATEGORY_CHANNEL
                && c.name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
        }) {
            return Ok(existing.id);
        }

        let created: RawChannel = self
            .request_json(
                Method::POST,
                &format!("/guilds/{}/channels", self.guild),
                Some(json!({ "name": name, "type": CATEGORY_CHANNEL })),
            )
            .await?;
        info!("Created category {} ({})", name, created.id);
        Ok(created.id)
    }

    async fn create_channel(
        &self,
        request: &CreateChannelRequest,
    ) -> Result<ChannelId, PlatformError> {
        let overwrites: Vec<Value> = request.overwrites.iter().map(overwrite_json).collect();
        let created: RawChannel = self
            .request_json(
                Method::POST,
                &format!("/guilds/{}/channels", self.guild),
                Some(json!({
                    "name": request.name,
                    "type": TEXT_CHANNEL,
                    "parent_id": request.parent,
                    "topic": request.topic,
                    "permission_overwrites": overwrites,
                })),
            )
            .await?;
        Ok(created.id)
    }

    async fn send_message(
        &self,
        target: MessageTarget,
        message: &OutgoingMessage,
    ) -> Result<MessageHandle, PlatformError> {
        let channel = match target {
            MessageTarget::Channel(channel) => channel,
            MessageTarget::User(user) => self.dm_channel(user).await?,
        };

        let sent: RawMessage = self
            .request_json(
                Method::POST,
                &format!("/channels/{}/messages", channel),
                Some(json!({
                    "content": message.content,
                    "components": components_json(&message.components),
                    "allowed_mentions": { "parse": ["users"] },
                })),
            )
            .await?;
        Ok(MessageHandle {
            channel: sent.channel_id,
            message: sent.id,
        })
    }

    async fn disable_components(&self, message: MessageHandle) -> Result<(), PlatformError> {
        self.request(
            Method::PATCH,
            &format!("/channels/{}/messages/{}", message.channel, message.message),
            Some(json!({ "components": [] })),
        )
        .await?;
        Ok(())
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<(), PlatformError> {
        self.request(Method::DELETE, &format!("/channels/{}", channel), None)
            .await?;
        Ok(())
    }

    async fn grant_role(&self, user: UserId, role: RoleId) -> Result<(), PlatformError> {
        self.request(
            Method::PUT,
            &format!("/guilds/{}/members/{}/roles/{}", self.guild, user, role),
            None,
        )
        .await?;
        Ok(())
    }

    async fn fetch_member(&self, user: UserId) -> Result<Member, PlatformError> {
        let member: RawMember = self
            .request_json(
                Method::GET,
                &format!("/guilds/{}/members/{}", self.guild, user),
                None,
            )
            .await?;
        Ok(Member {
            user: member.user.id,
            roles: member.roles,
        })
    }

    async fn fetch_user(&self, user: UserId) -> Result<User, PlatformError> {
        let raw: RawUser = self
            .request_json(Method::GET, &format!("/users/{}", user), None)
            .await?;
        Ok(User {
            id: raw.id,
            display_name: raw.global_name.unwrap_or_else(|| raw.username.clone()),
            username: raw.username,
        })
    }

    async fn fetch_role(&self, role: RoleId) -> Result<Role, PlatformError> {
        let roles: Vec<RawRole> = self
            .request_json(Method::GET, &format!("/guilds/{}/roles", self.guild), None)
            .await?;
        roles
            .into_iter()
            .find(|r| r.id == role)
            .map(|r| Role {
                id: r.id,
                name: r.name,
            })
            .ok_or_else(|| PlatformError::NotFound(format!("role {}", role)))
    }
}

/// Wire form of a permission overwrite.
fn overwrite_json(overwrite: &PermissionOverwrite) -> Value {
    let (id, kind) = match overwrite.target {
        OverwriteTarget::Role(role) => (role.to_string(), 0),
        OverwriteTarget::Member(user) => (user.to_string(), 1),
    };
    json!({
        "id": id,
        "type": kind,
        "allow": overwrite.allow.bits().to_string(),
        "deny": overwrite.deny.bits().to_string(),
    })
}

fn button_style(style: ButtonStyle) -> u8 {
    match style {
        ButtonStyle::Primary => 1,
        ButtonStyle::Secondary => 2,
        ButtonStyle::Success => 3,
        ButtonStyle::Danger => 4,
    }
}

/// Wire form of a component list: consecutive buttons share action rows of
/// up to five, each menu gets a row of its own.
fn components_json(components: &[Component]) -> Value {
    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut buttons: Vec<Value> = Vec::new();

    for component in components {
        match component {
            Component::Button { id, label, style } => {
                if buttons.len() == MAX_BUTTONS_PER_ROW {
                    rows.push(std::mem::take(&mut buttons));
                }
                buttons.push(json!({
                    "type": 2,
                    "style": button_style(*style),
                    "label": label,
                    "custom_id": id,
                }));
            }
            Component::Menu {
                id,
                placeholder,
                options,
                max_values,
            } => {
                if !buttons.is_empty() {
                    rows.push(std::mem::take(&mut buttons));
                }
                let options: Vec<Value> = options
                    .iter()
                    .map(|o| json!({ "label": o.label, "value": o.value }))
                    .collect();
                let max_values = (*max_values).clamp(1, options.len().max(1));
                rows.push(vec![json!({
                    "type": 3,
                    "custom_id": id,
                    "placeholder": placeholder,
                    "options": options,
                    "min_values": 1,
                    "max_values": max_values,
                })]);
            }
        }
    }
    if !buttons.is_empty() {
        rows.push(buttons);
    }

    Value::Array(
        rows.into_iter()
            .map(|row| json!({ "type": 1, "components": row }))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MenuOption;
    use ticketdesk_core::Permissions;

    fn button(n: usize) -> Component {
        Component::Button {
            id: format!("b{}", n),
            label: format!("Button {}", n),
            style: ButtonStyle::Primary,
        }
    }

    #[test]
    fn test_overwrite_json_for_role_and_member() {
        let role = overwrite_json(&PermissionOverwrite::deny(
            OverwriteTarget::Role(RoleId(5)),
            Permissions::VIEW_CHANNEL,
        ));
        assert_eq!(
            role,
            json!({ "id": "5", "type": 0, "allow": "0", "deny": "1024" })
        );

        let member = overwrite_json(&PermissionOverwrite::allow(
            OverwriteTarget::Member(UserId(6)),
            Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES,
        ));
        assert_eq!(member["type"], 1);
        assert_eq!(member["allow"], "3072");
    }

    #[test]
    fn test_buttons_are_split_into_rows_of_five() {
        let components: Vec<Component> = (0..6).map(button).collect();
        let rows = components_json(&components);
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["components"].as_array().unwrap().len(), 5);
        assert_eq!(rows[1]["components"][0]["custom_id"], "b5");
    }

    #[test]
    fn test_menu_gets_its_own_row_and_clamped_max() {
        let components = vec![
            button(0),
            Component::Menu {
                id: "menu".to_string(),
                placeholder: "Pick".to_string(),
                options: vec![MenuOption {
                    label: "Mod".to_string(),
                    value: "1".to_string(),
                }],
                max_values: 10,
            },
        ];
        let rows = components_json(&components);
        let rows = rows.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["components"][0]["type"], 3);
        assert_eq!(rows[1]["components"][0]["max_values"], 1);
    }

    #[test]
    fn test_no_components_is_empty_array() {
        assert_eq!(components_json(&[]), json!([]));
    }
}
