// Discord wire types and the client seam the bot's handlers talk through.

pub mod http;
pub mod interaction;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::commands::CommandDefinition;

pub use http::DiscordHttp;

/// Discord object id.
pub type Snowflake = u64;

/// Message flag that shows a message only to the invoking user.
pub const MESSAGE_FLAG_EPHEMERAL: u64 = 1 << 6;

#[derive(Debug, thiserror::Error)]
pub enum DiscordError {
    #[error("discord returned {status}: {body}")]
    Http { status: u16, body: String },

    #[error("rate limited by discord (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Operations the bot needs from the chat platform.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_message(
        &self,
        channel_id: Snowflake,
        message: &OutgoingMessage,
    ) -> Result<(), DiscordError>;

    async fn set_role_color(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        color: u32,
    ) -> Result<(), DiscordError>;

    async fn add_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> Result<(), DiscordError>;

    /// Post a follow-up to a deferred interaction.
    async fn send_followup(
        &self,
        application_id: Snowflake,
        interaction_token: &str,
        message: &OutgoingMessage,
    ) -> Result<(), DiscordError>;

    /// Replace the application's global command set.
    async fn overwrite_commands(
        &self,
        application_id: Snowflake,
        commands: &[CommandDefinition],
    ) -> Result<(), DiscordError>;
}

// ── Messages ─────────────────────────────────────────────────────────

/// Body of a channel message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutgoingMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<AllowedMentions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }

    /// Restrict which mention kinds in the content actually ping.
    pub fn allow_mentions(mut self, parse: &[&str]) -> Self {
        self.allowed_mentions = Some(AllowedMentions {
            parse: parse.iter().map(|p| p.to_string()).collect(),
        });
        self
    }

    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(MESSAGE_FLAG_EPHEMERAL);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

// ── Mentions ─────────────────────────────────────────────────────────

pub fn channel_mention(id: Snowflake) -> String {
    format!("<#{id}>")
}

pub fn user_mention(id: Snowflake) -> String {
    format!("<@{id}>")
}

pub fn role_mention(id: Snowflake) -> String {
    format!("<@&{id}>")
}

// ── Snowflake decoding ───────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSnowflake {
    Text(String),
    Number(u64),
}

impl RawSnowflake {
    fn into_id(self) -> Option<Snowflake> {
        match self {
            RawSnowflake::Text(s) => s.parse().ok(),
            RawSnowflake::Number(n) => Some(n),
        }
    }
}

/// Decode an id sent either as a JSON string (Discord's encoding) or a number.
pub fn parse_snowflake(value: &serde_json::Value) -> Option<Snowflake> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// `deserialize_with` helper for optional ids.
pub fn deserialize_optional_snowflake<'de, D>(deserializer: D) -> Result<Option<Snowflake>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawSnowflake>::deserialize(deserializer)?;
    Ok(raw.and_then(RawSnowflake::into_id))
}
