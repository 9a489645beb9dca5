// REST implementation of `ChatClient` (reqwest against the Discord HTTP API).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{ChatClient, DiscordError, OutgoingMessage, Snowflake};
use crate::commands::CommandDefinition;
use crate::metrics;

pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

const USER_AGENT: &str = concat!("DiscordBot (crew-bot, ", env!("CARGO_PKG_VERSION"), ")");
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Waits longer than this are surfaced as `RateLimited` instead of slept through.
const MAX_RETRY_WAIT: Duration = Duration::from_secs(10);
const MAX_RETRIES: u32 = 2;

#[derive(Deserialize)]
struct RateLimitBody {
    retry_after: f64,
}

/// Discord REST client authenticated with a bot token.
#[derive(Debug, Clone)]
pub struct DiscordHttp {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DiscordHttp {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, DiscordError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, sleeping through short 429s. Non-2xx responses become errors.
    async fn execute<B>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<reqwest::Response, DiscordError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let mut retries = 0;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .header(AUTHORIZATION, format!("Bot {}", self.token));
            request = match body {
                Some(body) => request.json(body),
                // Discord wants an explicit zero length on bodiless PUTs.
                None => request.header(reqwest::header::CONTENT_LENGTH, 0),
            };

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    metrics::DISCORD_API_ERRORS_TOTAL
                        .with_label_values(&[operation])
                        .inc();
                    return Err(e.into());
                }
            };
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .json::<RateLimitBody>()
                    .await
                    .ok()
                    .filter(|b| b.retry_after.is_finite() && b.retry_after >= 0.0)
                    .map(|b| Duration::from_secs_f64(b.retry_after));

                match retry_after {
                    Some(wait) if wait <= MAX_RETRY_WAIT && retries < MAX_RETRIES => {
                        retries += 1;
                        tracing::warn!(
                            operation,
                            retry = retries,
                            wait_ms = wait.as_millis() as u64,
                            "discord rate limit hit, retrying"
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    _ => {
                        metrics::DISCORD_API_ERRORS_TOTAL
                            .with_label_values(&[operation])
                            .inc();
                        return Err(DiscordError::RateLimited { retry_after });
                    }
                }
            }

            metrics::DISCORD_API_ERRORS_TOTAL
                .with_label_values(&[operation])
                .inc();
            let body = response.text().await.unwrap_or_default();
            return Err(DiscordError::Http {
                status: status.as_u16(),
                body,
            });
        }
    }
}

#[async_trait]
impl ChatClient for DiscordHttp {
    async fn send_message(
        &self,
        channel_id: Snowflake,
        message: &OutgoingMessage,
    ) -> Result<(), DiscordError> {
        self.execute(
            "send_message",
            Method::POST,
            &format!("/channels/{channel_id}/messages"),
            Some(message),
        )
        .await?;
        Ok(())
    }

    async fn set_role_color(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        color: u32,
    ) -> Result<(), DiscordError> {
        self.execute(
            "set_role_color",
            Method::PATCH,
            &format!("/guilds/{guild_id}/roles/{role_id}"),
            Some(&json!({ "color": color })),
        )
        .await?;
        Ok(())
    }

    async fn add_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> Result<(), DiscordError> {
        self.execute(
            "add_member_role",
            Method::PUT,
            &format!("/guilds/{guild_id}/members/{user_id}/roles/{role_id}"),
            None::<&()>,
        )
        .await?;
        Ok(())
    }

    async fn send_followup(
        &self,
        application_id: Snowflake,
        interaction_token: &str,
        message: &OutgoingMessage,
    ) -> Result<(), DiscordError> {
        self.execute(
            "send_followup",
            Method::POST,
            &format!("/webhooks/{application_id}/{interaction_token}"),
            Some(message),
        )
        .await?;
        Ok(())
    }

    async fn overwrite_commands(
        &self,
        application_id: Snowflake,
        commands: &[CommandDefinition],
    ) -> Result<(), DiscordError> {
        self.execute(
            "overwrite_commands",
            Method::PUT,
            &format!("/applications/{application_id}/commands"),
            Some(commands),
        )
        .await?;
        Ok(())
    }
}
