// Slash command handlers. Each returns the ephemeral reply shown to the caller.

use std::time::Instant;

use crate::api::AppState;
use crate::commands::Command;
use crate::discord::interaction::{CommandData, Interaction, InteractionResponse};
use crate::discord::{channel_mention, role_mention, DiscordError, OutgoingMessage, Snowflake};
use crate::metrics;
use crate::render;
use crate::roles;
use crate::scores::{parse_leaderboard, TOP_N};
use crate::store::StoreError;

// ── Replies ──────────────────────────────────────────────────────────

pub const GUILD_ONLY: &str = "❌ Lệnh chỉ dùng trong server";
pub const UNKNOWN_COMMAND: &str = "❌ Lệnh không hợp lệ";
pub const WRONG_SCORE_CHANNEL: &str = "❌ Sai kênh tính điểm";
pub const UNREADABLE_BOARD: &str = "❌ Không đọc được dữ liệu";
pub const SCORES_ADDED: &str = "✅ Đã cộng điểm";
pub const STANDINGS_NOT_POSTED: &str = "⚠️ Không gửi được bảng xếp hạng";
pub const LOADING_STANDINGS: &str = "📊 Đang tải bảng xếp hạng...";
pub const SCORES_CLEARED: &str = "🧹 Đã xóa toàn bộ điểm!";

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("missing option `{0}`")]
    MissingOption(&'static str),

    #[error("interaction has no channel")]
    NoChannel,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Discord(#[from] DiscordError),
}

impl CommandError {
    /// What the invoking user sees.
    pub fn user_message(&self) -> String {
        match self {
            CommandError::MissingOption(name) => format!("❌ Thiếu tham số `{name}`"),
            CommandError::NoChannel => "❌ Không xác định được kênh".to_string(),
            CommandError::Store(_) => "❌ Không lưu được dữ liệu".to_string(),
            CommandError::Discord(_) => "❌ Discord từ chối yêu cầu".to_string(),
        }
    }
}

/// Where and with what a command was invoked.
struct Invocation<'a> {
    guild_id: Snowflake,
    channel_id: Option<Snowflake>,
    data: &'a CommandData,
}

impl Invocation<'_> {
    fn snowflake(&self, name: &'static str) -> Result<Snowflake, CommandError> {
        self.data
            .snowflake(name)
            .ok_or(CommandError::MissingOption(name))
    }

    fn string(&self, name: &'static str) -> Result<&str, CommandError> {
        self.data.string(name).ok_or(CommandError::MissingOption(name))
    }
}

/// Answer an application command interaction.
///
/// Commands that only touch local state are answered inline. Deferred
/// commands are acknowledged right away and their reply is delivered as a
/// follow-up from a background task, so slow or rate-limited API calls never
/// hold the response past Discord's three second deadline.
pub async fn respond(state: &AppState, interaction: Interaction) -> InteractionResponse {
    let deferred = interaction.guild_id.is_some()
        && interaction
            .data
            .as_ref()
            .and_then(|d| Command::from_name(&d.name))
            .is_some_and(Command::is_deferred);

    let target = interaction
        .followup_target()
        .map(|(app, token)| (app, token.to_string()));
    let Some((application_id, token)) = target.filter(|_| deferred) else {
        return InteractionResponse::ephemeral(dispatch(state, &interaction).await);
    };

    let state = state.clone();
    tokio::spawn(async move {
        let reply = dispatch(&state, &interaction).await;
        let message = OutgoingMessage::text(reply).allow_mentions(&[]).ephemeral();
        if let Err(e) = state
            .client
            .send_followup(application_id, &token, &message)
            .await
        {
            tracing::error!(application_id, "failed to send follow-up: {e}");
        }
    });
    InteractionResponse::deferred_ephemeral()
}

/// Route an application command to its handler.
pub async fn dispatch(state: &AppState, interaction: &Interaction) -> String {
    let Some(data) = interaction.data.as_ref() else {
        return UNKNOWN_COMMAND.to_string();
    };
    let Some(command) = Command::from_name(&data.name) else {
        tracing::warn!(name = %data.name, "unknown command");
        return UNKNOWN_COMMAND.to_string();
    };
    metrics::COMMANDS_TOTAL
        .with_label_values(&[command.name()])
        .inc();

    let Some(guild_id) = interaction.guild_id else {
        return GUILD_ONLY.to_string();
    };
    let invocation = Invocation {
        guild_id,
        channel_id: interaction.channel_id,
        data,
    };

    let started = Instant::now();
    let result = match command {
        Command::DiemDanhRoom => set_reminder_channel(state, &invocation).await,
        Command::TinhDiemRoom => set_score_channel(state, &invocation).await,
        Command::TinhDiem => submit_scores(state, &invocation).await,
        Command::Week => show_standings(state, &invocation).await,
        Command::Clear => clear_scores(state).await,
        Command::ThongBaoRoom => set_announce_channel(state, &invocation).await,
        Command::RainbowRole => set_rainbow_role(state, &invocation).await,
        Command::CapRole => grant_role(state, &invocation).await,
    };
    metrics::COMMAND_DURATION_SECONDS
        .with_label_values(&[command.name()])
        .observe(started.elapsed().as_secs_f64());

    match result {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(guild_id, command = command.name(), "command failed: {e}");
            e.user_message()
        }
    }
}

// ── Channel / role settings ──────────────────────────────────────────

async fn set_reminder_channel(
    state: &AppState,
    invocation: &Invocation<'_>,
) -> Result<String, CommandError> {
    let channel = invocation.snowflake("channel")?;
    state
        .guilds
        .update(invocation.guild_id, |s| s.diemdanh_channel = Some(channel))
        .await?;
    tracing::info!(guild_id = invocation.guild_id, channel_id = channel, "reminder channel set");
    Ok(format!("✅ Đã set kênh điểm danh: {}", channel_mention(channel)))
}

async fn set_score_channel(
    state: &AppState,
    invocation: &Invocation<'_>,
) -> Result<String, CommandError> {
    let channel = invocation.snowflake("channel")?;
    state
        .guilds
        .update(invocation.guild_id, |s| s.tinhdiem_channel = Some(channel))
        .await?;
    tracing::info!(guild_id = invocation.guild_id, channel_id = channel, "score channel set");
    Ok(format!("✅ Đã set kênh tính điểm: {}", channel_mention(channel)))
}

async fn set_announce_channel(
    state: &AppState,
    invocation: &Invocation<'_>,
) -> Result<String, CommandError> {
    let channel = invocation.snowflake("channel")?;
    state
        .guilds
        .update(invocation.guild_id, |s| s.announce_channel = Some(channel))
        .await?;
    Ok(format!("✅ Đã set kênh thông báo role: {}", channel_mention(channel)))
}

async fn set_rainbow_role(
    state: &AppState,
    invocation: &Invocation<'_>,
) -> Result<String, CommandError> {
    let role = invocation.snowflake("role")?;
    state
        .guilds
        .update(invocation.guild_id, |s| s.rainbow_role = Some(role))
        .await?;
    tracing::info!(guild_id = invocation.guild_id, role_id = role, "rainbow role set");
    Ok(format!("🌈 Role {} sẽ tự đổi màu", role_mention(role)))
}

// ── Scores ───────────────────────────────────────────────────────────

async fn post_standings(state: &AppState, channel_id: Option<Snowflake>) -> Result<(), CommandError> {
    let Some(channel_id) = channel_id else {
        tracing::warn!("no channel to post standings to");
        return Err(CommandError::NoChannel);
    };
    let standings = state
        .scores
        .standings(TOP_N, Some(state.highlight.as_ref()))
        .await;
    let message = render::standings_message(&standings);
    state.client.send_message(channel_id, &message).await?;
    Ok(())
}

async fn submit_scores(
    state: &AppState,
    invocation: &Invocation<'_>,
) -> Result<String, CommandError> {
    let text = invocation.string("text")?;

    let settings = state.guilds.get(invocation.guild_id).await;
    if let Some(required) = settings.tinhdiem_channel {
        if invocation.channel_id != Some(required) {
            metrics::SCORE_SUBMISSIONS_TOTAL
                .with_label_values(&["wrong_channel"])
                .inc();
            return Ok(WRONG_SCORE_CHANNEL.to_string());
        }
    }

    let lines = parse_leaderboard(text);
    if lines.is_empty() {
        metrics::SCORE_SUBMISSIONS_TOTAL
            .with_label_values(&["unreadable"])
            .inc();
        return Ok(UNREADABLE_BOARD.to_string());
    }

    let applied = state.scores.accumulate(&lines).await?;
    metrics::SCORE_SUBMISSIONS_TOTAL
        .with_label_values(&["accepted"])
        .inc();
    tracing::info!(guild_id = invocation.guild_id, rows = applied, "scores accumulated");

    // Points are already committed, so the reply still confirms them.
    if let Err(e) = post_standings(state, invocation.channel_id).await {
        tracing::error!(guild_id = invocation.guild_id, "failed to post standings: {e}");
        return Ok(format!("{SCORES_ADDED}\n{STANDINGS_NOT_POSTED}"));
    }
    Ok(SCORES_ADDED.to_string())
}

async fn show_standings(
    state: &AppState,
    invocation: &Invocation<'_>,
) -> Result<String, CommandError> {
    post_standings(state, invocation.channel_id).await?;
    Ok(LOADING_STANDINGS.to_string())
}

async fn clear_scores(state: &AppState) -> Result<String, CommandError> {
    state.scores.clear().await?;
    tracing::info!("score ledger cleared");
    Ok(SCORES_CLEARED.to_string())
}

// ── Roles ────────────────────────────────────────────────────────────

async fn grant_role(state: &AppState, invocation: &Invocation<'_>) -> Result<String, CommandError> {
    let member = invocation.snowflake("member")?;
    let role = invocation.snowflake("role")?;
    roles::grant_and_announce(
        state.client.as_ref(),
        &state.guilds,
        invocation.guild_id,
        member,
        role,
        invocation.channel_id,
    )
    .await?;
    Ok(format!("✅ Đã cấp role {}", role_mention(role)))
}
