// Integration tests for the interactions endpoint: signature checks, command
// dispatch, persistence, and what the bot posts back to Discord.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use ed25519_dalek::{Signer, SigningKey};
use serde_json::{json, Value};
use tokio::sync::{Mutex, Notify};
use tower::ServiceExt;

use crew_bot::api::handlers::{
    GUILD_ONLY, LOADING_STANDINGS, SCORES_ADDED, SCORES_CLEARED, STANDINGS_NOT_POSTED,
    UNREADABLE_BOARD, WRONG_SCORE_CHANNEL,
};
use crew_bot::api::{router, AppState};
use crew_bot::commands::CommandDefinition;
use crew_bot::discord::{ChatClient, DiscordError, OutgoingMessage, Snowflake};
use crew_bot::guilds::GuildDirectory;
use crew_bot::render::{EMPTY_STANDINGS, STANDINGS_TITLE};
use crew_bot::roles::{cycle_role_colors, ColorCycle};
use crew_bot::scheduler::{send_reminders, ReminderSlot};
use crew_bot::scores::ScoreStore;
use crew_bot::store::JsonFile;

const APPLICATION: Snowflake = 900;
const TOKEN: &str = "interaction-token";
const GUILD: Snowflake = 1000;
const CHANNEL: Snowflake = 2000;
const OTHER_CHANNEL: Snowflake = 2001;

const DISCORD_REFUSED: &str = "❌ Discord từ chối yêu cầu";

// ── Fake chat client ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Message(Snowflake, OutgoingMessage),
    RoleColor(Snowflake, Snowflake, u32),
    MemberRole(Snowflake, Snowflake, Snowflake),
    Followup(Snowflake, String, OutgoingMessage),
    Commands(usize),
}

/// Records every successful call. Calls touching a channel or role listed as
/// failing return a 500 instead, and `gate` holds channel messages back until
/// it is notified.
#[derive(Default)]
struct RecordingClient {
    calls: Mutex<Vec<Call>>,
    failing_channels: HashSet<Snowflake>,
    failing_roles: HashSet<Snowflake>,
    gate: Option<Arc<Notify>>,
}

impl RecordingClient {
    fn failing_channel(mut self, channel_id: Snowflake) -> Self {
        self.failing_channels.insert(channel_id);
        self
    }

    fn failing_role(mut self, role_id: Snowflake) -> Self {
        self.failing_roles.insert(role_id);
        self
    }

    fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    async fn messages(&self) -> Vec<(Snowflake, OutgoingMessage)> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                Call::Message(channel, msg) => Some((channel, msg)),
                _ => None,
            })
            .collect()
    }

    async fn followups(&self) -> Vec<OutgoingMessage> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|c| match c {
                Call::Followup(_, _, msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    /// Wait until follow-up number `index` (0-based) has been sent.
    async fn followup(&self, index: usize) -> OutgoingMessage {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if let Some(msg) = self.followups().await.get(index) {
                    return msg.clone();
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("follow-up was never sent")
    }

    async fn record(&self, call: Call) {
        self.calls.lock().await.push(call);
    }
}

fn server_error() -> DiscordError {
    DiscordError::Http {
        status: 500,
        body: "internal error".to_string(),
    }
}

#[async_trait]
impl ChatClient for RecordingClient {
    async fn send_message(
        &self,
        channel_id: Snowflake,
        message: &OutgoingMessage,
    ) -> Result<(), DiscordError> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.failing_channels.contains(&channel_id) {
            return Err(server_error());
        }
        self.record(Call::Message(channel_id, message.clone())).await;
        Ok(())
    }

    async fn set_role_color(
        &self,
        guild_id: Snowflake,
        role_id: Snowflake,
        color: u32,
    ) -> Result<(), DiscordError> {
        if self.failing_roles.contains(&role_id) {
            return Err(server_error());
        }
        self.record(Call::RoleColor(guild_id, role_id, color)).await;
        Ok(())
    }

    async fn add_member_role(
        &self,
        guild_id: Snowflake,
        user_id: Snowflake,
        role_id: Snowflake,
    ) -> Result<(), DiscordError> {
        if self.failing_roles.contains(&role_id) {
            return Err(server_error());
        }
        self.record(Call::MemberRole(guild_id, user_id, role_id)).await;
        Ok(())
    }

    async fn send_followup(
        &self,
        application_id: Snowflake,
        interaction_token: &str,
        message: &OutgoingMessage,
    ) -> Result<(), DiscordError> {
        self.record(Call::Followup(
            application_id,
            interaction_token.to_string(),
            message.clone(),
        ))
        .await;
        Ok(())
    }

    async fn overwrite_commands(
        &self,
        _application_id: Snowflake,
        commands: &[CommandDefinition],
    ) -> Result<(), DiscordError> {
        self.record(Call::Commands(commands.len())).await;
        Ok(())
    }
}

// ── Harness ──────────────────────────────────────────────────────────

struct Harness {
    dir: tempfile::TempDir,
    key: SigningKey,
    client: Arc<RecordingClient>,
    guilds: Arc<GuildDirectory>,
    scores: Arc<ScoreStore>,
    app: Router,
}

impl Harness {
    async fn new() -> Self {
        Self::with_client(RecordingClient::default()).await
    }

    async fn with_client(client: RecordingClient) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let key = SigningKey::from_bytes(&[42u8; 32]);
        let client = Arc::new(client);
        let guilds = Arc::new(
            GuildDirectory::load(JsonFile::new(dir.path().join("config.json")))
                .await
                .unwrap(),
        );
        let scores = Arc::new(
            ScoreStore::load(JsonFile::new(dir.path().join("data.json")))
                .await
                .unwrap(),
        );

        let state = AppState {
            client: client.clone(),
            guilds: guilds.clone(),
            scores: scores.clone(),
            public_key: key.verifying_key(),
            highlight: Arc::from("[DR] Dragons Breath"),
        };

        Self {
            app: router(state),
            dir,
            key,
            client,
            guilds,
            scores,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn signed(&self, payload: &Value) -> Request<Body> {
        let body = serde_json::to_vec(payload).unwrap();
        let timestamp = "1760000000";
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(&body);
        let signature = hex::encode(self.key.sign(&message).to_bytes());

        Request::builder()
            .method("POST")
            .uri("/interactions")
            .header("content-type", "application/json")
            .header("x-signature-ed25519", signature)
            .header("x-signature-timestamp", timestamp)
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Run a command and return the reply text the user ends up seeing,
    /// following deferred commands through to their follow-up.
    async fn run(&self, name: &str, channel: Snowflake, options: Value) -> String {
        self.run_payload(command(name, Some(GUILD), channel, options))
            .await
    }

    async fn run_payload(&self, payload: Value) -> String {
        let sent = self.client.followups().await.len();
        let (status, body) = self.send(self.signed(&payload)).await;
        assert_eq!(status, StatusCode::OK, "unexpected status: {body}");
        assert_eq!(body["data"]["flags"], 64);

        match body["type"].as_u64() {
            Some(4) => body["data"]["content"].as_str().unwrap().to_string(),
            Some(5) => {
                let followup = self.client.followup(sent).await;
                assert_eq!(followup.flags, Some(64));
                followup.content.unwrap()
            }
            other => panic!("unexpected response type {other:?}: {body}"),
        }
    }
}

fn command(name: &str, guild: Option<Snowflake>, channel: Snowflake, options: Value) -> Value {
    let mut payload = json!({
        "type": 2,
        "application_id": APPLICATION.to_string(),
        "token": TOKEN,
        "channel_id": channel.to_string(),
        "data": { "name": name, "options": options },
    });
    if let Some(guild) = guild {
        payload["guild_id"] = json!(guild.to_string());
    }
    payload
}

fn read_json(path: PathBuf) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ── Endpoint ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ping_is_answered_with_pong() {
    let h = Harness::new().await;
    let (status, body) = h.send(h.signed(&json!({ "type": 1 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "type": 1 }));
}

#[tokio::test]
async fn test_unsigned_request_rejected() {
    let h = Harness::new().await;
    let request = Request::builder()
        .method("POST")
        .uri("/interactions")
        .body(Body::from(r#"{"type":1}"#))
        .unwrap();
    let (status, _) = h.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_signed_by_other_key_rejected() {
    let h = Harness::new().await;
    let body = br#"{"type":1}"#;
    let other = SigningKey::from_bytes(&[1u8; 32]);
    let mut message = b"1760000000".to_vec();
    message.extend_from_slice(body);

    let request = Request::builder()
        .method("POST")
        .uri("/interactions")
        .header("x-signature-ed25519", hex::encode(other.sign(&message).to_bytes()))
        .header("x-signature-timestamp", "1760000000")
        .body(Body::from(&body[..]))
        .unwrap();
    let (status, _) = h.send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let h = Harness::new().await;
    let (status, body) = h
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "crew-bot");

    let response = h
        .app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_deferred_command_answers_before_api_calls_finish() {
    let gate = Arc::new(Notify::new());
    let h = Harness::with_client(RecordingClient::default().gated(gate.clone())).await;

    let payload = command("week", Some(GUILD), CHANNEL, json!([]));
    let (status, body) = tokio::time::timeout(Duration::from_secs(2), h.send(h.signed(&payload)))
        .await
        .expect("interaction response waited on the Discord API");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "type": 5, "data": { "flags": 64 } }));
    assert!(h.client.messages().await.is_empty());

    gate.notify_one();
    let followup = h.client.followup(0).await;
    assert_eq!(followup.content.as_deref(), Some(LOADING_STANDINGS));
    assert_eq!(h.client.messages().await.len(), 1);

    let calls = h.client.calls().await;
    assert!(matches!(
        calls.last(),
        Some(Call::Followup(APPLICATION, token, _)) if token == TOKEN
    ));
}

#[tokio::test]
async fn test_local_commands_answer_inline() {
    let h = Harness::new().await;
    let payload = command("clear", Some(GUILD), CHANNEL, json!([]));
    let (_, body) = h.send(h.signed(&payload)).await;
    assert_eq!(body["type"], 4);
    assert_eq!(body["data"]["content"], SCORES_CLEARED);
    assert!(h.client.followups().await.is_empty());
}

#[tokio::test]
async fn test_command_outside_guild() {
    let h = Harness::new().await;
    let payload = command("week", None, CHANNEL, json!([]));
    let (_, body) = h.send(h.signed(&payload)).await;
    assert_eq!(body["data"]["content"], GUILD_ONLY);
    assert!(h.client.calls().await.is_empty());
}

// ── Scores ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_tinhdiem_accumulates_and_posts_standings() {
    let h = Harness::new().await;
    let board = "1 [AB] Alpha Bravo 12,000\n2 [DR] Dragons Breath 9,500";

    let reply = h
        .run("tinhdiem", CHANNEL, json!([{ "name": "text", "type": 3, "value": board }]))
        .await;
    assert_eq!(reply, SCORES_ADDED);

    let reply = h
        .run(
            "tinhdiem",
            CHANNEL,
            json!([{ "name": "text", "type": 3, "value": "1 [DR] Dragons Breath 3,000" }]),
        )
        .await;
    assert_eq!(reply, SCORES_ADDED);

    let ledger = h.scores.snapshot().await;
    assert_eq!(ledger.get("[AB] Alpha Bravo"), Some(12_000));
    assert_eq!(ledger.get("[DR] Dragons Breath"), Some(12_500));
    assert_eq!(
        read_json(h.path("data.json")),
        json!({ "[AB] Alpha Bravo": 12000, "[DR] Dragons Breath": 12500 })
    );

    let messages = h.client.messages().await;
    assert_eq!(messages.len(), 2);
    let (channel, last) = &messages[1];
    assert_eq!(*channel, CHANNEL);
    let embed = &last.embeds[0];
    assert_eq!(embed.title.as_deref(), Some(STANDINGS_TITLE));
    assert_eq!(
        embed.description.as_deref(),
        Some("🔥 **1. [DR] Dragons Breath** — `12,500` điểm\n**2. [AB] Alpha Bravo** — `12,000` điểm")
    );
}

#[tokio::test]
async fn test_tinhdiem_unreadable_text() {
    let h = Harness::new().await;
    let reply = h
        .run(
            "tinhdiem",
            CHANNEL,
            json!([{ "name": "text", "type": 3, "value": "hello there" }]),
        )
        .await;
    assert_eq!(reply, UNREADABLE_BOARD);
    assert!(h.client.messages().await.is_empty());
    assert!(h.scores.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_tinhdiem_rejected_outside_score_channel() {
    let h = Harness::new().await;
    let reply = h
        .run(
            "tinhdiemroom",
            CHANNEL,
            json!([{ "name": "channel", "type": 7, "value": CHANNEL.to_string() }]),
        )
        .await;
    assert_eq!(reply, format!("✅ Đã set kênh tính điểm: <#{CHANNEL}>"));

    let options = json!([{ "name": "text", "type": 3, "value": "1 [A] Alpha 10" }]);
    let reply = h.run("tinhdiem", OTHER_CHANNEL, options.clone()).await;
    assert_eq!(reply, WRONG_SCORE_CHANNEL);
    assert!(h.scores.snapshot().await.is_empty());

    let reply = h.run("tinhdiem", CHANNEL, options).await;
    assert_eq!(reply, SCORES_ADDED);
}

#[tokio::test]
async fn test_failed_standings_post_still_confirms_points() {
    let h = Harness::with_client(RecordingClient::default().failing_channel(CHANNEL)).await;
    let options = json!([{ "name": "text", "type": 3, "value": "1 [A] Alpha 100" }]);

    let reply = h.run("tinhdiem", CHANNEL, options).await;
    assert_eq!(reply, format!("{SCORES_ADDED}\n{STANDINGS_NOT_POSTED}"));
    assert_eq!(h.scores.snapshot().await.get("[A] Alpha"), Some(100));
    assert_eq!(read_json(h.path("data.json")), json!({ "[A] Alpha": 100 }));
}

#[tokio::test]
async fn test_week_reports_failed_post() {
    let h = Harness::with_client(RecordingClient::default().failing_channel(CHANNEL)).await;
    let reply = h.run("week", CHANNEL, json!([])).await;
    assert_eq!(reply, DISCORD_REFUSED);
}

#[tokio::test]
async fn test_week_without_channel() {
    let h = Harness::new().await;
    let mut payload = command("week", Some(GUILD), CHANNEL, json!([]));
    payload.as_object_mut().unwrap().remove("channel_id");

    let reply = h.run_payload(payload).await;
    assert_eq!(reply, "❌ Không xác định được kênh");
    assert!(h.client.messages().await.is_empty());
}

#[tokio::test]
async fn test_tinhdiem_without_text_option() {
    let h = Harness::new().await;
    let reply = h.run("tinhdiem", CHANNEL, json!([])).await;
    assert_eq!(reply, "❌ Thiếu tham số `text`");
}

#[tokio::test]
async fn test_week_with_no_data() {
    let h = Harness::new().await;
    let reply = h.run("week", CHANNEL, json!([])).await;
    assert_eq!(reply, LOADING_STANDINGS);

    let messages = h.client.messages().await;
    assert_eq!(messages, vec![(CHANNEL, OutgoingMessage::text(EMPTY_STANDINGS))]);
}

#[tokio::test]
async fn test_week_surfaces_highlight_outside_top() {
    let h = Harness::new().await;
    let mut board = String::from("1 [DR] Dragons Breath 5\n");
    for (i, letter) in ('A'..='J').enumerate() {
        board.push_str(&format!("{} [T{letter}] Team {letter} {}\n", i + 2, 1000 + i));
    }
    h.run("tinhdiem", CHANNEL, json!([{ "name": "text", "type": 3, "value": board }]))
        .await;

    h.run("week", CHANNEL, json!([])).await;
    let messages = h.client.messages().await;
    let (_, standings) = messages.last().unwrap();
    let embed = &standings.embeds[0];
    assert_eq!(embed.description.as_deref().unwrap().lines().count(), 10);
    assert_eq!(embed.fields.len(), 1);
    assert_eq!(embed.fields[0].name, "🔥 [DR] Dragons Breath");
    assert_eq!(embed.fields[0].value, "Hạng 11 — `5` điểm");
}

#[tokio::test]
async fn test_clear_wipes_ledger() {
    let h = Harness::new().await;
    h.run(
        "tinhdiem",
        CHANNEL,
        json!([{ "name": "text", "type": 3, "value": "1 [A] Alpha 10" }]),
    )
    .await;

    let reply = h.run("clear", CHANNEL, json!([])).await;
    assert_eq!(reply, SCORES_CLEARED);
    assert!(h.scores.snapshot().await.is_empty());
    assert_eq!(read_json(h.path("data.json")), json!({}));
}

// ── Reminders ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_diemdanhroom_routes_reminders() {
    let h = Harness::new().await;
    let reply = h
        .run(
            "diemdanhroom",
            CHANNEL,
            json!([{ "name": "channel", "type": 7, "value": OTHER_CHANNEL.to_string() }]),
        )
        .await;
    assert_eq!(reply, format!("✅ Đã set kênh điểm danh: <#{OTHER_CHANNEL}>"));
    assert_eq!(
        read_json(h.path("config.json")),
        json!({ (GUILD.to_string()): { "diemdanh_channel": OTHER_CHANNEL } })
    );

    let delivered = send_reminders(h.client.as_ref(), &h.guilds, ReminderSlot::Evening).await;
    assert_eq!(delivered, 1);
    let messages = h.client.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, OTHER_CHANNEL);
    assert_eq!(
        messages[0].1.content.as_deref(),
        Some("@everyone\n# 📌 ĐIỂM DANH SỰ KIỆN XỊT SƠN TỐI")
    );
}

#[tokio::test]
async fn test_reminders_continue_past_failing_guild() {
    let h = Harness::with_client(RecordingClient::default().failing_channel(CHANNEL)).await;
    h.guilds
        .update(1, |s| s.diemdanh_channel = Some(CHANNEL))
        .await
        .unwrap();
    h.guilds
        .update(2, |s| s.diemdanh_channel = Some(OTHER_CHANNEL))
        .await
        .unwrap();

    let delivered = send_reminders(h.client.as_ref(), &h.guilds, ReminderSlot::Noon).await;
    assert_eq!(delivered, 1);
    let messages = h.client.messages().await;
    assert_eq!(messages, vec![(OTHER_CHANNEL, ReminderSlot::Noon.message())]);
}

// ── Roles ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_caprole_grants_and_announces_in_invoking_channel() {
    let h = Harness::new().await;
    let reply = h
        .run(
            "caprole",
            CHANNEL,
            json!([
                { "name": "member", "type": 6, "value": "555" },
                { "name": "role", "type": 8, "value": "777" }
            ]),
        )
        .await;
    assert_eq!(reply, "✅ Đã cấp role <@&777>");

    let calls = h.client.calls().await;
    assert_eq!(calls[0], Call::MemberRole(GUILD, 555, 777));
    match &calls[1] {
        Call::Message(channel, msg) => {
            assert_eq!(*channel, CHANNEL);
            assert_eq!(msg.content.as_deref(), Some("🎉 <@555> vừa được cấp role <@&777>!"));
        }
        other => panic!("expected announcement, got {other:?}"),
    }
}

#[tokio::test]
async fn test_caprole_uses_announcement_channel() {
    let h = Harness::new().await;
    h.run(
        "thongbaoroom",
        CHANNEL,
        json!([{ "name": "channel", "type": 7, "value": OTHER_CHANNEL.to_string() }]),
    )
    .await;
    h.run(
        "caprole",
        CHANNEL,
        json!([
            { "name": "member", "type": 6, "value": "1" },
            { "name": "role", "type": 8, "value": "2" }
        ]),
    )
    .await;

    let messages = h.client.messages().await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, OTHER_CHANNEL);
}

#[tokio::test]
async fn test_rainbowrole_feeds_color_cycle() {
    let h = Harness::new().await;
    let reply = h
        .run(
            "rainbowrole",
            CHANNEL,
            json!([{ "name": "role", "type": 8, "value": "888" }]),
        )
        .await;
    assert_eq!(reply, "🌈 Role <@&888> sẽ tự đổi màu");

    let mut cycle = ColorCycle::new(&[0x111111, 0x222222]);
    assert_eq!(cycle_role_colors(h.client.as_ref(), &h.guilds, &mut cycle).await, 1);
    assert_eq!(cycle_role_colors(h.client.as_ref(), &h.guilds, &mut cycle).await, 1);

    let colors: Vec<u32> = h
        .client
        .calls()
        .await
        .into_iter()
        .filter_map(|c| match c {
            Call::RoleColor(GUILD, 888, color) => Some(color),
            _ => None,
        })
        .collect();
    assert_eq!(colors.len(), 2);
    assert_ne!(colors[0], colors[1]);
}

#[tokio::test]
async fn test_color_cycle_continues_past_failing_role() {
    let h = Harness::with_client(RecordingClient::default().failing_role(888)).await;
    h.guilds
        .update(1, |s| s.rainbow_role = Some(888))
        .await
        .unwrap();
    h.guilds
        .update(2, |s| s.rainbow_role = Some(999))
        .await
        .unwrap();

    let mut cycle = ColorCycle::default();
    assert_eq!(cycle_role_colors(h.client.as_ref(), &h.guilds, &mut cycle).await, 1);

    let calls = h.client.calls().await;
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], Call::RoleColor(2, 999, _)));
}

#[tokio::test]
async fn test_caprole_failure_skips_announcement() {
    let h = Harness::with_client(RecordingClient::default().failing_role(777)).await;
    let reply = h
        .run(
            "caprole",
            CHANNEL,
            json!([
                { "name": "member", "type": 6, "value": "555" },
                { "name": "role", "type": 8, "value": "777" }
            ]),
        )
        .await;
    assert_eq!(reply, DISCORD_REFUSED);
    assert!(h.client.messages().await.is_empty());
}

#[tokio::test]
async fn test_sync_commands_registers_full_set() {
    let client = RecordingClient::default();
    let count = crew_bot::commands::sync_commands(&client, 1).await.unwrap();
    assert_eq!(count, 8);
    assert_eq!(client.calls().await, vec![Call::Commands(8)]);
}
