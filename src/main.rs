use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crew_bot::api::{self, AppState};
use crew_bot::config::Config;
use crew_bot::discord::{ChatClient, DiscordHttp};
use crew_bot::guilds::GuildDirectory;
use crew_bot::scores::ScoreStore;
use crew_bot::store::JsonFile;
use crew_bot::{commands, metrics, roles, scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load().context("invalid configuration")?;
    metrics::register_metrics();

    let client: Arc<dyn ChatClient> = Arc::new(
        DiscordHttp::new(&config.api_base_url, &config.token)
            .context("failed to build Discord client")?,
    );
    let guilds = Arc::new(
        GuildDirectory::load(JsonFile::new(&config.config_file))
            .await
            .context("failed to load guild settings")?,
    );
    let scores = Arc::new(
        ScoreStore::load(JsonFile::new(&config.data_file))
            .await
            .context("failed to load score ledger")?,
    );

    if config.sync_commands {
        // A failed sync leaves the previously registered commands in place.
        if let Err(e) = commands::sync_commands(client.as_ref(), config.application_id).await {
            tracing::error!("failed to sync slash commands: {e}");
        }
    }

    scheduler::spawn_reminder_worker(client.clone(), guilds.clone(), config.utc_offset);
    roles::spawn_color_worker(client.clone(), guilds.clone(), config.color_cycle_interval);

    let state = AppState {
        client,
        guilds,
        scores,
        public_key: config.public_key,
        highlight: Arc::from(config.highlight_gang.as_str()),
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("failed to bind to port {}", config.port))?;

    tracing::info!("crew-bot listening on port {}", config.port);
    axum::serve(listener, app)
        .await
        .context("server error")?;
    Ok(())
}
