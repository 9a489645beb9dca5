// Role color cycling and role-grant announcements.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::discord::{ChatClient, DiscordError, Snowflake};
use crate::guilds::GuildDirectory;
use crate::metrics;
use crate::render;

/// Colors the rainbow role steps through, in order.
pub const PALETTE: [u32; 7] = [
    0xE74C3C, // red
    0xE67E22, // orange
    0xF1C40F, // gold
    0x2ECC71, // green
    0x3498DB, // blue
    0x9B59B6, // purple
    0xE91E63, // pink
];

/// Per-guild position in the palette. Each guild starts at a random color.
#[derive(Debug, Clone)]
pub struct ColorCycle {
    palette: Vec<u32>,
    positions: HashMap<Snowflake, usize>,
}

impl ColorCycle {
    pub fn new(palette: &[u32]) -> Self {
        Self {
            palette: palette.to_vec(),
            positions: HashMap::new(),
        }
    }

    /// Next color for `guild_id`, or `None` for an empty palette.
    pub fn advance(&mut self, guild_id: Snowflake) -> Option<u32> {
        if self.palette.is_empty() {
            return None;
        }
        let len = self.palette.len();
        let position = self
            .positions
            .entry(guild_id)
            .and_modify(|p| *p = (*p + 1) % len)
            .or_insert_with(|| rand::thread_rng().gen_range(0..len));
        Some(self.palette[*position])
    }
}

impl Default for ColorCycle {
    fn default() -> Self {
        Self::new(&PALETTE)
    }
}

/// Step every configured rainbow role to its next color. Returns how many roles were updated.
pub async fn cycle_role_colors(
    client: &dyn ChatClient,
    guilds: &GuildDirectory,
    cycle: &mut ColorCycle,
) -> usize {
    let mut updated = 0;
    for (guild_id, role_id) in guilds.rainbow_roles().await {
        let Some(color) = cycle.advance(guild_id) else {
            continue;
        };
        match client.set_role_color(guild_id, role_id, color).await {
            Ok(()) => {
                updated += 1;
                metrics::ROLE_COLOR_UPDATES_TOTAL
                    .with_label_values(&["ok"])
                    .inc();
                tracing::debug!(
                    guild_id,
                    role_id,
                    color = %format!("#{color:06X}"),
                    "role color updated"
                );
            }
            Err(e) => {
                metrics::ROLE_COLOR_UPDATES_TOTAL
                    .with_label_values(&["error"])
                    .inc();
                tracing::warn!(guild_id, role_id, "failed to update role color: {e}");
            }
        }
    }
    updated
}

/// Spawn the color cycling task. A zero interval disables cycling.
pub fn spawn_color_worker(
    client: Arc<dyn ChatClient>,
    guilds: Arc<GuildDirectory>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        tracing::info!("role color cycling disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut cycle = ColorCycle::default();
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            cycle_role_colors(client.as_ref(), &guilds, &mut cycle).await;
        }
    }))
}

/// Give `user_id` the role, then announce it in the guild's announcement
/// channel, or `fallback_channel` when none is configured.
///
/// Returns the channel the announcement went to, if any.
pub async fn grant_and_announce(
    client: &dyn ChatClient,
    guilds: &GuildDirectory,
    guild_id: Snowflake,
    user_id: Snowflake,
    role_id: Snowflake,
    fallback_channel: Option<Snowflake>,
) -> Result<Option<Snowflake>, DiscordError> {
    client.add_member_role(guild_id, user_id, role_id).await?;
    tracing::info!(guild_id, user_id, role_id, "role granted");

    let channel = guilds.get(guild_id).await.announce_channel.or(fallback_channel);
    if let Some(channel_id) = channel {
        client
            .send_message(channel_id, &render::role_grant_message(user_id, role_id))
            .await?;
    }
    Ok(channel)
}
