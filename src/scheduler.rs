// Timed attendance reminders, posted at fixed local times to every guild that
// has a reminder channel.

use std::sync::Arc;

use chrono::{DateTime, Days, FixedOffset, TimeZone, Utc};
use futures::future::join_all;
use tokio::task::JoinHandle;

use crate::discord::{ChatClient, OutgoingMessage};
use crate::guilds::GuildDirectory;
use crate::metrics;

/// The two daily reminder slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderSlot {
    Noon,
    Evening,
}

impl ReminderSlot {
    pub const ALL: [ReminderSlot; 2] = [ReminderSlot::Noon, ReminderSlot::Evening];

    /// Local hour the slot fires at (minute 0).
    pub fn hour(self) -> u32 {
        match self {
            ReminderSlot::Noon => 12,
            ReminderSlot::Evening => 19,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReminderSlot::Noon => "noon",
            ReminderSlot::Evening => "evening",
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            ReminderSlot::Noon => "@everyone\n# 📌 ĐIỂM DANH SỰ KIỆN XỊT SƠN TRƯA",
            ReminderSlot::Evening => "@everyone\n# 📌 ĐIỂM DANH SỰ KIỆN XỊT SƠN TỐI",
        }
    }

    pub fn message(self) -> OutgoingMessage {
        OutgoingMessage::text(self.text()).allow_mentions(&["everyone"])
    }
}

/// The earliest of `slots` strictly after `now`, evaluated in the `offset` zone.
/// `None` when `slots` is empty.
pub fn next_fire(
    now: DateTime<Utc>,
    slots: &[ReminderSlot],
    offset: FixedOffset,
) -> Option<(DateTime<Utc>, ReminderSlot)> {
    let today = now.with_timezone(&offset).date_naive();

    [0, 1]
        .into_iter()
        .filter_map(|days| today.checked_add_days(Days::new(days)))
        .flat_map(|date| slots.iter().map(move |&slot| (date, slot)))
        .filter_map(|(date, slot)| {
            let local = date.and_hms_opt(slot.hour(), 0, 0)?;
            let at = offset.from_local_datetime(&local).single()?.with_timezone(&Utc);
            (at > now).then_some((at, slot))
        })
        .min_by_key(|(at, _)| *at)
}

/// Post `slot`'s reminder to every configured channel. One guild failing does
/// not stop the others. Returns how many were delivered.
pub async fn send_reminders(
    client: &dyn ChatClient,
    guilds: &GuildDirectory,
    slot: ReminderSlot,
) -> usize {
    let message = slot.message();
    let targets = guilds.reminder_channels().await;

    let results = join_all(targets.iter().map(|&(guild_id, channel_id)| {
        let message = &message;
        async move {
            let result = client.send_message(channel_id, message).await;
            (guild_id, channel_id, result)
        }
    }))
    .await;

    let mut delivered = 0;
    for (guild_id, channel_id, result) in results {
        match result {
            Ok(()) => {
                delivered += 1;
                metrics::REMINDERS_SENT_TOTAL
                    .with_label_values(&[slot.label()])
                    .inc();
                tracing::info!(guild_id, channel_id, slot = slot.label(), "reminder sent");
            }
            Err(e) => {
                tracing::error!(
                    guild_id,
                    channel_id,
                    slot = slot.label(),
                    "failed to send reminder: {e}"
                );
            }
        }
    }
    delivered
}

/// Spawn the background task that sleeps until each slot and fires it.
pub fn spawn_reminder_worker(
    client: Arc<dyn ChatClient>,
    guilds: Arc<GuildDirectory>,
    offset: FixedOffset,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let Some((at, slot)) = next_fire(Utc::now(), &ReminderSlot::ALL, offset) else {
                tracing::error!("could not compute next reminder time, retrying in an hour");
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                continue;
            };
            tracing::info!(slot = slot.label(), fire_at = %at, "next reminder scheduled");

            let wait = (at - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            let delivered = send_reminders(client.as_ref(), &guilds, slot).await;
            tracing::info!(slot = slot.label(), delivered, "reminder round finished");
        }
    })
}
