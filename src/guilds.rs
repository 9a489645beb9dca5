// Per-guild settings (which channels and roles the bot uses), persisted as one
// JSON object keyed by guild id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::discord::Snowflake;
use crate::store::{JsonFile, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildSettings {
    /// Channel that receives the scheduled attendance reminders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diemdanh_channel: Option<Snowflake>,
    /// When set, score submissions are only accepted here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tinhdiem_channel: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub announce_channel: Option<Snowflake>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rainbow_role: Option<Snowflake>,
    /// Keys written by something else are carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// All guild settings plus the file they live in.
pub struct GuildDirectory {
    file: JsonFile,
    state: Mutex<Directory>,
}

#[derive(Clone)]
struct Directory {
    /// The file contents as last written, including entries that did not parse.
    document: Map<String, Value>,
    guilds: BTreeMap<Snowflake, GuildSettings>,
}

impl GuildDirectory {
    /// Load settings, skipping entries that are not well-formed objects so a
    /// single bad entry does not take the other guilds down with it. Skipped
    /// entries stay in the file.
    pub async fn load(file: JsonFile) -> Result<Self, StoreError> {
        let document: Map<String, Value> = file.load_or_init(Map::new()).await?;

        let mut guilds = BTreeMap::new();
        for (key, value) in &document {
            let Ok(guild_id) = key.parse::<Snowflake>() else {
                tracing::warn!(key = %key, "skipping guild settings with non-numeric id");
                continue;
            };
            if !value.is_object() {
                tracing::warn!(guild_id, "skipping guild settings that are not an object");
                continue;
            }
            match GuildSettings::deserialize(value) {
                Ok(settings) => {
                    guilds.insert(guild_id, settings);
                }
                Err(e) => tracing::warn!(guild_id, "skipping malformed guild settings: {e}"),
            }
        }

        tracing::info!(
            path = %file.path().display(),
            guilds = guilds.len(),
            "guild settings loaded"
        );
        Ok(Self {
            file,
            state: Mutex::new(Directory { document, guilds }),
        })
    }

    /// Settings for a guild; a guild never configured gets the defaults.
    pub async fn get(&self, guild_id: Snowflake) -> GuildSettings {
        self.state
            .lock()
            .await
            .guilds
            .get(&guild_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Mutate one guild's settings and persist. Only that guild's entry in the
    /// file is rewritten.
    pub async fn update<F>(&self, guild_id: Snowflake, f: F) -> Result<GuildSettings, StoreError>
    where
        F: FnOnce(&mut GuildSettings),
    {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        let settings = next.guilds.entry(guild_id).or_default();
        f(settings);
        let updated = settings.clone();

        let value = serde_json::to_value(&updated).map_err(|source| StoreError::Json {
            path: self.file.path().to_path_buf(),
            source,
        })?;
        next.document.insert(guild_id.to_string(), value);

        self.file.save(&next.document).await?;
        *state = next;
        Ok(updated)
    }

    /// `(guild, channel)` for every guild with a reminder channel.
    pub async fn reminder_channels(&self) -> Vec<(Snowflake, Snowflake)> {
        self.state
            .lock()
            .await
            .guilds
            .iter()
            .filter_map(|(&guild, s)| s.diemdanh_channel.map(|c| (guild, c)))
            .collect()
    }

    /// `(guild, role)` for every guild with a color-cycling role.
    pub async fn rainbow_roles(&self) -> Vec<(Snowflake, Snowflake)> {
        self.state
            .lock()
            .await
            .guilds
            .iter()
            .filter_map(|(&guild, s)| s.rainbow_role.map(|r| (guild, r)))
            .collect()
    }
}
