// Slash-command catalogue and registration with Discord.

use serde::Serialize;

use crate::discord::{ChatClient, DiscordError, Snowflake};

// Application command option types.
const OPTION_STRING: u8 = 3;
const OPTION_USER: u8 = 6;
const OPTION_CHANNEL: u8 = 7;
const OPTION_ROLE: u8 = 8;

const CHANNEL_GUILD_TEXT: u8 = 0;

/// Permission bitset string for ADMINISTRATOR; Discord hides the command from everyone else.
const ADMINISTRATOR: &str = "8";

/// Every command the bot answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Set the reminder channel.
    DiemDanhRoom,
    /// Set the channel scores must be submitted in.
    TinhDiemRoom,
    /// Submit a pasted leaderboard.
    TinhDiem,
    /// Show the weekly standings.
    Week,
    /// Wipe the score ledger.
    Clear,
    /// Set the role-grant announcement channel.
    ThongBaoRoom,
    /// Pick the role whose color cycles.
    RainbowRole,
    /// Grant a role to a member and announce it.
    CapRole,
}

impl Command {
    pub const ALL: [Command; 8] = [
        Command::DiemDanhRoom,
        Command::TinhDiemRoom,
        Command::TinhDiem,
        Command::Week,
        Command::Clear,
        Command::ThongBaoRoom,
        Command::RainbowRole,
        Command::CapRole,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::DiemDanhRoom => "diemdanhroom",
            Command::TinhDiemRoom => "tinhdiemroom",
            Command::TinhDiem => "tinhdiem",
            Command::Week => "week",
            Command::Clear => "clear",
            Command::ThongBaoRoom => "thongbaoroom",
            Command::RainbowRole => "rainbowrole",
            Command::CapRole => "caprole",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn is_admin_only(self) -> bool {
        !matches!(self, Command::TinhDiem | Command::Week)
    }

    /// Commands that call the Discord API before they can answer. These are
    /// acknowledged at once and answered with a follow-up.
    pub fn is_deferred(self) -> bool {
        matches!(self, Command::TinhDiem | Command::Week | Command::CapRole)
    }

    fn description(self) -> &'static str {
        match self {
            Command::DiemDanhRoom => "Set kênh điểm danh",
            Command::TinhDiemRoom => "Set kênh tính điểm",
            Command::TinhDiem => "Cộng điểm từ bảng xếp hạng",
            Command::Week => "Xem TOP TUẦN",
            Command::Clear => "Xóa toàn bộ điểm",
            Command::ThongBaoRoom => "Set kênh thông báo cấp role",
            Command::RainbowRole => "Chọn role đổi màu tự động",
            Command::CapRole => "Cấp role cho thành viên",
        }
    }

    fn options(self) -> Vec<CommandOptionDefinition> {
        match self {
            Command::DiemDanhRoom | Command::TinhDiemRoom | Command::ThongBaoRoom => {
                vec![CommandOptionDefinition::channel("channel", "Kênh văn bản")]
            }
            Command::TinhDiem => vec![CommandOptionDefinition::required(
                OPTION_STRING,
                "text",
                "Dán bảng điểm",
            )],
            Command::RainbowRole => vec![CommandOptionDefinition::required(
                OPTION_ROLE,
                "role",
                "Role cần đổi màu",
            )],
            Command::CapRole => vec![
                CommandOptionDefinition::required(OPTION_USER, "member", "Thành viên"),
                CommandOptionDefinition::required(OPTION_ROLE, "role", "Role cần cấp"),
            ],
            Command::Week | Command::Clear => Vec::new(),
        }
    }

    pub fn definition(self) -> CommandDefinition {
        CommandDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            options: self.options(),
            default_member_permissions: self.is_admin_only().then(|| ADMINISTRATOR.to_string()),
            dm_permission: false,
        }
    }
}

/// Global application command as sent to the bulk-overwrite endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandDefinition {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOptionDefinition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_member_permissions: Option<String>,
    pub dm_permission: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOptionDefinition {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub channel_types: Vec<u8>,
}

impl CommandOptionDefinition {
    fn required(kind: u8, name: &str, description: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            description: description.to_string(),
            required: true,
            channel_types: Vec::new(),
        }
    }

    fn channel(name: &str, description: &str) -> Self {
        Self {
            channel_types: vec![CHANNEL_GUILD_TEXT],
            ..Self::required(OPTION_CHANNEL, name, description)
        }
    }
}

pub fn definitions() -> Vec<CommandDefinition> {
    Command::ALL.into_iter().map(Command::definition).collect()
}

/// Publish the command set, replacing whatever was registered before.
pub async fn sync_commands(
    client: &dyn ChatClient,
    application_id: Snowflake,
) -> Result<usize, DiscordError> {
    let commands = definitions();
    client.overwrite_commands(application_id, &commands).await?;
    tracing::info!(count = commands.len(), "slash commands synced");
    Ok(commands.len())
}
