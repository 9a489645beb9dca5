// Message formatting: standings embed, reminders, role-grant announcements.

use crate::discord::{role_mention, user_mention, Embed, EmbedField, OutgoingMessage, Snowflake};
use crate::scores::{Ranked, Standings};

pub const STANDINGS_TITLE: &str = "🏆 TOP TUẦN – CREW";
pub const EMPTY_STANDINGS: &str = "📭 Chưa có dữ liệu";
pub const GOLD: u32 = 0xF1C40F;

const HIGHLIGHT_MARK: &str = "🔥";

/// Format an integer with `,` thousands separators: `1234567` -> `1,234,567`.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn standings_line(entry: &Ranked) -> String {
    let line = format!(
        "**{}. {}** — `{}` điểm",
        entry.rank,
        entry.name,
        format_thousands(entry.score)
    );
    if entry.highlighted {
        format!("{HIGHLIGHT_MARK} {line}")
    } else {
        line
    }
}

/// Render standings as an embed, or the "no data yet" text when nothing has been scored.
pub fn standings_message(standings: &Standings) -> OutgoingMessage {
    if standings.is_empty() {
        return OutgoingMessage::text(EMPTY_STANDINGS);
    }

    let description = standings
        .top
        .iter()
        .map(standings_line)
        .collect::<Vec<_>>()
        .join("\n");

    let fields = standings
        .highlighted
        .iter()
        .map(|entry| EmbedField {
            name: format!("{HIGHLIGHT_MARK} {}", entry.name),
            value: format!(
                "Hạng {} — `{}` điểm",
                entry.rank,
                format_thousands(entry.score)
            ),
            inline: false,
        })
        .collect();

    OutgoingMessage::embed(Embed {
        title: Some(STANDINGS_TITLE.to_string()),
        description: Some(description),
        color: Some(GOLD),
        fields,
    })
}

pub fn role_grant_message(user_id: Snowflake, role_id: Snowflake) -> OutgoingMessage {
    OutgoingMessage::text(format!(
        "🎉 {} vừa được cấp role {}!",
        user_mention(user_id),
        role_mention(role_id)
    ))
    .allow_mentions(&["users"])
}
