// crew-bot: Discord automation for a crew community. Scheduled attendance
// reminders, a weekly score ledger fed from pasted leaderboards, and role
// color cycling with role-grant announcements.

pub mod api;
pub mod commands;
pub mod config;
pub mod discord;
pub mod guilds;
pub mod metrics;
pub mod render;
pub mod roles;
pub mod scheduler;
pub mod scores;
pub mod store;
