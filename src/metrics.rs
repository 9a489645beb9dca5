// Prometheus metrics definitions for crew-bot.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Gauges ───────────────────────────────────────────────────────

    /// Groups currently tracked in the score ledger.
    pub static ref LEDGER_ENTRIES: IntGauge =
        IntGauge::new("crewbot_ledger_entries", "Groups tracked in the score ledger").unwrap();

    // ── Counters ─────────────────────────────────────────────────────

    /// Slash commands received, by command name.
    pub static ref COMMANDS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("crewbot_commands_total", "Slash commands received"),
        &["command"],
    )
    .unwrap();

    /// Score submissions, by outcome (accepted, unreadable, wrong_channel).
    pub static ref SCORE_SUBMISSIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("crewbot_score_submissions_total", "Leaderboard pastes submitted"),
        &["outcome"],
    )
    .unwrap();

    /// Parsed leaderboard rows added to the ledger.
    pub static ref SCORE_LINES_ACCUMULATED_TOTAL: IntCounter = IntCounter::new(
        "crewbot_score_lines_accumulated_total",
        "Leaderboard rows added to the ledger",
    )
    .unwrap();

    /// Reminders delivered, by slot.
    pub static ref REMINDERS_SENT_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("crewbot_reminders_sent_total", "Scheduled reminders delivered"),
        &["slot"],
    )
    .unwrap();

    /// Role color updates, by outcome.
    pub static ref ROLE_COLOR_UPDATES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("crewbot_role_color_updates_total", "Role color updates attempted"),
        &["outcome"],
    )
    .unwrap();

    /// Failed Discord REST calls, by operation.
    pub static ref DISCORD_API_ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("crewbot_discord_api_errors_total", "Failed Discord REST calls"),
        &["operation"],
    )
    .unwrap();

    /// Interaction requests rejected for a bad or missing signature.
    pub static ref SIGNATURE_REJECTIONS_TOTAL: IntCounter = IntCounter::new(
        "crewbot_signature_rejections_total",
        "Interaction requests with invalid signatures",
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// Time spent answering a slash command, by command name.
    pub static ref COMMAND_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "crewbot_command_duration_seconds",
            "Slash command handling time in seconds",
        )
        .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["command"],
    )
    .unwrap();
}

static REGISTER: Once = Once::new();

/// Register all metrics with the custom registry. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(LEDGER_ENTRIES.clone()),
            Box::new(COMMANDS_TOTAL.clone()),
            Box::new(SCORE_SUBMISSIONS_TOTAL.clone()),
            Box::new(SCORE_LINES_ACCUMULATED_TOTAL.clone()),
            Box::new(REMINDERS_SENT_TOTAL.clone()),
            Box::new(ROLE_COLOR_UPDATES_TOTAL.clone()),
            Box::new(DISCORD_API_ERRORS_TOTAL.clone()),
            Box::new(SIGNATURE_REJECTIONS_TOTAL.clone()),
            Box::new(COMMAND_DURATION_SECONDS.clone()),
        ];

        for c in collectors {
            if let Err(e) = REGISTRY.register(c) {
                tracing::error!("failed to register metric: {e}");
            }
        }
    });
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("failed to encode metrics: {e}");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
