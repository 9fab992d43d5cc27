//! Dashboard panels
//!
//! Each panel owns one dashboard: its refresh coordinator, a clone of the
//! portal client captured by the tick callback, and the last payload it was
//! handed. Ticks never touch the terminal; they post payloads onto the
//! console's update channel and the draw loop applies them in order.

mod logs;
mod metrics;
mod recovery;

pub use logs::{LogEntry, LogLevel, LogsPanel};
pub use metrics::MetricsPanel;
pub use recovery::{ComponentStatus, RecoveryPanel};

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use serde_json::Value;

use vigil_core::{RefreshCoordinator, RefreshMode, UsageLevel};

/// Payload routed from a refresh tick to the panel that requested it
#[derive(Debug)]
pub enum PanelUpdate {
    Metrics(Value),
    Logs(Value),
    Recovery(Value),
}

pub(crate) fn level_color(level: UsageLevel) -> Color {
    match level {
        UsageLevel::Normal => Color::Green,
        UsageLevel::Warning => Color::Yellow,
        UsageLevel::Danger => Color::Red,
    }
}

/// One-line panel footer: running state, cadence, last update, failure marker.
pub(crate) fn status_footer(refresh: &RefreshCoordinator) -> Line<'static> {
    let status = refresh.status();
    let state_color = match status.label() {
        "LIVE" => Color::Green,
        "PAUSED" => Color::Yellow,
        _ => Color::DarkGray,
    };

    let mut spans = vec![Span::styled(
        format!("● {}", status.label()),
        Style::default().fg(state_color),
    )];
    match refresh.mode() {
        RefreshMode::Auto => spans.push(Span::raw(format!(
            "  every {}s",
            refresh.config().interval.as_secs()
        ))),
        RefreshMode::Manual => spans.push(Span::raw("  on demand")),
    }
    if let Some(ts) = status.last_tick {
        spans.push(Span::raw(format!("  updated {}", ts.format("%H:%M:%S"))));
    }
    if status.last_error.is_some() {
        spans.push(Span::styled(
            "  last refresh failed",
            Style::default().fg(Color::Red),
        ));
    }
    Line::from(spans)
}
