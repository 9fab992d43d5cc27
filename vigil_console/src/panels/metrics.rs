//! System metrics panel - CPU, memory and disk gauges

use std::time::Duration;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Frame;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use vigil_core::{MetricsSnapshot, PortalClient, RefreshConfig, RefreshCoordinator, UsageLevel};

use super::{level_color, status_footer, PanelUpdate};

pub struct MetricsPanel {
    refresh: RefreshCoordinator,
    snapshot: Option<MetricsSnapshot>,
}

impl MetricsPanel {
    pub fn new(
        client: PortalClient,
        interval: Duration,
        updates: UnboundedSender<PanelUpdate>,
    ) -> Self {
        let refresh = RefreshCoordinator::new(
            RefreshConfig::new("metrics", interval),
            move |cancel| {
                let client = client.clone();
                let updates = updates.clone();
                async move {
                    let payload = client.metrics().await?;
                    if !cancel.is_cancelled() {
                        let _ = updates.send(PanelUpdate::Metrics(payload));
                    }
                    Ok(())
                }
            },
        );
        Self {
            refresh,
            snapshot: None,
        }
    }

    pub fn refresh(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    pub fn refresh_mut(&mut self) -> &mut RefreshCoordinator {
        &mut self.refresh
    }

    pub fn apply(&mut self, payload: Value) {
        self.snapshot = Some(MetricsSnapshot::new(payload));
    }

    /// Manual refresh drops the cached payload first, like the portal's full
    /// page reload
    pub fn reload(&mut self) {
        self.snapshot = None;
        self.refresh.refresh_now();
    }

    pub fn cpu(&self) -> Option<(f64, UsageLevel)> {
        self.reading("performance.cpu.usage_percent")
    }

    pub fn memory(&self) -> Option<(f64, UsageLevel)> {
        self.reading("performance.memory.usage_percent")
    }

    pub fn disk(&self) -> Option<(f64, UsageLevel)> {
        self.reading("performance.disk.usage_percent")
    }

    fn reading(&self, path: &str) -> Option<(f64, UsageLevel)> {
        let pct = self.snapshot.as_ref()?.percent(path)?;
        Some((pct, UsageLevel::from_percent(pct)))
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_gauge(f, chunks[0], "CPU", self.cpu());
        self.draw_gauge(f, chunks[1], "Memory", self.memory());
        self.draw_gauge(f, chunks[2], "Disk", self.disk());
        self.draw_details(f, chunks[3]);
        f.render_widget(Paragraph::new(status_footer(&self.refresh)), chunks[4]);
    }

    fn draw_gauge(&self, f: &mut Frame, area: Rect, title: &str, reading: Option<(f64, UsageLevel)>) {
        let block = Block::default().borders(Borders::ALL).title(title.to_string());
        match reading {
            Some((pct, level)) => {
                let gauge = Gauge::default()
                    .block(block)
                    .gauge_style(Style::default().fg(level_color(level)))
                    .ratio(pct / 100.0)
                    .label(format!("{:.0}%", pct));
                f.render_widget(gauge, area);
            }
            // Field absent from the payload: leave the gauge empty
            None => f.render_widget(Paragraph::new("--").block(block), area),
        }
    }

    fn draw_details(&self, f: &mut Frame, area: Rect) {
        let mut lines = Vec::new();
        if let Some(snap) = &self.snapshot {
            if let Some(host) = snap.text("hostname") {
                lines.push(Line::from(format!("Host    {}", host)));
            }
            if let Some(uptime) = snap.integer("uptime_seconds") {
                lines.push(Line::from(format!("Uptime  {}", format_uptime(uptime))));
            }
            if let Some(load) = snap.array("performance.load_average") {
                let rendered: Vec<String> = load
                    .iter()
                    .filter_map(Value::as_f64)
                    .map(|v| format!("{:.2}", v))
                    .collect();
                if !rendered.is_empty() {
                    lines.push(Line::from(format!("Load    {}", rendered.join(" "))));
                }
            }
            if let Some(ts) = snap.timestamp() {
                lines.push(Line::from(format!(
                    "As of   {}",
                    ts.format("%Y-%m-%d %H:%M:%S UTC")
                )));
            }
        } else {
            lines.push(Line::from("Waiting for first metrics payload..."));
        }
        f.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("System")),
            area,
        );
    }
}

/// Render seconds as a compact `1d 2h 3m` string
fn format_uptime(total_secs: i64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}
