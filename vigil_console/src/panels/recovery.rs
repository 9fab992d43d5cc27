//! Crash-recovery panel - component restart diagnostics

use std::time::Duration;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};
use ratatui::Frame;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use vigil_core::{PortalClient, RefreshConfig, RefreshCoordinator};

use super::{status_footer, PanelUpdate};

/// One supervised component as reported by the recovery endpoint
#[derive(Debug, Clone)]
pub struct ComponentStatus {
    pub name: String,
    pub state: String,
    pub restarts: i64,
    pub last_failure: Option<String>,
}

pub struct RecoveryPanel {
    refresh: RefreshCoordinator,
    components: Vec<ComponentStatus>,
    overall: Option<String>,
    last_crash: Option<String>,
}

impl RecoveryPanel {
    pub fn new(
        client: PortalClient,
        interval: Duration,
        updates: UnboundedSender<PanelUpdate>,
    ) -> Self {
        // Unlike the other dashboards, recovery stays paused across focus
        // changes until resumed by hand
        let config = RefreshConfig::new("recovery", interval).resume_on_visible(false);
        let refresh = RefreshCoordinator::new(config, move |cancel| {
            let client = client.clone();
            let updates = updates.clone();
            async move {
                let payload = client.recovery().await?;
                if !cancel.is_cancelled() {
                    let _ = updates.send(PanelUpdate::Recovery(payload));
                }
                Ok(())
            }
        });
        Self {
            refresh,
            components: Vec::new(),
            overall: None,
            last_crash: None,
        }
    }

    pub fn refresh(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    pub fn refresh_mut(&mut self) -> &mut RefreshCoordinator {
        &mut self.refresh
    }

    pub fn components(&self) -> &[ComponentStatus] {
        &self.components
    }

    pub fn overall(&self) -> Option<&str> {
        self.overall.as_deref()
    }

    pub fn apply(&mut self, payload: Value) {
        self.components = parse_components(&payload);
        self.overall = payload
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string);
        self.last_crash = payload
            .get("last_crash")
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    /// Soft refresh: keep the current table while the new payload is fetched
    pub fn soft_refresh(&self) {
        self.refresh.refresh_now();
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_summary(f, chunks[0]);
        self.draw_components(f, chunks[1]);
        f.render_widget(Paragraph::new(status_footer(&self.refresh)), chunks[2]);
    }

    fn draw_summary(&self, f: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw("Status: ")];
        match self.overall.as_deref() {
            Some(state) => spans.push(Span::styled(
                state.to_string(),
                Style::default().fg(state_color(state)),
            )),
            None => spans.push(Span::styled("unknown", Style::default().fg(Color::DarkGray))),
        }
        if let Some(last) = &self.last_crash {
            spans.push(Span::raw(format!("   Last crash: {}", last)));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_components(&self, f: &mut Frame, area: Rect) {
        let rows: Vec<Row> = self
            .components
            .iter()
            .map(|component| {
                Row::new(vec![
                    Cell::from(component.name.clone()),
                    Cell::from(Span::styled(
                        component.state.clone(),
                        Style::default().fg(state_color(&component.state)),
                    )),
                    Cell::from(component.restarts.to_string()),
                    Cell::from(component.last_failure.clone().unwrap_or_else(|| "-".into())),
                ])
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Percentage(30),
                Constraint::Length(12),
                Constraint::Length(10),
                Constraint::Min(10),
            ],
        )
        .header(
            Row::new(vec!["Component", "State", "Restarts", "Last failure"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Components"));

        f.render_widget(table, area);
    }
}

fn parse_components(payload: &Value) -> Vec<ComponentStatus> {
    payload
        .get("components")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| ComponentStatus {
                    name: item
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    state: item
                        .get("state")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown")
                        .to_string(),
                    restarts: item
                        .get("restart_count")
                        .and_then(Value::as_i64)
                        .unwrap_or(0),
                    last_failure: item
                        .get("last_failure")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn state_color(state: &str) -> Color {
    match state {
        "healthy" | "ok" | "running" => Color::Green,
        "degraded" | "recovering" | "restarting" => Color::Yellow,
        "failed" | "crashed" => Color::Red,
        _ => Color::DarkGray,
    }
}
