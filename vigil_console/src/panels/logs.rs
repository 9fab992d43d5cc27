//! System logs panel - scrolling view over the portal's recent log entries

use std::time::Duration;

use chrono::DateTime;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use vigil_core::{PortalClient, RefreshConfig, RefreshCoordinator};

use super::{status_footer, PanelUpdate};

/// Log level for coloring and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" | "err" => Some(LogLevel::Error),
            _ => None,
        }
    }

    fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Magenta,
            LogLevel::Debug => Color::Cyan,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// One parsed log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    pub source: String,
    pub message: String,
}

pub struct LogsPanel {
    refresh: RefreshCoordinator,
    entries: Vec<LogEntry>,
    scroll_offset: usize,
}

impl LogsPanel {
    pub fn new(
        client: PortalClient,
        interval: Duration,
        limit: usize,
        updates: UnboundedSender<PanelUpdate>,
    ) -> Self {
        let refresh = RefreshCoordinator::new(RefreshConfig::new("logs", interval), move |cancel| {
            let client = client.clone();
            let updates = updates.clone();
            async move {
                let payload = client.logs(limit).await?;
                if !cancel.is_cancelled() {
                    let _ = updates.send(PanelUpdate::Logs(payload));
                }
                Ok(())
            }
        });
        Self {
            refresh,
            entries: Vec::new(),
            scroll_offset: 0,
        }
    }

    pub fn refresh(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    pub fn refresh_mut(&mut self) -> &mut RefreshCoordinator {
        &mut self.refresh
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn apply(&mut self, payload: Value) {
        self.entries = parse_entries(&payload);
        let max = self.entries.len().saturating_sub(1);
        self.scroll_offset = self.scroll_offset.min(max);
    }

    /// Manual refresh drops the cached entries first, like the portal's full
    /// page reload
    pub fn reload(&mut self) {
        self.entries.clear();
        self.scroll_offset = 0;
        self.refresh.refresh_now();
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let max = self.entries.len().saturating_sub(1);
        self.scroll_offset = (self.scroll_offset + 1).min(max);
    }

    pub fn draw(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);

        let items: Vec<ListItem> = self
            .entries
            .iter()
            .skip(self.scroll_offset)
            .map(|entry| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} ", short_time(&entry.timestamp)),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::styled(
                        format!("{:<5} ", entry.level.as_str()),
                        Style::default().fg(entry.level.color()),
                    ),
                    Span::styled(
                        format!("{} ", entry.source),
                        Style::default().fg(Color::Cyan),
                    ),
                    Span::raw(entry.message.clone()),
                ]))
            })
            .collect();

        let title = format!("Logs ({})", self.entries.len());
        f.render_widget(
            List::new(items).block(Block::default().borders(Borders::ALL).title(title)),
            chunks[0],
        );
        f.render_widget(Paragraph::new(status_footer(&self.refresh)), chunks[1]);
    }
}

fn parse_entries(payload: &Value) -> Vec<LogEntry> {
    payload
        .get("logs")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| LogEntry {
                    timestamp: field(item, "timestamp", ""),
                    level: item
                        .get("level")
                        .and_then(Value::as_str)
                        .and_then(LogLevel::from_str)
                        .unwrap_or(LogLevel::Info),
                    source: field(item, "source", "-"),
                    message: field(item, "message", ""),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn field(item: &Value, key: &str, default: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Shorten an ISO-8601 timestamp to wall-clock time for the list view
fn short_time(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.format("%H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
