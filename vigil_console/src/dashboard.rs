//! Terminal dashboards for the Vigil console
//!
//! One ratatui application hosting the three operational dashboards as tabs.
//! Panels receive their payloads through an update channel fed by the refresh
//! coordinators; the draw loop drains it every iteration, so all terminal
//! mutation happens on this thread in payload-arrival order.

use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame, Terminal,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::debug;

use vigil_core::{ConsoleConfig, PortalClient};

use crate::panels::{LogsPanel, MetricsPanel, PanelUpdate, RecoveryPanel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Metrics,
    Logs,
    Recovery,
}

impl Tab {
    pub fn all() -> [Tab; 3] {
        [Tab::Metrics, Tab::Logs, Tab::Recovery]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Metrics => "Metrics",
            Tab::Logs => "Logs",
            Tab::Recovery => "Recovery",
        }
    }

    fn index(&self) -> usize {
        Tab::all().iter().position(|t| t == self).unwrap_or(0)
    }
}

pub struct ConsoleApp {
    active_tab: Tab,
    show_help: bool,
    metrics: MetricsPanel,
    logs: LogsPanel,
    recovery: RecoveryPanel,
    updates_rx: UnboundedReceiver<PanelUpdate>,
}

impl ConsoleApp {
    pub fn new(config: &ConsoleConfig) -> Result<Self> {
        let client = PortalClient::new(&config.api_url, config.request_timeout())?;
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let metrics = MetricsPanel::new(
            client.clone(),
            config.metrics_interval(),
            updates_tx.clone(),
        );
        let logs = LogsPanel::new(
            client.clone(),
            config.logs_interval(),
            config.log_limit,
            updates_tx.clone(),
        );
        let recovery = RecoveryPanel::new(client, config.recovery_interval(), updates_tx);

        Ok(Self {
            active_tab: Tab::Metrics,
            show_help: false,
            metrics,
            logs,
            recovery,
            updates_rx,
        })
    }

    /// Start all coordinators and trigger the initial population fetches
    pub fn start(&mut self) {
        debug!("starting dashboard refresh loops");
        self.metrics.refresh_mut().start();
        self.logs.refresh_mut().start();
        self.recovery.refresh_mut().start();
        self.metrics.refresh().refresh_now();
        self.logs.refresh().refresh_now();
        self.recovery.refresh().refresh_now();
    }

    pub fn run(config: ConsoleConfig) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Create app and run
        let mut app = ConsoleApp::new(&config)?;
        app.start();
        let res = app.run_app(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        res
    }

    fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            self.drain_updates();

            terminal.draw(|f| self.draw_ui(f))?;

            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) => {
                        if self.show_help {
                            self.show_help = false;
                            continue;
                        }
                        if self.handle_key(key.code) {
                            return Ok(());
                        }
                    }
                    // Terminal focus stands in for page visibility
                    Event::FocusLost => self.set_hidden(true),
                    Event::FocusGained => self.set_hidden(false),
                    _ => {}
                }
            }
        }
    }

    fn drain_updates(&mut self) {
        while let Ok(update) = self.updates_rx.try_recv() {
            self.apply_update(update);
        }
    }

    pub fn apply_update(&mut self, update: PanelUpdate) {
        match update {
            PanelUpdate::Metrics(payload) => self.metrics.apply(payload),
            PanelUpdate::Logs(payload) => self.logs.apply(payload),
            PanelUpdate::Recovery(payload) => self.recovery.apply(payload),
        }
    }

    /// Route one key press; returns true when the app should exit
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return true,
            KeyCode::Tab => self.next_tab(),
            KeyCode::BackTab => self.prev_tab(),
            KeyCode::Char('p') | KeyCode::Char('P') => self.toggle_active(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.refresh_active(),
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Char('H') => {
                self.show_help = true;
            }
            KeyCode::Up if self.active_tab == Tab::Logs => self.logs.scroll_up(),
            KeyCode::Down if self.active_tab == Tab::Logs => self.logs.scroll_down(),
            _ => {}
        }
        false
    }

    fn next_tab(&mut self) {
        let tabs = Tab::all();
        self.active_tab = tabs[(self.active_tab.index() + 1) % tabs.len()];
    }

    fn prev_tab(&mut self) {
        let tabs = Tab::all();
        self.active_tab = tabs[(self.active_tab.index() + tabs.len() - 1) % tabs.len()];
    }

    fn toggle_active(&mut self) {
        match self.active_tab {
            Tab::Metrics => self.metrics.refresh_mut().toggle(),
            Tab::Logs => self.logs.refresh_mut().toggle(),
            Tab::Recovery => self.recovery.refresh_mut().toggle(),
        }
    }

    /// Manual refresh: metrics and logs reload from scratch, recovery keeps
    /// its table while fetching
    fn refresh_active(&mut self) {
        match self.active_tab {
            Tab::Metrics => self.metrics.reload(),
            Tab::Logs => self.logs.reload(),
            Tab::Recovery => self.recovery.soft_refresh(),
        }
    }

    fn set_hidden(&mut self, hidden: bool) {
        debug!(hidden, "terminal visibility changed");
        self.metrics.refresh_mut().set_hidden(hidden);
        self.logs.refresh_mut().set_hidden(hidden);
        self.recovery.refresh_mut().set_hidden(hidden);
    }

    fn draw_ui(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.area());

        let titles: Vec<Line> = Tab::all().iter().map(|t| Line::from(t.title())).collect();
        let tabs = Tabs::new(titles)
            .select(self.active_tab.index())
            .block(Block::default().borders(Borders::ALL).title("Vigil"))
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_widget(tabs, chunks[0]);

        match self.active_tab {
            Tab::Metrics => self.metrics.draw(f, chunks[1]),
            Tab::Logs => self.logs.draw(f, chunks[1]),
            Tab::Recovery => self.recovery.draw(f, chunks[1]),
        }

        let hint = "q quit  tab switch  p pause/resume  r refresh  ? help";
        f.render_widget(
            Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
            chunks[2],
        );

        if self.show_help {
            self.draw_help(f);
        }
    }

    fn draw_help(&self, f: &mut Frame) {
        let area = centered_rect(50, 40, f.area());
        let lines = vec![
            Line::from("q        quit"),
            Line::from("tab      next dashboard"),
            Line::from("shift+tab  previous dashboard"),
            Line::from("p        pause or resume auto-refresh"),
            Line::from("r        refresh now"),
            Line::from("up/down  scroll logs"),
            Line::from(""),
            Line::from("Dashboards pause while the terminal is unfocused."),
            Line::from("Press any key to close this help."),
        ];
        f.render_widget(Clear, area);
        f.render_widget(
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help")),
            area,
        );
    }
}

/// Entry point used by the `dash` subcommand
pub fn run(config: ConsoleConfig) -> Result<()> {
    ConsoleApp::run(config)
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vigil_core::UsageLevel;

    fn app() -> ConsoleApp {
        ConsoleApp::new(&ConsoleConfig::default()).expect("app")
    }

    // ========================================================================
    // App State Tests
    // ========================================================================

    #[test]
    fn test_new_defaults() {
        let app = app();
        assert_eq!(app.active_tab, Tab::Metrics);
        assert!(!app.show_help);
        assert!(!app.metrics.refresh().is_running());
        assert!(!app.logs.refresh().is_running());
        assert!(!app.recovery.refresh().is_running());
    }

    #[test]
    fn test_next_tab_cycles_through_all() {
        let mut app = app();
        assert_eq!(app.active_tab, Tab::Metrics);

        app.next_tab();
        assert_eq!(app.active_tab, Tab::Logs);

        app.next_tab();
        assert_eq!(app.active_tab, Tab::Recovery);

        // Should wrap around
        app.next_tab();
        assert_eq!(app.active_tab, Tab::Metrics);
    }

    #[test]
    fn test_prev_tab_cycles_backwards() {
        let mut app = app();
        app.prev_tab();
        assert_eq!(app.active_tab, Tab::Recovery);

        app.prev_tab();
        assert_eq!(app.active_tab, Tab::Logs);
    }

    #[test]
    fn test_help_key_opens_overlay() {
        let mut app = app();
        let quit = app.handle_key(KeyCode::Char('?'));
        assert!(!quit);
        assert!(app.show_help);
    }

    #[test]
    fn test_quit_key() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Char('Q')));
    }

    // ========================================================================
    // Key Dispatch Tests
    // ========================================================================

    #[tokio::test]
    async fn test_pause_key_toggles_active_panel_only() {
        let mut app = app();
        app.handle_key(KeyCode::Char('p'));
        assert!(app.metrics.refresh().is_running());
        assert!(!app.logs.refresh().is_running());

        app.handle_key(KeyCode::Char('p'));
        assert!(!app.metrics.refresh().is_running());
    }

    #[tokio::test]
    async fn test_scroll_keys_only_reach_logs_tab() {
        let mut app = app();
        app.apply_update(PanelUpdate::Logs(json!({
            "logs": [{ "message": "a" }, { "message": "b" }, { "message": "c" }]
        })));

        // On the metrics tab, arrows are ignored
        app.handle_key(KeyCode::Down);
        assert_eq!(app.logs.scroll_offset(), 0);

        app.next_tab();
        app.handle_key(KeyCode::Down);
        assert_eq!(app.logs.scroll_offset(), 1);
    }

    // ========================================================================
    // Visibility Tests
    // ========================================================================

    #[tokio::test]
    async fn test_focus_loss_pauses_all_and_resume_honors_policy() {
        let mut app = app();
        app.start();
        assert!(app.metrics.refresh().is_running());
        assert!(app.recovery.refresh().is_running());

        app.set_hidden(true);
        assert!(!app.metrics.refresh().is_running());
        assert!(!app.logs.refresh().is_running());
        assert!(!app.recovery.refresh().is_running());

        app.set_hidden(false);
        assert!(app.metrics.refresh().is_running());
        assert!(app.logs.refresh().is_running());
        // Recovery never auto-resumes; it waits for a manual toggle
        assert!(!app.recovery.refresh().is_running());
    }

    // ========================================================================
    // Update Routing Tests
    // ========================================================================

    #[test]
    fn test_updates_reach_their_panels() {
        let mut app = app();
        app.apply_update(PanelUpdate::Metrics(json!({
            "performance": { "cpu": { "usage_percent": 91.0 } }
        })));
        app.apply_update(PanelUpdate::Recovery(json!({
            "status": "ok",
            "components": [{ "name": "worker", "state": "healthy" }]
        })));

        assert_eq!(app.metrics.cpu(), Some((91.0, UsageLevel::Danger)));
        assert_eq!(app.recovery.components().len(), 1);
        assert!(app.logs.entries().is_empty());
    }
}
