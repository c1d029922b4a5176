use crate::backup::{BackupCompleteScreen, BackupCompleteView, TransferPrompt};
use crate::funds::TransferableFunds;
use crate::platform::{DialogPresenter, Navigator, Route};
use crate::transactions::{DisplayableTransaction, TransactionDirection};
use crate::ui::console::transfer_summary;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use parking_lot::Mutex;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTab {
    Transactions,
    Backup,
}

/// What the screen asked the platform to do, as seen by the TUI
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlatformState {
    pub confirmation_open: bool,
    pub backup_restarted: bool,
    pub notices: Vec<String>,
}

/// Navigator and dialog presenter backed by shared state the TUI renders
#[derive(Debug, Clone, Default)]
pub struct TuiPlatform {
    state: Arc<Mutex<PlatformState>>,
}

impl TuiPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlatformState {
        self.state.lock().clone()
    }
}

impl Navigator for TuiPlatform {
    fn pop_back_stack_inclusive(&self) {
        self.state.lock().notices.push("Back stack cleared".to_string());
    }

    fn push(&self, route: Route) {
        let mut state = self.state.lock();
        match route {
            Route::BackupStart => {
                state.backup_restarted = true;
                state.confirmation_open = false;
            }
        }
        state.notices.push(format!("Opened {:?}", route));
    }
}

impl DialogPresenter for TuiPlatform {
    fn show_transfer_funds_prompt(&self, funds: &TransferableFunds) {
        self.state
            .lock()
            .notices
            .push(format!("{} sweepable address(es) found", funds.pending.len()));
    }

    fn dismiss_transfer_funds_prompt(&self) {
        self.state.lock().notices.push("Transfer prompt closed".to_string());
    }

    fn show_transfer_funds_confirmation(&self) {
        let mut state = self.state.lock();
        state.confirmation_open = true;
        state.notices.push("Transfer confirmation opened".to_string());
    }
}

/// One row of the transaction list
pub fn transaction_line(tx: &DisplayableTransaction) -> String {
    let symbol = match tx.direction {
        TransactionDirection::Received => "↓",
        TransactionDirection::Sent => "↑",
        TransactionDirection::Transferred => "↔",
    };
    let short_hash: String = tx.hash.chars().take(10).collect();
    let when = tx
        .datetime()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let status = if tx.pending {
        "Pending".to_string()
    } else {
        format!("{} conf", tx.confirmations)
    };

    format!(
        "{} {}  {}  {} sat  fee {}  {}",
        symbol, short_hash, when, tx.amount, tx.fee, status
    )
}

/// Body text of the Backup tab
pub fn backup_lines(view: &BackupCompleteView, platform: &PlatformState) -> Vec<String> {
    let mut lines = vec!["Your wallet is backed up.".to_string()];
    if let Some(message) = &view.last_backup {
        lines.push(message.clone());
    }
    lines.push(String::new());
    if platform.confirmation_open {
        lines.push("Confirm the transfer from the wallet to finish sweeping funds.".to_string());
        lines.push(String::new());
    }
    if platform.backup_restarted {
        lines.push("Backup restarted. Write down your recovery phrase again.".to_string());
    } else {
        lines.push("[b] Backup again".to_string());
    }
    lines
}

/// Input handling and state, independent of the terminal
pub struct TuiState {
    active_tab: ActiveTab,
    transactions: Vec<DisplayableTransaction>,
    selected: usize,
    screen: BackupCompleteScreen,
    platform: TuiPlatform,
}

impl TuiState {
    /// `screen` must have been built with `platform` as its navigator and
    /// dialog presenter
    pub fn new(
        transactions: Vec<DisplayableTransaction>,
        mut screen: BackupCompleteScreen,
        platform: TuiPlatform,
    ) -> Self {
        screen.on_create();
        Self {
            active_tab: ActiveTab::Transactions,
            transactions,
            selected: 0,
            screen,
            platform,
        }
    }

    pub fn active_tab(&self) -> ActiveTab {
        self.active_tab
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn screen(&self) -> &BackupCompleteScreen {
        &self.screen
    }

    /// Apply background results that arrived since the last tick
    pub fn tick(&mut self) {
        if self.screen.pump_events() > 0 {
            // Surface the prompt where it can be answered
            if matches!(self.screen.prompt(), TransferPrompt::Showing(_)) {
                self.active_tab = ActiveTab::Backup;
            }
        }
    }

    /// Returns `false` once the user asked to quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('q') {
            return false;
        }

        match key.code {
            KeyCode::Tab => {
                self.active_tab = match self.active_tab {
                    ActiveTab::Transactions => ActiveTab::Backup,
                    ActiveTab::Backup => ActiveTab::Transactions,
                };
            }
            KeyCode::Char('1') => self.active_tab = ActiveTab::Transactions,
            KeyCode::Char('2') => self.active_tab = ActiveTab::Backup,
            KeyCode::Up if self.active_tab == ActiveTab::Transactions => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down if self.active_tab == ActiveTab::Transactions => {
                if self.selected + 1 < self.transactions.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('s') if self.active_tab == ActiveTab::Backup => {
                self.screen.on_transfer_send();
            }
            KeyCode::Char('c') if self.active_tab == ActiveTab::Backup => {
                self.screen.on_transfer_cancel();
            }
            KeyCode::Char('b') if self.active_tab == ActiveTab::Backup => {
                self.screen.on_backup_again();
            }
            _ => {}
        }
        true
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
            .split(frame.size());

        let tabs = Tabs::new(vec!["Transactions", "Backup"])
            .select(match self.active_tab {
                ActiveTab::Transactions => 0,
                ActiveTab::Backup => 1,
            })
            .block(Block::default().title("Wallet").borders(Borders::ALL))
            .style(Style::default().fg(Color::White))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, chunks[0]);

        match self.active_tab {
            ActiveTab::Transactions => self.render_transactions(frame, chunks[1]),
            ActiveTab::Backup => self.render_backup(frame, chunks[1]),
        }
    }

    fn render_transactions(&self, frame: &mut Frame, area: Rect) {
        if self.transactions.is_empty() {
            let message = Paragraph::new("No transactions found")
                .block(Block::default().title("Transactions").borders(Borders::ALL));
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = self
            .transactions
            .iter()
            .enumerate()
            .map(|(i, tx)| {
                let style = if i == self.selected {
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
                } else if tx.pending {
                    Style::default().fg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(transaction_line(tx)).style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title(format!("Transactions ({})", self.transactions.len()))
                .borders(Borders::ALL),
        );
        frame.render_widget(list, area);
    }

    fn render_backup(&self, frame: &mut Frame, area: Rect) {
        let platform = self.platform.state();
        let lines: Vec<Line> = backup_lines(self.screen.view(), &platform)
            .into_iter()
            .map(Line::from)
            .collect();
        let body = Paragraph::new(lines)
            .block(Block::default().title("Backup complete").borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        frame.render_widget(body, area);

        if let TransferPrompt::Showing(funds) = self.screen.prompt() {
            let mut lines: Vec<Line> = transfer_summary(funds).into_iter().map(Line::from).collect();
            lines.push(Line::from(""));
            lines.push(Line::from("[s] Send    [c] Cancel"));

            let popup = centered(area, 70, 50);
            let dialog = Paragraph::new(lines)
                .block(
                    Block::default()
                        .title("Transfer funds to default account?")
                        .borders(Borders::ALL)
                        .style(Style::default().fg(Color::Cyan)),
                )
                .wrap(Wrap { trim: true });
            frame.render_widget(Clear, popup);
            frame.render_widget(dialog, popup);
        }
    }
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

pub struct WalletTui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    state: TuiState,
}

impl WalletTui {
    pub fn new(state: TuiState) -> Result<Self, io::Error> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self { terminal, state })
    }

    pub fn run(&mut self) -> Result<(), io::Error> {
        loop {
            self.state.tick();
            let state = &self.state;
            self.terminal.draw(|frame| state.render(frame))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && !self.state.handle_key(key) {
                        break;
                    }
                }
            }
        }

        debug!("Leaving terminal UI");
        Ok(())
    }
}

impl Drop for WalletTui {
    fn drop(&mut self) {
        self.state.screen.on_destroy();
        let _ = disable_raw_mode();
        let _ = self.terminal.backend_mut().execute(LeaveAlternateScreen);
    }
}
