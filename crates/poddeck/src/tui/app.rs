use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::time::Duration;

use crate::app::Application;
use crate::tui::state::DashboardApp;
use crate::tui::types::{AppState, ViewMode};

/// What a key press asks the dashboard to do. Collected first, executed
/// after the match on `app_state` releases its borrow.
enum UiAction {
    None,
    Quit,
    Next,
    Previous,
    EnterServer,
    GoHome,
    Refresh,
    OpenCreate,
    OpenEdit,
    RequestUpdate,
    RequestDelete,
    OpenLogs,
    OpenScan,
    CloseDialog,
    SubmitCreate,
    CommitEdit,
    SubmitUpdate,
    SubmitDelete,
}

/// Run the interactive dashboard until the user quits.
pub async fn run_dashboard(app: &Application) -> Result<()> {
    let mut stdout = std::io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut dashboard = DashboardApp::new(app);
    let result = run_event_loop(&mut terminal, &mut dashboard).await;

    // Stop any dialog-scoped poller before giving the terminal back.
    dashboard.close_dialog();

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    dashboard: &mut DashboardApp,
) -> Result<()> {
    loop {
        dashboard.sync().await;
        terminal.draw(|frame| dashboard.render(frame))?;

        // The timeout doubles as the redraw tick while dialogs poll.
        if !event::poll(Duration::from_millis(150))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let action = key_action(dashboard, key.code);
        if !run_action(dashboard, action).await {
            return Ok(());
        }
    }
}

fn key_action(dashboard: &mut DashboardApp, code: KeyCode) -> UiAction {
    let view_mode = dashboard.view_mode;
    match &mut dashboard.app_state {
        AppState::Normal => normal_key_action(view_mode, code),
        AppState::CreateDialog(form) => match code {
            KeyCode::Esc => UiAction::CloseDialog,
            KeyCode::Enter => UiAction::SubmitCreate,
            KeyCode::Tab | KeyCode::Down => {
                form.next_field();
                UiAction::None
            }
            KeyCode::BackTab | KeyCode::Up => {
                form.previous_field();
                UiAction::None
            }
            KeyCode::Backspace => {
                form.focused_field_mut().pop();
                UiAction::None
            }
            KeyCode::Char(character) => {
                form.focused_field_mut().push(character);
                UiAction::None
            }
            _ => UiAction::None,
        },
        AppState::EditImage(form) => match code {
            KeyCode::Esc => UiAction::CloseDialog,
            KeyCode::Enter => UiAction::CommitEdit,
            KeyCode::Backspace => {
                form.input.pop();
                UiAction::None
            }
            KeyCode::Char(character) => {
                form.input.push(character);
                UiAction::None
            }
            _ => UiAction::None,
        },
        AppState::ConfirmUpdate { .. } => match code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => UiAction::SubmitUpdate,
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => UiAction::CloseDialog,
            _ => UiAction::None,
        },
        AppState::ConfirmDelete { .. } => match code {
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => UiAction::SubmitDelete,
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => UiAction::CloseDialog,
            _ => UiAction::None,
        },
        AppState::LogsDialog(_) | AppState::ScanDialog(_) => match code {
            KeyCode::Esc | KeyCode::Char('q') => UiAction::CloseDialog,
            _ => UiAction::None,
        },
        // Blocking notification: surfaced once, dismissed by any key.
        AppState::Notice(_) => UiAction::CloseDialog,
    }
}

fn normal_key_action(view_mode: ViewMode, code: KeyCode) -> UiAction {
    match code {
        KeyCode::Char('q') => UiAction::Quit,
        KeyCode::Esc => match view_mode {
            ViewMode::ServerList => UiAction::Quit,
            ViewMode::ServerDetail => UiAction::GoHome,
        },
        KeyCode::Down | KeyCode::Char('j') => UiAction::Next,
        KeyCode::Up | KeyCode::Char('k') => UiAction::Previous,
        KeyCode::Enter => match view_mode {
            ViewMode::ServerList => UiAction::EnterServer,
            ViewMode::ServerDetail => UiAction::None,
        },
        KeyCode::Char('r') => UiAction::Refresh,
        KeyCode::Char('c') if view_mode == ViewMode::ServerDetail => UiAction::OpenCreate,
        KeyCode::Char('e') if view_mode == ViewMode::ServerDetail => UiAction::OpenEdit,
        KeyCode::Char('u') if view_mode == ViewMode::ServerDetail => UiAction::RequestUpdate,
        KeyCode::Char('d') if view_mode == ViewMode::ServerDetail => UiAction::RequestDelete,
        KeyCode::Char('l') if view_mode == ViewMode::ServerDetail => UiAction::OpenLogs,
        KeyCode::Char('s') if view_mode == ViewMode::ServerDetail => UiAction::OpenScan,
        _ => UiAction::None,
    }
}

/// Execute one action; returns false when the dashboard should exit.
async fn run_action(dashboard: &mut DashboardApp, action: UiAction) -> bool {
    match action {
        UiAction::None => {}
        UiAction::Quit => return false,
        UiAction::Next => dashboard.next(),
        UiAction::Previous => dashboard.previous(),
        UiAction::EnterServer => dashboard.enter_server().await,
        UiAction::GoHome => dashboard.go_home().await,
        UiAction::Refresh => dashboard.request_refresh(),
        UiAction::OpenCreate => dashboard.open_create(),
        UiAction::OpenEdit => dashboard.open_edit(),
        UiAction::RequestUpdate => dashboard.request_update(),
        UiAction::RequestDelete => dashboard.request_delete(),
        UiAction::OpenLogs => dashboard.open_logs().await,
        UiAction::OpenScan => dashboard.open_scan().await,
        UiAction::CloseDialog => dashboard.close_dialog(),
        UiAction::SubmitCreate => dashboard.submit_create().await,
        UiAction::CommitEdit => dashboard.commit_edit().await,
        UiAction::SubmitUpdate => dashboard.submit_update().await,
        UiAction::SubmitDelete => dashboard.submit_delete().await,
    }
    true
}
