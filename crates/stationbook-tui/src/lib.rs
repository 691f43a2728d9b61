// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use stationbook_app::{
    Account, AccountForm, AccountId, AppCommand, AppEvent, AppState, DETAILS_SUBTITLE,
    DETAILS_TITLE, DetailsView, DirectoryCommand, DirectoryEvent, FormField, FormKind, Modal,
    RemoteCompletion, RemoteRequest, Screen,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const APP_TITLE: &str = "Sites & Service Stations";
const COLUMN_HEADERS: [&str; 4] = [
    "SITE LOCATION",
    "SERVICE STATION NAME",
    "ACCOUNT #",
    "ACTION",
];
const ROW_ACTION_MARK: &str = "⋮";
const EMPTY_TABLE_TEXT: &str = "No accounts found";
const LOADING_TEXT: &str = "Loading accounts...";

/// Executes directory requests on behalf of the event loop.
pub trait AppRuntime {
    fn run_request(&mut self, request: &RemoteRequest) -> RemoteCompletion;

    /// Hands a request off for execution. The completion must come back on
    /// `tx`; the default runs it inline.
    fn spawn_request(&mut self, request: RemoteRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let completion = self.run_request(&request);
        tx.send(InternalEvent::Remote(completion))
            .map_err(|_| anyhow!("request event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Remote(RemoteCompletion),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Table,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewData {
    focus: Focus,
    cursor: usize,
    form_field: FormField,
    status_token: u64,
}

impl Default for ViewData {
    fn default() -> Self {
        Self {
            focus: Focus::default(),
            cursor: 0,
            form_field: FormField::SiteName,
            status_token: 0,
        }
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    mount(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn mount<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    tracing::debug!("directory mounted; loading accounts");
    dispatch_directory(state, runtime, view_data, internal_tx, DirectoryCommand::Load);
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Remote(completion) => {
                dispatch_directory(
                    state,
                    runtime,
                    view_data,
                    tx,
                    DirectoryCommand::Complete(completion),
                );
            }
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(4));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn bump_status_token(view_data: &mut ViewData, internal_tx: &Sender<InternalEvent>) {
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    bump_status_token(view_data, internal_tx);
}

fn dispatch_directory<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: DirectoryCommand,
) {
    let events = state.dispatch(AppCommand::Directory(command));
    apply_app_events(state, runtime, view_data, internal_tx, events);
}

fn apply_app_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    events: Vec<AppEvent>,
) {
    for event in events {
        match event {
            AppEvent::Directory(DirectoryEvent::RequestIssued(request)) => {
                let op = request.op.name();
                if let Err(error) = runtime.spawn_request(request, internal_tx.clone()) {
                    tracing::error!(op, %error, "could not start accounts request");
                    emit_status(state, view_data, internal_tx, format!("{op} failed: {error}"));
                }
            }
            AppEvent::Directory(
                DirectoryEvent::AccountsChanged { .. } | DirectoryEvent::FilterChanged { .. },
            ) => clamp_cursor(state, view_data),
            AppEvent::Directory(DirectoryEvent::ModalChanged {
                modal: Modal::CreateForm | Modal::EditForm,
                open: true,
            }) => view_data.form_field = FormField::SiteName,
            AppEvent::StatusUpdated(_) => bump_status_token(view_data, internal_tx),
            _ => {}
        }
    }
}

fn clamp_cursor(state: &AppState, view_data: &mut ViewData) {
    let len = state.directory.filtered().len();
    view_data.cursor = view_data.cursor.min(len.saturating_sub(1));
}

fn cursor_account<'a>(state: &'a AppState, view_data: &ViewData) -> Option<&'a Account> {
    state.directory.filtered().get(view_data.cursor)
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if matches!(state.screen, Screen::Details(_)) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q')
        ) {
            state.dispatch(AppCommand::CloseDetails);
        }
        return false;
    }

    if state.directory.alert().is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            dispatch_directory(
                state,
                runtime,
                view_data,
                internal_tx,
                DirectoryCommand::DismissAlert,
            );
        }
        return false;
    }

    if state.directory.is_open(Modal::EditForm) {
        handle_form_key(state, runtime, view_data, internal_tx, FormKind::Edit, key);
        return false;
    }

    if state.directory.is_open(Modal::CreateForm) {
        handle_form_key(state, runtime, view_data, internal_tx, FormKind::Create, key);
        return false;
    }

    if state.directory.is_open(Modal::RowMenu) {
        handle_row_menu_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match view_data.focus {
        Focus::Search => handle_search_key(state, runtime, view_data, internal_tx, key),
        Focus::Table => handle_table_key(state, runtime, view_data, internal_tx, key),
    }
    false
}

fn handle_search_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let mut query = state.directory.query().to_owned();
    match key.code {
        KeyCode::Enter => {
            let input = if query.is_empty() { None } else { Some(query) };
            state.dispatch(AppCommand::OpenDetails(input));
            return;
        }
        KeyCode::Esc | KeyCode::Down | KeyCode::Tab => {
            view_data.focus = Focus::Table;
            return;
        }
        KeyCode::Backspace => {
            if query.pop().is_none() {
                return;
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => query.push(ch),
        _ => return,
    }
    dispatch_directory(
        state,
        runtime,
        view_data,
        internal_tx,
        DirectoryCommand::Search(query),
    );
}

fn handle_table_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let len = state.directory.filtered().len();
    let command = match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if view_data.cursor + 1 < len {
                view_data.cursor += 1;
            }
            return;
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.cursor = view_data.cursor.saturating_sub(1);
            return;
        }
        KeyCode::Char('g') | KeyCode::Home => {
            view_data.cursor = 0;
            return;
        }
        KeyCode::Char('G') | KeyCode::End => {
            view_data.cursor = len.saturating_sub(1);
            return;
        }
        KeyCode::Char('/') | KeyCode::Tab => {
            view_data.focus = Focus::Search;
            return;
        }
        KeyCode::Char('a') => DirectoryCommand::OpenCreateForm,
        KeyCode::Char('r') => DirectoryCommand::Load,
        KeyCode::Enter | KeyCode::Char('m') => {
            let Some(id) = selected_row_id(state, view_data) else {
                emit_status(state, view_data, internal_tx, "no account selected");
                return;
            };
            DirectoryCommand::OpenRowMenu(id)
        }
        KeyCode::Esc if !state.directory.query().is_empty() => {
            DirectoryCommand::Search(String::new())
        }
        _ => return,
    };
    dispatch_directory(state, runtime, view_data, internal_tx, command);
}

fn handle_row_menu_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(id) = state.directory.selected().cloned() else {
        dispatch_directory(
            state,
            runtime,
            view_data,
            internal_tx,
            DirectoryCommand::CloseRowMenu,
        );
        return;
    };
    let command = match key.code {
        KeyCode::Char('e') => DirectoryCommand::OpenEditForm(id),
        KeyCode::Char('d') => DirectoryCommand::Remove(id),
        KeyCode::Esc | KeyCode::Char('q') => DirectoryCommand::CloseRowMenu,
        _ => return,
    };
    dispatch_directory(state, runtime, view_data, internal_tx, command);
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    kind: FormKind,
    key: KeyEvent,
) {
    let field = view_data.form_field;
    let command = match key.code {
        KeyCode::Esc => match kind {
            FormKind::Create => DirectoryCommand::CloseCreateForm,
            FormKind::Edit => DirectoryCommand::CloseEditForm,
        },
        KeyCode::Enter => match kind {
            FormKind::Create => DirectoryCommand::SubmitCreate,
            FormKind::Edit => DirectoryCommand::SubmitEdit,
        },
        KeyCode::Tab | KeyCode::Down => {
            view_data.form_field = field.next();
            return;
        }
        KeyCode::BackTab | KeyCode::Up => {
            view_data.form_field = field.prev();
            return;
        }
        KeyCode::Backspace => {
            let mut value = form_value(state, kind, field);
            if value.pop().is_none() {
                return;
            }
            DirectoryCommand::EditField {
                form: kind,
                field,
                value,
            }
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let mut value = form_value(state, kind, field);
            value.push(ch);
            DirectoryCommand::EditField {
                form: kind,
                field,
                value,
            }
        }
        _ => return,
    };
    dispatch_directory(state, runtime, view_data, internal_tx, command);
}

fn open_form(state: &AppState, kind: FormKind) -> Option<&AccountForm> {
    match kind {
        FormKind::Create => state.directory.create_form(),
        FormKind::Edit => state.directory.edit_session().map(|session| &session.form),
    }
}

fn form_value(state: &AppState, kind: FormKind, field: FormField) -> String {
    open_form(state, kind)
        .map(|form| form.value(field).to_owned())
        .unwrap_or_default()
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    match &state.screen {
        Screen::Directory => render_directory(frame, state, view_data),
        Screen::Details(details) => render_details(frame, state, details),
    }
}

fn render_directory(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new("[a] Add New")
        .style(Style::default().fg(Color::White))
        .block(
            Block::default()
                .title(APP_TITLE)
                .borders(Borders::ALL)
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        );
    frame.render_widget(header, layout[0]);

    let search_style = if view_data.focus == Focus::Search {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let search = Paragraph::new(search_text(state, view_data)).block(
        Block::default()
            .title("search")
            .borders(Borders::ALL)
            .border_style(search_style),
    );
    frame.render_widget(search, layout[1]);

    render_table(frame, layout[2], state, view_data);

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[3]);

    if state.directory.is_open(Modal::RowMenu)
        && let Some(account) = state.directory.selected_account()
    {
        let area = centered_rect(44, 36, frame.area());
        frame.render_widget(Clear, area);
        let deleting = state.directory.has_pending_mutation(&account.id);
        let menu = Paragraph::new(render_row_menu_text(account, deleting)).block(
            Block::default()
                .title("actions")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(menu, area);
    }

    for kind in [FormKind::Create, FormKind::Edit] {
        if let Some(form) = open_form(state, kind) {
            let area = centered_rect(64, 50, frame.area());
            frame.render_widget(Clear, area);
            let body = Paragraph::new(render_form_overlay_text(kind, form, view_data.form_field))
                .block(Block::default().title(kind.title()).borders(Borders::ALL));
            frame.render_widget(body, area);
        }
    }

    if let Some(alert) = state.directory.alert() {
        let area = centered_rect(50, 28, frame.area());
        frame.render_widget(Clear, area);
        let body = Paragraph::new(format!("{alert}\n\n[enter] OK")).block(
            Block::default()
                .title("Alert")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Red)),
        );
        frame.render_widget(body, area);
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, view_data: &ViewData) {
    let block = Block::default()
        .title(table_title(state))
        .borders(Borders::ALL);
    let accounts = state.directory.filtered();
    if accounts.is_empty() {
        let text = if state.directory.is_loading() {
            LOADING_TEXT
        } else {
            EMPTY_TABLE_TEXT
        };
        frame.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let header = Row::new(COLUMN_HEADERS.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = accounts.iter().enumerate().map(|(index, account)| {
        let mut style = Style::default();
        if index == view_data.cursor {
            style = style.bg(Color::DarkGray);
        }
        if state.directory.has_pending_mutation(&account.id) {
            style = style.add_modifier(Modifier::DIM);
        }
        Row::new(table_cells(account).map(Cell::from)).style(style)
    });

    let widths = [
        Constraint::Percentage(32),
        Constraint::Percentage(32),
        Constraint::Percentage(24),
        Constraint::Percentage(12),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(table, area);
}

fn render_details(frame: &mut ratatui::Frame<'_>, state: &AppState, details: &DetailsView) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)])
        .split(frame.area());

    let area = centered_rect(60, 40, layout[0]);
    let body = Paragraph::new(render_details_text(details)).block(
        Block::default()
            .title(DETAILS_TITLE)
            .borders(Borders::ALL)
            .title_style(Style::default().add_modifier(Modifier::BOLD)),
    );
    frame.render_widget(body, area);

    let hints = match &state.status_line {
        Some(status) => format!("DETAILS | {status} | esc back | ctrl+q"),
        None => "DETAILS | esc back | ctrl+q".to_owned(),
    };
    let status = Paragraph::new(hints)
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[1]);
}

fn table_cells(account: &Account) -> [String; 4] {
    [
        account.site_name.clone(),
        account.service_station.clone(),
        account.account_number.clone(),
        ROW_ACTION_MARK.to_owned(),
    ]
}

fn table_title(state: &AppState) -> String {
    let directory = &state.directory;
    let mut title = format!(
        "accounts {}/{}",
        directory.filtered().len(),
        directory.accounts().len()
    );
    if directory.is_loading() {
        title.push_str(" loading...");
    }
    title
}

fn search_text(state: &AppState, view_data: &ViewData) -> String {
    let query = state.directory.query();
    if view_data.focus == Focus::Search {
        format!("{query}_")
    } else if query.is_empty() {
        "Search by site, station or account # (/)".to_owned()
    } else {
        query.to_owned()
    }
}

fn render_row_menu_text(account: &Account, deleting: bool) -> String {
    let mut lines = vec![
        format!("{} | {}", account.site_name, account.service_station),
        String::new(),
        "[e] Edit".to_owned(),
        "[d] Delete".to_owned(),
        "[esc] Cancel".to_owned(),
    ];
    if deleting {
        lines.push(String::new());
        lines.push("request in flight...".to_owned());
    }
    lines.join("\n")
}

fn render_form_overlay_text(kind: FormKind, form: &AccountForm, active: FormField) -> String {
    let mut lines = Vec::with_capacity(FormField::ALL.len() + 2);
    for field in FormField::ALL {
        let marker = if field == active { ">" } else { " " };
        let cursor = if field == active { "_" } else { "" };
        lines.push(format!(
            "{marker} {}: {}{cursor}",
            field.label(),
            form.value(field)
        ));
    }
    lines.push(String::new());
    lines.push(format!(
        "[enter] {} | [esc] Cancel | [tab] next field",
        kind.submit_label()
    ));
    lines.join("\n")
}

fn render_details_text(details: &DetailsView) -> String {
    format!("{DETAILS_SUBTITLE}\n\n{}", details.body())
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let directory = &state.directory;
    let (mode, hints) = if directory.alert().is_some() {
        ("ALERT", "enter dismiss")
    } else if directory.is_open(Modal::CreateForm) || directory.is_open(Modal::EditForm) {
        ("FORM", "tab/shift+tab field | enter save | esc cancel")
    } else if directory.is_open(Modal::RowMenu) {
        ("MENU", "e edit | d delete | esc close")
    } else if view_data.focus == Focus::Search {
        ("SEARCH", "type to filter | enter details | esc table")
    } else {
        (
            "NAV",
            "j/k move | enter actions | a add | / search | r reload | ctrl+q",
        )
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {hints}"),
        None => format!("{mode} | {hints}"),
    }
}

fn selected_row_id(state: &AppState, view_data: &ViewData) -> Option<AccountId> {
    cursor_account(state, view_data).map(|account| account.id.clone())
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}
