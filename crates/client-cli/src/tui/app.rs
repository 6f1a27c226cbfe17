//! Dashboard TUI application state and rendering.

use std::sync::mpsc::Receiver;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
};
use tokio::sync::mpsc::UnboundedSender;

use shared::invoice::{available_actions, Action, Invoice, InvoiceStatus};
use shared::{translate, InvoiceFilter, Language};

use crate::store::InvoiceStore;

/// Commands from the dashboard to the async bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Fetch the authoritative invoice list.
    Refresh,
    /// Issue the send transition for one invoice.
    Send(String),
}

/// Events from the async bridge back into the dashboard.
#[derive(Debug)]
pub enum AppEvent {
    /// A list fetch settled.
    Invoices(Result<Vec<Invoice>, String>),
    /// A send request settled.
    SendSettled {
        invoice_id: String,
        result: Result<(), String>,
    },
    /// The session gate reports we are no longer authenticated.
    SessionLost,
}

/// Input focus of the dashboard.
#[derive(Debug, Clone, PartialEq)]
enum Mode {
    Normal,
    /// Typing into the search field.
    Search,
    /// Confirmation dialog before sending.
    ConfirmSend { invoice_id: String },
    /// Read-only detail view of one invoice.
    Detail { invoice_id: String },
}

#[derive(Debug, Clone)]
struct Notice {
    text: String,
    is_error: bool,
}

/// Dashboard application state.
pub struct App {
    language: Language,
    store: InvoiceStore,
    search: String,
    status_filter: Option<InvoiceStatus>,
    /// When on, restrict to invoices created in the last 30 days.
    recent_only: bool,
    selected: usize,
    mode: Mode,
    /// Invoice id of the send request currently in flight. While set, the
    /// send action is disabled so a second press cannot duplicate the call.
    send_in_flight: Option<String>,
    refresh_in_flight: bool,
    notice: Option<Notice>,
    should_quit: bool,
    session_lost: bool,
    cmd_tx: UnboundedSender<AppCommand>,
    event_rx: Receiver<AppEvent>,
}

impl App {
    pub fn new(
        language: Language,
        cmd_tx: UnboundedSender<AppCommand>,
        event_rx: Receiver<AppEvent>,
    ) -> Self {
        Self {
            language,
            store: InvoiceStore::new(),
            search: String::new(),
            status_filter: None,
            recent_only: false,
            selected: 0,
            mode: Mode::Normal,
            send_in_flight: None,
            refresh_in_flight: false,
            notice: None,
            should_quit: false,
            session_lost: false,
            cmd_tx,
            event_rx,
        }
    }

    /// Whether the dashboard exited because the session was lost.
    pub fn session_lost(&self) -> bool {
        self.session_lost
    }

    /// Run the TUI main loop.
    pub fn run(&mut self) -> std::io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        while !self.should_quit {
            self.process_events();
            self.maybe_refresh();

            terminal.draw(|f| self.draw(f))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }
        }

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        Ok(())
    }

    fn t(&self, key: &str) -> String {
        translate(self.language, key).to_string()
    }

    fn filter(&self) -> InvoiceFilter {
        let (from, to) = if self.recent_only {
            let now = Utc::now();
            (Some(now - ChronoDuration::days(30)), Some(now))
        } else {
            (None, None)
        };
        InvoiceFilter {
            search: if self.search.is_empty() {
                None
            } else {
                Some(self.search.clone())
            },
            status: self.status_filter,
            from,
            to,
        }
    }

    fn visible_ids(&self) -> Vec<String> {
        self.store
            .visible(&self.filter())
            .iter()
            .map(|i| i.id.clone())
            .collect()
    }

    /// Issue a refresh when the cache is stale and none is in flight.
    /// Re-fetching is the consequence of invalidation, never a side
    /// effect wired into individual actions.
    fn maybe_refresh(&mut self) {
        if self.store.is_stale() && !self.refresh_in_flight {
            self.refresh_in_flight = true;
            let _ = self.cmd_tx.send(AppCommand::Refresh);
        }
    }

    /// Drain pending events from the async bridge.
    fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::Invoices(Ok(invoices)) => {
                    self.refresh_in_flight = false;
                    self.store.apply_refresh(invoices);
                    self.clamp_selection();
                }
                AppEvent::Invoices(Err(error)) => {
                    // Previous list stays visible; surface a notice only.
                    // The store settles the invalidation, so no further
                    // fetch goes out until the user retries with 'r'.
                    self.refresh_in_flight = false;
                    self.store.refresh_failed(error);
                    let detail = self.store.take_error().unwrap_or_default();
                    let text = format!("{}: {}", self.t("dashboard.fetch_error"), detail);
                    self.notify(text, true);
                }
                AppEvent::SendSettled { invoice_id, result } => {
                    self.send_in_flight = None;
                    match result {
                        Ok(()) => {
                            let text = self.t("dashboard.send_success");
                            self.notify(text, false);
                        }
                        Err(detail) => {
                            let text = format!("{}: {}", self.t("dashboard.send_error"), detail);
                            self.notify(text, true);
                        }
                    }
                    // Authoritative status comes from the server; settle
                    // first, then exactly one refetch via invalidation
                    let _ = invoice_id;
                    self.store.invalidate();
                }
                AppEvent::SessionLost => {
                    self.session_lost = true;
                    self.should_quit = true;
                }
            }
        }
    }

    fn notify(&mut self, text: String, is_error: bool) {
        self.notice = Some(Notice { text, is_error });
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_ids().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn selected_invoice(&self) -> Option<&Invoice> {
        let ids = self.visible_ids();
        let id = ids.get(self.selected)?;
        self.store.get(id)
    }

    /// Handle keyboard input.
    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.mode.clone() {
            Mode::Search => self.handle_search_key(code),
            Mode::ConfirmSend { invoice_id } => self.handle_confirm_key(code, invoice_id),
            Mode::Detail { .. } => {
                if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                    self.mode = Mode::Normal;
                }
            }
            Mode::Normal => self.handle_normal_key(code),
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('/') => self.mode = Mode::Search,
            KeyCode::Char('f') => {
                self.cycle_status_filter();
                self.clamp_selection();
            }
            KeyCode::Char('d') => {
                self.recent_only = !self.recent_only;
                self.clamp_selection();
            }
            KeyCode::Char('r') => self.store.invalidate(),
            KeyCode::Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
            }
            KeyCode::Down => {
                let len = self.visible_ids().len();
                if len > 0 && self.selected < len - 1 {
                    self.selected += 1;
                }
            }
            KeyCode::Char('s') => self.request_send(),
            KeyCode::Char('v') | KeyCode::Enter => {
                if let Some(invoice) = self.selected_invoice() {
                    self.mode = Mode::Detail {
                        invoice_id: invoice.id.clone(),
                    };
                }
            }
            _ => {}
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter | KeyCode::Esc => self.mode = Mode::Normal,
            KeyCode::Char(c) => {
                self.search.push(c);
                self.clamp_selection();
            }
            KeyCode::Backspace => {
                self.search.pop();
                self.clamp_selection();
            }
            _ => {}
        }
    }

    fn handle_confirm_key(&mut self, code: KeyCode, invoice_id: String) {
        match code {
            KeyCode::Char('y') | KeyCode::Enter => self.confirm_send(invoice_id),
            KeyCode::Char('n') | KeyCode::Esc => self.mode = Mode::Normal,
            _ => {}
        }
    }

    /// Open the send confirmation for the selected invoice, if its status
    /// permits sending and no send is already in flight.
    fn request_send(&mut self) {
        if self.send_in_flight.is_some() {
            return;
        }
        let Some(invoice) = self.selected_invoice() else {
            return;
        };
        if !available_actions(invoice.status).contains(&Action::Send) {
            return;
        }
        self.mode = Mode::ConfirmSend {
            invoice_id: invoice.id.clone(),
        };
    }

    /// Issue the send command. Guarded: while a send is in flight the
    /// control is disabled, so repeated confirmation produces exactly one
    /// backend call.
    fn confirm_send(&mut self, invoice_id: String) {
        self.mode = Mode::Normal;
        if self.send_in_flight.is_some() {
            return;
        }
        self.send_in_flight = Some(invoice_id.clone());
        let _ = self.cmd_tx.send(AppCommand::Send(invoice_id));
    }

    fn status_filter_label(&self) -> String {
        match self.status_filter {
            Some(status) => status.label().to_string(),
            None => self.t("common.all"),
        }
    }

    fn cycle_status_filter(&mut self) {
        let order = InvoiceStatus::FILTERABLE;
        self.status_filter = match self.status_filter {
            None => Some(order[0]),
            Some(current) => {
                let idx = order.iter().position(|s| *s == current).unwrap_or(0);
                if idx + 1 < order.len() {
                    Some(order[idx + 1])
                } else {
                    None
                }
            }
        };
    }

    /// Draw the UI.
    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_filter_bar(frame, layout[0]);
        self.draw_table(frame, layout[1]);
        self.draw_status_bar(frame, layout[2]);

        match &self.mode {
            Mode::ConfirmSend { .. } => self.draw_confirm_dialog(frame, area),
            Mode::Detail { invoice_id } => self.draw_detail(frame, area, invoice_id),
            _ => {}
        }
    }

    fn draw_filter_bar(&self, frame: &mut Frame, area: Rect) {
        let border_style = if self.mode == Mode::Search {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        let line = format!(
            " {}: {}_ | {}: {} | 30d: {} ",
            self.t("dashboard.search"),
            self.search,
            self.t("dashboard.status"),
            self.status_filter_label(),
            if self.recent_only { "on" } else { "off" },
        );
        let block = Block::default()
            .title(format!(" {} ", self.t("dashboard.title")))
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(line), inner);
    }

    fn draw_table(&self, frame: &mut Frame, area: Rect) {
        let filter = self.filter();
        let visible = self.store.visible(&filter);

        let header = Row::new(vec![
            "Created", "Number", "Client", "Amount", "Status", "Financing", "Possible",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = visible
            .iter()
            .enumerate()
            .map(|(idx, invoice)| {
                let style = if idx == self.selected {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                Row::new(vec![
                    Cell::from(invoice.created_date.format("%Y-%m-%d").to_string()),
                    Cell::from(invoice.invoice_number.clone()),
                    Cell::from(invoice.client.clone()),
                    Cell::from(invoice.amount_display()),
                    Cell::from(invoice.status.label()),
                    Cell::from(invoice.financing_date_display()),
                    Cell::from(invoice.possible_financing_display()),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(12),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(table, area);
    }

    fn draw_status_bar(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = match &self.notice {
            Some(notice) => {
                let fg = if notice.is_error {
                    Color::Red
                } else {
                    Color::Green
                };
                (
                    notice.text.clone(),
                    Style::default().fg(fg).bg(Color::Black),
                )
            }
            None => {
                let sending = if self.send_in_flight.is_some() {
                    " | sending..."
                } else {
                    ""
                };
                (
                    format!(
                        " /: search | f: status | d: 30d | s: send | v: view | r: refresh | q: quit{}",
                        sending
                    ),
                    Style::default().bg(Color::DarkGray).fg(Color::White),
                )
            }
        };
        frame.render_widget(Paragraph::new(text).style(style), area);
    }

    fn draw_confirm_dialog(&self, frame: &mut Frame, area: Rect) {
        let dialog = centered_rect(50, 20, area);
        frame.render_widget(Clear, dialog);
        let block = Block::default()
            .title(format!(" {} ", self.t("dashboard.send")))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow));
        let inner = block.inner(dialog);
        frame.render_widget(block, dialog);
        let text = format!("{}\n\n[y] yes   [n] no", self.t("dashboard.confirm_send"));
        frame.render_widget(Paragraph::new(text), inner);
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect, invoice_id: &str) {
        let Some(invoice) = self.store.get(invoice_id) else {
            return;
        };
        let dialog = centered_rect(60, 60, area);
        frame.render_widget(Clear, dialog);
        let block = Block::default()
            .title(format!(
                " {} {} ",
                self.t("dashboard.view"),
                invoice.invoice_number
            ))
            .borders(Borders::ALL);
        let inner = block.inner(dialog);
        frame.render_widget(block, dialog);

        let lines = vec![
            format!("Client:    {}", invoice.client),
            format!("Amount:    {}", invoice.amount_display()),
            format!("Due:       {}", invoice.due_date.format("%Y-%m-%d")),
            format!("Status:    {}", invoice.status.label()),
            format!("Financing: {}", invoice.financing_date_display()),
            format!("Possible:  {}", invoice.possible_financing_display()),
            format!(
                "Score:     {}",
                invoice
                    .score
                    .map(|s| format!("{:.2}", s))
                    .unwrap_or_else(|| "-".to_string())
            ),
            format!(
                "Notes:     {}",
                invoice.description.as_deref().unwrap_or("-")
            ),
        ];
        frame.render_widget(Paragraph::new(lines.join("\n")), inner);
    }
}

/// Centered sub-rectangle for dialogs, in percent of the parent area.
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
    use chrono::TimeZone;
    use std::sync::mpsc;
    use tokio::sync::mpsc::unbounded_channel;

    fn invoice(id: &str, status: InvoiceStatus) -> Invoice {
        Invoice {
            id: id.to_string(),
            invoice_number: format!("INV-{}", id),
            client: "Acme".to_string(),
            amount: 100.0,
            currency: "EUR".to_string(),
            due_date: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            description: None,
            created_date: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            status,
            financing_date: None,
            possible_financing: None,
            score: None,
        }
    }

    fn test_app() -> (
        App,
        tokio::sync::mpsc::UnboundedReceiver<AppCommand>,
        mpsc::Sender<AppEvent>,
    ) {
        let (cmd_tx, cmd_rx) = unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        (App::new(Language::En, cmd_tx, event_rx), cmd_rx, event_tx)
    }

    fn drain_commands(
        rx: &mut tokio::sync::mpsc::UnboundedReceiver<AppCommand>,
    ) -> Vec<AppCommand> {
        let mut commands = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            commands.push(cmd);
        }
        commands
    }

    #[test]
    fn test_initial_tick_issues_one_refresh() {
        let (mut app, mut cmd_rx, _event_tx) = test_app();
        app.maybe_refresh();
        app.maybe_refresh();
        // Stale store, but only one refresh while it is in flight
        assert_eq!(drain_commands(&mut cmd_rx), vec![AppCommand::Refresh]);
    }

    #[test]
    fn test_send_confirmation_is_idempotent_while_in_flight() {
        let (mut app, mut cmd_rx, event_tx) = test_app();
        event_tx
            .send(AppEvent::Invoices(Ok(vec![invoice(
                "1",
                InvoiceStatus::Draft,
            )])))
            .unwrap();
        app.process_events();
        app.maybe_refresh();
        drain_commands(&mut cmd_rx);

        app.handle_key(KeyCode::Char('s'), KeyModifiers::NONE);
        assert!(matches!(app.mode, Mode::ConfirmSend { .. }));
        app.handle_key(KeyCode::Char('y'), KeyModifiers::NONE);

        // Second attempt while the first is still in flight
        app.handle_key(KeyCode::Char('s'), KeyModifiers::NONE);
        assert_eq!(app.mode, Mode::Normal);
        app.confirm_send("1".to_string());

        assert_eq!(
            drain_commands(&mut cmd_rx),
            vec![AppCommand::Send("1".to_string())]
        );
    }

    #[test]
    fn test_send_not_offered_for_non_draft() {
        let (mut app, mut cmd_rx, event_tx) = test_app();
        event_tx
            .send(AppEvent::Invoices(Ok(vec![invoice(
                "1",
                InvoiceStatus::Sent,
            )])))
            .unwrap();
        app.process_events();

        app.handle_key(KeyCode::Char('s'), KeyModifiers::NONE);
        assert_eq!(app.mode, Mode::Normal);
        assert!(drain_commands(&mut cmd_rx).is_empty());
    }

    #[test]
    fn test_send_settle_triggers_exactly_one_refetch() {
        let (mut app, mut cmd_rx, event_tx) = test_app();
        event_tx
            .send(AppEvent::Invoices(Ok(vec![invoice(
                "1",
                InvoiceStatus::Draft,
            )])))
            .unwrap();
        app.process_events();
        app.maybe_refresh();
        drain_commands(&mut cmd_rx);

        app.confirm_send("1".to_string());
        assert_eq!(
            drain_commands(&mut cmd_rx),
            vec![AppCommand::Send("1".to_string())]
        );

        // No refetch is issued before the send settles
        app.maybe_refresh();
        assert!(drain_commands(&mut cmd_rx).is_empty());

        event_tx
            .send(AppEvent::SendSettled {
                invoice_id: "1".to_string(),
                result: Ok(()),
            })
            .unwrap();
        app.process_events();
        app.maybe_refresh();
        app.maybe_refresh();
        assert_eq!(drain_commands(&mut cmd_rx), vec![AppCommand::Refresh]);
        assert!(app.send_in_flight.is_none());
    }

    #[test]
    fn test_failed_send_leaves_status_unchanged_and_notifies() {
        let (mut app, _cmd_rx, event_tx) = test_app();
        event_tx
            .send(AppEvent::Invoices(Ok(vec![invoice(
                "1",
                InvoiceStatus::Draft,
            )])))
            .unwrap();
        app.process_events();

        app.confirm_send("1".to_string());
        event_tx
            .send(AppEvent::SendSettled {
                invoice_id: "1".to_string(),
                result: Err("backend said no".to_string()),
            })
            .unwrap();
        app.process_events();

        // No optimistic mutation to roll back
        assert_eq!(app.store.get("1").unwrap().status, InvoiceStatus::Draft);
        let notice = app.notice.as_ref().unwrap();
        assert!(notice.is_error);
        assert!(notice.text.contains("backend said no"));
    }

    #[test]
    fn test_failed_fetch_keeps_previous_list_visible() {
        let (mut app, _cmd_rx, event_tx) = test_app();
        event_tx
            .send(AppEvent::Invoices(Ok(vec![
                invoice("1", InvoiceStatus::Draft),
                invoice("2", InvoiceStatus::Sent),
            ])))
            .unwrap();
        app.process_events();

        event_tx
            .send(AppEvent::Invoices(Err("connection refused".to_string())))
            .unwrap();
        app.process_events();

        assert_eq!(app.store.invoices().len(), 2);
        let notice = app.notice.as_ref().unwrap();
        assert!(notice.is_error);
        assert!(notice.text.contains("connection refused"));
    }

    #[test]
    fn test_failed_fetch_does_not_retry_until_asked() {
        let (mut app, mut cmd_rx, event_tx) = test_app();
        app.maybe_refresh();
        assert_eq!(drain_commands(&mut cmd_rx), vec![AppCommand::Refresh]);

        event_tx
            .send(AppEvent::Invoices(Err("connection refused".to_string())))
            .unwrap();
        app.process_events();

        // Subsequent frames stay quiet instead of hammering the backend
        for _ in 0..5 {
            app.process_events();
            app.maybe_refresh();
        }
        assert!(drain_commands(&mut cmd_rx).is_empty());

        // An explicit retry invalidates and fetches exactly once
        app.handle_key(KeyCode::Char('r'), KeyModifiers::NONE);
        app.maybe_refresh();
        app.maybe_refresh();
        assert_eq!(drain_commands(&mut cmd_rx), vec![AppCommand::Refresh]);
    }

    #[test]
    fn test_session_lost_stops_rendering_protected_content() {
        let (mut app, _cmd_rx, event_tx) = test_app();
        event_tx.send(AppEvent::SessionLost).unwrap();
        app.process_events();
        assert!(app.should_quit);
        assert!(app.session_lost());
    }

    #[test]
    fn test_status_filter_cycles_through_all_and_back() {
        let (mut app, _cmd_rx, _event_tx) = test_app();
        assert_eq!(app.status_filter, None);
        let mut seen = Vec::new();
        for _ in 0..InvoiceStatus::FILTERABLE.len() {
            app.cycle_status_filter();
            seen.push(app.status_filter.unwrap());
        }
        assert_eq!(seen, InvoiceStatus::FILTERABLE.to_vec());
        app.cycle_status_filter();
        assert_eq!(app.status_filter, None);
    }

    #[test]
    fn test_status_filter_narrows_visible_rows() {
        let (mut app, _cmd_rx, event_tx) = test_app();
        event_tx
            .send(AppEvent::Invoices(Ok(vec![
                invoice("d", InvoiceStatus::Draft),
                invoice("s", InvoiceStatus::Sent),
            ])))
            .unwrap();
        app.process_events();
        assert_eq!(app.visible_ids(), vec!["d", "s"]);

        app.status_filter = Some(InvoiceStatus::Sent);
        assert_eq!(app.visible_ids(), vec!["s"]);
    }

    #[test]
    fn test_search_input_updates_filter() {
        let (mut app, _cmd_rx, event_tx) = test_app();
        let mut other = invoice("2", InvoiceStatus::Sent);
        other.client = "Globex".to_string();
        event_tx
            .send(AppEvent::Invoices(Ok(vec![
                invoice("1", InvoiceStatus::Draft),
                other,
            ])))
            .unwrap();
        app.process_events();

        app.handle_key(KeyCode::Char('/'), KeyModifiers::NONE);
        for c in "glo".chars() {
            app.handle_key(KeyCode::Char(c), KeyModifiers::NONE);
        }
        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);

        assert_eq!(app.visible_ids(), vec!["2"]);
    }

    #[test]
    fn test_selection_clamps_when_filter_shrinks_list() {
        let (mut app, _cmd_rx, event_tx) = test_app();
        event_tx
            .send(AppEvent::Invoices(Ok(vec![
                invoice("1", InvoiceStatus::Draft),
                invoice("2", InvoiceStatus::Sent),
                invoice("3", InvoiceStatus::Sent),
            ])))
            .unwrap();
        app.process_events();

        app.handle_key(KeyCode::Down, KeyModifiers::NONE);
        app.handle_key(KeyCode::Down, KeyModifiers::NONE);
        assert_eq!(app.selected, 2);

        app.status_filter = Some(InvoiceStatus::Draft);
        app.clamp_selection();
        assert_eq!(app.selected, 0);
    }
}
