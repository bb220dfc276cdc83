use crate::config::AppConfig;
use crate::error::GatewayError;
use crate::event::{AppEvent, Event, EventHandler};
use crate::gateway::{Backend, MemoryGateway, ResponsePair};
use crate::session::{PendingSubmission, Session};
use crate::ui::line_rows;
use crate::ui::transcript::transcript_lines;
use crate::{log_debug, log_error, log_info};
use color_eyre::Result;
use ratatui::{
    DefaultTerminal,
    crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    layout::Rect,
};
use std::cell::Cell;
use tokio::sync::mpsc;

/// Result of a dispatched submission, handed back to the UI task.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub pending: PendingSubmission,
    pub result: std::result::Result<ResponsePair, GatewayError>,
}

/// Application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    pub running: bool,
    /// Form, busy flag and transcripts
    pub session: Session,
    /// Lines scrolled off the top of both columns
    pub scroll_offset: u16,
    /// Advances on ticks while a submission is in flight
    pub spinner_frame: usize,
    /// Event handler.
    pub events: EventHandler,
    /// Inside of a transcript column as last drawn
    pub(crate) column_area: Cell<Rect>,

    gateway: MemoryGateway,
    outcome_tx: mpsc::UnboundedSender<SubmissionOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<SubmissionOutcome>,
}

impl App {
    /// Constructs a new instance of [`App`].
    pub fn new(config: &AppConfig) -> Self {
        Self::with_events(config, EventHandler::new())
    }

    /// Same as [`App::new`] with a caller-supplied event source.
    pub fn with_events(config: &AppConfig, events: EventHandler) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        Self {
            running: true,
            session: Session::new(config.default_user_id.clone()),
            scroll_offset: 0,
            spinner_frame: 0,
            events,
            column_area: Cell::new(Rect::default()),
            gateway: MemoryGateway::new(config.base_url.clone()),
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn base_url(&self) -> &str {
        self.gateway.base_url()
    }

    /// Run the application's main loop.
    pub async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let mut needs_redraw = true;

        while self.running {
            if needs_redraw {
                terminal.draw(|frame| frame.render_widget(&self, frame.area()))?;
                needs_redraw = false;
            }

            tokio::select! {
                event = self.events.next() => {
                    match event? {
                        Event::Tick => {
                            // Only the spinner moves between events
                            if self.session.is_busy() {
                                self.spinner_frame = self.spinner_frame.wrapping_add(1);
                                needs_redraw = true;
                            }
                        }
                        Event::Crossterm(crossterm::event::Event::Key(key_event)) => {
                            self.handle_key_events(key_event);
                        }
                        Event::Crossterm(crossterm::event::Event::Resize(_, _)) => {
                            needs_redraw = true;
                        }
                        Event::Crossterm(_) => {}
                        Event::App(app_event) => {
                            self.handle_app_event(app_event);
                            needs_redraw = true;
                        }
                    }
                }
                outcome = self.outcome_rx.recv() => {
                    if let Some(outcome) = outcome {
                        self.apply_outcome(outcome);
                        needs_redraw = true;
                    }
                }
            }
        }
        Ok(())
    }

    /// Handles the key events and queues the matching [`AppEvent`].
    pub fn handle_key_events(&mut self, key_event: KeyEvent) {
        if let Some(app_event) = map_key(key_event) {
            self.events.send(app_event);
        }
    }

    pub fn handle_app_event(&mut self, app_event: AppEvent) {
        match app_event {
            AppEvent::Input(ch) => self.session.push_char(ch),
            AppEvent::Backspace => self.session.pop_char(),
            AppEvent::SwitchField => self.session.toggle_focus(),
            AppEvent::Submit => self.submit(),
            AppEvent::ScrollUp => self.scroll_up(1),
            AppEvent::ScrollDown => self.scroll_down(1),
            AppEvent::PageUp => self.scroll_up(self.page_rows()),
            AppEvent::PageDown => self.scroll_down(self.page_rows()),
            AppEvent::Quit => self.quit(),
        }
    }

    /// Dispatch the current form to both backends without blocking the UI.
    pub fn submit(&mut self) {
        let Some(pending) = self.session.begin_submit() else {
            return;
        };

        log_info!(
            "Submitting query for user '{}' to {}",
            pending.request.user_id,
            self.gateway.base_url()
        );

        let gateway = self.gateway.clone();
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let result = gateway.query_both(&pending.request).await;
            if tx.send(SubmissionOutcome { pending, result }).is_err() {
                log_debug!("Submission finished after the app stopped listening");
            }
        });
    }

    /// Wait for the next finished submission.
    pub async fn next_outcome(&mut self) -> Option<SubmissionOutcome> {
        self.outcome_rx.recv().await
    }

    pub fn apply_outcome(&mut self, outcome: SubmissionOutcome) {
        if let Err(e) = &outcome.result {
            log_error!("Query failed: {}", e);
        } else {
            // Newest entries sit at the top
            self.scroll_offset = 0;
        }
        self.session.complete(outcome.pending, outcome.result);
    }

    /// Furthest the columns can scroll before the longer one runs out of rows.
    pub fn max_scroll(&self) -> u16 {
        let area = self.column_area.get();
        let longest = Backend::ALL
            .into_iter()
            .map(|backend| {
                let lines = transcript_lines(
                    backend,
                    self.session.transcript(backend),
                    self.session.column_state(backend),
                    self.spinner_frame,
                );
                lines.iter().map(|line| line_rows(line, area.width)).sum::<usize>()
            })
            .max()
            .unwrap_or(0);

        let hidden = longest.saturating_sub(usize::from(area.height));
        u16::try_from(hidden).unwrap_or(u16::MAX)
    }

    fn page_rows(&self) -> u16 {
        self.column_area.get().height.max(1)
    }

    fn scroll_up(&mut self, rows: u16) {
        self.scroll_offset = self.scroll_offset.saturating_sub(rows);
    }

    fn scroll_down(&mut self, rows: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(rows).min(self.max_scroll());
    }

    /// Set running to false to quit the application.
    pub fn quit(&mut self) {
        self.running = false;
    }
}

/// Translate a key press into an application event.
pub fn map_key(key_event: KeyEvent) -> Option<AppEvent> {
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    match key_event.code {
        KeyCode::Char('c' | 'C') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(AppEvent::Quit)
        }
        KeyCode::Esc => Some(AppEvent::Quit),
        KeyCode::Enter => Some(AppEvent::Submit),
        KeyCode::Tab | KeyCode::BackTab => Some(AppEvent::SwitchField),
        KeyCode::Backspace => Some(AppEvent::Backspace),
        KeyCode::Up => Some(AppEvent::ScrollUp),
        KeyCode::Down => Some(AppEvent::ScrollDown),
        KeyCode::PageUp => Some(AppEvent::PageUp),
        KeyCode::PageDown => Some(AppEvent::PageDown),
        // Shift is the only modifier that still types
        KeyCode::Char(ch) if key_event.modifiers.difference(KeyModifiers::SHIFT).is_empty() => {
            Some(AppEvent::Input(ch))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::QueryResponse;
    use ratatui::crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn mapped(code: KeyCode, modifiers: KeyModifiers) -> Option<AppEvent> {
        map_key(press(code, modifiers))
    }

    #[test]
    fn test_key_mapping() {
        let none = KeyModifiers::NONE;
        assert_eq!(mapped(KeyCode::Enter, none), Some(AppEvent::Submit));
        assert_eq!(mapped(KeyCode::Esc, none), Some(AppEvent::Quit));
        assert_eq!(mapped(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(AppEvent::Quit));
        assert_eq!(mapped(KeyCode::Char('c'), none), Some(AppEvent::Input('c')));
        assert_eq!(mapped(KeyCode::Char('Q'), KeyModifiers::SHIFT), Some(AppEvent::Input('Q')));
        assert_eq!(mapped(KeyCode::BackTab, KeyModifiers::SHIFT), Some(AppEvent::SwitchField));
        assert_eq!(mapped(KeyCode::Down, none), Some(AppEvent::ScrollDown));
        assert_eq!(mapped(KeyCode::PageDown, none), Some(AppEvent::PageDown));
        assert_eq!(mapped(KeyCode::F(5), none), None);
    }

    #[test]
    fn test_modified_chars_do_not_type() {
        assert_eq!(mapped(KeyCode::Char('u'), KeyModifiers::CONTROL), None);
        assert_eq!(mapped(KeyCode::Char('d'), KeyModifiers::CONTROL), None);
        assert_eq!(mapped(KeyCode::Char('x'), KeyModifiers::ALT), None);
        assert_eq!(mapped(KeyCode::Char('X'), KeyModifiers::SHIFT | KeyModifiers::ALT), None);
    }

    fn app_with_history(entries: usize) -> App {
        let mut app = App::with_events(&AppConfig::default(), EventHandler::detached());
        for i in 0..entries {
            app.session.query = format!("question {}", i);
            let pending = app.session.begin_submit().unwrap();
            let response = QueryResponse {
                response: format!("answer {}", i),
                memory_saved: true,
                context_found: false,
                retrieved_memory: None,
                performance_metrics: None,
            };
            let pair = ResponsePair { mem0: response.clone(), zep: response };
            app.apply_outcome(SubmissionOutcome { pending, result: Ok(pair) });
        }
        app
    }

    #[test]
    fn test_scroll_stops_at_last_row() {
        // Each entry is four short rows: Q, A, memory, blank
        let mut app = app_with_history(5);
        app.column_area.set(Rect::new(0, 0, 60, 8));
        assert_eq!(app.max_scroll(), 12);

        for _ in 0..50 {
            app.handle_app_event(AppEvent::ScrollDown);
        }
        assert_eq!(app.scroll_offset, 12);

        app.handle_app_event(AppEvent::ScrollUp);
        assert_eq!(app.scroll_offset, 11);
    }

    #[test]
    fn test_page_keys_move_by_column_height() {
        let mut app = app_with_history(5);
        app.column_area.set(Rect::new(0, 0, 60, 8));

        app.handle_app_event(AppEvent::PageDown);
        assert_eq!(app.scroll_offset, 8);
        app.handle_app_event(AppEvent::PageDown);
        assert_eq!(app.scroll_offset, 12);
        app.handle_app_event(AppEvent::PageUp);
        assert_eq!(app.scroll_offset, 4);
    }

    #[test]
    fn test_short_transcript_does_not_scroll() {
        let mut app = app_with_history(1);
        app.column_area.set(Rect::new(0, 0, 60, 8));

        app.handle_app_event(AppEvent::PageDown);
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn test_release_events_are_ignored() {
        let release = KeyEvent {
            code: KeyCode::Enter,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(map_key(release), None);
    }
}
