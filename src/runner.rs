use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::client::{ClientError, ClientOptions, HistoryClient, PageSource};
use crate::model::{FilterType, PageResponse, PageSize};
use crate::refresh::{RefreshController, RefreshStatus, REFRESH_INTERVAL};
use crate::view::{LoadOutcome, LoadTicket, PageView, ViewState};

#[derive(Clone, Debug)]
pub struct Options {
    pub base_url: String,
    pub initial: ViewState,
    pub refresh_interval: Duration,
    pub client: ClientOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            initial: ViewState::default(),
            refresh_interval: REFRESH_INTERVAL,
            client: ClientOptions::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("refresh interval must be positive")]
    InvalidInterval,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// User input, whether typed at the terminal or sent by an embedding program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    NextPage,
    PreviousPage,
    /// 0-based page index.
    GoToPage(usize),
    SetPageSize(PageSize),
    SetFilter(FilterType),
    ToggleRefresh,
    Reload,
    Quit,
}

#[derive(Debug)]
pub enum Event {
    Tick,
    Loaded {
        ticket: LoadTicket,
        result: Result<PageResponse, ClientError>,
    },
}

/// What changed in the view, reported after each handled event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewUpdate {
    Loaded,
    LoadFailed(String),
    RefreshChanged(RefreshStatus),
    /// Navigation to a page outside the known range; nothing was fetched.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Builds a client-backed session from `Options`.
pub fn connect(options: &Options) -> Result<Session<HistoryClient>, RunnerError> {
    if options.refresh_interval.is_zero() {
        return Err(RunnerError::InvalidInterval);
    }
    let client = HistoryClient::new(&options.base_url, &options.client)?;
    Ok(Session::new(
        client,
        options.initial.clone(),
        options.refresh_interval,
    ))
}

/// Fetch one page without starting a session.
pub async fn load_once(options: &Options) -> Result<PageView, RunnerError> {
    let client = HistoryClient::new(&options.base_url, &options.client)?;
    let mut view = PageView::new(options.initial.clone());
    let ticket = view.reload();
    let response = client.fetch(&ticket.query).await?;
    view.apply_success(&ticket, response, Local::now());
    if view.needs_reload(&ticket) {
        let ticket = view.reload();
        let response = client.fetch(&ticket.query).await?;
        view.apply_success(&ticket, response, Local::now());
    }
    Ok(view)
}

/// Owns the view and the refresh timer. Fetches run as separate tasks and
/// report back through the event channel, so several can be in flight at
/// once; the view discards completions older than what it already shows.
pub struct Session<S: PageSource> {
    source: S,
    view: PageView,
    refresh: RefreshController,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    in_flight: usize,
}

impl<S: PageSource> Session<S> {
    pub fn new(source: S, initial: ViewState, refresh_interval: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let tick_tx = events_tx.clone();
        let refresh = RefreshController::new(refresh_interval, initial.auto_refresh, move || {
            let _ = tick_tx.send(Event::Tick);
        });
        Self {
            source,
            view: PageView::new(initial),
            refresh,
            events_tx,
            events_rx,
            in_flight: 0,
        }
    }

    pub fn view(&self) -> &PageView {
        &self.view
    }

    pub fn refresh(&self) -> &RefreshController {
        &self.refresh
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Initial load, then arm the timer if auto refresh is on.
    pub fn start(&mut self) {
        let ticket = self.view.reload();
        self.spawn_fetch(ticket);
        if self.refresh.is_enabled() {
            self.refresh.start();
        }
    }

    fn spawn_fetch(&mut self, ticket: LoadTicket) {
        tracing::debug!(
            event = "session.fetch_issued",
            seq = ticket.seq,
            page = ticket.query.page
        );
        self.in_flight += 1;
        let source = self.source.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_page(ticket.query.clone()).await;
            let _ = tx.send(Event::Loaded { ticket, result });
        });
    }

    pub fn handle_command(&mut self, command: Command) -> (Flow, Option<ViewUpdate>) {
        let ticket = match command {
            Command::NextPage => self.view.next_page(),
            Command::PreviousPage => self.view.previous_page(),
            Command::GoToPage(index) => self.view.go_to_page(index),
            Command::SetPageSize(size) => Some(self.view.set_page_size(size)),
            Command::SetFilter(filter) => Some(self.view.set_filter(filter)),
            Command::Reload => Some(self.view.reload()),
            Command::ToggleRefresh => {
                let status = self.refresh.toggle();
                self.view.set_auto_refresh(status == RefreshStatus::Enabled);
                return (Flow::Continue, Some(ViewUpdate::RefreshChanged(status)));
            }
            Command::Quit => {
                self.refresh.stop();
                return (Flow::Quit, None);
            }
        };
        match ticket {
            Some(ticket) => {
                self.spawn_fetch(ticket);
                (Flow::Continue, None)
            }
            None => (Flow::Continue, Some(ViewUpdate::Ignored)),
        }
    }

    /// Waits for the next timer tick or fetch completion.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events_rx.recv().await
    }

    pub fn handle_event(&mut self, event: Event) -> Option<ViewUpdate> {
        match event {
            Event::Tick => {
                let ticket = self.view.reload();
                self.spawn_fetch(ticket);
                None
            }
            Event::Loaded { ticket, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                match result {
                    Ok(response) => {
                        match self.view.apply_success(&ticket, response, Local::now()) {
                            LoadOutcome::Applied => {
                                tracing::info!(
                                    event = "session.page_loaded",
                                    seq = ticket.seq,
                                    page = ticket.query.page,
                                    total_pages = self.view.total_pages()
                                );
                                if self.view.needs_reload(&ticket) {
                                    let ticket = self.view.reload();
                                    self.spawn_fetch(ticket);
                                }
                                Some(ViewUpdate::Loaded)
                            }
                            _ => None,
                        }
                    }
                    Err(e) => {
                        let message = e.to_string();
                        tracing::warn!(event = "session.load_failed", seq = ticket.seq, error = %message);
                        match self.view.apply_failure(&ticket, message.clone()) {
                            LoadOutcome::Failed => Some(ViewUpdate::LoadFailed(message)),
                            _ => None,
                        }
                    }
                }
            }
        }
    }

    /// Drives the session until `Quit`, Ctrl-C, or until input is closed with
    /// nothing left that could change the view.
    pub async fn run<F>(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut on_update: F,
    ) -> PageView
    where
        F: FnMut(&PageView, &ViewUpdate),
    {
        self.start();
        let mut input_open = true;
        loop {
            tokio::select! {
                command = commands.recv(), if input_open => {
                    match command {
                        Some(command) => {
                            let (flow, update) = self.handle_command(command);
                            if let Some(update) = update {
                                on_update(&self.view, &update);
                            }
                            if flow == Flow::Quit {
                                break;
                            }
                        }
                        None => {
                            tracing::debug!(event = "session.input_closed");
                            input_open = false;
                        }
                    }
                }
                event = self.events_rx.recv() => {
                    // the session holds a sender, so the channel never closes
                    if let Some(event) = event {
                        if let Some(update) = self.handle_event(event) {
                            on_update(&self.view, &update);
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!(event = "session.interrupted");
                    break;
                }
            }
            if !input_open && !self.refresh.is_enabled() && self.in_flight == 0 {
                break;
            }
        }
        self.refresh.stop();
        self.view
    }
}
