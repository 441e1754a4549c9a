use crate::audit::AuditState;
use crate::backends::{BackendsState, BackendsView};
use crate::common::ApiClient;
use crate::config::Config;
use crate::console::{Console, ConsoleEvent};
use crate::keymap::Keymap;
use crate::register::RegisterState;
use crate::settings::SettingsState;
use color_eyre::eyre::{Result, eyre};
use crossterm::event::EventStream;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, PartialEq)]
pub enum AppView {
    Backends(BackendsView),
    Settings,
}

#[derive(Default, Debug)]
pub struct AppState {
    pub backends: BackendsState,
    pub settings: SettingsState,
    /// Ping target input.
    pub ping: tui_input::Input,
    pub audit: AuditState,
    pub register: RegisterState,
}

/// 60 FPS = 1000ms / 60 = 16.67ms per frame
const FPS_RATE: Duration = Duration::from_millis(1000 / 60);

#[derive(Debug)]
pub struct App {
    /// Active application view.
    pub view: AppView,
    /// Application state.
    ///
    /// This is shared among all views.
    pub state: AppState,
    /// Is the application running?
    pub is_running: bool,
    /// Event stream.
    pub event_stream: EventStream,
    /// Configuration.
    pub config: Config,
    /// Key bindings of the backend table.
    pub keymap: Keymap,
    /// Registry mirror, pending edits and request bookkeeping.
    pub console: Console<ApiClient>,
    /// Completions and refresh ticks, taken by [`App::run`].
    console_events: Option<UnboundedReceiver<ConsoleEvent>>,
}

impl App {
    /// Construct a new instance of [`App`].
    pub fn new() -> Result<Self> {
        Self::new_at_view(AppView::Backends(BackendsView::Browse))
    }

    pub fn new_at_view(view: AppView) -> Result<Self> {
        Ok(Self::with_config(Config::load()?, view))
    }

    pub fn with_config(config: Config, view: AppView) -> Self {
        let client = Arc::new(ApiClient::from_config(&config));
        let (console, console_events) = Console::new(client, config.refresh_interval());
        Self {
            view,
            state: AppState::default(),
            is_running: false,
            event_stream: EventStream::new(),
            config,
            keymap: Keymap::default(),
            console,
            console_events: Some(console_events),
        }
    }

    /// Run the application's main loop.
    pub async fn run(mut self, mut terminal: ratatui::DefaultTerminal) -> Result<()> {
        let mut console_events = self
            .console_events
            .take()
            .ok_or_else(|| eyre!("application is already running"))?;
        self.is_running = true;

        tracing::info!(api = %self.config.api_url(), "starting console");
        self.console.init();
        if self.config.auto_refresh {
            self.console.start_auto_refresh();
        }

        // create a ticker for redraws while requests are in flight
        let mut interval = tokio::time::interval(FPS_RATE);

        while self.is_running {
            terminal.draw(|frame| self.draw(frame))?;

            tokio::select! {
                _ = interval.tick() => {
                    // will trigger a redraw by looping
                    continue;
                }
                Some(event) = console_events.recv() => {
                    self.console.handle(event);
                }
                result = self.handle_crossterm_events() => {
                    result?;
                }
            }
        }

        tracing::info!("console stopped");
        Ok(())
    }

    /// Renders the user interface.
    fn draw(&mut self, frame: &mut ratatui::Frame) {
        match self.view.clone() {
            AppView::Backends(view) => self.draw_backends(frame, view),
            AppView::Settings => self.draw_settings(frame),
        }
    }

    /// Reads the crossterm events and updates the state of [`App`].
    async fn handle_crossterm_events(&mut self) -> Result<()> {
        use crossterm::event::{Event, KeyEventKind};
        use futures::{FutureExt, StreamExt};

        let event = self.event_stream.next().fuse().await;
        match event {
            Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                match self.view.clone() {
                    AppView::Backends(view) => self.handle_backends_input(key, view),
                    AppView::Settings => self.handle_settings_input(key),
                }
            }
            Some(Err(err)) => return Err(err.into()),
            _ => {}
        }
        Ok(())
    }

    /// Points the console at the current config's control plane and period.
    pub(crate) fn apply_config(&mut self) {
        self.console
            .set_transport(Arc::new(ApiClient::from_config(&self.config)));
        self.console
            .set_refresh_interval(self.config.refresh_interval());
    }

    /// Set running to false to quit the application.
    pub fn quit(&mut self) {
        self.is_running = false;
    }
}
