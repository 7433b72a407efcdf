//! # Session Controller
//!
//! Top-level state machine driving one interactive session: validate the
//! API key, read commands, dispatch workflows, and serialize everything
//! on a single loop task.
//!
//! ## States
//!
//! `Idle → Validating → {Invalid → ShuttingDown, Valid → AwaitingCommand}`;
//! `AwaitingCommand ↔ ProcessingCommand`; any state reaches
//! `ShuttingDown → Stopped` on `quit`/`exit` or an interrupt signal.
//!
//! Commands are processed one at a time: lines arriving while a search
//! workflow runs stay queued in the input channel until the loop is back
//! in `AwaitingCommand`.

mod command;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::{AppConfig, SearchConfig};
use crate::console::{ConsoleEvent, InputChannel};
use crate::error::{Result, RouteScoutError};
use crate::orchestration::{ApiManager, CityMapper, RoutesHandler};
use crate::scheduler::{Scheduler, Task};
use crate::transport::{Transport, UreqTransport};

pub use command::{validate_date, Command, HELP_TEXT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Validating,
    AwaitingCommand,
    ProcessingCommand,
    ShuttingDown,
    Stopped,
}

pub struct Session {
    scheduler: Arc<Scheduler>,
    console: InputChannel,
    api: Arc<ApiManager>,
    city_mapper: CityMapper,
    routes: RoutesHandler,
    search: SearchConfig,
    state: SessionState,
    shutdown_delay: Duration,
}

impl Session {
    pub fn new(config: &AppConfig, api_key: impl Into<String>) -> Result<Self> {
        Self::with_transport(config, api_key, Arc::new(UreqTransport::default()))
    }

    /// Build a session over an explicit transport. Tests use this to
    /// script API behavior without touching the network.
    pub fn with_transport(
        config: &AppConfig,
        api_key: impl Into<String>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        std::fs::create_dir_all(&config.cache_dir).map_err(|e| {
            RouteScoutError::Configuration(format!(
                "cannot create cache dir {}: {e}",
                config.cache_dir.display()
            ))
        })?;

        let scheduler = Arc::new(Scheduler::new(config.worker_threads));
        let api = Arc::new(ApiManager::new(
            Arc::clone(&scheduler),
            transport,
            api_key,
            config,
        ));
        let city_mapper = CityMapper::new(
            Arc::clone(&scheduler),
            Arc::clone(&api),
            &config.cache_dir,
        );
        let routes = RoutesHandler::new(
            Arc::clone(&scheduler),
            Arc::clone(&api),
            &config.cache_dir,
        );

        Ok(Self {
            scheduler,
            console: InputChannel::new(Duration::from_millis(config.heartbeat_ms)),
            api,
            city_mapper,
            routes,
            search: SearchConfig::default(),
            state: SessionState::Idle,
            shutdown_delay: Duration::from_millis(config.shutdown_delay_ms),
        })
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Drive the session to completion. Blocks the calling task until
    /// the session stops via `quit`, end of input, or an interrupt.
    pub async fn run(mut self) -> Result<()> {
        self.state = SessionState::Validating;
        info!("validating API key");

        if !self.api.validate_key().await {
            self.console.print("invalid API key");
            // Defer the stop past the current frame, as a delayed no-op.
            let _ = self
                .scheduler
                .submit_delayed(Task::cache_read("shutdown_task", ""), self.shutdown_delay)
                .await;
            self.stop().await;
            return Ok(());
        }

        self.state = SessionState::AwaitingCommand;
        self.console.print("type 'help' to list available commands");
        self.console.start_reading();

        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                event = self.console.next_event() => match event {
                    ConsoleEvent::Line(line) => self.handle_line(&line).await,
                    ConsoleEvent::Heartbeat => {}
                    ConsoleEvent::Closed => {
                        debug!("input channel closed");
                        self.stop().await;
                    }
                },
                _ = &mut interrupt => {
                    info!("interrupt received");
                    self.stop().await;
                }
            }
            if self.state == SessionState::Stopped {
                break;
            }
        }
        Ok(())
    }

    /// Process one input line. Whitespace-only lines are ignored.
    pub async fn handle_line(&mut self, line: &str) {
        if self.state == SessionState::Stopped || self.state == SessionState::ShuttingDown {
            return;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }

        self.state = SessionState::ProcessingCommand;
        match Command::parse(trimmed) {
            Command::Help => self.console.print(HELP_TEXT),
            Command::Quit => {
                self.stop().await;
                return;
            }
            Command::From(city) => {
                if !city.is_empty() {
                    self.search.departure = city;
                }
            }
            Command::To(city) => {
                if !city.is_empty() {
                    self.search.arrival = city;
                }
            }
            Command::Date(raw) => match validate_date(&raw) {
                Ok(()) => self.search.date = raw,
                Err(e) => self.console.print(&e.to_string()),
            },
            Command::ShowConfig => self.console.print(&self.search.describe()),
            Command::Search => self.run_search().await,
            Command::Unknown(_) => self.console.print("unknown command, type 'help'"),
        }
        self.state = SessionState::AwaitingCommand;
    }

    /// The search chain: city mapping, then route retrieval, then print.
    async fn run_search(&mut self) {
        if !self.search.is_complete() {
            self.console
                .print("not all fields are set: need from, to and date");
            return;
        }

        if let Err(e) = self.city_mapper.map_city_codes(&mut self.search).await {
            self.console.print(&format!("city mapping failed: {e}"));
            return;
        }

        match self.routes.get_routes(&self.search).await {
            Ok(report) => self.console.print(&report),
            Err(e) => self.console.print(&format!("route lookup failed: {e}")),
        }
    }

    /// Idempotent stop path shared by `quit`, end of input, interrupts,
    /// and failed validation.
    pub async fn stop(&mut self) {
        if matches!(
            self.state,
            SessionState::ShuttingDown | SessionState::Stopped
        ) {
            return;
        }
        self.state = SessionState::ShuttingDown;
        info!("session shutting down");
        self.console.stop();
        self.scheduler.shutdown().await;
        self.state = SessionState::Stopped;
    }
}
