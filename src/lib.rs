//! # Route Scout
//!
//! Interactive transit route lookup backed by a remote timetable search
//! API, with per-day on-disk caching of results.
//!
//! ## Architecture
//!
//! The heart of the crate is the **task scheduling core**: a single loop
//! task plus a fixed-size pool of worker threads. Blocking operations
//! (network requests, cache reads and writes) run as [`scheduler::Task`]s
//! on the workers; every continuation resumes on the loop, so nothing
//! above the scheduler boundary needs a lock. In-flight task identities
//! are tracked centrally, which deduplicates logically identical requests.
//!
//! ## Module Organization
//!
//! - [`scheduler`] - worker pool, task variants, in-flight registry
//! - [`console`] - background stdin reader and idle heartbeat
//! - [`orchestration`] - API access, city-code mapping, route retrieval
//! - [`session`] - command state machine driving one interactive session
//! - [`transport`] - blocking HTTP seam
//! - [`config`] - application settings with environment overrides
//! - [`error`] - structured error handling
//! - [`logging`] - tracing subscriber setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use route_scout::config::AppConfig;
//! use route_scout::session::Session;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let session = Session::new(&config, "API_KEY")?;
//! session.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod console;
pub mod error;
pub mod logging;
pub mod orchestration;
pub mod scheduler;
pub mod session;
pub mod transport;

pub use config::{AppConfig, SearchConfig};
pub use error::{Result, RouteScoutError};
pub use scheduler::{Scheduler, Task, TaskKind, TaskOutcome};
pub use session::{Session, SessionState};
