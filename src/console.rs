//! Console input channel.
//!
//! Decouples blocking line-oriented stdin from the session loop. One
//! background reader thread blocks on stdin and forwards each completed
//! line through a channel; the session drains that channel from its own
//! select loop, so input handling always interleaves with scheduler
//! completions on the same task and orchestrator state needs no locks.

use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, trace};

const PROMPT: &str = "> ";

/// What the session observes from the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    /// A completed, non-empty input line.
    Line(String),
    /// Idle wake-up; carries no work, exists so the loop stays live
    /// between input lines.
    Heartbeat,
    /// stdin reached end of file or the reader thread exited.
    Closed,
}

pub struct InputChannel {
    lines_tx: Option<mpsc::UnboundedSender<String>>,
    lines_rx: mpsc::UnboundedReceiver<String>,
    heartbeat: tokio::time::Interval,
    reading: Arc<AtomicBool>,
    stop_flag: Arc<AtomicBool>,
}

impl InputChannel {
    pub fn new(heartbeat_period: Duration) -> Self {
        let (lines_tx, lines_rx) = mpsc::unbounded_channel();
        let mut heartbeat = tokio::time::interval(heartbeat_period);
        heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        Self {
            lines_tx: Some(lines_tx),
            lines_rx,
            heartbeat,
            reading: Arc::new(AtomicBool::new(false)),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the reader thread. No-op when already reading.
    pub fn start_reading(&mut self) {
        if self.reading.swap(true, Ordering::AcqRel) {
            return;
        }
        // The thread takes the only sender; when it exits the channel
        // closes and the session observes `Closed`. Without a sender
        // there is nothing to restart, so the flag goes back down.
        let Some(lines_tx) = self.lines_tx.take() else {
            self.reading.store(false, Ordering::Release);
            return;
        };
        let reading = Arc::clone(&self.reading);
        let stop_flag = Arc::clone(&self.stop_flag);

        std::thread::Builder::new()
            .name("console-reader".to_string())
            .spawn(move || {
                show_prompt();
                let stdin = std::io::stdin();
                let mut buffer = String::new();
                loop {
                    if stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    buffer.clear();
                    match stdin.lock().read_line(&mut buffer) {
                        Ok(0) => break,
                        Ok(_) => {
                            let line = buffer.trim_end_matches(['\n', '\r']).to_string();
                            if !line.is_empty() && lines_tx.send(line).is_err() {
                                break;
                            }
                            if reading.load(Ordering::Acquire) {
                                show_prompt();
                            }
                        }
                        Err(e) => {
                            debug!(error = %e, "console reader failed, closing channel");
                            break;
                        }
                    }
                }
            })
            .expect("spawn console reader thread");
    }

    /// Wait for the next input line, heartbeat tick, or channel close.
    pub async fn next_event(&mut self) -> ConsoleEvent {
        tokio::select! {
            line = self.lines_rx.recv() => match line {
                Some(line) => ConsoleEvent::Line(line),
                None => ConsoleEvent::Closed,
            },
            _ = self.heartbeat.tick() => {
                trace!("console heartbeat");
                ConsoleEvent::Heartbeat
            }
        }
    }

    /// Write a message and re-display the prompt.
    pub fn print(&self, message: &str) {
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{message}");
        let _ = write!(stdout, "{PROMPT}");
        let _ = stdout.flush();
    }

    /// Signal the reader to stop. Safe to call from the session loop
    /// during shutdown; the thread is released rather than joined, since
    /// it may be parked inside a blocking stdin read until the next line
    /// or process exit. The heartbeat stops once the loop stops polling.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
        self.reading.store(false, Ordering::Release);
    }

    pub fn is_reading(&self) -> bool {
        self.reading.load(Ordering::Acquire)
    }
}

fn show_prompt() {
    let mut stdout = std::io::stdout().lock();
    let _ = write!(stdout, "{PROMPT}");
    let _ = stdout.flush();
}
