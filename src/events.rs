//! Event types and the main event loop driver for the Mayday TUI.
//!
//! This module defines the [`Event`] enum (keyboard input, ticks, and the
//! form mutations the submission pipeline produces) and the
//! [`EventHandler`], which runs a background task that polls crossterm for
//! key events and emits periodic [`Event::Tick`]s. The main loop in
//! `main.rs` receives events via [`EventHandler::next`]; background tasks
//! (the submission pipeline, the health poller) send events via a clone of
//! [`EventHandler::tx`].
//!
//! The pipeline never touches the terminal. Everything it wants shown is an
//! [`Event`] applied to [`App`](crate::app::App) by the main loop, which
//! keeps the orchestration testable without a terminal attached.

use crate::alert::Severity;
use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Kind of message currently shown in the location status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Loading,
    Success,
    Error,
}

/// The location status line under the address field.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusLine {
    pub fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Submit control state requested by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlState {
    /// Disabled, with a progress label ("Getting your location...").
    Busy(String),
    /// Enabled, original label restored.
    Ready,
}

/// Events processed by the application event loop.
///
/// The main loop matches on these to update [`App`](crate::app::App) state
/// and drive the UI. Everything except `Tick` and `Input` is a view
/// mutation emitted by the submission pipeline or the health poller.
#[derive(Debug, Clone)]
pub enum Event {
    /// Periodic tick used for UI refresh and alert timers.
    Tick,
    /// User key press from the terminal.
    Input(KeyEvent),
    /// Show, change, or hide (`None`) the location status line.
    Status(Option<StatusLine>),
    /// Write (`Some`) or clear (`None`) the hidden coordinate fields.
    Coordinates(Option<(f64, f64)>),
    /// Write the address field.
    Address(String),
    /// Disable/enable the submit control.
    Control(ControlState),
    /// Show a modal alert; severity is inferred from the message when `None`.
    Alert(Option<Severity>, String),
    /// Clear every form field.
    ResetForm,
    /// Result of the latest report-API health probe.
    Health(bool),
}

/// Multiplexes terminal input and ticks into a single event stream.
///
/// Holds an unbounded channel: the sender ([`tx`](EventHandler::tx)) can be
/// cloned and given to background tasks, while the receiver is consumed by
/// [`next`](EventHandler::next) in the main loop. A background task polls
/// crossterm with a timeout and sends [`Event::Input`] on key press and
/// [`Event::Tick`] at the configured interval.
pub struct EventHandler {
    /// Sender for posting events (e.g. from the submission task).
    pub tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Creates a new event handler and spawns the input/tick task.
    ///
    /// The spawned task runs until the process exits. It polls crossterm
    /// with a timeout of `tick_rate_ms`; key *presses* are forwarded as
    /// [`Event::Input`] (repeat/release events would double characters in
    /// the text fields), and [`Event::Tick`] fires at the configured
    /// interval.
    ///
    /// # Panics
    ///
    /// The background task may panic if crossterm `poll` or `read` fails
    /// (e.g. terminal disconnected). The main loop does not protect against
    /// this.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            let mut last_tick = Instant::now();
            loop {
                let timeout = tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::from_secs(0));
                if event::poll(timeout).expect("Poll failed") {
                    if let CrosstermEvent::Key(key) = event::read().expect("Read failed") {
                        if key.kind == KeyEventKind::Press {
                            event_tx.send(Event::Input(key)).ok();
                        }
                    }
                }
                if last_tick.elapsed() >= tick_rate {
                    event_tx.send(Event::Tick).ok();
                    last_tick = Instant::now();
                }
            }
        });

        Self { tx, rx }
    }

    /// Receives the next event from the channel.
    ///
    /// Returns `None` when all senders have been dropped (e.g. the input
    /// task exited). The main loop normally runs until
    /// [`App::should_quit`](crate::app::App::should_quit) is true, so this
    /// only matters if the background task is killed.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
