use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use eyre::{Result, eyre};
use futures::StreamExt;
use futures::stream::BoxStream;
use librarian_client::ApiError;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time;

use super::app::App;
use super::state::HealthTicket;

/// Base tick interval for the event loop; spinner timing is handled in InteractionState
const BASE_TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Application events that drive the TUI state machine.
///
/// Terminal input and ticks come from the event loop itself; the completion
/// variants are sent by the `Dispatcher` tasks.
#[derive(Debug)]
pub enum AppEvent {
    /// Keyboard input event (filtered to Press events only)
    Key(KeyEvent),

    /// Periodic tick for spinner animation
    Tick,

    /// Terminal resize event (width, height)
    Resize(u16, u16),

    /// The pending query resolved
    QueryCompleted(Result<String, ApiError>),

    /// A health probe resolved
    HealthCompleted {
        ticket: HealthTicket,
        result: Result<bool, ApiError>,
    },
}

/// Async event loop with prioritized event handling.
///
/// # Priority Model (Biased Select)
/// 1. **Backend completions** - applied as soon as they arrive
/// 2. **Keyboard input** - user responsiveness
/// 3. **Tick events** - spinner animation
///
/// # Graceful Shutdown
/// - SIGINT sets the shutdown flag and breaks the loop
/// - EventStream close (stdin EOF) triggers shutdown
pub struct EventLoop {
    /// Completions from in-flight requests
    completions: UnboundedReceiver<AppEvent>,

    /// Terminal event reader (created lazily on first run)
    reader: Option<BoxStream<'static, io::Result<Event>>>,

    /// Tick interval timer (created lazily on first run)
    tick_timer: Option<time::Interval>,

    /// Shutdown flag - when true, event loop will terminate
    shutdown: bool,
}

impl EventLoop {
    pub fn new(completions: UnboundedReceiver<AppEvent>) -> Self {
        Self {
            completions,
            reader: None,
            tick_timer: None,
            shutdown: false,
        }
    }

    /// Event loop reading terminal events from `input` instead of the TTY
    #[cfg(test)]
    pub fn with_input(
        completions: UnboundedReceiver<AppEvent>,
        input: BoxStream<'static, io::Result<Event>>,
    ) -> Self {
        Self {
            reader: Some(input),
            ..Self::new(completions)
        }
    }

    /// Wait for the next application event.
    ///
    /// # Errors
    /// Returns an error if the terminal event stream fails. A closed stream
    /// is treated as a shutdown signal instead.
    pub async fn run(&mut self) -> Result<AppEvent> {
        let reader = self
            .reader
            .get_or_insert_with(|| EventStream::new().boxed());

        // Reused across calls to keep a steady cadence
        let tick_timer = self.tick_timer.get_or_insert_with(|| {
            let mut interval = time::interval(BASE_TICK_INTERVAL);
            // Skip the first immediate tick
            interval.reset();
            interval
        });

        loop {
            if self.shutdown {
                break;
            }

            let event = tokio::select! {
                biased;

                Some(completion) = self.completions.recv() => Some(completion),

                maybe_event = reader.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) => {
                            // Filter to Press events only for cross-platform safety
                            if key.kind == KeyEventKind::Press {
                                Some(AppEvent::Key(key))
                            } else {
                                None
                            }
                        }
                        Some(Ok(Event::Resize(w, h))) => Some(AppEvent::Resize(w, h)),
                        Some(Err(e)) => {
                            return Err(eyre!("terminal event error: {}", e));
                        }
                        None => {
                            // EventStream closed (stdin EOF)
                            self.shutdown = true;
                            None
                        }
                        // Mouse, focus, paste
                        _ => None,
                    }
                }

                _ = tick_timer.tick() => Some(AppEvent::Tick),

                _ = tokio::signal::ctrl_c() => {
                    self.shutdown = true;
                    Some(AppEvent::Tick)
                }
            };

            if let Some(app_event) = event {
                return Ok(app_event);
            }
        }

        // Loop exited due to shutdown - return final tick to allow cleanup
        Ok(AppEvent::Tick)
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown
    }

    /// Wait for the next event and apply it to the app.
    /// Returns true if the app should keep running.
    pub async fn poll_and_apply(&mut self, app: &mut App) -> Result<bool> {
        let event = self.run().await?;
        app.handle_event(event);

        Ok(!app.state.should_exit && !self.is_shutdown())
    }
}
