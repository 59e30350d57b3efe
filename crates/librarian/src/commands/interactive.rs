use std::io;
use std::sync::Arc;
use std::time::Duration;

use eyre::Result;
use librarian_client::{ApiClient, Settings};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::tui::render::{calculate_needed_height, render};
use crate::tui::{
    App, Dispatcher, EventLoop, InteractionState, RenderContext, TerminalGuard, Theme,
    install_panic_hook,
};

/// Pause before redrawing after a failed cursor position read
const REDRAW_BACKOFF: Duration = Duration::from_millis(20);

pub async fn run(
    settings: &Settings,
    question: Option<String>,
    keep_output: bool,
    check_health: bool,
) -> Result<()> {
    // Restore the terminal even if we panic
    install_panic_hook();

    let client = ApiClient::new(&settings.api_base)?;
    info!(api_base = %settings.api_base, "starting interactive UI");

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(Arc::new(client), events_tx);

    let mut state = InteractionState::new(settings.default_k());
    if let Some(question) = question {
        state.set_query(&question);
    }

    let mut app = App::new(state, dispatcher);
    if check_health {
        app.check_health();
    }

    let mut guard = TerminalGuard::new(keep_output)?;
    let mut event_loop = EventLoop::new(events_rx);
    let theme = Theme::default();

    loop {
        // Content taller than the viewport scrolls; keep paging within range
        let needed = calculate_needed_height(&app.state, &theme);
        app.state.clamp_answer_scroll(guard.hidden_rows(needed));

        let ctx = RenderContext {
            theme: &theme,
            anchor_col: guard.anchor_col(),
            textarea: &app.state.textarea,
        };

        if let Err(e) = guard.terminal().draw(|frame| render(frame, &app.state, &ctx)) {
            recover_from_draw_error(e).await?;
            continue;
        }

        if !event_loop.poll_and_apply(&mut app).await? {
            break;
        }
    }

    debug!("interactive UI closed");
    Ok(())
}

/// Cursor position reads can fail mid-resize. Those wait out a short pause so
/// the caller can redraw; any other error is returned.
async fn recover_from_draw_error(error: io::Error) -> Result<()> {
    let message = error.to_string();
    if !message.contains("cursor position") {
        return Err(error.into());
    }

    debug!("skipping frame: {message}");
    tokio::time::sleep(REDRAW_BACKOFF).await;
    Ok(())
}
