use crossterm::{
    cursor,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use eyre::{Context, Result, bail};
use ratatui::{Terminal, TerminalOptions, Viewport, backend::CrosstermBackend};
use std::io::{IsTerminal, Stdout, stdout};

/// Install a panic hook that restores the terminal before the panic message
/// is printed. Call it once from the UI thread, before creating a `TerminalGuard`.
///
/// Only panics on that thread touch the terminal. Panics on runtime workers
/// (backend calls, which are turned into failed requests) are logged instead,
/// so the UI keeps drawing in raw mode.
pub fn install_panic_hook() {
    let ui_thread = std::thread::current().id();
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if std::thread::current().id() != ui_thread {
            // Printing would scribble over the inline viewport
            tracing::error!("panic on worker thread: {panic_info}");
            return;
        }

        // Already panicking; nothing useful to do with an error here
        let _ = disable_raw_mode();
        original_hook(panic_info);
    }));
}

/// Minimum viewport height
const MIN_VIEWPORT_HEIGHT: u16 = 12;

/// Margin to leave below viewport for shell prompt
const VIEWPORT_BOTTOM_MARGIN: u16 = 2;

/// Guards terminal lifecycle.
///
/// Construction captures the cursor column, enables raw mode and creates an
/// inline viewport below the prompt. Dropping it clears the viewport (unless
/// `keep_output` was requested) and disables raw mode.
pub struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    anchor_col: u16,
    keep_output: bool,
    viewport_height: u16,
}

impl TerminalGuard {
    /// # Errors
    /// Fails when stdout is not a terminal or the terminal cannot be initialised.
    pub fn new(keep_output: bool) -> Result<Self> {
        if !stdout().is_terminal() {
            bail!(
                "the interactive UI requires a terminal (TTY) but stdout is not one; \
                 use `librarian ask` when piping output"
            );
        }

        let (_, term_height) = crossterm::terminal::size().unwrap_or((80, 24));
        let viewport_height = term_height
            .saturating_sub(VIEWPORT_BOTTOM_MARGIN)
            .max(MIN_VIEWPORT_HEIGHT);

        // Capture cursor position before raw mode; some terminals report it differently after
        let anchor_col = cursor::position().map(|(x, _)| x).unwrap_or(0);

        enable_raw_mode().context("failed to enable raw mode")?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::with_options(
            backend,
            TerminalOptions {
                viewport: Viewport::Inline(viewport_height),
            },
        )
        .context("failed to create terminal with inline viewport")?;

        Ok(Self {
            terminal,
            anchor_col,
            keep_output,
            viewport_height,
        })
    }

    pub fn terminal(&mut self) -> &mut Terminal<CrosstermBackend<Stdout>> {
        &mut self.terminal
    }

    /// Column the cursor was at when the guard was created
    pub fn anchor_col(&self) -> u16 {
        self.anchor_col
    }

    /// Rows of content that do not fit in the viewport
    pub fn hidden_rows(&self, needed: u16) -> u16 {
        hidden_rows(needed, self.viewport_height)
    }
}

/// The inline viewport has a fixed height, so taller content is scrolled
/// instead of growing it.
fn hidden_rows(needed: u16, viewport_height: u16) -> u16 {
    needed.saturating_sub(viewport_height)
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best-effort cleanup
        if !self.keep_output {
            let _ = self.terminal.clear();
        }

        let _ = disable_raw_mode();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hidden_rows() {
        assert_eq!(hidden_rows(10, 22), 0);
        assert_eq!(hidden_rows(22, 22), 0);
        assert_eq!(hidden_rows(97, 30), 67);
    }

    #[test]
    fn test_panic_hook_installation() {
        install_panic_hook();
        // Installing again replaces the previous hook
        install_panic_hook();
    }
}
