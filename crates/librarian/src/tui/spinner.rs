//! Spinner shown while a query is in flight

use std::time::Duration;

/// Braille dots, one frame per tick
pub const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// How long each frame stays on screen
pub const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// Frame at the given index (wraps around)
pub fn frame_at(index: usize) -> &'static str {
    FRAMES[index % FRAMES.len()]
}
