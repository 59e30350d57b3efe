//! View model types for the TUI application
//!
//! These types describe what the card shows. They are derived from
//! `InteractionState` via `Blocks::from_state()` and never mutated elsewhere.

use super::state::{InteractionState, PRESET_QUESTIONS, Phase};

pub const CARD_TITLE: &str = "📚 Smart Librarian";

/// Shown in the response block before the first query
pub const EMPTY_RESPONSE: &str = "—";

/// Shown next to the spinner while a query is in flight
pub const LOADING_TEXT: &str = "Caut...";

/// Content variants for blocks - each variant is fully self-describing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// The query input; rendered by the textarea widget
    Input { text: String },
    /// Current result count
    TopK { k: u8 },
    /// Numbered example questions
    Presets { questions: Vec<&'static str> },
    Spinner {
        frame: usize,
        status_text: &'static str,
    },
    Answer { markdown: String },
    Error { message: String },
    Placeholder(&'static str),
}

impl Content {
    /// Get the prefix symbol for this content type
    pub fn prefix_symbol(&self) -> &'static str {
        match self {
            Content::Input { .. } => ">",
            Content::Error { .. } => "!",
            Content::Spinner { .. } => "/",
            Content::TopK { .. }
            | Content::Presets { .. }
            | Content::Answer { .. }
            | Content::Placeholder(_) => " ",
        }
    }
}

/// A visual block in the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub content: Vec<Content>,
    pub separator_above: bool,
}

/// Everything one frame shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blocks {
    pub title: &'static str,
    /// Right-aligned status in the card's top border
    pub health: String,
    pub items: Vec<Block>,
    pub footer: &'static str,
}

impl Blocks {
    /// Pure function: derive the complete view model from state
    pub fn from_state(state: &InteractionState) -> Self {
        let mut items = vec![
            Block {
                content: vec![
                    Content::Input {
                        text: state.query(),
                    },
                    Content::TopK { k: state.k() },
                ],
                separator_above: false,
            },
            Block {
                content: vec![Content::Presets {
                    questions: PRESET_QUESTIONS.to_vec(),
                }],
                separator_above: false,
            },
        ];

        let response = if state.phase() == Phase::Loading {
            Content::Spinner {
                frame: state.spinner_frame,
                status_text: LOADING_TEXT,
            }
        } else if let Some(answer) = state.result().answer() {
            Content::Answer {
                markdown: answer.to_string(),
            }
        } else if let Some(message) = state.result().error() {
            Content::Error {
                message: message.to_string(),
            }
        } else {
            Content::Placeholder(EMPTY_RESPONSE)
        };
        items.push(Block {
            content: vec![response],
            separator_above: false,
        });

        // First has no separator
        for (idx, block) in items.iter_mut().enumerate() {
            block.separator_above = idx > 0;
        }

        Self {
            title: CARD_TITLE,
            health: format!("Health: {}", state.health().display_text()),
            items,
            footer: Self::footer_for_state(state),
        }
    }

    fn footer_for_state(state: &InteractionState) -> &'static str {
        if state.in_flight() {
            "[Ctrl+R]: Health  [Esc]: Quit"
        } else if state.can_submit() {
            "[Enter]: Trimite  [Alt+↑/↓]: k  [Alt+1-4]: Preset  [Ctrl+R]: Health  [Esc]: Quit"
        } else {
            "[Alt+↑/↓]: k  [Alt+1-4]: Preset  [Ctrl+R]: Health  [Esc]: Quit"
        }
    }
}
