use super::dispatch::Dispatcher;
use super::event::AppEvent;
use super::state::{HealthTicket, InteractionState};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::{Input, Key};

/// Rows moved per PageUp/PageDown in the response
const SCROLL_STEP: u16 = 5;

/// Couples the interaction state with the dispatcher that talks to the backend.
/// Key handling and completions both funnel through here.
pub struct App {
    pub state: InteractionState,
    dispatcher: Dispatcher,
}

impl App {
    pub fn new(state: InteractionState, dispatcher: Dispatcher) -> Self {
        Self { state, dispatcher }
    }

    /// Submit the current query. Returns false if nothing was sent.
    pub fn submit(&mut self) -> bool {
        self.dispatcher.submit(&mut self.state)
    }

    pub fn check_health(&mut self) -> HealthTicket {
        self.dispatcher.check_health(&mut self.state)
    }

    /// Fill the input with a preset question; never sends anything
    pub fn select_preset(&mut self, index: usize) -> bool {
        self.state.select_preset(index)
    }

    /// Apply one event from the loop. Returns true if render is needed.
    pub fn handle_event(&mut self, event: AppEvent) -> bool {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Tick => {
                self.state.tick();
                self.state.in_flight()
            }
            AppEvent::Resize(..) => true,
            AppEvent::QueryCompleted(result) => {
                self.state.complete_query(result);
                true
            }
            AppEvent::HealthCompleted { ticket, result } => {
                self.state.complete_health(ticket, result)
            }
        }
    }

    /// Handle a key event. Returns true if render is needed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => {
                self.state.exit();
                return true;
            }
            // Raw mode delivers Ctrl+C as a key rather than a signal
            KeyCode::Char('c') if ctrl => {
                self.state.exit();
                return true;
            }
            KeyCode::Char('r') if ctrl => {
                self.check_health();
                return true;
            }
            KeyCode::Enter if alt => {
                self.state.textarea.insert_newline();
                return true;
            }
            KeyCode::Enter => {
                self.submit();
                return true;
            }
            KeyCode::Up if alt => {
                self.state.increment_k();
                return true;
            }
            KeyCode::Down if alt => {
                self.state.decrement_k();
                return true;
            }
            KeyCode::PageUp => {
                self.state.scroll_answer_up(SCROLL_STEP);
                return true;
            }
            KeyCode::PageDown => {
                self.state.scroll_answer_down(SCROLL_STEP);
                return true;
            }
            KeyCode::Char(c @ '1'..='9') if alt => {
                let index = c as usize - '1' as usize;
                return self.select_preset(index);
            }
            _ => {}
        }

        // Delegate all other keys to textarea
        // Manually convert crossterm KeyEvent to tui-textarea Input
        let tui_key = match key.code {
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Left => Key::Left,
            KeyCode::Right => Key::Right,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::Tab => Key::Tab,
            _ => Key::Null,
        };

        if tui_key == Key::Null {
            return false;
        }

        let input = Input {
            key: tui_key,
            ctrl,
            alt,
            shift: key.modifiers.contains(KeyModifiers::SHIFT),
        };
        self.state.textarea.input(input);
        true
    }
}
