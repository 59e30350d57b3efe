//! Interaction state for the terminal UI
//!
//! `InteractionState` is the single source of truth for what the UI shows:
//! the query being edited, the result count, the outcome of the last query,
//! whether a query is in flight, and the backend's health. Every render is
//! derived from it via `Blocks::from_state()`, and every change goes through
//! one of the transition methods below.

use std::time::Instant;

use librarian_client::settings::{MAX_K, MIN_K, clamp_k};
use librarian_client::{ApiError, ChatRequest};
use tracing::{debug, trace};
use tui_textarea::{CursorMove, TextArea};

use super::spinner;

/// Example questions offered below the input
pub const PRESET_QUESTIONS: [&str; 4] = [
    "Vreau o carte despre libertate și control social.",
    "Ce-mi recomanzi dacă iubesc poveștile fantastice?",
    "Vreau o carte despre prietenie și magie.",
    "Ce este 1984?",
];

const INPUT_PLACEHOLDER: &str = "Ex: Vreau o carte despre prietenie și magie";

/// Coarse liveness of the backend, independent of the query path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// No probe has been issued yet
    Unknown,
    /// A probe is in flight
    Checking,
    /// Backend reported `ok: true`
    Ok,
    /// Backend answered but reported `ok: false`
    Degraded,
    /// The probe failed
    Error,
}

impl HealthStatus {
    /// Map a finished probe onto a final status
    pub fn from_probe(result: &Result<bool, ApiError>) -> Self {
        match result {
            Ok(true) => Self::Ok,
            Ok(false) => Self::Degraded,
            Err(_) => Self::Error,
        }
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Checking => "Verific...",
            Self::Ok => "OK",
            Self::Degraded => "Probleme",
            Self::Error => "Eroare",
        }
    }
}

/// Outcome of the most recent query. Answer and error are exclusive by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AnswerResult {
    #[default]
    Empty,
    Answer(String),
    Failed(String),
}

impl AnswerResult {
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Answer(answer) => Some(answer),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl From<Result<String, ApiError>> for AnswerResult {
    fn from(result: Result<String, ApiError>) -> Self {
        match result {
            Ok(answer) => Self::Answer(answer),
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}

/// Mutually exclusive presentation states, derived from the query fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

/// Identifies one health probe. Only the most recently issued ticket may
/// update the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HealthTicket(u64);

pub struct InteractionState {
    /// Query input (tui-textarea handles cursor and editing)
    pub textarea: TextArea<'static>,
    /// Whether the app should exit
    pub should_exit: bool,
    /// Spinner animation state
    pub spinner_frame: usize,
    /// When the spinner frame last advanced
    pub last_spinner_tick: Instant,
    k: u8,
    result: AnswerResult,
    /// Rows the response is scrolled back from its end
    answer_scroll: u16,
    in_flight: bool,
    health: HealthStatus,
    health_seq: u64,
}

/// Create a TextArea with our preferred configuration
fn create_textarea<'a>(lines: impl IntoIterator<Item = &'a str>) -> TextArea<'static> {
    let mut textarea = TextArea::new(lines.into_iter().map(str::to_string).collect());
    textarea.set_cursor_line_style(ratatui::style::Style::default());
    textarea.set_wrap_mode(tui_textarea::WrapMode::Word);
    textarea.set_placeholder_text(INPUT_PLACEHOLDER);
    textarea.move_cursor(CursorMove::Bottom);
    textarea.move_cursor(CursorMove::End);
    textarea
}

impl InteractionState {
    pub fn new(k: u8) -> Self {
        let mut state = Self {
            textarea: create_textarea(std::iter::empty()),
            should_exit: false,
            spinner_frame: 0,
            last_spinner_tick: Instant::now(),
            k: MIN_K,
            result: AnswerResult::Empty,
            answer_scroll: 0,
            in_flight: false,
            health: HealthStatus::Unknown,
            health_seq: 0,
        };
        state.set_k(i64::from(k));
        state
    }

    // ===== Accessors =====

    /// Current query text, exactly as typed
    pub fn query(&self) -> String {
        self.textarea.lines().join("\n")
    }

    /// True when the query is empty or whitespace only
    pub fn query_is_blank(&self) -> bool {
        self.textarea.lines().iter().all(|line| line.trim().is_empty())
    }

    pub fn k(&self) -> u8 {
        self.k
    }

    pub fn result(&self) -> &AnswerResult {
        &self.result
    }

    pub fn answer_scroll(&self) -> u16 {
        self.answer_scroll
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn health(&self) -> HealthStatus {
        self.health
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight {
            return Phase::Loading;
        }

        match self.result {
            AnswerResult::Empty => Phase::Idle,
            AnswerResult::Answer(_) => Phase::Success,
            AnswerResult::Failed(_) => Phase::Error,
        }
    }

    /// Whether the submit control is enabled
    pub fn can_submit(&self) -> bool {
        !self.in_flight && !self.query_is_blank()
    }

    // ===== Input transitions =====

    /// Replace the query text
    pub fn set_query(&mut self, query: &str) {
        self.textarea = create_textarea(query.lines());
    }

    /// Set the result count, clamped into the accepted range
    pub fn set_k(&mut self, k: i64) {
        self.k = clamp_k(k);
    }

    pub fn increment_k(&mut self) {
        self.k = self.k.saturating_add(1).min(MAX_K);
    }

    pub fn decrement_k(&mut self) {
        self.k = self.k.saturating_sub(1).max(MIN_K);
    }

    /// Overwrite the query with a preset question. Returns false for an unknown index.
    pub fn select_preset(&mut self, index: usize) -> bool {
        match PRESET_QUESTIONS.get(index) {
            Some(question) => {
                self.set_query(question);
                true
            }
            None => false,
        }
    }

    // ===== Query lifecycle =====

    /// Start a query if the submit control is enabled.
    ///
    /// Clears the previous outcome and marks the query in flight, returning
    /// the request to send. Returns `None` without touching anything when the
    /// query is blank or another query is pending.
    pub fn begin_submit(&mut self) -> Option<ChatRequest> {
        if !self.can_submit() {
            trace!(in_flight = self.in_flight, "submit ignored");
            return None;
        }

        self.result = AnswerResult::Empty;
        self.answer_scroll = 0;
        self.in_flight = true;

        Some(ChatRequest::new(self.query().trim(), self.k))
    }

    /// Record the outcome of the pending query and return to idle
    pub fn complete_query(&mut self, result: Result<String, ApiError>) {
        self.in_flight = false;
        self.answer_scroll = 0;

        if let Err(ref err) = result {
            debug!(error = %err, "query failed");
        }
        self.result = result.into();
    }

    // ===== Response scrolling =====

    /// Scroll back towards the start of a response taller than the viewport
    pub fn scroll_answer_up(&mut self, rows: u16) {
        self.answer_scroll = self.answer_scroll.saturating_add(rows);
    }

    /// Scroll forward towards the end of the response
    pub fn scroll_answer_down(&mut self, rows: u16) {
        self.answer_scroll = self.answer_scroll.saturating_sub(rows);
    }

    /// Keep the scroll within the rows that are actually hidden
    pub fn clamp_answer_scroll(&mut self, hidden_rows: u16) {
        self.answer_scroll = self.answer_scroll.min(hidden_rows);
    }

    // ===== Health lifecycle =====

    /// Mark a new probe as in flight and hand out its ticket
    pub fn begin_health_check(&mut self) -> HealthTicket {
        self.health_seq += 1;
        self.health = HealthStatus::Checking;
        HealthTicket(self.health_seq)
    }

    /// Apply a finished probe. Completions from probes superseded by a newer
    /// one are dropped; returns whether the result was applied.
    pub fn complete_health(
        &mut self,
        ticket: HealthTicket,
        result: Result<bool, ApiError>,
    ) -> bool {
        if ticket.0 != self.health_seq {
            debug!(
                ticket = ticket.0,
                latest = self.health_seq,
                "discarding stale health result"
            );
            return false;
        }

        if let Err(ref err) = result {
            debug!(error = %err, "health check failed");
        }
        self.health = HealthStatus::from_probe(&result);
        true
    }

    // ===== Utility methods =====

    pub fn exit(&mut self) {
        self.should_exit = true;
    }

    /// Advance the spinner if its interval has elapsed. Called on every event loop tick.
    pub fn tick(&mut self) {
        if self.last_spinner_tick.elapsed() >= spinner::TICK_INTERVAL {
            self.spinner_frame = (self.spinner_frame + 1) % spinner::FRAMES.len();
            self.last_spinner_tick = Instant::now();
        }
    }
}

impl Default for InteractionState {
    fn default() -> Self {
        Self::new(librarian_client::settings::DEFAULT_K)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn http_error(status: u16, body: &str) -> ApiError {
        ApiError::HttpStatus {
            status,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_initial_state() {
        let state = InteractionState::default();

        assert_eq!(state.k(), 3);
        assert_eq!(state.result(), &AnswerResult::Empty);
        assert!(!state.in_flight());
        assert_eq!(state.health(), HealthStatus::Unknown);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(!state.can_submit());
    }

    #[test]
    fn test_blank_query_never_submits() {
        let mut state = InteractionState::default();
        assert!(state.begin_submit().is_none());

        state.set_query("   \n\t  ");
        assert!(state.query_is_blank());
        assert!(state.begin_submit().is_none());
        assert!(!state.in_flight());
    }

    #[test]
    fn test_begin_submit_builds_trimmed_request() {
        let mut state = InteractionState::new(5);
        state.set_query("  Ce este 1984?  ");

        let request = state.begin_submit().expect("request");

        assert_eq!(request, ChatRequest::new("Ce este 1984?", 5));
        assert!(!request.rebuild);
        assert!(state.in_flight());
        assert_eq!(state.phase(), Phase::Loading);
    }

    #[test]
    fn test_submit_while_in_flight_is_noop() {
        let mut state = InteractionState::default();
        state.set_query("Ce este 1984?");

        assert!(state.begin_submit().is_some());
        assert!(!state.can_submit());
        assert!(state.begin_submit().is_none());
        assert!(state.in_flight());
    }

    #[test]
    fn test_submit_clears_previous_outcome() {
        let mut state = InteractionState::default();
        state.set_query("q");
        state.begin_submit();
        state.complete_query(Err(http_error(500, "internal error")));
        assert_eq!(state.phase(), Phase::Error);

        state.begin_submit();
        assert_eq!(state.result(), &AnswerResult::Empty);
    }

    #[test]
    fn test_success_sets_answer_only() {
        let mut state = InteractionState::default();
        state.set_query("Vreau o carte despre prietenie și magie.");
        state.begin_submit();

        state.complete_query(Ok("Recomand ... ".to_string()));

        assert!(!state.in_flight());
        assert_eq!(state.result().answer(), Some("Recomand ... "));
        assert_eq!(state.result().error(), None);
        assert_eq!(state.phase(), Phase::Success);
    }

    #[test]
    fn test_failure_sets_error_only() {
        let mut state = InteractionState::default();
        state.set_query("q");
        state.begin_submit();

        state.complete_query(Err(http_error(500, "internal error")));

        assert!(!state.in_flight());
        assert_eq!(state.result().answer(), None);
        let message = state.result().error().expect("error message");
        assert!(message.contains("500"));
        assert!(message.contains("internal error"));
    }

    #[test]
    fn test_error_state_allows_new_submission() {
        let mut state = InteractionState::default();
        state.set_query("q");
        state.begin_submit();
        state.complete_query(Err(http_error(502, "bad gateway")));

        assert!(state.can_submit());
        assert!(state.begin_submit().is_some());
    }

    #[test]
    fn test_k_is_clamped() {
        let mut state = InteractionState::default();

        state.set_k(0);
        assert_eq!(state.k(), 1);
        state.decrement_k();
        assert_eq!(state.k(), 1);

        state.set_k(100);
        assert_eq!(state.k(), 8);
        state.increment_k();
        assert_eq!(state.k(), 8);

        state.set_k(4);
        state.increment_k();
        assert_eq!(state.k(), 5);

        assert_eq!(InteractionState::new(0).k(), 1);
    }

    #[test]
    fn test_preset_sets_exact_query() {
        let mut state = InteractionState::default();
        state.set_query("something else");

        assert!(state.select_preset(2));
        assert_eq!(state.query(), "Vreau o carte despre prietenie și magie.");
        assert!(!state.in_flight());
        assert_eq!(state.result(), &AnswerResult::Empty);

        assert!(!state.select_preset(PRESET_QUESTIONS.len()));
        assert_eq!(state.query(), "Vreau o carte despre prietenie și magie.");
    }

    #[test]
    fn test_multiline_query_round_trips() {
        let mut state = InteractionState::default();
        state.set_query("first line\nsecond line");
        assert_eq!(state.query(), "first line\nsecond line");
    }

    #[test]
    fn test_health_goes_checking_synchronously() {
        let mut state = InteractionState::default();
        let _ticket = state.begin_health_check();
        assert_eq!(state.health(), HealthStatus::Checking);
    }

    #[test]
    fn test_health_outcomes() {
        let cases = [
            (Ok(true), HealthStatus::Ok),
            (Ok(false), HealthStatus::Degraded),
            (Err(http_error(503, "")), HealthStatus::Error),
        ];

        for (result, expected) in cases {
            let mut state = InteractionState::default();
            let ticket = state.begin_health_check();
            assert!(state.complete_health(ticket, result));
            assert_eq!(state.health(), expected);
        }
    }

    #[test]
    fn test_stale_health_result_is_discarded() {
        let mut state = InteractionState::default();
        let first = state.begin_health_check();
        let second = state.begin_health_check();

        assert!(state.complete_health(second, Ok(true)));
        assert!(!state.complete_health(first, Err(http_error(500, ""))));
        assert_eq!(state.health(), HealthStatus::Ok);
    }

    #[test]
    fn test_health_does_not_touch_query() {
        let mut state = InteractionState::default();
        state.set_query("q");
        state.begin_submit();

        let ticket = state.begin_health_check();
        state.complete_health(ticket, Ok(true));

        assert!(state.in_flight());
        assert_eq!(state.result(), &AnswerResult::Empty);
    }

    #[test]
    fn test_health_display_text() {
        assert_eq!(HealthStatus::Ok.display_text(), "OK");
        assert_eq!(HealthStatus::Error.display_text(), "Eroare");
        assert_eq!(HealthStatus::Degraded.display_text(), "Probleme");
    }

    #[test]
    fn test_answer_scroll_is_clamped_and_reset() {
        let mut state = InteractionState::default();
        state.set_query("q");
        state.begin_submit();
        state.complete_query(Ok("long answer".to_string()));

        state.scroll_answer_up(5);
        state.scroll_answer_up(5);
        assert_eq!(state.answer_scroll(), 10);

        state.clamp_answer_scroll(7);
        assert_eq!(state.answer_scroll(), 7);

        state.scroll_answer_down(100);
        assert_eq!(state.answer_scroll(), 0);

        state.scroll_answer_up(3);
        state.begin_submit();
        assert_eq!(state.answer_scroll(), 0);
    }
}
