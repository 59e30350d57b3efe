use ratatui::style::{Color, Modifier, Style};

/// What a piece of text means, independent of how it is coloured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meaning {
    Base,
    Guidance,
    Important,
    Annotation,
    Muted,
    AlertWarn,
    AlertError,
}

/// Maps meanings onto terminal styles
#[derive(Debug, Clone)]
pub struct Theme {
    base: Style,
    guidance: Style,
    important: Style,
    annotation: Style,
    muted: Style,
    alert_warn: Style,
    alert_error: Style,
}

impl Theme {
    pub fn as_style(&self, meaning: Meaning) -> Style {
        match meaning {
            Meaning::Base => self.base,
            Meaning::Guidance => self.guidance,
            Meaning::Important => self.important,
            Meaning::Annotation => self.annotation,
            Meaning::Muted => self.muted,
            Meaning::AlertWarn => self.alert_warn,
            Meaning::AlertError => self.alert_error,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            base: Style::default(),
            guidance: Style::default().fg(Color::Blue),
            important: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            annotation: Style::default().fg(Color::DarkGray),
            muted: Style::default().fg(Color::DarkGray),
            alert_warn: Style::default().fg(Color::Yellow),
            alert_error: Style::default().fg(Color::Red),
        }
    }
}
