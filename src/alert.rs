//! Modal alert state for the Mayday TUI.
//!
//! An [`Alert`] is the popup shown over the form after a submission (or any
//! other notable outcome). At most one alert exists at a time: `App` keeps
//! an `Option<Alert>` and showing a new one replaces it. Severity can be
//! passed explicitly by callers that know the outcome; for unattributed
//! messages it is inferred from the copy itself by substring markers.

use ratatui::style::Color;

/// Ticks before the OK control takes focus and accepts input. One tick at
/// the 150 ms tick rate gives the modal a brief settle time.
pub const FOCUS_DELAY_TICKS: u8 = 1;

/// Ticks the dismissed modal stays on screen, dimmed, before removal.
pub const FADE_TICKS: u8 = 2;

/// Substrings that mark a message as reporting success.
const SUCCESS_MARKERS: [&str; 2] = ["successfully", "Thank you"];

/// Substrings that mark a message as reporting a failure.
const ERROR_MARKERS: [&str; 4] = ["error", "Error", "could not", "Could not"];

/// Visual classification of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    /// Infers a severity from message content.
    ///
    /// Success markers are checked before error markers; anything unmatched
    /// stays informational. This is a heuristic, not a guarantee.
    pub fn infer(message: &str) -> Self {
        if SUCCESS_MARKERS.iter().any(|m| message.contains(m)) {
            Severity::Success
        } else if ERROR_MARKERS.iter().any(|m| message.contains(m)) {
            Severity::Error
        } else {
            Severity::Info
        }
    }

    /// Fixed glyph shown in the modal header.
    pub fn glyph(self) -> &'static str {
        match self {
            Severity::Success => "✓",
            Severity::Error => "✕",
            Severity::Info => "ℹ",
        }
    }

    /// Fixed header title.
    pub fn title(self) -> &'static str {
        match self {
            Severity::Success => "Success",
            Severity::Error => "Error",
            Severity::Info => "Notice",
        }
    }

    /// Accent color used for the header glyph and the modal border.
    pub fn color(self) -> Color {
        match self {
            Severity::Success => Color::Green,
            Severity::Error => Color::Red,
            Severity::Info => Color::Cyan,
        }
    }
}

/// One modal alert, from display through fade-out.
#[derive(Debug, Clone)]
pub struct Alert {
    pub severity: Severity,
    pub message: String,
    /// Counts down to the OK control taking focus.
    focus_delay: u8,
    /// `Some(n)` once dismissed; counts down to removal.
    fade: Option<u8>,
}

impl Alert {
    /// Builds an alert, inferring severity when the caller has none.
    pub fn new(severity: Option<Severity>, message: impl Into<String>) -> Self {
        let message = message.into();
        let severity = severity.unwrap_or_else(|| Severity::infer(&message));
        Self {
            severity,
            message,
            focus_delay: FOCUS_DELAY_TICKS,
            fade: None,
        }
    }

    /// Whether the OK control has taken focus yet. Dismissal keys are inert
    /// until it has.
    pub fn ok_focused(&self) -> bool {
        self.focus_delay == 0
    }

    /// Whether the alert is fading out (input is ignored during the fade).
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Begins the fade-out. Both the OK control and the outside-click
    /// equivalent (Esc) land here, so there is exactly one dismissal path.
    pub fn dismiss(&mut self) {
        if self.fade.is_none() {
            self.fade = Some(FADE_TICKS);
        }
    }

    /// Advances timers by one tick. Returns `true` once the alert should be
    /// removed from the screen, `FADE_TICKS` ticks after dismissal.
    pub fn on_tick(&mut self) -> bool {
        if self.focus_delay > 0 {
            self.focus_delay -= 1;
        }
        match self.fade {
            Some(n) if n <= 1 => true,
            Some(n) => {
                self.fade = Some(n - 1);
                false
            }
            None => false,
        }
    }
}
