use crate::alert::Alert;
use crate::events::{ControlState, Event, StatusLine};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Label on the submit control when it is idle.
pub const SUBMIT_LABEL: &str = "Send report";

// Focus order mirrors the form layout, top to bottom.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Focus {
    Phone,
    Message,
    Submit,
}

impl Default for Focus {
    fn default() -> Self {
        Focus::Phone
    }
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Phone => Focus::Message,
            Focus::Message => Focus::Submit,
            Focus::Submit => Focus::Phone,
        }
    }

    fn prev(self) -> Self {
        match self {
            Focus::Phone => Focus::Submit,
            Focus::Message => Focus::Phone,
            Focus::Submit => Focus::Message,
        }
    }
}

/// Work the main loop must start on the caller's behalf. Key handling
/// stays synchronous; anything async is handed back as an `Action`.
#[derive(Debug, PartialEq)]
pub enum Action {
    Submit { phone: String, message: String },
}

pub struct App {
    // Form fields
    pub phone: String,
    pub message: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    // Acquisition status line under the address field
    pub status: Option<StatusLine>,

    // Modal alert; at most one, newest wins
    pub alert: Option<Alert>,

    // Submission control
    pub focus: Focus,
    pub submitting: bool,
    pub submit_enabled: bool,
    pub submit_label: String,

    // Footer telemetry
    pub api_online: Option<bool>,
    pub tick_count: usize,
    pub should_quit: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            phone: String::new(),
            message: String::new(),
            address: String::new(),
            latitude: None,
            longitude: None,
            status: None,
            alert: None,
            focus: Focus::Phone,
            submitting: false,
            submit_enabled: true,
            submit_label: SUBMIT_LABEL.to_string(),
            api_online: None,
            tick_count: 0,
            should_quit: false,
        }
    }

    pub fn on_tick(&mut self) {
        self.tick_count += 1;

        if let Some(alert) = self.alert.as_mut() {
            if alert.on_tick() {
                self.alert = None;
            }
        }
    }

    /// Applies a view mutation posted by a background task.
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::Status(status) => self.status = status,
            Event::Coordinates(Some((lat, lng))) => {
                self.latitude = Some(lat);
                self.longitude = Some(lng);
            }
            Event::Coordinates(None) => {
                self.latitude = None;
                self.longitude = None;
            }
            Event::Address(address) => self.address = address,
            Event::Control(ControlState::Busy(label)) => {
                self.submitting = true;
                self.submit_enabled = false;
                self.submit_label = label;
            }
            Event::Control(ControlState::Ready) => {
                self.submitting = false;
                self.submit_enabled = true;
                self.submit_label = SUBMIT_LABEL.to_string();
            }
            Event::Alert(severity, message) => {
                self.alert = Some(Alert::new(severity, message));
            }
            Event::ResetForm => {
                self.phone.clear();
                self.message.clear();
                self.address.clear();
                self.latitude = None;
                self.longitude = None;
            }
            Event::Health(online) => self.api_online = Some(online),
            Event::Tick | Event::Input(_) => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        // A visible alert captures all input. Dismissal keys only work
        // once the OK control has taken focus and the fade hasn't begun.
        if let Some(alert) = self.alert.as_mut() {
            if alert.ok_focused() && !alert.is_fading() {
                if let KeyCode::Enter | KeyCode::Esc = key.code {
                    alert.dismiss();
                }
            }
            return None;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::BackTab | KeyCode::Up => self.focus = self.focus.prev(),
            KeyCode::Enter => match self.focus {
                Focus::Submit => return self.activate_submit(),
                _ => self.focus = self.focus.next(),
            },
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                match self.focus {
                    Focus::Phone => self.phone.push(c),
                    Focus::Message => self.message.push(c),
                    Focus::Submit => {}
                }
            }
            KeyCode::Backspace => {
                match self.focus {
                    Focus::Phone => {
                        self.phone.pop();
                    }
                    Focus::Message => {
                        self.message.pop();
                    }
                    Focus::Submit => {}
                }
            }
            _ => {}
        }
        None
    }

    /// Starts a submission unless one is already in flight. Both fields
    /// must hold something once trimmed; the submitter trims again when it
    /// builds the report.
    fn activate_submit(&mut self) -> Option<Action> {
        if self.submitting || !self.submit_enabled {
            return None;
        }
        if self.phone.trim().is_empty() || self.message.trim().is_empty() {
            self.alert = Some(Alert::new(
                None,
                "Please enter your phone number and a message before sending.",
            ));
            return None;
        }

        self.submitting = true;
        self.submit_enabled = false;
        Some(Action::Submit {
            phone: self.phone.clone(),
            message: self.message.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Severity;
    use crate::events::StatusKind;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ready_app(phone: &str, message: &str) -> App {
        let mut app = App::new();
        app.phone = phone.to_string();
        app.message = message.to_string();
        app.focus = Focus::Submit;
        app
    }

    #[test]
    fn a_new_alert_replaces_the_one_on_screen() {
        let mut app = App::new();
        app.apply(Event::Alert(None, "first".to_string()));
        app.apply(Event::Alert(Some(Severity::Success), "second".to_string()));

        let alert = app.alert.as_ref().unwrap();
        assert_eq!(alert.message, "second");
        assert_eq!(alert.severity, Severity::Success);
    }

    #[test]
    fn replacement_works_even_mid_dismissal() {
        let mut app = App::new();
        app.apply(Event::Alert(None, "first".to_string()));
        app.on_tick();
        app.alert.as_mut().unwrap().dismiss();
        app.apply(Event::Alert(None, "second".to_string()));

        let alert = app.alert.as_ref().unwrap();
        assert_eq!(alert.message, "second");
        assert!(!alert.is_fading());
    }

    #[test]
    fn dismissal_keys_are_inert_until_the_ok_control_takes_focus() {
        let mut app = App::new();
        app.apply(Event::Alert(None, "hold on".to_string()));

        app.handle_key(key(KeyCode::Enter));
        assert!(!app.alert.as_ref().unwrap().is_fading());

        app.on_tick();
        app.handle_key(key(KeyCode::Enter));
        assert!(app.alert.as_ref().unwrap().is_fading());

        app.on_tick();
        app.on_tick();
        assert!(app.alert.is_none());
    }

    #[test]
    fn escape_dismisses_like_the_ok_control() {
        let mut app = App::new();
        app.apply(Event::Alert(None, "notice".to_string()));
        app.on_tick();

        app.handle_key(key(KeyCode::Esc));
        assert!(app.alert.as_ref().unwrap().is_fading());
        assert!(!app.should_quit);
    }

    #[test]
    fn an_alert_blocks_typing_into_the_form() {
        let mut app = App::new();
        app.apply(Event::Alert(None, "wait".to_string()));
        app.handle_key(key(KeyCode::Char('x')));
        assert!(app.phone.is_empty());
    }

    #[test]
    fn typing_routes_to_the_focused_field() {
        let mut app = App::new();
        app.handle_key(key(KeyCode::Char('0')));
        app.handle_key(key(KeyCode::Char('9')));
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Char('h')));
        app.handle_key(key(KeyCode::Char('i')));
        app.handle_key(key(KeyCode::Backspace));

        assert_eq!(app.phone, "09");
        assert_eq!(app.message, "h");
    }

    #[test]
    fn focus_cycles_through_the_form_both_ways() {
        let mut app = App::new();
        assert_eq!(app.focus, Focus::Phone);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Message);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Submit);
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.focus, Focus::Phone);
        app.handle_key(key(KeyCode::BackTab));
        assert_eq!(app.focus, Focus::Submit);
    }

    #[test]
    fn enter_on_the_submit_control_starts_a_submission() {
        let mut app = ready_app("0912345678", "Flooding");
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(
            action,
            Some(Action::Submit {
                phone: "0912345678".to_string(),
                message: "Flooding".to_string(),
            })
        );
        assert!(app.submitting);
        assert!(!app.submit_enabled);
    }

    #[test]
    fn a_second_activation_is_ignored_while_one_is_in_flight() {
        let mut app = ready_app("0912345678", "Flooding");
        assert!(app.handle_key(key(KeyCode::Enter)).is_some());
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
    }

    #[test]
    fn empty_fields_block_submission_with_a_notice() {
        let mut app = ready_app("0912345678", "   ");
        let action = app.handle_key(key(KeyCode::Enter));
        assert!(action.is_none());
        assert!(!app.submitting);

        let alert = app.alert.as_ref().unwrap();
        assert_eq!(alert.severity, Severity::Info);
        assert!(alert.message.contains("Please enter"));
    }

    #[test]
    fn control_events_disable_and_restore_the_submit_label() {
        let mut app = App::new();
        app.apply(Event::Control(ControlState::Busy("Sending...".to_string())));
        assert!(app.submitting);
        assert!(!app.submit_enabled);
        assert_eq!(app.submit_label, "Sending...");

        app.apply(Event::Control(ControlState::Ready));
        assert!(!app.submitting);
        assert!(app.submit_enabled);
        assert_eq!(app.submit_label, SUBMIT_LABEL);
    }

    #[test]
    fn reset_clears_fields_but_not_the_status_line() {
        let mut app = App::new();
        app.phone = "0912".to_string();
        app.message = "help".to_string();
        app.address = "somewhere".to_string();
        app.apply(Event::Coordinates(Some((1.0, 2.0))));
        app.apply(Event::Status(Some(StatusLine::new(
            StatusKind::Success,
            "✓ Location acquired",
        ))));

        app.apply(Event::ResetForm);
        assert!(app.phone.is_empty());
        assert!(app.message.is_empty());
        assert!(app.address.is_empty());
        assert_eq!(app.latitude, None);
        assert_eq!(app.longitude, None);
        // Hiding the status line is its own event.
        assert!(app.status.is_some());

        app.apply(Event::Status(None));
        assert!(app.status.is_none());
    }

    #[test]
    fn quit_keys_set_the_flag() {
        let mut app = App::new();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);

        let mut app = App::new();
        app.handle_key(key(KeyCode::Esc));
        assert!(app.should_quit);
    }
}
