//! Appointment ID lookup that leads to the result page.

use crate::render::{Screen, Tone};
use crate::router::Route;

pub const MISSING_ID_ERROR: &str = "Please enter your appointment ID";

/// Appointment ID lookup form. Navigates; never calls the backend itself.
#[derive(Debug, Clone, Default)]
pub struct CheckResults {
    input: String,
    error: Option<String>,
}

impl CheckResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Typing clears any previous error
    pub fn set_input(&mut self, value: &str) {
        self.input = value.to_string();
        self.error = None;
    }

    /// Route to the result page for the trimmed ID, or record an inline error
    pub fn submit(&mut self) -> Option<Route> {
        let id = self.input.trim();
        if id.is_empty() {
            self.error = Some(MISSING_ID_ERROR.to_string());
            return None;
        }
        Some(Route::PatientResult {
            appointment_id: id.to_string(),
        })
    }

    pub fn render(&self) -> String {
        let mut screen = Screen::new("Check Your Results");
        screen
            .line("Enter your appointment ID to view your consultation results.")
            .blank()
            .field("Appointment ID", &self.input)
            .line("You received this ID when you submitted your patient intake form.");
        if let Some(error) = &self.error {
            screen.notice(Tone::Error, error);
        }
        screen
            .button("View My Results", true)
            .link("Back to Home", &Route::Home);
        screen.finish()
    }
}
