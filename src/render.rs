//! Plain-text screen builder shared by the page renderers.

use std::fmt;

use crate::router::Route;

/// Tone of an inline message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warning,
    Error,
    Busy,
}

impl Tone {
    fn marker(&self) -> &'static str {
        match self {
            Self::Info => "[i]",
            Self::Success => "[ok]",
            Self::Warning => "[!]",
            Self::Error => "[x]",
            Self::Busy => "[..]",
        }
    }
}

/// Line-oriented text screen
#[derive(Debug, Clone, Default)]
pub struct Screen {
    lines: Vec<String>,
}

impl Screen {
    /// Start a screen with an underlined title
    pub fn new(title: &str) -> Self {
        let mut screen = Self::default();
        screen.lines.push(title.to_string());
        screen.lines.push("=".repeat(title.chars().count()));
        screen
    }

    pub fn line(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(text.into());
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.lines.push(String::new());
        }
        self
    }

    pub fn section(&mut self, heading: &str) -> &mut Self {
        self.blank();
        self.lines.push(heading.to_string());
        self.lines.push("-".repeat(heading.chars().count()));
        self
    }

    /// `Label: value`, or `Label: -` for an empty value
    pub fn field(&mut self, label: &str, value: &str) -> &mut Self {
        let value = if value.trim().is_empty() { "-" } else { value };
        self.lines.push(format!("{}: {}", label, value));
        self
    }

    pub fn bullets(&mut self, items: &[String]) -> &mut Self {
        for item in items {
            self.lines.push(format!("  - {}", item));
        }
        self
    }

    pub fn notice(&mut self, tone: Tone, text: &str) -> &mut Self {
        self.lines.push(format!("{} {}", tone.marker(), text));
        self
    }

    pub fn button(&mut self, label: &str, enabled: bool) -> &mut Self {
        if enabled {
            self.lines.push(format!("[ {} ]", label));
        } else {
            self.lines.push(format!("[ {} ] (disabled)", label));
        }
        self
    }

    pub fn link(&mut self, label: &str, route: &Route) -> &mut Self {
        self.lines.push(format!("-> {}: {}", label, route));
        self
    }

    pub fn finish(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_layout() {
        let mut screen = Screen::new("Results");
        screen
            .field("Appointment ID", "abc")
            .field("Doctor", "")
            .section("Concerns")
            .bullets(&["Thirst".to_string()])
            .notice(Tone::Warning, "Not ready")
            .button("Refresh", true)
            .button("Submit", false)
            .link("Home", &Route::Home);

        let text = screen.finish();
        assert!(text.starts_with("Results\n=======\n"));
        assert!(text.contains("Doctor: -\n"));
        assert!(text.contains("\nConcerns\n--------\n  - Thirst\n"));
        assert!(text.contains("[!] Not ready"));
        assert!(text.contains("[ Refresh ]\n[ Submit ] (disabled)"));
        assert!(text.ends_with("-> Home: /\n"));
    }

    #[test]
    fn test_blank_lines_do_not_stack() {
        let mut screen = Screen::new("T");
        screen.blank().blank().section("S");
        assert_eq!(screen.finish(), "T\n=\n\nS\n-\n");
    }
}
