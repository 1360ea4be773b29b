//! Request lifecycle for page controllers.
//!
//! A page holds one [`RequestState`] per outstanding kind of request and a
//! [`RequestSequence`] that stamps each request with a ticket. A response is
//! applied only if its ticket is still the latest one issued, so a slow reply
//! to a superseded request cannot overwrite newer state.

use std::fmt;

/// Lifecycle of a single request: idle, loading, success or error
#[derive(Debug, Clone, PartialEq)]
pub enum RequestState<T, E = String> {
    Idle,
    Loading,
    Success(T),
    Error(E),
}

impl<T, E> Default for RequestState<T, E> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T, E> RequestState<T, E> {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Payload of a successful request
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            Self::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Success(data) => Some(data),
            _ => None,
        }
    }

    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success(_) => "success",
            Self::Error(_) => "error",
        }
    }
}

impl<T, E> From<Result<T, E>> for RequestState<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Success(data),
            Err(e) => Self::Error(e),
        }
    }
}

/// Stamp identifying one issued request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket(u64);

impl fmt::Display for RequestTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic request counter. Issuing a new ticket supersedes every earlier one.
#[derive(Debug, Default)]
pub struct RequestSequence {
    generation: u64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment generation and return a ticket for the new request
    pub fn next(&mut self) -> RequestTicket {
        self.generation = self.generation.wrapping_add(1);
        RequestTicket(self.generation)
    }

    /// Supersede any outstanding request without starting a new one
    pub fn invalidate(&mut self) {
        self.next();
    }

    /// Whether a response carrying this ticket may still be applied
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_idle() {
        let state: RequestState<u32> = RequestState::default();
        assert!(state.is_idle());
        assert_eq!(state.label(), "idle");
        assert!(state.data().is_none());
    }

    #[test]
    fn test_from_result() {
        let ok: RequestState<u32, String> = Ok(7).into();
        assert_eq!(ok.data(), Some(&7));
        assert!(ok.is_success());

        let err: RequestState<u32, String> = Err("boom".to_string()).into();
        assert_eq!(err.error().map(String::as_str), Some("boom"));
        assert!(err.is_error());
        assert!(err.into_data().is_none());
    }

    #[test]
    fn test_only_latest_ticket_is_current() {
        let mut seq = RequestSequence::new();
        let first = seq.next();
        assert!(seq.is_current(first));

        let second = seq.next();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalidate_supersedes_outstanding() {
        let mut seq = RequestSequence::new();
        let ticket = seq.next();
        seq.invalidate();
        assert!(!seq.is_current(ticket));
    }

    #[test]
    fn test_ticket_display() {
        let mut seq = RequestSequence::new();
        assert_eq!(seq.next().to_string(), "#1");
    }
}
