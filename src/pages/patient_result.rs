//! Patient result viewer.
//!
//! Fetches on mount. A 404 from the backend means the doctor has not finished
//! the consultation yet and is shown as "not ready", distinct from failures.
//! Both can be retried with [`PatientResultPage::refresh`].

use thiserror::Error;
use tracing::{debug, warn};

use crate::api_client::{ApiError, ConsultBackend};
use crate::models::{AiAnalysis, ConsultationResult};
use crate::render::{Screen, Tone};
use crate::request_state::{RequestSequence, RequestState, RequestTicket};
use crate::router::Route;

pub const NOT_READY_MESSAGE: &str =
    "Your doctor is still reviewing your data. Please check back later.";
pub const GENERIC_FAILURE: &str = "Failed to load consultation results";
pub const CONTACT_DOCTOR_MESSAGE: &str =
    "Your consultation has been completed. Please contact your doctor if you have any questions.";

/// Why a lookup produced no result
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Results not ready yet")]
    NotReady,
    #[error("{0}")]
    Failed(String),
}

impl From<ApiError> for LookupError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::NotReady => Self::NotReady,
            other => Self::Failed(
                other
                    .detail()
                    .map(str::to_string)
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            ),
        }
    }
}

/// What the page shows for the current state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultPresentation<'a> {
    Loading,
    NotReady,
    Failed(&'a str),
    Analysis(&'a ConsultationResult, &'a AiAnalysis),
    ContactDoctor(&'a ConsultationResult),
}

#[derive(Debug)]
pub struct PatientResultPage {
    appointment_id: String,
    state: RequestState<ConsultationResult, LookupError>,
    sequence: RequestSequence,
}

impl PatientResultPage {
    pub fn new(appointment_id: &str) -> Self {
        Self {
            appointment_id: appointment_id.to_string(),
            state: RequestState::Idle,
            sequence: RequestSequence::new(),
        }
    }

    pub fn appointment_id(&self) -> &str {
        &self.appointment_id
    }

    pub fn state(&self) -> &RequestState<ConsultationResult, LookupError> {
        &self.state
    }

    /// Mark a fetch as started and return its ticket
    pub fn begin_fetch(&mut self) -> RequestTicket {
        self.state = RequestState::Loading;
        self.sequence.next()
    }

    /// Apply a fetch outcome; stale tickets are ignored. Returns whether applied.
    pub fn apply(
        &mut self,
        ticket: RequestTicket,
        result: Result<ConsultationResult, ApiError>,
    ) -> bool {
        if !self.sequence.is_current(ticket) {
            debug!("Discarding stale result response {}", ticket);
            return false;
        }
        if let Err(e) = &result {
            if !e.is_not_ready() {
                warn!("Error fetching result for {}: {}", self.appointment_id, e);
            }
        }
        self.state = result.map_err(LookupError::from).into();
        true
    }

    pub async fn fetch<B>(&mut self, backend: &B)
    where
        B: ConsultBackend + ?Sized,
    {
        let ticket = self.begin_fetch();
        let result = backend.get_result(&self.appointment_id).await;
        self.apply(ticket, result);
    }

    /// Explicit user retry
    pub async fn refresh<B>(&mut self, backend: &B)
    where
        B: ConsultBackend + ?Sized,
    {
        self.fetch(backend).await;
    }

    pub fn presentation(&self) -> ResultPresentation<'_> {
        match &self.state {
            RequestState::Idle | RequestState::Loading => ResultPresentation::Loading,
            RequestState::Error(LookupError::NotReady) => ResultPresentation::NotReady,
            RequestState::Error(LookupError::Failed(msg)) => ResultPresentation::Failed(msg),
            RequestState::Success(result) => match &result.ai_analysis {
                Some(analysis) => ResultPresentation::Analysis(result, analysis),
                None => ResultPresentation::ContactDoctor(result),
            },
        }
    }

    pub fn render(&self) -> String {
        let mut screen = Screen::new("Consultation Results");
        screen.field("Appointment ID", &self.appointment_id).blank();

        match self.presentation() {
            ResultPresentation::Loading => {
                screen.notice(Tone::Busy, "Loading your results...");
            }
            ResultPresentation::NotReady => {
                screen
                    .notice(Tone::Warning, "Results Not Ready Yet")
                    .line(NOT_READY_MESSAGE)
                    .button("Refresh", true);
            }
            ResultPresentation::Failed(msg) => {
                screen
                    .notice(Tone::Error, msg)
                    .button("Refresh", true);
            }
            ResultPresentation::Analysis(result, analysis) => {
                render_completed(&mut screen, result);
                render_analysis(&mut screen, analysis);
            }
            ResultPresentation::ContactDoctor(result) => {
                render_completed(&mut screen, result);
                screen.blank().line(CONTACT_DOCTOR_MESSAGE);
            }
        }

        screen.blank().link("Back to Home", &Route::Home);
        screen.finish()
    }
}

fn render_completed(screen: &mut Screen, result: &ConsultationResult) {
    screen
        .notice(Tone::Success, "Consultation Complete")
        .line(format!("Reviewed by {}", result.doctor_name()));
    if let Some(at) = &result.approved_at {
        screen.field("Approved at", at);
    }
    if let Some(notes) = result.doctor_notes.as_deref().filter(|n| !n.trim().is_empty()) {
        screen.section("Doctor's Notes").line(notes);
    }
}

/// Structured AI analysis block, shared with the doctor review page
pub(crate) fn render_analysis(screen: &mut Screen, analysis: &AiAnalysis) {
    screen.section("AI-Assisted Analysis");
    if let Some(score) = analysis.risk_score {
        let level = analysis
            .risk_level()
            .map(|l| format!(" ({} risk)", l.label()))
            .unwrap_or_default();
        screen.field("Risk Assessment", &format!("{}/10{}", score, level));
    }
    let lists = [
        ("Primary Concerns", &analysis.primary_concerns),
        ("Differential Diagnoses", &analysis.differential_diagnoses),
        ("Recommended Tests", &analysis.recommended_tests),
        ("Recommendations", &analysis.treatment_recommendations),
    ];
    for (heading, items) in lists {
        if !items.is_empty() {
            screen.line(format!("{}:", heading)).bullets(items);
        }
    }
    if let Some(summary) = &analysis.clinical_summary {
        screen.field("Clinical Summary", summary);
    }
    if let Some(timeline) = &analysis.follow_up_timeline {
        screen.field("Follow-up", timeline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_analysis, FakeBackend};

    fn completed(analysis: Option<AiAnalysis>) -> ConsultationResult {
        ConsultationResult {
            appointment_id: "appt-1".to_string(),
            doctor_notes: Some("Book a follow-up".to_string()),
            ai_analysis: analysis,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_not_ready_is_distinct_from_failure() {
        let backend = FakeBackend::new();
        let mut page = PatientResultPage::new("appt-1");

        page.fetch(&backend).await;

        assert_eq!(page.presentation(), ResultPresentation::NotReady);
        let text = page.render();
        assert!(text.contains("Results Not Ready Yet"));
        assert!(text.contains(NOT_READY_MESSAGE));
        assert!(text.contains("[ Refresh ]"));
    }

    #[tokio::test]
    async fn test_server_error_uses_detail() {
        let backend = FakeBackend::new();
        backend.fail_with(500);
        let mut page = PatientResultPage::new("appt-1");

        page.fetch(&backend).await;

        assert_eq!(
            page.presentation(),
            ResultPresentation::Failed("simulated 500 failure")
        );
    }

    #[test]
    fn test_generic_failure_without_detail() {
        let err = LookupError::from(ApiError::UrlError("bad".to_string()));
        assert_eq!(err, LookupError::Failed(GENERIC_FAILURE.to_string()));
    }

    #[tokio::test]
    async fn test_refresh_after_completion() {
        let backend = FakeBackend::new();
        let mut page = PatientResultPage::new("appt-1");
        page.fetch(&backend).await;
        assert_eq!(page.presentation(), ResultPresentation::NotReady);

        backend
            .results
            .lock()
            .unwrap()
            .insert("appt-1".to_string(), completed(Some(sample_analysis())));
        page.refresh(&backend).await;

        match page.presentation() {
            ResultPresentation::Analysis(result, analysis) => {
                assert_eq!(result.doctor_name(), "Dr. Smith");
                assert_eq!(analysis.risk_score, Some(6.5));
            }
            other => panic!("unexpected presentation: {:?}", other),
        }
        let text = page.render();
        assert!(text.contains("Risk Assessment: 6.5/10 (moderate risk)"));
        assert!(text.contains("  - Elevated HbA1c"));
        assert!(text.contains("Book a follow-up"));
        assert_eq!(backend.call_count(), 2);
    }

    #[test]
    fn test_missing_analysis_falls_back_to_contact_doctor() {
        let mut page = PatientResultPage::new("appt-1");
        let ticket = page.begin_fetch();
        assert_eq!(page.presentation(), ResultPresentation::Loading);

        page.apply(ticket, Ok(completed(None)));

        assert!(matches!(
            page.presentation(),
            ResultPresentation::ContactDoctor(_)
        ));
        assert!(page.render().contains(CONTACT_DOCTOR_MESSAGE));
    }

    #[test]
    fn test_stale_response_ignored() {
        let mut page = PatientResultPage::new("appt-1");
        let first = page.begin_fetch();
        let second = page.begin_fetch();

        assert!(page.apply(second, Err(ApiError::NotReady)));
        assert!(!page.apply(first, Ok(completed(None))));
        assert_eq!(page.presentation(), ResultPresentation::NotReady);
    }
}
