//! Patient intake page: `editing -> submitting -> submitted | editing`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::api_client::{ApiError, ConsultBackend};
use crate::intake::{IntakeDraft, LabDraft, ValidationError};
use crate::models::{IntakeForm, LabResults, SubmitIntakeResponse};
use crate::render::{Screen, Tone};
use crate::router::Route;

/// Alert shown when the backend rejects or never receives the intake
pub const SUBMIT_FAILED_ALERT: &str = "Failed to submit data. Please try again.";

/// Intake page phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntakePhase {
    Editing,
    Submitting,
    Submitted { appointment_id: String },
}

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),
    #[error("Submission failed: {0}")]
    Submit(#[from] ApiError),
}

/// Validated payload ready to send
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedIntake {
    pub intake: IntakeForm,
    pub lab_results: LabResults,
    pub doctor_id: String,
    pub appointment_time: DateTime<Utc>,
}

/// Intake form controller
#[derive(Debug, Clone)]
pub struct PatientPortal {
    pub draft: IntakeDraft,
    pub labs: LabDraft,
    phase: IntakePhase,
    validation_error: Option<ValidationError>,
    alert: Option<String>,
}

impl Default for PatientPortal {
    fn default() -> Self {
        Self::new()
    }
}

impl PatientPortal {
    pub fn new() -> Self {
        Self {
            draft: IntakeDraft::default(),
            labs: LabDraft::default(),
            phase: IntakePhase::Editing,
            validation_error: None,
            alert: None,
        }
    }

    /// Form addressed to a specific doctor
    pub fn for_doctor(doctor_id: &str) -> Self {
        let mut page = Self::new();
        page.draft.doctor_id = doctor_id.to_string();
        page
    }

    pub fn phase(&self) -> &IntakePhase {
        &self.phase
    }

    pub fn validation_error(&self) -> Option<&ValidationError> {
        self.validation_error.as_ref()
    }

    /// Blocking alert from the last failed submission
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Submit button is live only while editing
    pub fn can_submit(&self) -> bool {
        self.phase == IntakePhase::Editing
    }

    pub fn appointment_id(&self) -> Option<&str> {
        match &self.phase {
            IntakePhase::Submitted { appointment_id } => Some(appointment_id.as_str()),
            _ => None,
        }
    }

    /// Where "Check Results" leads once submitted
    pub fn result_route(&self) -> Option<Route> {
        self.appointment_id().map(|id| Route::PatientResult {
            appointment_id: id.to_string(),
        })
    }

    /// Validate the drafts and enter `submitting`. Validation failures stay
    /// in `editing` and no request may be sent.
    pub fn begin_submit(&mut self) -> Result<PreparedIntake, IntakeError> {
        if self.phase != IntakePhase::Editing {
            return Err(IntakeError::InvalidTransition(format!(
                "Cannot submit from {:?}",
                self.phase
            )));
        }

        let validated = self
            .draft
            .validate()
            .and_then(|intake| self.labs.validate().map(|labs| (intake, labs)));

        let (intake, lab_results) = match validated {
            Ok(pair) => pair,
            Err(e) => {
                debug!("Intake validation failed: {}", e);
                self.validation_error = Some(e.clone());
                return Err(e.into());
            }
        };

        self.validation_error = None;
        self.alert = None;
        self.phase = IntakePhase::Submitting;

        Ok(PreparedIntake {
            intake,
            lab_results,
            doctor_id: self.draft.doctor_id.clone(),
            appointment_time: Utc::now(),
        })
    }

    /// Apply the backend's answer. Failure returns to `editing` with the
    /// drafts untouched.
    pub fn finish_submit(
        &mut self,
        result: Result<SubmitIntakeResponse, ApiError>,
    ) -> Result<String, IntakeError> {
        if self.phase != IntakePhase::Submitting {
            return Err(IntakeError::InvalidTransition(format!(
                "No submission in flight ({:?})",
                self.phase
            )));
        }

        match result {
            Ok(response) if !response.appointment_id.trim().is_empty() => {
                info!("Intake submitted, appointment {}", response.appointment_id);
                self.phase = IntakePhase::Submitted {
                    appointment_id: response.appointment_id.clone(),
                };
                Ok(response.appointment_id)
            }
            Ok(_) => {
                warn!("Backend accepted intake without an appointment id");
                self.phase = IntakePhase::Editing;
                self.alert = Some(SUBMIT_FAILED_ALERT.to_string());
                Err(IntakeError::Submit(ApiError::Http {
                    status: 200,
                    detail: "missing appointment_id".to_string(),
                }))
            }
            Err(e) => {
                error!("Submission error: {}", e);
                self.phase = IntakePhase::Editing;
                self.alert = Some(SUBMIT_FAILED_ALERT.to_string());
                Err(e.into())
            }
        }
    }

    /// Validate, send, and apply the response
    pub async fn submit<B>(&mut self, backend: &B) -> Result<String, IntakeError>
    where
        B: ConsultBackend + ?Sized,
    {
        let prepared = self.begin_submit()?;
        let result = backend
            .submit_intake(
                &prepared.intake,
                &prepared.lab_results,
                &prepared.doctor_id,
                prepared.appointment_time,
            )
            .await;
        self.finish_submit(result)
    }

    /// "Submit Another": back to editing, drafts kept
    pub fn submit_another(&mut self) {
        self.phase = IntakePhase::Editing;
        self.alert = None;
        self.validation_error = None;
    }

    pub fn render(&self) -> String {
        match &self.phase {
            IntakePhase::Submitted { appointment_id } => {
                let mut screen = Screen::new("Submission Successful!");
                screen
                    .line("Your medical data has been sent to your doctor.")
                    .blank()
                    .field("Your Appointment ID", appointment_id)
                    .line("Save this ID to check your results later.")
                    .blank();
                if let Some(route) = self.result_route() {
                    screen.link("Check Results", &route);
                }
                screen.link("Back to Home", &Route::Home);
                screen.finish()
            }
            phase => {
                let mut screen = Screen::new("Patient Medical Intake");
                if let Some(alert) = &self.alert {
                    screen.notice(Tone::Error, alert);
                }

                screen
                    .section("Personal Information")
                    .field("Age *", &self.draft.age)
                    .field("Gender *", self.draft.gender.as_str())
                    .section("Medical Information")
                    .field("Chief Complaint *", &self.draft.chief_complaint)
                    .field("Current Symptoms *", &self.draft.symptoms)
                    .field("Symptom Duration *", &self.draft.symptom_duration)
                    .field("Medical History (comma-separated)", &self.draft.medical_history)
                    .field(
                        "Current Medications (comma-separated)",
                        &self.draft.current_medications,
                    )
                    .field("Allergies (comma-separated)", &self.draft.allergies)
                    .section("Lab Results (Optional)")
                    .field("Glucose (mg/dL)", &self.labs.glucose)
                    .field("HbA1c (%)", &self.labs.hba1c)
                    .field("Total Cholesterol (mg/dL)", &self.labs.cholesterol)
                    .field("Triglycerides (mg/dL)", &self.labs.triglycerides)
                    .field("HDL (mg/dL)", &self.labs.hdl)
                    .field("LDL (mg/dL)", &self.labs.ldl)
                    .field("Blood Pressure", &self.labs.blood_pressure)
                    .field("BMI", &self.labs.bmi)
                    .blank();

                if let Some(e) = &self.validation_error {
                    screen.notice(Tone::Warning, &e.to_string());
                }
                if *phase == IntakePhase::Submitting {
                    screen.notice(Tone::Busy, "Submitting...");
                }
                screen.button("Submit", self.can_submit());
                screen.link("Back to Home", &Route::Home);
                screen.finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Gender;
    use crate::test_support::FakeBackend;

    fn filled_portal() -> PatientPortal {
        let mut page = PatientPortal::new();
        page.draft.age = "45".to_string();
        page.draft.gender = Gender::Female;
        page.draft.chief_complaint = "fatigue".to_string();
        page.draft.symptoms = "tiredness, thirst".to_string();
        page.draft.symptom_duration = "3 weeks".to_string();
        page.draft.allergies = "Penicillin, , Peanuts".to_string();
        page
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let backend = FakeBackend::new();
        let mut page = filled_portal();

        let id = page.submit(&backend).await.unwrap();

        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(page.appointment_id(), Some(id.as_str()));
        assert_eq!(
            page.result_route(),
            Some(Route::PatientResult {
                appointment_id: id.clone()
            })
        );

        let submissions = backend.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        let (intake, labs, doctor_id) = &submissions[0];
        assert_eq!(intake.allergies, vec!["Penicillin", "Peanuts"]);
        assert!(labs.is_empty());
        assert_eq!(doctor_id, crate::models::DEFAULT_DOCTOR_ID);
    }

    #[tokio::test]
    async fn test_missing_required_field_makes_no_call() {
        let backend = FakeBackend::new();
        let mut page = filled_portal();
        page.draft.symptom_duration.clear();

        let err = page.submit(&backend).await.unwrap_err();

        assert!(matches!(
            err,
            IntakeError::Validation(ValidationError::Required("Symptom duration"))
        ));
        assert_eq!(backend.call_count(), 0);
        assert_eq!(page.phase(), &IntakePhase::Editing);
        assert!(page.render().contains("Symptom duration is required"));
    }

    #[tokio::test]
    async fn test_bad_lab_value_makes_no_call() {
        let backend = FakeBackend::new();
        let mut page = filled_portal();
        page.labs.glucose = "high".to_string();

        assert!(page.submit(&backend).await.is_err());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_returns_to_editing_with_form_preserved() {
        let backend = FakeBackend::new();
        backend.fail_with(500);
        let mut page = filled_portal();
        let before = page.draft.clone();

        let err = page.submit(&backend).await.unwrap_err();

        assert!(matches!(err, IntakeError::Submit(_)));
        assert_eq!(page.phase(), &IntakePhase::Editing);
        assert_eq!(page.alert(), Some(SUBMIT_FAILED_ALERT));
        assert_eq!(page.draft, before);
        assert!(page.can_submit());

        // Retry after the backend recovers
        backend.recover();
        assert!(page.submit(&backend).await.is_ok());
        assert!(page.alert().is_none());
    }

    #[test]
    fn test_submitting_blocks_second_submit() {
        let mut page = filled_portal();
        page.begin_submit().unwrap();
        assert_eq!(page.phase(), &IntakePhase::Submitting);
        assert!(!page.can_submit());
        assert!(matches!(
            page.begin_submit(),
            Err(IntakeError::InvalidTransition(_))
        ));
        assert!(page.render().contains("[ Submit ] (disabled)"));
    }

    #[test]
    fn test_finish_without_submit_rejected() {
        let mut page = PatientPortal::new();
        let result = page.finish_submit(Ok(SubmitIntakeResponse {
            appointment_id: "x".to_string(),
            status: None,
            message: None,
        }));
        assert!(matches!(result, Err(IntakeError::InvalidTransition(_))));
    }

    #[test]
    fn test_empty_appointment_id_is_failure() {
        let mut page = filled_portal();
        page.begin_submit().unwrap();
        let result = page.finish_submit(Ok(SubmitIntakeResponse {
            appointment_id: " ".to_string(),
            status: None,
            message: None,
        }));
        assert!(result.is_err());
        assert_eq!(page.phase(), &IntakePhase::Editing);
    }

    #[tokio::test]
    async fn test_submit_another_keeps_drafts() {
        let backend = FakeBackend::new();
        let mut page = filled_portal();
        page.submit(&backend).await.unwrap();
        assert!(page.render().contains("Submission Successful!"));

        page.submit_another();
        assert_eq!(page.phase(), &IntakePhase::Editing);
        assert_eq!(page.draft.chief_complaint, "fatigue");
        assert!(page.appointment_id().is_none());
    }
}
