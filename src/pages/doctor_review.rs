//! Doctor review workflow.
//!
//! The dashboard (`/doctor`) and the deep-linked record view
//! (`/doctor/record/:id`) are the same controller in two [`ReviewMode`]s. They
//! differ only in which analyze endpoint is called and what happens after a
//! successful analysis.
//!
//! Each of the three fetches (list, record, analysis) carries a ticket from its
//! own [`RequestSequence`]. Selecting another appointment invalidates the
//! outstanding record and analysis tickets, so a slow response for a previous
//! selection can never populate the view.

use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::api_client::{ApiError, ConsultBackend};
use crate::models::{AnalysisRequest, AnalysisResult, Appointment, AppointmentStatus, PatientRecord};
use crate::pages::patient_result::render_analysis;
use crate::render::{Screen, Tone};
use crate::request_state::{RequestSequence, RequestState, RequestTicket};
use crate::router::Route;

pub const NOTES_REQUIRED: &str = "Please add doctor notes before analyzing";
pub const DASHBOARD_SUCCESS: &str = "Analysis complete! Results saved for patient.";
pub const DASHBOARD_FAILURE: &str = "Failed to complete analysis";
pub const RECORD_FAILURE: &str = "Failed to analyze record";
pub const RECORD_SUCCESS: &str = "Analysis complete and approved.";
const LIST_FAILURE: &str = "Failed to load appointments";
const RECORD_LOAD_FAILURE: &str = "Failed to load patient record";

/// Which screen the workflow is driving
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewMode {
    /// Master-detail over the whole appointment list
    Dashboard,
    /// Deep link to a single appointment
    Record { appointment_id: String },
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("No appointment selected")]
    NothingSelected,
    #[error("Patient record has not loaded")]
    RecordNotLoaded,
    #[error("Appointment is already completed")]
    AlreadyCompleted,
    #[error("An analysis request is already in flight")]
    InFlight,
    #[error("This record has already been analyzed")]
    AlreadyAnalyzed,
    #[error("{}", NOTES_REQUIRED)]
    NotesRequired,
    #[error("Response superseded by a newer request")]
    Superseded,
    #[error("{0}")]
    Failed(String),
}

#[derive(Debug)]
pub struct DoctorReview {
    doctor_id: String,
    mode: ReviewMode,
    appointments: RequestState<Vec<Appointment>>,
    selected: Option<Appointment>,
    record: RequestState<PatientRecord>,
    analysis: RequestState<AnalysisResult>,
    notes: String,
    notice: Option<(Tone, String)>,
    list_sequence: RequestSequence,
    record_sequence: RequestSequence,
    analysis_sequence: RequestSequence,
}

impl DoctorReview {
    fn with_mode(doctor_id: &str, mode: ReviewMode) -> Self {
        Self {
            doctor_id: doctor_id.to_string(),
            mode,
            appointments: RequestState::Idle,
            selected: None,
            record: RequestState::Idle,
            analysis: RequestState::Idle,
            notes: String::new(),
            notice: None,
            list_sequence: RequestSequence::new(),
            record_sequence: RequestSequence::new(),
            analysis_sequence: RequestSequence::new(),
        }
    }

    pub fn dashboard(doctor_id: &str) -> Self {
        Self::with_mode(doctor_id, ReviewMode::Dashboard)
    }

    pub fn record_view(doctor_id: &str, appointment_id: &str) -> Self {
        Self::with_mode(
            doctor_id,
            ReviewMode::Record {
                appointment_id: appointment_id.to_string(),
            },
        )
    }

    pub fn mode(&self) -> &ReviewMode {
        &self.mode
    }

    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    pub fn appointments(&self) -> &RequestState<Vec<Appointment>> {
        &self.appointments
    }

    pub fn selected(&self) -> Option<&Appointment> {
        self.selected.as_ref()
    }

    pub fn record(&self) -> &RequestState<PatientRecord> {
        &self.record
    }

    pub fn analysis(&self) -> &RequestState<AnalysisResult> {
        &self.analysis
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn notice(&self) -> Option<(Tone, &str)> {
        self.notice.as_ref().map(|(tone, text)| (*tone, text.as_str()))
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.notes = notes.to_string();
    }

    // --- Appointment list ---

    pub fn begin_load_appointments(&mut self) -> RequestTicket {
        self.appointments = RequestState::Loading;
        self.list_sequence.next()
    }

    pub fn apply_appointments(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Appointment>, ApiError>,
    ) -> bool {
        if !self.list_sequence.is_current(ticket) {
            debug!("Discarding stale appointment list {}", ticket);
            return false;
        }
        self.appointments = match result {
            Ok(list) => {
                info!("Loaded {} appointments for {}", list.len(), self.doctor_id);
                RequestState::Success(list)
            }
            Err(e) => {
                error!("Error fetching appointments: {}", e);
                RequestState::Error(LIST_FAILURE.to_string())
            }
        };
        true
    }

    pub async fn load_appointments<B>(&mut self, backend: &B)
    where
        B: ConsultBackend + ?Sized,
    {
        let ticket = self.begin_load_appointments();
        let result = backend.get_appointments(&self.doctor_id).await;
        self.apply_appointments(ticket, result);
    }

    // --- Selection and record ---

    /// Make `appointment` current. Prior record and analysis state is cleared
    /// immediately and their outstanding tickets are invalidated.
    pub fn select(&mut self, appointment: Appointment) -> (RequestTicket, String) {
        debug!("Selecting appointment {}", appointment.appointment_id);
        let id = appointment.appointment_id.clone();
        self.selected = Some(appointment);
        self.record = RequestState::Loading;
        self.analysis = RequestState::Idle;
        self.analysis_sequence.invalidate();
        self.notes.clear();
        self.notice = None;
        (self.record_sequence.next(), id)
    }

    /// Select by id from the loaded list, falling back to a placeholder entry
    pub fn select_by_id(&mut self, appointment_id: &str) -> (RequestTicket, String) {
        let appointment = self
            .appointments
            .data()
            .and_then(|list| list.iter().find(|a| a.appointment_id == appointment_id))
            .cloned()
            .unwrap_or_else(|| Appointment::placeholder(appointment_id));
        self.select(appointment)
    }

    pub fn apply_record(
        &mut self,
        ticket: RequestTicket,
        result: Result<PatientRecord, ApiError>,
    ) -> bool {
        if !self.record_sequence.is_current(ticket) {
            debug!("Discarding stale patient record {}", ticket);
            return false;
        }
        match result {
            Ok(record) => {
                if let Some(status) = record.status.clone() {
                    self.update_status(&record.appointment_id, status);
                }
                self.record = RequestState::Success(record);
            }
            Err(e) => {
                error!("Error fetching patient record: {}", e);
                let message = e.detail().unwrap_or(RECORD_LOAD_FAILURE).to_string();
                self.record = RequestState::Error(message);
            }
        }
        true
    }

    /// Select and fetch in one step
    pub async fn open_record<B>(&mut self, backend: &B, appointment: Appointment)
    where
        B: ConsultBackend + ?Sized,
    {
        let (ticket, id) = self.select(appointment);
        let result = backend.get_patient_record(&id).await;
        self.apply_record(ticket, result);
    }

    /// Keep the selection and the list in step with the latest known status
    fn update_status(&mut self, appointment_id: &str, status: AppointmentStatus) {
        if let Some(selected) = self
            .selected
            .as_mut()
            .filter(|s| s.appointment_id == appointment_id || appointment_id.is_empty())
        {
            selected.has_result |= status.is_completed();
            selected.status = status.clone();
        }
        if let RequestState::Success(list) = &mut self.appointments {
            for appt in list.iter_mut().filter(|a| a.appointment_id == appointment_id) {
                appt.has_result |= status.is_completed();
                appt.status = status.clone();
            }
        }
    }

    // --- Analyze and approve ---

    pub fn is_completed(&self) -> bool {
        self.selected
            .as_ref()
            .is_some_and(|s| s.status.is_completed())
    }

    fn check_submittable(&self) -> Result<&Appointment, ReviewError> {
        let selected = self.selected.as_ref().ok_or(ReviewError::NothingSelected)?;
        if !self.record.is_success() {
            return Err(ReviewError::RecordNotLoaded);
        }
        if self.analysis.is_loading() {
            return Err(ReviewError::InFlight);
        }
        if selected.status.is_completed() {
            return Err(ReviewError::AlreadyCompleted);
        }
        if matches!(self.mode, ReviewMode::Record { .. }) && self.analysis.is_success() {
            return Err(ReviewError::AlreadyAnalyzed);
        }
        Ok(selected)
    }

    /// Whether "Analyze & Approve" is live
    pub fn can_submit(&self) -> bool {
        self.check_submittable().is_ok()
    }

    /// Build the request and mark the analysis in flight
    pub fn begin_analysis(
        &mut self,
        request_ai_analysis: bool,
    ) -> Result<(RequestTicket, AnalysisRequest), ReviewError> {
        let appointment_id = self.check_submittable()?.appointment_id.clone();

        if matches!(self.mode, ReviewMode::Record { .. }) && self.notes.trim().is_empty() {
            self.notice = Some((Tone::Warning, NOTES_REQUIRED.to_string()));
            return Err(ReviewError::NotesRequired);
        }

        let request = AnalysisRequest::new(
            &appointment_id,
            &self.doctor_id,
            &self.notes,
            request_ai_analysis,
        );
        self.analysis = RequestState::Loading;
        self.notice = None;
        Ok((self.analysis_sequence.next(), request))
    }

    pub fn apply_analysis(
        &mut self,
        ticket: RequestTicket,
        result: Result<AnalysisResult, ApiError>,
    ) -> bool {
        if !self.analysis_sequence.is_current(ticket) {
            debug!("Discarding stale analysis response {}", ticket);
            return false;
        }

        match result {
            Ok(analysis) => {
                let id = self
                    .selected
                    .as_ref()
                    .map(|s| s.appointment_id.clone())
                    .unwrap_or_default();
                info!("Analysis approved for {}", id);
                self.update_status(&id, AppointmentStatus::Completed);

                match self.mode {
                    ReviewMode::Dashboard => {
                        self.selected = None;
                        self.record = RequestState::Idle;
                        self.record_sequence.invalidate();
                        self.notes.clear();
                        self.analysis = RequestState::Idle;
                        self.notice = Some((Tone::Success, DASHBOARD_SUCCESS.to_string()));
                    }
                    ReviewMode::Record { .. } => {
                        self.analysis = RequestState::Success(analysis);
                        self.notice = Some((Tone::Success, RECORD_SUCCESS.to_string()));
                    }
                }
            }
            Err(e) => {
                error!("Error analyzing: {}", e);
                let message = match self.mode {
                    ReviewMode::Dashboard => DASHBOARD_FAILURE.to_string(),
                    ReviewMode::Record { .. } => {
                        e.detail().unwrap_or(RECORD_FAILURE).to_string()
                    }
                };
                self.analysis = RequestState::Error(message.clone());
                self.notice = Some((Tone::Error, message));
            }
        }
        true
    }

    /// Run analyze-and-approve against the endpoint for this mode. On the
    /// dashboard a success also refreshes the appointment list.
    pub async fn submit_analysis<B>(
        &mut self,
        backend: &B,
        request_ai_analysis: bool,
    ) -> Result<(), ReviewError>
    where
        B: ConsultBackend + ?Sized,
    {
        let (ticket, request) = self.begin_analysis(request_ai_analysis)?;
        let result = match self.mode {
            ReviewMode::Dashboard => backend.analyze_and_approve(&request).await,
            ReviewMode::Record { .. } => backend.analyze_and_approve_record(&request).await,
        };

        if !self.apply_analysis(ticket, result) {
            warn!("Analysis response for {} arrived after reselection", request.appointment_id);
            return Err(ReviewError::Superseded);
        }
        if let RequestState::Error(message) = &self.analysis {
            return Err(ReviewError::Failed(message.clone()));
        }

        if self.mode == ReviewMode::Dashboard {
            self.load_appointments(backend).await;
        }
        Ok(())
    }

    /// Initial load. The record view also selects its appointment and fetches
    /// the record.
    pub async fn mount<B>(&mut self, backend: &B)
    where
        B: ConsultBackend + ?Sized,
    {
        self.load_appointments(backend).await;
        if let ReviewMode::Record { appointment_id } = &self.mode {
            let appointment_id = appointment_id.clone();
            let (ticket, id) = self.select_by_id(&appointment_id);
            let result = backend.get_patient_record(&id).await;
            self.apply_record(ticket, result);
        }
    }

    // --- Rendering ---

    pub fn render(&self) -> String {
        let title = match self.mode {
            ReviewMode::Dashboard => "Doctor Dashboard",
            ReviewMode::Record { .. } => "Patient Record",
        };
        let mut screen = Screen::new(title);
        if let Some((tone, text)) = self.notice() {
            screen.notice(tone, text);
        }

        if self.mode == ReviewMode::Dashboard {
            self.render_list(&mut screen);
        }
        self.render_detail(&mut screen);

        screen.blank();
        if let ReviewMode::Record { .. } = self.mode {
            screen.link("Back to Dashboard", &Route::DoctorDashboard);
        }
        screen.link("Back to Home", &Route::Home);
        screen.finish()
    }

    fn render_list(&self, screen: &mut Screen) {
        screen.section("Patient Appointments");
        match &self.appointments {
            RequestState::Idle | RequestState::Loading => {
                screen.notice(Tone::Busy, "Loading appointments...");
            }
            RequestState::Error(msg) => {
                screen.notice(Tone::Error, msg);
            }
            RequestState::Success(list) if list.is_empty() => {
                screen.line("No appointments yet.");
            }
            RequestState::Success(list) => {
                let selected_id = self.selected.as_ref().map(|s| s.appointment_id.as_str());
                for appt in list {
                    let marker = if Some(appt.appointment_id.as_str()) == selected_id {
                        ">"
                    } else {
                        " "
                    };
                    let time = if appt.appointment_time.is_empty() {
                        "-"
                    } else {
                        appt.appointment_time.as_str()
                    };
                    screen.line(format!(
                        "{} {}  {}  [{}]",
                        marker, appt.appointment_id, time, appt.status
                    ));
                }
            }
        }
    }

    fn render_detail(&self, screen: &mut Screen) {
        let Some(selected) = &self.selected else {
            if self.mode == ReviewMode::Dashboard {
                screen.blank().line("Select an appointment to review.");
            }
            return;
        };

        screen
            .section("Patient Information")
            .field("Appointment ID", &selected.appointment_id)
            .field("Status", selected.status.as_str());

        match &self.record {
            RequestState::Idle | RequestState::Loading => {
                screen.notice(Tone::Busy, "Loading patient record...");
                return;
            }
            RequestState::Error(msg) => {
                screen.notice(Tone::Error, msg);
                return;
            }
            RequestState::Success(record) => {
                let intake = &record.intake_data;
                screen
                    .field("Age", &intake.age.to_string())
                    .field("Gender", intake.gender.as_str())
                    .field("Chief Complaint", &intake.chief_complaint)
                    .field("Symptoms", &intake.symptoms)
                    .field("Duration", &intake.symptom_duration)
                    .field("Medical History", &intake.medical_history.join(", "))
                    .field("Current Medications", &intake.current_medications.join(", "))
                    .field("Allergies", &intake.allergies.join(", "));

                screen.section("Lab Results");
                if record.lab_results.is_empty() {
                    screen.line("No lab results provided.");
                }
                for (label, value) in record.lab_results.labelled_values() {
                    screen.field(label, &value);
                }
                if let Some(notes) = &record.lab_results.test_notes {
                    screen.field("Lab Notes", notes);
                }
            }
        }

        screen.section("Doctor's Notes").field("Notes", &self.notes);
        if self.is_completed() {
            screen.notice(Tone::Info, "This consultation has been completed.");
        }
        if self.analysis.is_loading() {
            screen.notice(Tone::Busy, "Analyzing...");
        }
        screen.button("Analyze & Approve", self.can_submit());

        if let Some(result) = self.analysis.data() {
            if let Some(analysis) = &result.ai_analysis {
                render_analysis(screen, analysis);
            }
        }
    }
}
