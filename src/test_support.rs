//! In-memory backend for driving page controllers in unit tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::api_client::{ApiError, ConsultBackend};
use crate::models::{
    AiAnalysis, AnalysisRequest, AnalysisResult, Appointment, AppointmentStatus,
    ConsultationResult, IntakeForm, LabResults, PatientRecord, SubmitIntakeResponse,
};

/// Scripted backend. Appointments complete when analyzed.
#[derive(Default)]
pub struct FakeBackend {
    pub appointments: Mutex<Vec<Appointment>>,
    pub records: Mutex<HashMap<String, PatientRecord>>,
    pub results: Mutex<HashMap<String, ConsultationResult>>,
    pub submissions: Mutex<Vec<(IntakeForm, LabResults, String)>>,
    pub analyses: Mutex<Vec<(&'static str, AnalysisRequest)>>,
    /// When set, every call fails with this HTTP status
    pub fail_status: Mutex<Option<u16>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_appointment(self, id: &str, status: AppointmentStatus) -> Self {
        self.appointments.lock().unwrap().push(Appointment {
            appointment_id: id.to_string(),
            patient_id: None,
            appointment_time: "2025-03-01T09:30:00".to_string(),
            status: status.clone(),
            has_result: status.is_completed(),
        });
        self.records
            .lock()
            .unwrap()
            .insert(id.to_string(), sample_record(id, status));
        self
    }

    pub fn fail_with(&self, status: u16) {
        *self.fail_status.lock().unwrap() = Some(status);
    }

    pub fn recover(&self) {
        *self.fail_status.lock().unwrap() = None;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record_call(&self, name: &str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(name.to_string());
        match *self.fail_status.lock().unwrap() {
            Some(status) => Err(ApiError::Http {
                status,
                detail: format!("simulated {} failure", status),
            }),
            None => Ok(()),
        }
    }

    fn complete(&self, endpoint: &'static str, request: &AnalysisRequest) -> AnalysisResult {
        self.analyses
            .lock()
            .unwrap()
            .push((endpoint, request.clone()));

        let analysis = request.request_ai_analysis.then(sample_analysis);
        for appt in self.appointments.lock().unwrap().iter_mut() {
            if appt.appointment_id == request.appointment_id {
                appt.status = AppointmentStatus::Completed;
                appt.has_result = true;
            }
        }
        self.results.lock().unwrap().insert(
            request.appointment_id.clone(),
            ConsultationResult {
                appointment_id: request.appointment_id.clone(),
                status: Some("completed".to_string()),
                approved_by: Some(request.doctor_id.clone()),
                doctor_name: Some("Dr. Sarah Chen".to_string()),
                doctor_notes: Some(request.doctor_notes.clone()),
                ai_analysis: analysis.clone(),
                ..Default::default()
            },
        );

        AnalysisResult {
            status: Some("success".to_string()),
            message: Some("Analysis complete".to_string()),
            ai_analysis: analysis,
            ..Default::default()
        }
    }
}

pub fn sample_record(id: &str, status: AppointmentStatus) -> PatientRecord {
    PatientRecord {
        appointment_id: id.to_string(),
        patient_id: None,
        intake_data: IntakeForm {
            age: 45,
            gender: crate::models::Gender::Female,
            chief_complaint: format!("complaint for {}", id),
            symptoms: "tiredness, thirst".to_string(),
            symptom_duration: "3 weeks".to_string(),
            medical_history: vec!["Hypertension".to_string()],
            current_medications: vec![],
            allergies: vec!["Penicillin".to_string()],
        },
        lab_results: LabResults {
            hba1c: Some(7.1),
            ..Default::default()
        },
        appointment_time: Some("2025-03-01T09:30:00".to_string()),
        status: Some(status),
    }
}

pub fn sample_analysis() -> AiAnalysis {
    AiAnalysis {
        risk_score: Some(6.5),
        primary_concerns: vec!["Elevated HbA1c".to_string()],
        treatment_recommendations: vec!["Start metformin".to_string()],
        clinical_summary: Some("Probable type 2 diabetes".to_string()),
        ..Default::default()
    }
}

#[async_trait]
impl ConsultBackend for FakeBackend {
    async fn submit_intake(
        &self,
        intake: &IntakeForm,
        lab_results: &LabResults,
        doctor_id: &str,
        _appointment_time: DateTime<Utc>,
    ) -> Result<SubmitIntakeResponse, ApiError> {
        self.record_call("submit_intake")?;
        self.submissions.lock().unwrap().push((
            intake.clone(),
            lab_results.clone(),
            doctor_id.to_string(),
        ));
        Ok(SubmitIntakeResponse {
            appointment_id: uuid::Uuid::new_v4().to_string(),
            status: Some("pending".to_string()),
            message: None,
        })
    }

    async fn get_result(&self, appointment_id: &str) -> Result<ConsultationResult, ApiError> {
        self.record_call("get_result")?;
        self.results
            .lock()
            .unwrap()
            .get(appointment_id)
            .cloned()
            .ok_or(ApiError::NotReady)
    }

    async fn get_appointments(&self, _doctor_id: &str) -> Result<Vec<Appointment>, ApiError> {
        self.record_call("get_appointments")?;
        Ok(self.appointments.lock().unwrap().clone())
    }

    async fn get_patient_record(&self, appointment_id: &str) -> Result<PatientRecord, ApiError> {
        self.record_call("get_patient_record")?;
        self.records
            .lock()
            .unwrap()
            .get(appointment_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(appointment_id.to_string()))
    }

    async fn analyze_and_approve(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ApiError> {
        self.record_call("analyze_and_approve")?;
        Ok(self.complete("analyze", request))
    }

    async fn analyze_and_approve_record(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ApiError> {
        self.record_call("analyze_and_approve_record")?;
        Ok(self.complete("record", request))
    }
}
