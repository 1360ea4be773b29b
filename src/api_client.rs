//! Consultation backend API client
//!
//! Thin JSON-over-HTTP wrapper around the `/api/v1` surface. Each call is a
//! single best-effort request: no retries, no caching, no auth.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::models::{
    AnalysisRequest, AnalysisResult, Appointment, ConsultationResult, IntakeForm, LabResults,
    PatientRecord, SubmitIntakeResponse,
};

/// Default backend URL (local development)
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

const API_PREFIX: &str = "/api/v1";

/// Backend API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The consultation exists but no doctor has completed it yet
    #[error("Results not ready yet")]
    NotReady,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server returned {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    UrlError(String),
}

impl ApiError {
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }

    /// Backend-supplied explanation, if the server sent one
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::NotFound(detail) | Self::Http { detail, .. } if !detail.is_empty() => {
                Some(detail.as_str())
            }
            _ => None,
        }
    }
}

/// Operations the pages need from the backend
#[async_trait]
pub trait ConsultBackend: Send + Sync {
    /// `POST /patient/submit-intake`
    async fn submit_intake(
        &self,
        intake: &IntakeForm,
        lab_results: &LabResults,
        doctor_id: &str,
        appointment_time: DateTime<Utc>,
    ) -> Result<SubmitIntakeResponse, ApiError>;

    /// `GET /patient/result/{id}`; 404 maps to [`ApiError::NotReady`]
    async fn get_result(&self, appointment_id: &str) -> Result<ConsultationResult, ApiError>;

    /// `GET /doctor/appointments?doctor_id=...`
    async fn get_appointments(&self, doctor_id: &str) -> Result<Vec<Appointment>, ApiError>;

    /// `GET /doctor/record/{id}`
    async fn get_patient_record(&self, appointment_id: &str) -> Result<PatientRecord, ApiError>;

    /// `POST /doctor/analyze`
    async fn analyze_and_approve(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ApiError>;

    /// `POST /doctor/record/{id}/analyze-and-approve`
    async fn analyze_and_approve_record(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ApiError>;
}

/// Intake submission body: intake fields at the top level, labs nested
#[derive(Debug, Serialize)]
struct IntakeSubmission<'a> {
    #[serde(flatten)]
    intake: &'a IntakeForm,
    lab_results: &'a LabResults,
    doctor_id: &'a str,
    appointment_time: String,
}

/// Body for the record-scoped endpoint (the id travels in the path)
#[derive(Debug, Serialize)]
struct RecordApproval<'a> {
    doctor_id: &'a str,
    request_ai_analysis: bool,
    doctor_notes: &'a str,
    approved: bool,
}

/// FastAPI-style error body
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the backend at `base_url`
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let cleaned_url = base_url.trim().trim_end_matches('/');
        info!("Creating ApiClient with base_url: {}", cleaned_url);

        let parsed = url::Url::parse(cleaned_url)
            .map_err(|e| ApiError::UrlError(format!("Invalid URL '{}': {}", cleaned_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::UrlError(format!(
                "URL must use http or https scheme, got: {}",
                parsed.scheme()
            )));
        }

        let http_client = reqwest::Client::builder().build()?;

        Ok(Self {
            http_client,
            base_url: cleaned_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// Convert an HTTP response into the payload or a classified error
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            return Ok(serde_json::from_str(&body)?);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body);
        warn!("Backend returned {}: {}", status, detail);

        match status {
            reqwest::StatusCode::NOT_FOUND => Err(ApiError::NotFound(detail)),
            _ => Err(ApiError::Http {
                status: status.as_u16(),
                detail,
            }),
        }
    }
}

/// Pull a human-readable message out of an error body
fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Some(serde_json::Value::String(detail)),
        }) => detail,
        Ok(ErrorBody {
            detail: Some(other),
        }) => other.to_string(),
        _ => body.trim().to_string(),
    }
}

#[async_trait]
impl ConsultBackend for ApiClient {
    async fn submit_intake(
        &self,
        intake: &IntakeForm,
        lab_results: &LabResults,
        doctor_id: &str,
        appointment_time: DateTime<Utc>,
    ) -> Result<SubmitIntakeResponse, ApiError> {
        let body = IntakeSubmission {
            intake,
            lab_results,
            doctor_id,
            appointment_time: appointment_time.to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        info!("Submitting intake for doctor {}", doctor_id);
        let response = self
            .http_client
            .post(self.endpoint("/patient/submit-intake"))
            .json(&body)
            .send()
            .await?;

        let submitted: SubmitIntakeResponse = Self::handle_response(response).await?;
        info!("Intake accepted, appointment {}", submitted.appointment_id);
        Ok(submitted)
    }

    async fn get_result(&self, appointment_id: &str) -> Result<ConsultationResult, ApiError> {
        debug!("Fetching result for appointment {}", appointment_id);
        let url = self.endpoint(&format!(
            "/patient/result/{}",
            urlencoding::encode(appointment_id)
        ));
        let response = self.http_client.get(&url).send().await?;

        match Self::handle_response(response).await {
            Err(ApiError::NotFound(_)) => {
                info!("Result for appointment {} not ready", appointment_id);
                Err(ApiError::NotReady)
            }
            other => other,
        }
    }

    async fn get_appointments(&self, doctor_id: &str) -> Result<Vec<Appointment>, ApiError> {
        debug!("Fetching appointments for doctor {}", doctor_id);
        let response = self
            .http_client
            .get(self.endpoint("/doctor/appointments"))
            .query(&[("doctor_id", doctor_id)])
            .send()
            .await?;

        let appointments: Vec<Appointment> = Self::handle_response(response).await?;
        info!("Found {} appointments", appointments.len());
        Ok(appointments)
    }

    async fn get_patient_record(&self, appointment_id: &str) -> Result<PatientRecord, ApiError> {
        debug!("Fetching record for appointment {}", appointment_id);
        let url = self.endpoint(&format!(
            "/doctor/record/{}",
            urlencoding::encode(appointment_id)
        ));
        let response = self.http_client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    async fn analyze_and_approve(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ApiError> {
        info!(
            "Doctor {} analyzing appointment {}",
            request.doctor_id, request.appointment_id
        );
        let response = self
            .http_client
            .post(self.endpoint("/doctor/analyze"))
            .json(request)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn analyze_and_approve_record(
        &self,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, ApiError> {
        info!(
            "Doctor {} analyzing record {}",
            request.doctor_id, request.appointment_id
        );
        let url = self.endpoint(&format!(
            "/doctor/record/{}/analyze-and-approve",
            urlencoding::encode(&request.appointment_id)
        ));
        let body = RecordApproval {
            doctor_id: &request.doctor_id,
            request_ai_analysis: request.request_ai_analysis,
            doctor_notes: &request.doctor_notes,
            approved: request.approved,
        };
        let response = self.http_client.post(&url).json(&body).send().await?;
        Self::handle_response(response).await
    }
}
