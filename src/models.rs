//! View models mirroring the consultation backend DTOs.
//!
//! Nothing here is persisted: every value lives for the lifetime of one page
//! view and is re-fetched on the next mount.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Doctor whose appointments the portal reviews (no doctor login exists)
pub const DEFAULT_DOCTOR_ID: &str = "11111111-1111-1111-1111-111111111111";

/// Fallback doctor name when the backend omits one
pub const FALLBACK_DOCTOR_NAME: &str = "Dr. Smith";

/// Patient gender as offered by the intake form. Reads are case-insensitive
/// and anything unrecognised becomes `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Default for Gender {
    fn default() -> Self {
        Self::Male
    }
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Self::Male),
            "female" => Ok(Self::Female),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown gender: {}", s)),
        }
    }
}

impl From<String> for Gender {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(Self::Other)
    }
}

/// Intake questionnaire as the backend receives and returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeForm {
    pub age: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, deserialize_with = "string_or_null")]
    pub chief_complaint: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub symptoms: String,
    // Older records store this as `duration`
    #[serde(default, alias = "duration", deserialize_with = "string_or_null")]
    pub symptom_duration: String,
    #[serde(default, deserialize_with = "list_or_string")]
    pub medical_history: Vec<String>,
    #[serde(default, deserialize_with = "list_or_string")]
    pub current_medications: Vec<String>,
    #[serde(default, deserialize_with = "list_or_string")]
    pub allergies: Vec<String>,
}

/// Optional lab values. Absent values serialize as `null`, never as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredLabResults")]
pub struct LabResults {
    pub glucose: Option<f64>,
    pub hba1c: Option<f64>,
    pub cholesterol: Option<f64>,
    pub triglycerides: Option<f64>,
    pub hdl: Option<f64>,
    pub ldl: Option<f64>,
    /// Free text such as "120/80"
    pub blood_pressure: Option<String>,
    pub bmi: Option<f64>,
    pub test_notes: Option<String>,
}

/// Lab values as the backend may return them: renamed keys and blood
/// pressure split into systolic and diastolic readings
#[derive(Deserialize)]
struct StoredLabResults {
    #[serde(default, alias = "fasting_glucose")]
    glucose: Option<f64>,
    #[serde(default)]
    hba1c: Option<f64>,
    #[serde(default, alias = "cholesterol_total", alias = "total_cholesterol")]
    cholesterol: Option<f64>,
    #[serde(default)]
    triglycerides: Option<f64>,
    #[serde(default, alias = "cholesterol_hdl")]
    hdl: Option<f64>,
    #[serde(default, alias = "cholesterol_ldl")]
    ldl: Option<f64>,
    #[serde(default)]
    blood_pressure: Option<String>,
    #[serde(default)]
    blood_pressure_systolic: Option<f64>,
    #[serde(default)]
    blood_pressure_diastolic: Option<f64>,
    #[serde(default)]
    bmi: Option<f64>,
    #[serde(default)]
    test_notes: Option<String>,
}

impl From<StoredLabResults> for LabResults {
    fn from(stored: StoredLabResults) -> Self {
        let split_reading = match (stored.blood_pressure_systolic, stored.blood_pressure_diastolic) {
            (Some(sys), Some(dia)) => Some(format!("{}/{}", sys, dia)),
            (Some(sys), None) => Some(format!("{}/-", sys)),
            (None, Some(dia)) => Some(format!("-/{}", dia)),
            (None, None) => None,
        };
        Self {
            glucose: stored.glucose,
            hba1c: stored.hba1c,
            cholesterol: stored.cholesterol,
            triglycerides: stored.triglycerides,
            hdl: stored.hdl,
            ldl: stored.ldl,
            blood_pressure: stored
                .blood_pressure
                .filter(|bp| !bp.trim().is_empty())
                .or(split_reading),
            bmi: stored.bmi,
            test_notes: stored.test_notes.filter(|n| !n.trim().is_empty()),
        }
    }
}

impl LabResults {
    /// True when no lab value or note was provided
    pub fn is_empty(&self) -> bool {
        self.labelled_values().is_empty() && self.test_notes.is_none()
    }

    /// Present values paired with their display label and unit
    pub fn labelled_values(&self) -> Vec<(&'static str, String)> {
        let numeric = [
            ("Glucose", self.glucose, " mg/dL"),
            ("HbA1c", self.hba1c, "%"),
            ("Total Cholesterol", self.cholesterol, " mg/dL"),
            ("Triglycerides", self.triglycerides, " mg/dL"),
            ("HDL", self.hdl, " mg/dL"),
            ("LDL", self.ldl, " mg/dL"),
        ];

        let mut values: Vec<(&'static str, String)> = numeric
            .iter()
            .filter_map(|(label, value, unit)| value.map(|v| (*label, format!("{}{}", v, unit))))
            .collect();

        if let Some(bp) = &self.blood_pressure {
            values.push(("Blood Pressure", format!("{} mmHg", bp)));
        }
        if let Some(bmi) = self.bmi {
            values.push(("BMI", bmi.to_string()));
        }
        values
    }
}

/// Appointment review status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AppointmentStatus {
    Pending,
    Completed,
    /// Any status this client does not know about
    Other(String),
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Other(s) => s,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl From<String> for AppointmentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            _ => Self::Other(s),
        }
    }
}

impl From<AppointmentStatus> for String {
    fn from(status: AppointmentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appointment list item for the doctor dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default, deserialize_with = "string_or_null")]
    pub appointment_time: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub has_result: bool,
}

impl Appointment {
    /// Stand-in used by deep links until the backend reports the real entry
    pub fn placeholder(appointment_id: &str) -> Self {
        Self {
            appointment_id: appointment_id.to_string(),
            patient_id: None,
            appointment_time: String::new(),
            status: AppointmentStatus::Pending,
            has_result: false,
        }
    }
}

/// Intake and lab data for one appointment, as shown to the doctor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default)]
    pub appointment_id: String,
    #[serde(default)]
    pub patient_id: Option<String>,
    pub intake_data: IntakeForm,
    #[serde(default)]
    pub lab_results: LabResults,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
}

/// Doctor's analyze-and-approve request. `approved` is always true: the
/// portal has no reject or defer path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub appointment_id: String,
    pub doctor_id: String,
    pub doctor_notes: String,
    pub request_ai_analysis: bool,
    pub approved: bool,
}

impl AnalysisRequest {
    pub fn new(
        appointment_id: &str,
        doctor_id: &str,
        doctor_notes: &str,
        request_ai_analysis: bool,
    ) -> Self {
        Self {
            appointment_id: appointment_id.to_string(),
            doctor_id: doctor_id.to_string(),
            doctor_notes: doctor_notes.to_string(),
            request_ai_analysis,
            approved: true,
        }
    }
}

/// Backend-produced structured assessment (risk score on a 0-10 scale)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    #[serde(default)]
    pub risk_score: Option<f64>,
    #[serde(default, deserialize_with = "list_or_string")]
    pub primary_concerns: Vec<String>,
    #[serde(default, deserialize_with = "list_or_string")]
    pub differential_diagnoses: Vec<String>,
    #[serde(default, deserialize_with = "list_or_string")]
    pub recommended_tests: Vec<String>,
    #[serde(default, deserialize_with = "list_or_string")]
    pub treatment_recommendations: Vec<String>,
    #[serde(default)]
    pub clinical_summary: Option<String>,
    #[serde(default)]
    pub follow_up_timeline: Option<String>,
}

impl AiAnalysis {
    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.risk_score.map(RiskLevel::from_score)
    }
}

/// Coarse banding of the 0-10 risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 3.0 {
            Self::Low
        } else if score < 7.0 {
            Self::Moderate
        } else {
            Self::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

/// Response to a successful intake submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitIntakeResponse {
    pub appointment_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to analyze-and-approve (either endpoint)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub doctor_notes: Option<String>,
    #[serde(default)]
    pub ai_analysis: Option<AiAnalysis>,
}

/// Completed consultation as the patient sees it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsultationResult {
    #[serde(default)]
    pub appointment_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub approved_by: Option<String>,
    #[serde(default)]
    pub approved_at: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub doctor_notes: Option<String>,
    #[serde(default)]
    pub ai_analysis: Option<AiAnalysis>,
}

impl ConsultationResult {
    pub fn doctor_name(&self) -> &str {
        self.doctor_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(FALLBACK_DOCTOR_NAME)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrString {
    List(Vec<String>),
    One(String),
}

/// Accepts `null`, a single string, or a list of strings
fn list_or_string<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<ListOrString>::deserialize(deserializer)? {
        Some(ListOrString::List(items)) => items,
        Some(ListOrString::One(item)) => vec![item],
        None => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter(|item| !item.trim().is_empty())
        .collect())
}

fn string_or_null<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
