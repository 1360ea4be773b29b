//! Intake form drafts and the transforms applied before submission.

use thiserror::Error;

use crate::models::{Gender, IntakeForm, LabResults, DEFAULT_DOCTOR_ID};

/// Client-side validation failure, shown inline next to the form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be a number, got '{value}'")]
    NotANumber { field: &'static str, value: String },
}

/// Split a comma-separated field into trimmed, non-empty entries, in order
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an optional numeric field. Blank input is `None`, never 0.
pub fn parse_optional_number(
    field: &'static str,
    input: &str,
) -> Result<Option<f64>, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(ValidationError::NotANumber {
            field,
            value: trimmed.to_string(),
        }),
    }
}

/// Blank free text becomes `None`
pub fn optional_text(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn required<'a>(field: &'static str, input: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(trimmed)
    }
}

/// Raw text of the intake questionnaire, exactly as typed
#[derive(Debug, Clone, PartialEq)]
pub struct IntakeDraft {
    pub age: String,
    pub gender: Gender,
    pub chief_complaint: String,
    pub symptoms: String,
    pub symptom_duration: String,
    pub medical_history: String,
    pub current_medications: String,
    pub allergies: String,
    pub doctor_id: String,
}

impl Default for IntakeDraft {
    fn default() -> Self {
        Self {
            age: String::new(),
            gender: Gender::Male,
            chief_complaint: String::new(),
            symptoms: String::new(),
            symptom_duration: String::new(),
            medical_history: String::new(),
            current_medications: String::new(),
            allergies: String::new(),
            doctor_id: DEFAULT_DOCTOR_ID.to_string(),
        }
    }
}

impl IntakeDraft {
    /// Check required fields and build the submission model
    pub fn validate(&self) -> Result<IntakeForm, ValidationError> {
        let age_text = required("Age", &self.age)?;
        let age = age_text
            .parse::<u32>()
            .map_err(|_| ValidationError::NotANumber {
                field: "Age",
                value: age_text.to_string(),
            })?;

        Ok(IntakeForm {
            age,
            gender: self.gender,
            chief_complaint: required("Chief complaint", &self.chief_complaint)?.to_string(),
            symptoms: required("Symptoms", &self.symptoms)?.to_string(),
            symptom_duration: required("Symptom duration", &self.symptom_duration)?.to_string(),
            medical_history: split_list(&self.medical_history),
            current_medications: split_list(&self.current_medications),
            allergies: split_list(&self.allergies),
        })
    }
}

/// Raw text of the optional lab section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabDraft {
    pub glucose: String,
    pub hba1c: String,
    pub cholesterol: String,
    pub triglycerides: String,
    pub hdl: String,
    pub ldl: String,
    pub blood_pressure: String,
    pub bmi: String,
}

impl LabDraft {
    pub fn validate(&self) -> Result<LabResults, ValidationError> {
        Ok(LabResults {
            glucose: parse_optional_number("Glucose", &self.glucose)?,
            hba1c: parse_optional_number("HbA1c", &self.hba1c)?,
            cholesterol: parse_optional_number("Total cholesterol", &self.cholesterol)?,
            triglycerides: parse_optional_number("Triglycerides", &self.triglycerides)?,
            hdl: parse_optional_number("HDL", &self.hdl)?,
            ldl: parse_optional_number("LDL", &self.ldl)?,
            blood_pressure: optional_text(&self.blood_pressure),
            bmi: parse_optional_number("BMI", &self.bmi)?,
            test_notes: None,
        })
    }
}
