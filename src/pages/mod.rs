//! Page controllers, one per route.
//!
//! Each controller owns its form and request state and renders itself to
//! plain text. Network calls go through [`ConsultBackend`] so the same flows
//! run against the HTTP client or an in-memory backend.

pub mod check_results;
pub mod doctor_review;
pub mod home;
pub mod patient_portal;
pub mod patient_result;

pub use check_results::CheckResults;
pub use doctor_review::{DoctorReview, ReviewError, ReviewMode};
pub use patient_portal::{IntakeError, IntakePhase, PatientPortal};
pub use patient_result::{LookupError, PatientResultPage, ResultPresentation};

use crate::api_client::ConsultBackend;
use crate::config::Config;
use crate::router::Route;

/// A mounted page
#[derive(Debug)]
pub enum Page {
    Home,
    PatientPortal(PatientPortal),
    CheckResults(CheckResults),
    PatientResult(PatientResultPage),
    DoctorReview(DoctorReview),
}

impl Page {
    /// Fresh page for a route
    pub fn for_route(route: &Route, config: &Config) -> Self {
        match route {
            Route::Home => Self::Home,
            Route::PatientPortal => Self::PatientPortal(PatientPortal::for_doctor(&config.doctor_id)),
            Route::CheckResults => Self::CheckResults(CheckResults::new()),
            Route::PatientResult { appointment_id } => {
                Self::PatientResult(PatientResultPage::new(appointment_id))
            }
            Route::DoctorDashboard => Self::DoctorReview(DoctorReview::dashboard(&config.doctor_id)),
            Route::DoctorRecord { appointment_id } => {
                Self::DoctorReview(DoctorReview::record_view(&config.doctor_id, appointment_id))
            }
        }
    }

    /// Run the page's on-mount fetches
    pub async fn mount<B>(&mut self, backend: &B)
    where
        B: ConsultBackend + ?Sized,
    {
        match self {
            Self::PatientResult(page) => page.fetch(backend).await,
            Self::DoctorReview(page) => page.mount(backend).await,
            Self::Home | Self::PatientPortal(_) | Self::CheckResults(_) => {}
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Home => home::render(),
            Self::PatientPortal(page) => page.render(),
            Self::CheckResults(page) => page.render(),
            Self::PatientResult(page) => page.render(),
            Self::DoctorReview(page) => page.render(),
        }
    }
}
