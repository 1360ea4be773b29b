//! Portal landing page.

use crate::render::Screen;
use crate::router::Route;

/// Landing page with the three entry points
pub fn render() -> String {
    let mut screen = Screen::new("Medical Consultation Portal");
    screen
        .line("AI-assisted consultations reviewed by your doctor.")
        .section("For Patients")
        .link("Submit Medical Data", &Route::PatientPortal)
        .link("Check Results", &Route::CheckResults)
        .section("For Doctors")
        .link("Doctor Dashboard", &Route::DoctorDashboard);
    screen.finish()
}
