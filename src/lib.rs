//! Client for the medical consultation portal.
//!
//! Patients submit an intake form (optionally with lab values) and later look
//! up the doctor's AI-assisted assessment by appointment ID. Doctors review
//! pending appointments and run analyze-and-approve.

pub mod api_client;
pub mod config;
pub mod intake;
pub mod models;
pub mod pages;
pub mod render;
pub mod request_state;
pub mod router;

#[cfg(test)]
mod test_support;
