//! Maps portal paths to pages.
//!
//! | Path | Page |
//! |---|---|
//! | `/` | Home |
//! | `/patient` | Patient intake |
//! | `/check-results` | Appointment ID lookup |
//! | `/patient/result/:appointmentId` | Patient result viewer |
//! | `/doctor` | Doctor dashboard |
//! | `/doctor/record/:appointmentId` | Single record review |

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("No page at '{0}'")]
    NotFound(String),
    #[error("Invalid path parameter '{0}'")]
    InvalidParameter(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    PatientPortal,
    CheckResults,
    PatientResult { appointment_id: String },
    DoctorDashboard,
    DoctorRecord { appointment_id: String },
}

impl Route {
    /// Resolve a path (query string and fragment ignored)
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let without_query = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim();

        let segments: Vec<&str> = without_query
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Ok(Self::Home),
            ["patient"] => Ok(Self::PatientPortal),
            ["check-results"] => Ok(Self::CheckResults),
            ["patient", "result", id] => Ok(Self::PatientResult {
                appointment_id: decode_param(id)?,
            }),
            ["doctor"] => Ok(Self::DoctorDashboard),
            ["doctor", "record", id] => Ok(Self::DoctorRecord {
                appointment_id: decode_param(id)?,
            }),
            _ => Err(RouteError::NotFound(path.to_string())),
        }
    }

    /// Canonical path for this route
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::PatientPortal => "/patient".to_string(),
            Self::CheckResults => "/check-results".to_string(),
            Self::PatientResult { appointment_id } => {
                format!("/patient/result/{}", urlencoding::encode(appointment_id))
            }
            Self::DoctorDashboard => "/doctor".to_string(),
            Self::DoctorRecord { appointment_id } => {
                format!("/doctor/record/{}", urlencoding::encode(appointment_id))
            }
        }
    }

    /// The appointment identifier carried by the path, if any
    pub fn appointment_id(&self) -> Option<&str> {
        match self {
            Self::PatientResult { appointment_id } | Self::DoctorRecord { appointment_id } => {
                Some(appointment_id.as_str())
            }
            _ => None,
        }
    }
}

fn decode_param(raw: &str) -> Result<String, RouteError> {
    let decoded = urlencoding::decode(raw)
        .map_err(|_| RouteError::InvalidParameter(raw.to_string()))?;
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        return Err(RouteError::InvalidParameter(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

impl std::str::FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "1d787531-a368-49ec-aa6c-5fb42dc4b907";

    #[test]
    fn test_static_routes() {
        assert_eq!(Route::parse("/").unwrap(), Route::Home);
        assert_eq!(Route::parse("").unwrap(), Route::Home);
        assert_eq!(Route::parse("/patient").unwrap(), Route::PatientPortal);
        assert_eq!(Route::parse("/patient/").unwrap(), Route::PatientPortal);
        assert_eq!(Route::parse("/check-results").unwrap(), Route::CheckResults);
        assert_eq!(Route::parse("/doctor").unwrap(), Route::DoctorDashboard);
    }

    #[test]
    fn test_parameter_routes() {
        let route = Route::parse(&format!("/patient/result/{}", ID)).unwrap();
        assert_eq!(
            route,
            Route::PatientResult {
                appointment_id: ID.to_string()
            }
        );
        assert_eq!(route.appointment_id(), Some(ID));

        let route: Route = format!("/doctor/record/{}?tab=labs", ID).parse().unwrap();
        assert_eq!(
            route,
            Route::DoctorRecord {
                appointment_id: ID.to_string()
            }
        );
    }

    #[test]
    fn test_unknown_paths() {
        assert!(matches!(Route::parse("/admin"), Err(RouteError::NotFound(_))));
        assert!(matches!(Route::parse("/patient/result"), Err(RouteError::NotFound(_))));
        assert!(matches!(
            Route::parse("/doctor/record/a/b"),
            Err(RouteError::NotFound(_))
        ));
    }

    #[test]
    fn test_blank_parameter_rejected() {
        assert!(matches!(
            Route::parse("/patient/result/%20"),
            Err(RouteError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_path_round_trip_with_encoding() {
        let route = Route::PatientResult {
            appointment_id: "abc def".to_string(),
        };
        assert_eq!(route.path(), "/patient/result/abc%20def");
        assert_eq!(Route::parse(&route.path()).unwrap(), route);
        assert_eq!(Route::DoctorDashboard.to_string(), "/doctor");
    }
}
