use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::fmt::{self, Debug, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Validation,
    NotFound,
    DomainRule,
    Geocode,
    RouteProvider,
    Persistence,
    Internal,
}

#[derive(Debug)]
pub struct Error {
    pub kind: Kind,
    pub code: &'static str,
    pub message: String,
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self.kind {
            Kind::Validation => StatusCode::BAD_REQUEST,
            Kind::NotFound => StatusCode::NOT_FOUND,
            Kind::DomainRule => StatusCode::NOT_ACCEPTABLE,
            Kind::Geocode | Kind::RouteProvider | Kind::Persistence | Kind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        persistence_error("database error", err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = Json(json!({
            "error_code": self.code,
            "error_description": self.message,
        }));

        (status, body).into_response()
    }
}

pub fn invalid_data_error(message: impl Into<String>) -> Error {
    Error {
        kind: Kind::Validation,
        code: "INVALID_DATA",
        message: message.into(),
    }
}

pub fn invalid_driver_error() -> Error {
    Error {
        kind: Kind::Validation,
        code: "INVALID_DRIVER",
        message: "the informed driver id is invalid".into(),
    }
}

pub fn driver_not_found_error() -> Error {
    Error {
        kind: Kind::NotFound,
        code: "DRIVER_NOT_FOUND",
        message: "driver not found".into(),
    }
}

pub fn invalid_distance_error(min_km: f64) -> Error {
    Error {
        kind: Kind::DomainRule,
        code: "INVALID_DISTANCE",
        message: format!(
            "the informed distance is below the driver's minimum of {} km",
            min_km
        ),
    }
}

pub fn route_not_found_error() -> Error {
    Error {
        kind: Kind::NotFound,
        code: "ROUTE_NOT_FOUND",
        message: "no route could be calculated between the given addresses".into(),
    }
}

pub fn no_rides_found_error() -> Error {
    Error {
        kind: Kind::NotFound,
        code: "NO_RIDES_FOUND",
        message: "no rides found for the given customer".into(),
    }
}

pub fn geocode_error(message: impl Display) -> Error {
    Error {
        kind: Kind::Geocode,
        code: "ROUTE_CALCULATION_ERROR",
        message: format!("failed to geocode address: {}", message),
    }
}

pub fn route_provider_error(message: impl Display) -> Error {
    Error {
        kind: Kind::RouteProvider,
        code: "ROUTE_CALCULATION_ERROR",
        message: format!("failed to calculate route: {}", message),
    }
}

/// The underlying error is logged here; the caller only sees `description`.
pub fn persistence_error<T: Debug>(description: &str, err: T) -> Error {
    tracing::error!(?err, "{}", description);

    Error {
        kind: Kind::Persistence,
        code: "INTERNAL_SERVER_ERROR",
        message: description.into(),
    }
}

pub fn config_error(message: impl Display) -> Error {
    Error {
        kind: Kind::Internal,
        code: "INTERNAL_SERVER_ERROR",
        message: format!("configuration error: {}", message),
    }
}

pub fn unexpected_error<T: Debug>(err: T) -> Error {
    tracing::error!(?err, "unexpected error");

    Error {
        kind: Kind::Internal,
        code: "INTERNAL_SERVER_ERROR",
        message: "unexpected error".into(),
    }
}

#[test]
fn error_status_mapping() {
    assert_eq!(invalid_data_error("x").status(), StatusCode::BAD_REQUEST);
    assert_eq!(invalid_driver_error().status(), StatusCode::BAD_REQUEST);
    assert_eq!(driver_not_found_error().status(), StatusCode::NOT_FOUND);
    assert_eq!(invalid_distance_error(5.0).status(), StatusCode::NOT_ACCEPTABLE);
    assert_eq!(route_not_found_error().status(), StatusCode::NOT_FOUND);
    assert_eq!(no_rides_found_error().status(), StatusCode::NOT_FOUND);
    assert_eq!(
        geocode_error("ZERO_RESULTS").status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        persistence_error("failed to save ride", "disk full").status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn upstream_errors_keep_provider_message() {
    let err = geocode_error("REQUEST_DENIED");
    assert_eq!(err.kind, Kind::Geocode);
    assert_eq!(err.code, "ROUTE_CALCULATION_ERROR");
    assert!(err.message.contains("REQUEST_DENIED"));

    let err = route_provider_error("503 Service Unavailable");
    assert_eq!(err.kind, Kind::RouteProvider);
    assert!(err.message.contains("503"));
}
