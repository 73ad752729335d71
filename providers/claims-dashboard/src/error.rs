use advisor_provider::AdvisorError;
use claims_analytics::AnalysisError;
use notification_common::ProviderError;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use crate::auth::AuthError;

/// Every failure a request can hit. None of them ends the session.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("{0}")]
    UnreadableFile(String),

    #[error("{0}")]
    InsufficientData(String),

    #[error("{message}")]
    ExternalService { message: String, timeout: bool },

    #[error("{0}")]
    Authentication(#[from] AuthError),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Internal(String),
}

impl warp::reject::Reject for DashboardError {}

impl DashboardError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn no_dataset() -> Self {
        Self::invalid("no claims file loaded in this session")
    }

    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::UnreadableFile(_) => StatusCode::BAD_REQUEST,
            DashboardError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DashboardError::ExternalService { timeout: true, .. } => StatusCode::GATEWAY_TIMEOUT,
            DashboardError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            DashboardError::Authentication(_) => StatusCode::UNAUTHORIZED,
            DashboardError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DashboardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DashboardError::UnreadableFile(_) => "unreadable_file",
            DashboardError::InsufficientData(_) => "insufficient_data",
            DashboardError::ExternalService { timeout: true, .. } => "external_service_timeout",
            DashboardError::ExternalService { .. } => "external_service",
            DashboardError::Authentication(_) => "authentication",
            DashboardError::InvalidInput(_) => "invalid_input",
            DashboardError::Internal(_) => "internal",
        }
    }
}

impl From<AnalysisError> for DashboardError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::UnreadableFile(inner) => DashboardError::UnreadableFile(inner.to_string()),
            insufficient @ AnalysisError::InsufficientData { .. } => {
                DashboardError::InsufficientData(insufficient.to_string())
            }
            frame @ AnalysisError::Frame(_) => DashboardError::Internal(frame.to_string()),
        }
    }
}

impl From<AdvisorError> for DashboardError {
    fn from(err: AdvisorError) -> Self {
        DashboardError::ExternalService {
            timeout: err.is_timeout(),
            message: format!("advisor: {}", err),
        }
    }
}

impl From<ProviderError> for DashboardError {
    fn from(err: ProviderError) -> Self {
        DashboardError::ExternalService {
            timeout: err.is_timeout(),
            message: format!("notifier: {}", err),
        }
    }
}

// `From<DashboardError> for Rejection` comes from warp's blanket impl over `Reject`
// (it calls `warp::reject::custom`).

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

/// Turn any rejection into a JSON `{error, message}` reply
pub async fn recover(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, body) = if let Some(err) = rejection.find::<DashboardError>() {
        if err.status().is_server_error() {
            error!("Request failed: {}", err);
        } else {
            warn!("Request rejected ({}): {}", err.code(), err);
        }
        (
            err.status(),
            ErrorBody {
                error: err.code(),
                message: err.to_string(),
            },
        )
    } else if rejection.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            ErrorBody {
                error: "not_found",
                message: "no such route".to_string(),
            },
        )
    } else if let Some(err) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorBody {
                error: "invalid_input",
                message: err.to_string(),
            },
        )
    } else if let Some(err) = rejection.find::<warp::reject::InvalidQuery>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorBody {
                error: "invalid_input",
                message: err.to_string(),
            },
        )
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorBody {
                error: "unreadable_file",
                message: "upload exceeds the size limit".to_string(),
            },
        )
    } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
        (
            StatusCode::LENGTH_REQUIRED,
            ErrorBody {
                error: "invalid_input",
                message: "a Content-Length header is required".to_string(),
            },
        )
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorBody {
                error: "method_not_allowed",
                message: "method not allowed".to_string(),
            },
        )
    } else {
        error!("Unhandled rejection: {:?}", rejection);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody {
                error: "internal",
                message: "internal error".to_string(),
            },
        )
    };

    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}
