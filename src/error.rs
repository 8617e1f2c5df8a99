use actix_web::body::BoxBody;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("An unspecified internal error ocurred: {0}")]
    InternalError(#[from] anyhow::Error),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Not logged in")]
    Unauthorized,
    #[error("{0}")]
    Forbidden(String),
    #[error("An unspecified internal error ocurred")]
    DatabaseError(#[from] BlockingError),
}

impl ApiError {
    fn get_error_code(&self) -> String {
        match self {
            ApiError::InternalError(_) => "IE-00500".to_string(),
            ApiError::NotFound(_) => "NF-00404".to_string(),
            ApiError::Conflict(_) => "CF-00400".to_string(),
            ApiError::InvalidArgument(_) => "IA-00400".to_string(),
            ApiError::InvalidCredentials => "IC-00400".to_string(),
            ApiError::Unauthorized => "UA-00401".to_string(),
            ApiError::Forbidden(_) => "FB-00403".to_string(),
            ApiError::DatabaseError(_) => "DE-00500".to_string(),
        }
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(value: diesel::result::Error) -> Self {
        use diesel::result::{DatabaseErrorKind, Error};
        match value {
            Error::NotFound => ApiError::NotFound("Record not found".to_string()),
            Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                ApiError::Conflict(info.message().to_string())
            }
            e => {
                log::error!("storage error: {}", e);
                ApiError::InternalError(anyhow::anyhow!("{}", e))
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub message: String,
    pub status: u16,
    pub timestamp: NaiveDateTime,
    pub internal_code: String,
}

impl From<&ApiError> for ErrorResponse {
    fn from(value: &ApiError) -> Self {
        Self {
            message: value.to_string(),
            status: value.status_code().as_u16(),
            timestamp: NaiveDateTime::from_timestamp_opt(chrono::Utc::now().timestamp(), 0)
                .unwrap_or_default(),
            internal_code: value.get_error_code(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        HttpResponse::build(self.status_code()).json(ErrorResponse::from(self))
    }
}
