use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use deadpool_redis::{redis::RedisError, CreatePoolError, PoolError};
use serde::Serialize;
use std::borrow::Cow;

/// Machine readable code sent with every error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    ValidationError,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    DuplicateValue,
    InternalServerError,
    UserNotFound,
    InvalidOldPassword,
    AvatarIsNull,
    FriendshipRequestNotFound,
    FriendshipExists,
    FriendshipUserIsAlreadyBlocked,
    FriendshipInvalidTransition,
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Bad Request: {1}")]
    BadRequest(ErrorCode, Cow<'static, str>),
    #[error("Unauthorized: {1}")]
    Unauthorized(ErrorCode, Cow<'static, str>),
    #[error("Forbidden: {1}")]
    Forbidden(ErrorCode, Cow<'static, str>),
    #[error("Not Found: {1}")]
    NotFound(ErrorCode, Cow<'static, str>),
    #[error("Conflict: {1}")]
    Conflict(ErrorCode, Cow<'static, str>),
    #[error("Unprocessable Entity: {1}")]
    Unprocessable(ErrorCode, Cow<'static, str>),
    #[error("Internal Server Error")]
    InternalServer,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status: &'static str,
    pub status_code: u16,
    pub code: ErrorCode,
    pub message: Cow<'static, str>,
}

impl Error {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(ErrorCode::BadRequest, msg.into())
    }

    pub fn unauthorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized(ErrorCode::Unauthorized, msg.into())
    }

    pub fn internal_server_error() -> Self {
        Self::InternalServer
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Error::BadRequest(code, _)
            | Error::Unauthorized(code, _)
            | Error::Forbidden(code, _)
            | Error::NotFound(code, _)
            | Error::Conflict(code, _)
            | Error::Unprocessable(code, _) => *code,
            Error::InternalServer => ErrorCode::InternalServerError,
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match *self {
            Error::BadRequest(..) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(..) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(..) => StatusCode::FORBIDDEN,
            Error::NotFound(..) => StatusCode::NOT_FOUND,
            Error::Conflict(..) => StatusCode::CONFLICT,
            Error::Unprocessable(..) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InternalServer => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match self {
            Error::NotFound(_, msg)
            | Error::Conflict(_, msg)
            | Error::Unauthorized(_, msg)
            | Error::BadRequest(_, msg)
            | Error::Forbidden(_, msg)
            | Error::Unprocessable(_, msg) => msg.clone(),
            Error::InternalServer => "Internal Server Error".into(),
        };

        HttpResponse::build(status).json(ErrorBody {
            status: "error",
            status_code: status.as_u16(),
            code: self.code(),
            message,
        })
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SystemError {
    // jwt errors
    #[error("JWT Error")]
    JwtError(#[from] jsonwebtoken::errors::Error),
    // argon2 errors
    #[error("Hash Error")]
    HashError(#[from] argon2::password_hash::Error),
    // sqlx errors
    #[error("Database Error : {0}")]
    DatabaseError(Cow<'static, str>),
    #[error("Migration Error")]
    MigrateError(#[from] sqlx::migrate::MigrateError),
    // serde errors
    #[error("JSON Serialization/Deserialization Error")]
    JsonError(#[from] serde_json::Error),
    // redis errors
    #[error(transparent)]
    PoolInit(#[from] CreatePoolError),
    #[error("Redis pool error: {0}")]
    PoolGet(#[from] PoolError),
    #[error("Redis error")]
    RedisError(#[from] RedisError),
    // blob storage errors
    #[error("IO Error")]
    IoError(#[from] std::io::Error),
    // Custom Errors
    #[error("Bad Request: {1}")]
    BadRequest(ErrorCode, Cow<'static, str>),
    #[error("Unauthorized: {0}")]
    Unauthorized(Cow<'static, str>),
    #[error("Forbidden: {1}")]
    Forbidden(ErrorCode, Cow<'static, str>),
    #[error("Not Found: {1}")]
    NotFound(ErrorCode, Cow<'static, str>),
    #[error("Conflict: {1}")]
    Conflict(ErrorCode, Cow<'static, str>),
    #[error("Unprocessable: {1}")]
    Unprocessable(ErrorCode, Cow<'static, str>),
    #[error("Internal System Error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

/// Turns a unique constraint name such as `users_email_key` into "Email already exists".
fn conflict_message(constraint: Option<&str>) -> Cow<'static, str> {
    let Some(constraint) = constraint else {
        return "Duplicate value".into();
    };

    let field = constraint
        .strip_suffix("_key")
        .unwrap_or(constraint)
        .split('_')
        .next_back()
        .unwrap_or("value");

    let mut chars = field.chars();
    let field = match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => "Value".to_string(),
    };

    format!("{field} already exists").into()
}

impl From<SystemError> for Error {
    fn from(value: SystemError) -> Self {
        match value {
            SystemError::BadRequest(code, msg) => Error::BadRequest(code, msg),
            SystemError::Unauthorized(msg) => Error::Unauthorized(ErrorCode::Unauthorized, msg),
            SystemError::Forbidden(code, msg) => Error::Forbidden(code, msg),
            SystemError::NotFound(code, msg) => Error::NotFound(code, msg),
            SystemError::Conflict(code, msg) => Error::Conflict(code, msg),
            SystemError::Unprocessable(code, msg) => Error::Unprocessable(code, msg),
            // token problems never leak as 500
            SystemError::JwtError(_) => {
                Error::Unauthorized(ErrorCode::Unauthorized, "Token Invalid or Expired".into())
            }
            _ => {
                log::error!("Internal Server Error: {:?}", value);
                Error::InternalServer
            }
        }
    }
}

impl From<sqlx::Error> for SystemError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => {
                    log::warn!("Unique violation: {}", db_err.message());
                    return SystemError::Conflict(
                        ErrorCode::DuplicateValue,
                        conflict_message(db_err.constraint()),
                    );
                }
                Some("23503") => {
                    log::warn!("Foreign key violation: {}", db_err.message());
                    return SystemError::not_found("Referenced resource not found");
                }
                Some("23514") => {
                    log::warn!("Check violation: {}", db_err.message());
                    return SystemError::bad_request("Value violates a data constraint");
                }
                _ => {
                    log::error!("Unhandled DB error: {:?}", db_err);
                    return SystemError::DatabaseError(db_err.message().to_string().into());
                }
            }
        }
        log::error!("{:?}", err);
        SystemError::InternalError(Box::new(err))
    }
}

impl SystemError {
    pub fn bad_request(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::BadRequest(ErrorCode::BadRequest, msg.into())
    }

    pub fn not_found(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::NotFound(ErrorCode::NotFound, msg.into())
    }

    pub fn unauthorized(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Forbidden(ErrorCode::Forbidden, msg.into())
    }

    pub fn conflict(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Conflict(ErrorCode::Conflict, msg.into())
    }

    pub fn unprocessable(msg: impl Into<Cow<'static, str>>) -> Self {
        Self::Unprocessable(ErrorCode::ValidationError, msg.into())
    }

    /// Replaces the code of a client facing error. Infrastructure errors are left untouched.
    pub fn with_code(self, code: ErrorCode) -> Self {
        match self {
            Self::BadRequest(_, msg) => Self::BadRequest(code, msg),
            Self::Forbidden(_, msg) => Self::Forbidden(code, msg),
            Self::NotFound(_, msg) => Self::NotFound(code, msg),
            Self::Conflict(_, msg) => Self::Conflict(code, msg),
            Self::Unprocessable(_, msg) => Self::Unprocessable(code, msg),
            other => other,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::BadRequest(code, _)
            | Self::Forbidden(code, _)
            | Self::NotFound(code, _)
            | Self::Conflict(code, _)
            | Self::Unprocessable(code, _) => Some(*code),
            Self::Unauthorized(_) => Some(ErrorCode::Unauthorized),
            _ => None,
        }
    }
}
