//! # Errors (Feathers-style)
//!
//! Denial is an ordinary [`Decision`](crate::Decision) value. `AccessError`
//! only shows up when a caller explicitly turns a decision into a failure
//! (`Decision::enforce`), when a guard rejects a field write, when a
//! storage-layer validator reports field messages, or when the engine is
//! misused (e.g. a tenant update decision without a target id).
//!
//! Errors can be carried through `anyhow::Error`, so they flow through the
//! async hook pipeline unchanged and can be recovered with
//! [`AccessError::from_anyhow`].

use anyhow::Error as AnyError;
use serde_json::Value;

/// A convenience result type for tenancy APIs.
pub type AccessResult<T> = std::result::Result<T, AccessError>;

/// Feathers-ish error class names + status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,       // 400
    NotAuthenticated, // 401
    Forbidden,        // 403
    NotFound,         // 404
    Unprocessable,    // 422
    GeneralError,     // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotAuthenticated => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Unprocessable => 422,
            ErrorKind::GeneralError => 500,
        }
    }

    /// Feathers error `name` (e.g. "NotFound")
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotAuthenticated => "NotAuthenticated",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Unprocessable => "Unprocessable",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    /// Feathers error `className` (kebab-cased)
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotAuthenticated => "not-authenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Unprocessable => "unprocessable",
            ErrorKind::GeneralError => "general-error",
        }
    }
}

/// A structured access error that can live inside `anyhow::Error`.
///
/// `errors` carries field-level messages (`{"slug": ["..."]}`) for
/// validation failures and the rejected field names for guard failures.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{} ({}): {message}", .kind.name(), .kind.status_code())]
pub struct AccessError {
    pub kind: ErrorKind,
    pub message: String,
    pub errors: Option<Value>,
}

impl AccessError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: Value) -> Self {
        self.errors = Some(errors);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    /// Convert into `anyhow::Error` so it flows through the hook pipeline.
    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    /// Downcast an `anyhow::Error` to an `AccessError` if possible.
    pub fn from_anyhow(err: &AnyError) -> Option<&AccessError> {
        err.downcast_ref::<AccessError>()
    }

    /// Turn any error into an AccessError:
    /// - if it's already an AccessError, keep it
    /// - otherwise wrap as GeneralError
    pub fn normalize(err: AnyError) -> AccessError {
        match err.downcast::<AccessError>() {
            Ok(access) => access,
            Err(other) => AccessError::general_error(other.to_string()),
        }
    }

    /// Feathers-ish JSON payload.
    pub fn to_json(&self) -> Value {
        let mut base = serde_json::json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });
        if let Some(e) = &self.errors {
            base["errors"] = e.clone();
        }
        base
    }

    // ---- Constructors ----

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_authenticated(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotAuthenticated, msg)
    }
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unprocessable, msg)
    }
    pub fn general_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeneralError, msg)
    }
}

/// Convenience helper for "bail with AccessError".
#[macro_export]
macro_rules! bail_access {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::AccessError::$ctor($msg).into_anyhow());
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::AccessError::$ctor(format!($fmt, $($arg)*)).into_anyhow());
    };
}
