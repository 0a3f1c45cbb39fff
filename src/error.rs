use std::fmt;
use std::time::Duration;

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;
use tracing_error::SpanTrace;
use uuid::Uuid;

use crate::entities::reimbursement::ReimbursementStatus;
use crate::role::Role;

/// Error body returned by the backend.
///
/// The backend answers failures with `{"detail": "..."}`, or with a list of
/// field errors when request validation fails before a handler runs.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub detail: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
}

impl FieldError {
    /// Last path component of `loc`, which names the offending field.
    #[must_use]
    pub fn field(&self) -> Option<String> {
        self.loc.last().map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

impl ErrorResponse {
    /// Decode an error body, returning `None` if it isn't in the backend's format.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }

    /// First field named by a field-level error, if any.
    #[must_use]
    pub fn field(&self) -> Option<String> {
        match &self.detail {
            ErrorDetail::Message(_) => None,
            ErrorDetail::Fields(fields) => fields.first().and_then(FieldError::field),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            ErrorDetail::Message(message) => write!(f, "{message}"),
            ErrorDetail::Fields(fields) => {
                let messages = fields
                    .iter()
                    .map(|e| match e.field() {
                        Some(field) => format!("{field}: {}", e.msg),
                        None => e.msg.clone(),
                    })
                    .collect::<Vec<_>>();
                write!(f, "{}", messages.join("; "))
            }
        }
    }
}

/// Errors that can occur when working with the payroll backend.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("error making request: {source}")]
    #[diagnostic(
        code(payslip_rs::request_error),
        help("Check your network connection and backend availability")
    )]
    Request {
        #[source]
        source: reqwest::Error,
        span_trace: SpanTrace,
    },

    #[error("request to {url} timed out")]
    #[diagnostic(
        code(payslip_rs::timeout),
        help("The backend did not answer within the configured request timeout")
    )]
    Timeout { url: String, span_trace: SpanTrace },

    #[error("error decoding {entity_type} response: {source}")]
    #[diagnostic(
        code(payslip_rs::deserialization_error),
        help("The backend returned data in an unexpected format")
    )]
    DeserializationError {
        #[source]
        source: serde_json::Error,
        entity_type: String,
        url: String,
        response_body: Option<String>,
    },

    #[error("endpoint could not be parsed as a URL")]
    #[diagnostic(
        code(payslip_rs::invalid_endpoint),
        help("Check that the configured base URL is an absolute http(s) URL")
    )]
    InvalidEndpoint,

    #[error("invalid configuration: {message}")]
    #[diagnostic(code(payslip_rs::configuration))]
    Configuration { message: String },

    #[error("credential storage failed: {0}")]
    #[diagnostic(code(payslip_rs::storage))]
    Storage(#[source] std::io::Error),

    /// Bad credentials, or a token the backend no longer accepts.
    #[error("authentication failed: {message}")]
    #[diagnostic(
        code(payslip_rs::authentication),
        help("Log in again with valid credentials")
    )]
    Authentication { message: String },

    /// The caller's role may not perform the operation, or there is no active session.
    #[error("{operation} is not permitted: {message}")]
    #[diagnostic(code(payslip_rs::authorization))]
    Authorization {
        role: Option<Role>,
        operation: String,
        message: String,
    },

    #[error("invalid input{}: {message}", .field.as_ref().map(|f| format!(" for `{f}`")).unwrap_or_default())]
    #[diagnostic(code(payslip_rs::validation))]
    Validation {
        field: Option<String>,
        message: String,
    },

    #[error("{entity} not found: {id}")]
    #[diagnostic(
        code(payslip_rs::not_found),
        help("Verify that the {entity} exists and is visible to the current user")
    )]
    NotFound {
        entity: String,
        id: String,
        url: Option<String>,
        response_body: Option<String>,
    },

    #[error("conflict: {message}")]
    #[diagnostic(code(payslip_rs::conflict))]
    Conflict { message: String, url: String },

    /// A reimbursement in a terminal state cannot transition again.
    #[error("reimbursement {id} is already {status} and cannot become {requested}")]
    #[diagnostic(code(payslip_rs::invalid_state))]
    InvalidState {
        id: Uuid,
        status: ReimbursementStatus,
        requested: ReimbursementStatus,
    },

    /// A payroll record returned by the backend whose amounts don't add up.
    #[error("payroll record {record_id} does not reconcile: {detail}")]
    #[diagnostic(
        code(payslip_rs::unreconciled),
        help("gross must equal base + overtime + bonuses, and net must equal gross - deductions")
    )]
    Unreconciled { record_id: Uuid, detail: String },

    #[error("rate limit exceeded: retry after {retry_after:?}")]
    #[diagnostic(
        code(payslip_rs::rate_limit_exceeded),
        help("The backend is throttling requests. Wait and retry.")
    )]
    RateLimitExceeded {
        retry_after: Option<Duration>,
        url: String,
        response_body: Option<String>,
    },

    #[error("unexpected response ({status_code}) from {url}{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    #[diagnostic(code(payslip_rs::api))]
    Api {
        status_code: reqwest::StatusCode,
        url: String,
        message: Option<String>,
        span_trace: SpanTrace,
    },
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let span_trace = SpanTrace::capture();
        if e.is_timeout() {
            return Self::Timeout {
                url: e.url().map(ToString::to_string).unwrap_or_default(),
                span_trace,
            };
        }
        Self::Request {
            source: e,
            span_trace,
        }
    }
}

impl Error {
    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub(crate) fn forbidden(role: Role, operation: &str) -> Self {
        Self::Authorization {
            role: Some(role),
            operation: operation.to_string(),
            message: format!("the {role} role lacks permission"),
        }
    }

    pub(crate) fn no_session(operation: &str) -> Self {
        Self::Authorization {
            role: None,
            operation: operation.to_string(),
            message: "no active session".to_string(),
        }
    }

    pub(crate) fn session_replaced(operation: &str) -> Self {
        Self::Authorization {
            role: None,
            operation: operation.to_string(),
            message: "session replaced by a newer login".to_string(),
        }
    }

    /// Names the entity and id a `NotFound` refers to. Other errors pass through.
    pub(crate) fn for_entity(self, entity: &str, id: impl fmt::Display) -> Self {
        match self {
            Self::NotFound {
                url, response_body, ..
            } => Self::NotFound {
                entity: entity.to_string(),
                id: id.to_string(),
                url,
                response_body,
            },
            other => other,
        }
    }

    /// Span trace captured where the error was created, if any.
    #[must_use]
    pub fn span_trace(&self) -> Option<&SpanTrace> {
        match self {
            Self::Request { span_trace, .. }
            | Self::Timeout { span_trace, .. }
            | Self::Api { span_trace, .. } => Some(span_trace),
            _ => None,
        }
    }

    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Timeout { url, .. }
            | Self::DeserializationError { url, .. }
            | Self::Conflict { url, .. }
            | Self::RateLimitExceeded { url, .. }
            | Self::Api { url, .. } => Some(url),
            Self::NotFound { url, .. } => url.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn status_code(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Request { source, .. } => source.status(),
            Self::Api { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::DeserializationError { response_body, .. }
            | Self::NotFound { response_body, .. }
            | Self::RateLimitExceeded { response_body, .. } => response_body.as_deref(),
            _ => None,
        }
    }

    /// Whether retrying the same request could succeed without changing it.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request { .. } | Self::Timeout { .. } | Self::RateLimitExceeded { .. } => true,
            Self::Api { status_code, .. } => status_code.is_server_error(),
            _ => false,
        }
    }
}

/// Type alias for results from this crate.
///
/// This is already a Miette diagnostic result due to the implementation of
/// the Diagnostic trait for the Error type.
pub type Result<O> = std::result::Result<O, Error>;
