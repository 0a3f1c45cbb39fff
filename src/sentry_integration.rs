//! Sentry integration for payslip-rs errors.
//!
//! Only available when the `sentry` feature is enabled.
//!
//! ```toml
//! [dependencies]
//! payslip-rs = { version = "0.1", features = ["sentry"] }
//! ```
//!
//! Span traces are only populated when the subscriber includes
//! `tracing_error::ErrorLayer`:
//!
//! ```ignore
//! use tracing_subscriber::prelude::*;
//! use tracing_error::ErrorLayer;
//!
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer())
//!     .with(ErrorLayer::default())
//!     .with(sentry::integrations::tracing::layer())
//!     .init();
//! ```

use std::collections::BTreeMap;

use sentry_core::{Breadcrumb, protocol::Value};

use crate::error::Error;

const MAX_BODY_PREVIEW: usize = 500;

/// Convert a payslip-rs Error into a Sentry breadcrumb.
impl<'a> From<&'a Error> for Breadcrumb {
    fn from(error: &'a Error) -> Self {
        let mut data = BTreeMap::new();
        let (category, message) = match error {
            Error::Request { source, .. } => ("http.request", format!("HTTP request error: {source}")),

            Error::Timeout { url, .. } => {
                data.insert("url".to_string(), Value::from(url.clone()));
                ("http.request", "Request timed out".to_string())
            }

            Error::DeserializationError {
                entity_type, url, ..
            } => {
                data.insert("entity_type".to_string(), Value::from(entity_type.clone()));
                data.insert("url".to_string(), Value::from(url.clone()));
                (
                    "http.response",
                    format!("Failed to deserialize {entity_type} response"),
                )
            }

            Error::NotFound { entity, id, .. } => {
                data.insert("entity".to_string(), Value::from(entity.clone()));
                data.insert("id".to_string(), Value::from(id.clone()));
                ("http.response", format!("{entity} not found"))
            }

            Error::Conflict { message, url } => {
                data.insert("url".to_string(), Value::from(url.clone()));
                ("payslip.conflict", message.clone())
            }

            Error::Authentication { .. } => ("auth", "Authentication failed".to_string()),

            Error::Authorization {
                role, operation, ..
            } => {
                data.insert("operation".to_string(), Value::from(operation.clone()));
                if let Some(role) = role {
                    data.insert("role".to_string(), Value::from(role.as_str()));
                }
                ("auth", format!("{operation} not permitted"))
            }

            Error::Validation { field, message } => {
                if let Some(field) = field {
                    data.insert("field".to_string(), Value::from(field.clone()));
                }
                ("payslip.validation", message.clone())
            }

            Error::InvalidState {
                id,
                status,
                requested,
            } => {
                data.insert("reimbursement_id".to_string(), Value::from(id.to_string()));
                data.insert("status".to_string(), Value::from(status.as_str()));
                data.insert("requested".to_string(), Value::from(requested.as_str()));
                ("payslip.workflow", "Invalid reimbursement transition".to_string())
            }

            Error::Unreconciled { record_id, detail } => {
                data.insert("record_id".to_string(), Value::from(record_id.to_string()));
                ("payslip.payroll", detail.clone())
            }

            Error::RateLimitExceeded {
                retry_after, url, ..
            } => {
                data.insert("url".to_string(), Value::from(url.clone()));
                if let Some(retry) = retry_after {
                    data.insert("retry_after_secs".to_string(), Value::from(retry.as_secs()));
                }
                ("payslip.rate_limit", "Rate limit exceeded".to_string())
            }

            Error::Api {
                status_code,
                url,
                message,
                ..
            } => {
                data.insert("status_code".to_string(), Value::from(status_code.as_u16()));
                data.insert("url".to_string(), Value::from(url.clone()));
                (
                    "payslip.api",
                    message
                        .clone()
                        .unwrap_or_else(|| format!("Unexpected status {status_code}")),
                )
            }

            Error::InvalidEndpoint => ("payslip.config", "Invalid endpoint URL".to_string()),

            Error::Configuration { message } => ("payslip.config", message.clone()),

            Error::Storage(e) => ("payslip.storage", format!("Credential storage failed: {e}")),
        };

        Breadcrumb {
            ty: "error".to_string(),
            category: Some(category.to_string()),
            message: Some(message),
            data,
            level: sentry_core::Level::Error,
            ..Default::default()
        }
    }
}

/// Extracts error details for use as additional Sentry context.
///
/// ```ignore
/// use sentry::configure_scope;
/// use payslip_rs::sentry_integration::error_to_sentry_context;
///
/// if let Err(e) = session.payroll()?.list().await {
///     configure_scope(|scope| {
///         for (key, value) in error_to_sentry_context(&e) {
///             scope.set_extra(&key, value);
///         }
///     });
/// }
/// ```
pub fn error_to_sentry_context(error: &Error) -> BTreeMap<String, Value> {
    let mut context = BTreeMap::new();

    if let Some(span_trace) = error.span_trace() {
        context.insert(
            "payslip.span_trace".to_string(),
            Value::from(format!("{span_trace}")),
        );
    }

    if let Some(url) = error.url() {
        context.insert("payslip.url".to_string(), Value::from(url.to_string()));
    }

    if let Some(status) = error.status_code() {
        context.insert("payslip.status_code".to_string(), Value::from(status.as_u16()));
    }

    if let Some(body) = error.response_body() {
        let truncated = if body.len() > MAX_BODY_PREVIEW {
            let cut = (0..=MAX_BODY_PREVIEW)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            format!("{}...", &body[..cut])
        } else {
            body.to_string()
        };
        context.insert("payslip.response_body".to_string(), Value::from(truncated));
    }

    context.insert("payslip.transient".to_string(), Value::from(error.is_transient()));

    context
}
