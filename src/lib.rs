//! # payslip-rs
//!
//! Client-side orchestration for employee management, monthly payroll and
//! expense reimbursement against a payroll backend, with three roles:
//! administrator, payroll officer and employee.
//!
//! ```ignore
//! use payslip_rs::{Config, Session, entities::{PayPeriod, PayrollRequest}};
//!
//! let session = Session::new(Config::from_env()?)?;
//! let ctx = session.login("payroll", "payroll123").await?;
//!
//! let period = PayPeriod::new(6, 2024)?;
//! let record = ctx.payroll()?.process(&PayrollRequest::new("EMP0001", period)).await?;
//! println!("net salary: {}", record.net_salary);
//! ```
//!
//! Handles such as [`SessionContext::payroll`] check the user's role before
//! any request is made. [`SessionContext::profile`] exposes the same handles
//! through role-typed desks instead.
//!
//! ## Sentry Integration
//!
//! Transport errors capture a [`SpanTrace`] when the subscriber includes
//! `tracing_error::ErrorLayer`. With the `sentry` feature enabled, errors
//! convert into Sentry breadcrumbs:
//!
//! ```ignore
//! if let Err(e) = ctx.payroll()?.list().await {
//!     if let Some(trace) = e.span_trace() {
//!         eprintln!("Span trace:\n{}", trace);
//!     }
//!     sentry::capture_error(&e);
//! }
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]

#[macro_use]
extern crate tracing;

pub mod client;
pub mod config;
pub mod dashboard;
pub mod directory;
pub mod endpoints;
pub mod entities;
pub mod error;
pub mod payroll;
pub mod profile;
pub mod reimbursement;
pub mod role;
pub mod session;
pub mod utils;

#[cfg(feature = "sentry")]
pub mod sentry_integration;

pub use client::{AccessToken, Client};
pub use config::Config;
pub use dashboard::{Dashboard, DashboardView};
pub use endpoints::ApiEndpoint;
pub use error::{Error, Result};
pub use profile::RoleProfile;
pub use role::{Capability, Role};
pub use session::{FileTokenStore, MemoryTokenStore, Session, SessionContext, TokenStore};

// Re-export SpanTrace for users who want to access it
pub use tracing_error::SpanTrace;
