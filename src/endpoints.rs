use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A typed representation of the backend's endpoints.
///
/// Paths are relative to the configured base URL.
#[derive(Debug, Clone)]
pub enum ApiEndpoint {
    // Session endpoints
    Login,
    Me,
    Register,

    // Directory endpoints
    Employees,
    Employee(String),

    // Payroll endpoints
    Payroll,
    EmployeePayroll(String),
    Deductions,

    // Reimbursement endpoints
    Reimbursements,
    Reimbursement(Uuid),
    ApproveReimbursement(Uuid),

    DashboardAnalytics,
}

impl ApiEndpoint {
    fn path(&self) -> String {
        match self {
            Self::Login => "auth/login".to_string(),
            Self::Me => "auth/me".to_string(),
            Self::Register => "auth/register".to_string(),
            Self::Employees => "employees".to_string(),
            Self::Employee(id) => format!("employees/{}", encode_segment(id)),
            Self::Payroll => "payroll".to_string(),
            Self::EmployeePayroll(id) => format!("payroll/{}", encode_segment(id)),
            Self::Deductions => "deductions".to_string(),
            Self::Reimbursements => "reimbursements".to_string(),
            Self::Reimbursement(id) => format!("reimbursements/{id}"),
            Self::ApproveReimbursement(id) => format!("reimbursements/{id}/approve"),
            Self::DashboardAnalytics => "analytics/dashboard".to_string(),
        }
    }

    /// Resolves the endpoint against `base`.
    ///
    /// Employee ids that would not stay a single path segment are rejected.
    pub fn to_url(&self, base: &Url) -> Result<Url> {
        if let Self::Employee(id) | Self::EmployeePayroll(id) = self {
            check_segment(id)?;
        }
        base.join(&self.path()).map_err(|_| Error::InvalidEndpoint)
    }
}

impl fmt::Display for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Characters escaped inside a single path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'+')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Employee ids are externally assigned strings; keep them to one path segment.
fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

fn check_segment(segment: &str) -> Result<()> {
    match segment.trim() {
        "" | "." | ".." => Err(Error::validation("employee_id", "not a valid employee id")),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_below_the_base_path() {
        let base = Url::parse("http://localhost:8001/api/").unwrap();
        assert_eq!(
            ApiEndpoint::Employee("EMP0001".into()).to_url(&base).unwrap().as_str(),
            "http://localhost:8001/api/employees/EMP0001"
        );
        let id = Uuid::nil();
        assert_eq!(
            ApiEndpoint::ApproveReimbursement(id).to_url(&base).unwrap().as_str(),
            format!("http://localhost:8001/api/reimbursements/{id}/approve")
        );
    }

    #[test]
    fn employee_ids_cannot_escape_their_segment() {
        let base = Url::parse("http://localhost:8001/api/").unwrap();
        let url = ApiEndpoint::Employee("../auth/me".into()).to_url(&base).unwrap();
        assert_eq!(url.path(), "/api/employees/..%2Fauth%2Fme");

        for id in ["..", ".", ""] {
            for endpoint in [ApiEndpoint::Employee(id.into()), ApiEndpoint::EmployeePayroll(id.into())] {
                match endpoint.to_url(&base) {
                    Err(Error::Validation { field, .. }) => assert_eq!(field.as_deref(), Some("employee_id")),
                    other => panic!("expected validation error for {id:?}, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn reserved_characters_are_percent_encoded() {
        let base = Url::parse("http://localhost:8001/api/").unwrap();
        assert_eq!(
            ApiEndpoint::Employee("EMP 1".into()).to_url(&base).unwrap().as_str(),
            "http://localhost:8001/api/employees/EMP%201"
        );
        assert_eq!(
            ApiEndpoint::EmployeePayroll("A+B?x#y".into()).to_url(&base).unwrap().path(),
            "/api/payroll/A%2BB%3Fx%23y"
        );
        assert_eq!(
            ApiEndpoint::Employee("EMP-0001.v2".into()).to_url(&base).unwrap().path(),
            "/api/employees/EMP-0001.v2"
        );
    }
}
