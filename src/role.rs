use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Access role carried by an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    PayrollOfficer,
    Employee,
}

/// An operation family a role may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// List, create and update employees.
    ManageEmployees,
    /// Read a single employee record (admins: any, employees: their own).
    ViewEmployee,
    /// Trigger payroll computation and read every payroll record.
    ProcessPayroll,
    /// Read payroll records visible to the caller.
    ViewPayslips,
    /// Submit expense claims for the caller's own employee record.
    SubmitClaims,
    /// Approve or reject pending claims.
    ReviewClaims,
    /// Read the deduction catalog.
    ViewDeductions,
    /// Read the dashboard analytics summary.
    ViewAnalytics,
}

impl Capability {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManageEmployees => "employees.manage",
            Self::ViewEmployee => "employees.read",
            Self::ProcessPayroll => "payroll.process",
            Self::ViewPayslips => "payroll.read",
            Self::SubmitClaims => "reimbursements.submit",
            Self::ReviewClaims => "reimbursements.review",
            Self::ViewDeductions => "deductions.read",
            Self::ViewAnalytics => "analytics.read",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Role {
    /// Capabilities granted to this role.
    #[must_use]
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Admin => &[
                Capability::ManageEmployees,
                Capability::ViewEmployee,
                Capability::ProcessPayroll,
                Capability::ViewPayslips,
                Capability::ReviewClaims,
                Capability::ViewDeductions,
                Capability::ViewAnalytics,
            ],
            Self::PayrollOfficer => &[
                Capability::ProcessPayroll,
                Capability::ViewPayslips,
                Capability::ViewDeductions,
                Capability::ViewAnalytics,
            ],
            Self::Employee => &[
                Capability::ViewEmployee,
                Capability::ViewPayslips,
                Capability::SubmitClaims,
            ],
        }
    }

    #[must_use]
    pub fn allows(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Fails with `Error::Authorization` unless the role holds `capability`.
    pub fn require(self, capability: Capability) -> Result<()> {
        if self.allows(capability) {
            Ok(())
        } else {
            trace!(role = %self, %capability, "capability denied");
            Err(Error::forbidden(self, capability.as_str()))
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::PayrollOfficer => "payroll_officer",
            Self::Employee => "employee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing a role from a string
#[derive(Debug, Clone)]
pub struct ParseRoleError(String);

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid role string: {}", self.0)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "payroll_officer" => Ok(Self::PayrollOfficer),
            "employee" => Ok(Self::Employee),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}
