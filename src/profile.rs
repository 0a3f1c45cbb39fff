//! Role-typed views over a session.
//!
//! Each desk only exposes the handles its role may use, so a caller that
//! matches on [`RoleProfile`] cannot reach an operation the role lacks.

use crate::directory::DirectoryApi;
use crate::dashboard::AnalyticsApi;
use crate::entities::Employee;
use crate::error::Result;
use crate::payroll::{DeductionsApi, PayrollApi, PayslipsApi};
use crate::reimbursement::{ClaimsApi, ReviewApi};
use crate::role::Role;
use crate::session::SessionContext;

#[derive(Clone, Copy, Debug)]
pub enum RoleProfile<'a> {
    Administrator(AdminDesk<'a>),
    PayrollOfficer(OfficerDesk<'a>),
    Employee(EmployeeDesk<'a>),
}

impl RoleProfile<'_> {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Administrator(_) => Role::Admin,
            Self::PayrollOfficer(_) => Role::PayrollOfficer,
            Self::Employee(_) => Role::Employee,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AdminDesk<'a> {
    session: &'a SessionContext,
}

impl<'a> AdminDesk<'a> {
    #[must_use]
    pub fn directory(&self) -> DirectoryApi<'a> {
        DirectoryApi::new(self.session)
    }

    #[must_use]
    pub fn payroll(&self) -> PayrollApi<'a> {
        PayrollApi::new(self.session)
    }

    #[must_use]
    pub fn payslips(&self) -> PayslipsApi<'a> {
        PayslipsApi::new(self.session)
    }

    #[must_use]
    pub fn review(&self) -> ReviewApi<'a> {
        ReviewApi::new(self.session)
    }

    #[must_use]
    pub fn deductions(&self) -> DeductionsApi<'a> {
        DeductionsApi::new(self.session)
    }

    #[must_use]
    pub fn analytics(&self) -> AnalyticsApi<'a> {
        AnalyticsApi::new(self.session)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OfficerDesk<'a> {
    session: &'a SessionContext,
}

impl<'a> OfficerDesk<'a> {
    #[must_use]
    pub fn payroll(&self) -> PayrollApi<'a> {
        PayrollApi::new(self.session)
    }

    #[must_use]
    pub fn payslips(&self) -> PayslipsApi<'a> {
        PayslipsApi::new(self.session)
    }

    #[must_use]
    pub fn deductions(&self) -> DeductionsApi<'a> {
        DeductionsApi::new(self.session)
    }

    #[must_use]
    pub fn analytics(&self) -> AnalyticsApi<'a> {
        AnalyticsApi::new(self.session)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct EmployeeDesk<'a> {
    session: &'a SessionContext,
}

impl<'a> EmployeeDesk<'a> {
    /// The caller's own payroll records.
    #[must_use]
    pub fn payslips(&self) -> PayslipsApi<'a> {
        PayslipsApi::new(self.session)
    }

    /// `None` when the account isn't linked to an employee record.
    #[must_use]
    pub fn claims(&self) -> Option<ClaimsApi<'a>> {
        self.session
            .employee_id()
            .map(|_| ClaimsApi::new(self.session))
    }

    pub async fn own_record(&self) -> Result<Employee> {
        self.session.own_employee_record().await
    }
}

impl SessionContext {
    /// The desk matching this user's role.
    #[must_use]
    pub fn profile(&self) -> RoleProfile<'_> {
        match self.role() {
            Role::Admin => RoleProfile::Administrator(AdminDesk { session: self }),
            Role::PayrollOfficer => RoleProfile::PayrollOfficer(OfficerDesk { session: self }),
            Role::Employee => RoleProfile::Employee(EmployeeDesk { session: self }),
        }
    }
}
