//! Payroll processing and payslip access.

pub mod bulk;
pub mod calculation;

pub use bulk::{BulkFailure, BulkOutcome};
pub use calculation::PayrollBreakdown;

use crate::endpoints::ApiEndpoint;
use crate::entities::{Deduction, PayPeriod, PayrollRecord, PayrollRequest};
use crate::error::Result;
use crate::role::Capability;
use crate::session::SessionContext;

/// Payroll processing, for administrators and payroll officers.
#[derive(Clone, Copy, Debug)]
pub struct PayrollApi<'a> {
    session: &'a SessionContext,
}

impl<'a> PayrollApi<'a> {
    pub(crate) fn new(session: &'a SessionContext) -> Self {
        Self { session }
    }

    /// Every payroll record.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<PayrollRecord>> {
        self.session.client().get(ApiEndpoint::Payroll).await
    }

    /// Payroll records of one employee.
    #[instrument(skip(self))]
    pub async fn history_for(&self, employee_id: &str) -> Result<Vec<PayrollRecord>> {
        self.session
            .client()
            .get(ApiEndpoint::EmployeePayroll(employee_id.to_string()))
            .await
    }

    /// Records already processed for `period`.
    ///
    /// The backend accepts repeated runs for the same period, so callers that
    /// want one record per employee and month check here first.
    #[instrument(skip(self))]
    pub async fn records_for_period(&self, period: PayPeriod) -> Result<Vec<PayrollRecord>> {
        let records = self.list().await?;
        Ok(records.into_iter().filter(|r| r.covers(period)).collect())
    }

    /// Computes payroll for one employee and period.
    ///
    /// The returned record is checked against its own components; a mismatch
    /// is reported as `Error::Unreconciled`.
    #[instrument(skip(self, request), fields(employee_id = %request.employee_id, month = request.month, year = request.year))]
    pub async fn process(&self, request: &PayrollRequest) -> Result<PayrollRecord> {
        request.validate()?;
        let record: PayrollRecord = self
            .session
            .client()
            .post_endpoint(ApiEndpoint::Payroll, request)
            .await
            .map_err(|e| e.for_entity("Employee", &request.employee_id))?;

        record.reconcile()?;
        debug!(record_id = %record.id, net = %record.net_salary, "payroll processed");
        Ok(record)
    }
}

/// Payroll records visible to the caller.
///
/// Employees only ever receive their own records; the backend does the scoping.
#[derive(Clone, Copy, Debug)]
pub struct PayslipsApi<'a> {
    session: &'a SessionContext,
}

impl<'a> PayslipsApi<'a> {
    pub(crate) fn new(session: &'a SessionContext) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<PayrollRecord>> {
        self.session.client().get(ApiEndpoint::Payroll).await
    }
}

/// The deduction catalog applied to every payroll run.
#[derive(Clone, Copy, Debug)]
pub struct DeductionsApi<'a> {
    session: &'a SessionContext,
}

impl<'a> DeductionsApi<'a> {
    pub(crate) fn new(session: &'a SessionContext) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Deduction>> {
        self.session.client().get(ApiEndpoint::Deductions).await
    }
}

impl SessionContext {
    pub fn payroll(&self) -> Result<PayrollApi<'_>> {
        self.require(Capability::ProcessPayroll)?;
        Ok(PayrollApi::new(self))
    }

    pub fn payslips(&self) -> Result<PayslipsApi<'_>> {
        self.require(Capability::ViewPayslips)?;
        Ok(PayslipsApi::new(self))
    }

    pub fn deductions(&self) -> Result<DeductionsApi<'_>> {
        self.require(Capability::ViewDeductions)?;
        Ok(DeductionsApi::new(self))
    }
}
