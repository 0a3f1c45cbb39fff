//! Role-specific landing views.
//!
//! A [`Dashboard`] loads everything its user's role is shown and reloads all
//! of it after each successful change made through it, so the view never
//! mixes data from before and after a write.
//!
//! A write that the backend accepted is always reported as such. If the
//! reload after it fails, the previous view stays in place and the failure
//! is kept in [`Dashboard::stale`] until a later reload succeeds.

use uuid::Uuid;

use crate::endpoints::ApiEndpoint;
use crate::entities::{
    ClaimForm, DashboardAnalytics, Deduction, Employee, EmployeeForm, PayPeriod, PayrollRecord,
    PayrollRequest, Reimbursement,
};
use crate::error::{Error, Result};
use crate::payroll::BulkOutcome;
use crate::profile::RoleProfile;
use crate::role::Capability;
use crate::session::SessionContext;

/// Organization-wide figures, for administrators and payroll officers.
#[derive(Clone, Copy, Debug)]
pub struct AnalyticsApi<'a> {
    session: &'a SessionContext,
}

impl<'a> AnalyticsApi<'a> {
    pub(crate) fn new(session: &'a SessionContext) -> Self {
        Self { session }
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardAnalytics> {
        self.session.client().get(ApiEndpoint::DashboardAnalytics).await
    }
}

impl SessionContext {
    pub fn analytics(&self) -> Result<AnalyticsApi<'_>> {
        self.require(Capability::ViewAnalytics)?;
        Ok(AnalyticsApi::new(self))
    }
}

#[derive(Clone, Debug)]
pub struct AdminOverview {
    pub analytics: DashboardAnalytics,
    pub employees: Vec<Employee>,
    pub payroll_records: Vec<PayrollRecord>,
    pub pending_reimbursements: Vec<Reimbursement>,
    pub deductions: Vec<Deduction>,
}

#[derive(Clone, Debug)]
pub struct OfficerOverview {
    pub analytics: DashboardAnalytics,
    pub payroll_records: Vec<PayrollRecord>,
    pub deductions: Vec<Deduction>,
}

#[derive(Clone, Debug)]
pub struct EmployeeOverview {
    pub payroll_records: Vec<PayrollRecord>,
    pub reimbursements: Vec<Reimbursement>,
}

#[derive(Clone, Debug)]
pub enum DashboardView {
    Administrator(AdminOverview),
    PayrollOfficer(OfficerOverview),
    Employee(EmployeeOverview),
}

impl DashboardView {
    /// Payroll records shown in this view.
    #[must_use]
    pub fn payroll_records(&self) -> &[PayrollRecord] {
        match self {
            Self::Administrator(view) => &view.payroll_records,
            Self::PayrollOfficer(view) => &view.payroll_records,
            Self::Employee(view) => &view.payroll_records,
        }
    }

    #[must_use]
    pub fn analytics(&self) -> Option<&DashboardAnalytics> {
        match self {
            Self::Administrator(view) => Some(&view.analytics),
            Self::PayrollOfficer(view) => Some(&view.analytics),
            Self::Employee(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct Dashboard {
    session: SessionContext,
    view: DashboardView,
    stale: Option<Error>,
}

impl Dashboard {
    #[instrument(skip(session), fields(user = %session.user().username, role = %session.role()))]
    pub async fn load(session: SessionContext) -> Result<Self> {
        let view = fetch_view(&session).await?;
        Ok(Self {
            session,
            view,
            stale: None,
        })
    }

    #[must_use]
    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Why the view predates the last accepted write, if it does.
    #[must_use]
    pub fn stale(&self) -> Option<&Error> {
        self.stale.as_ref()
    }

    /// Reloads every part of the view. On failure the previous view is kept.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<()> {
        self.view = fetch_view(&self.session).await?;
        self.stale = None;
        Ok(())
    }

    async fn refresh_after_write(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "write accepted but the dashboard could not be reloaded");
            self.stale = Some(e);
        }
    }

    pub async fn create_employee(&mut self, form: &EmployeeForm) -> Result<Employee> {
        let employee = self.session.directory()?.create(form).await?;
        self.refresh_after_write().await;
        Ok(employee)
    }

    pub async fn update_employee(&mut self, employee_id: &str, form: &EmployeeForm) -> Result<Employee> {
        let employee = self.session.directory()?.update(employee_id, form).await?;
        self.refresh_after_write().await;
        Ok(employee)
    }

    pub async fn process_payroll(&mut self, request: &PayrollRequest) -> Result<PayrollRecord> {
        let record = self.session.payroll()?.process(request).await?;
        self.refresh_after_write().await;
        Ok(record)
    }

    /// Runs bulk payroll and refreshes if at least one employee succeeded.
    pub async fn process_bulk(&mut self, employee_ids: &[String], period: PayPeriod) -> Result<BulkOutcome> {
        let outcome = self.session.payroll()?.process_bulk(employee_ids, period).await;
        if !outcome.succeeded.is_empty() {
            self.refresh_after_write().await;
        }
        Ok(outcome)
    }

    pub async fn submit_claim(&mut self, form: &ClaimForm) -> Result<Reimbursement> {
        let claim = self.session.claims()?.submit(form).await?;
        self.refresh_after_write().await;
        Ok(claim)
    }

    pub async fn approve(&mut self, id: Uuid) -> Result<Reimbursement> {
        let claim = self.session.review()?.approve(id).await?;
        self.refresh_after_write().await;
        Ok(claim)
    }

    pub async fn reject(&mut self, id: Uuid) -> Result<Reimbursement> {
        let claim = self.session.review()?.reject(id).await?;
        self.refresh_after_write().await;
        Ok(claim)
    }
}

async fn fetch_view(session: &SessionContext) -> Result<DashboardView> {
    let view = match session.profile() {
        RoleProfile::Administrator(desk) => DashboardView::Administrator(AdminOverview {
            analytics: desk.analytics().dashboard().await?,
            employees: desk.directory().list().await?,
            payroll_records: desk.payroll().list().await?,
            pending_reimbursements: desk.review().pending().await?,
            deductions: desk.deductions().list().await?,
        }),
        RoleProfile::PayrollOfficer(desk) => DashboardView::PayrollOfficer(OfficerOverview {
            analytics: desk.analytics().dashboard().await?,
            payroll_records: desk.payroll().list().await?,
            deductions: desk.deductions().list().await?,
        }),
        RoleProfile::Employee(desk) => {
            let payroll_records = desk.payslips().list().await?;
            let reimbursements = match desk.claims() {
                Some(claims) => claims.list().await?,
                None => Vec::new(),
            };
            DashboardView::Employee(EmployeeOverview {
                payroll_records,
                reimbursements,
            })
        }
    };

    debug!(records = view.payroll_records().len(), "dashboard loaded");
    Ok(view)
}
