pub mod analytics;
pub mod deduction;
pub mod employee;
pub mod payroll_record;
pub mod reimbursement;
pub mod user;

pub use analytics::DashboardAnalytics;
pub use deduction::{AppliedDeduction, Deduction, DeductionKind};
pub use employee::{Department, Employee, EmployeeDraft, EmployeeForm, EmployeeStatus};
pub use payroll_record::{PayPeriod, PayrollRecord, PayrollRequest, PayrollStatus};
pub use reimbursement::{ClaimForm, NewClaim, Reimbursement, ReimbursementStatus};
pub use user::{RegistrationResponse, User, UserRegistration};
