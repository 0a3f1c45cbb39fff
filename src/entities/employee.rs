use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{Error, Result};
use crate::utils::date_format::{parse_timestamp, timestamp_format, timestamp_format_option};
use crate::utils::serde_helpers::{parse_positive_amount, required};

/// Organizational department.
///
/// Values outside the known set are kept as `Other` when read from the
/// backend, but are rejected when submitted through an [`EmployeeForm`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
#[allow(clippy::upper_case_acronyms)]
pub enum Department {
    Engineering,
    Sales,
    Marketing,
    HR,
    Finance,
    Operations,
    CustomerSupport,
    ProductManagement,
    Design,
    Legal,
    IT,
    Research,
    Other(String),
}

impl Department {
    pub const KNOWN: [Department; 12] = [
        Self::Engineering,
        Self::Sales,
        Self::Marketing,
        Self::HR,
        Self::Finance,
        Self::Operations,
        Self::CustomerSupport,
        Self::ProductManagement,
        Self::Design,
        Self::Legal,
        Self::IT,
        Self::Research,
    ];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Engineering => "Engineering",
            Self::Sales => "Sales",
            Self::Marketing => "Marketing",
            Self::HR => "HR",
            Self::Finance => "Finance",
            Self::Operations => "Operations",
            Self::CustomerSupport => "Customer Support",
            Self::ProductManagement => "Product Management",
            Self::Design => "Design",
            Self::Legal => "Legal",
            Self::IT => "IT",
            Self::Research => "Research",
            Self::Other(name) => name,
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for Department {
    fn from(value: String) -> Self {
        Self::KNOWN
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(value.trim()))
            .unwrap_or(Self::Other(value))
    }
}

impl From<Department> for String {
    fn from(value: Department) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employment status. Deactivation is the only removal path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    #[default]
    Active,
    #[serde(alias = "terminated")]
    Inactive,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Employee {
    /// Backend-internal identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Externally assigned identifier, e.g. `EMP0001`.
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub department: Department,
    pub position: String,
    #[serde(with = "timestamp_format")]
    pub joining_date: OffsetDateTime,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_salary: Decimal,
    pub bank_account: String,
    pub tax_id: String,
    pub address: String,
    #[serde(default)]
    pub status: EmployeeStatus,
    #[serde(default, with = "timestamp_format_option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<OffsetDateTime>,
}

impl Employee {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    /// An editable form pre-filled with this record.
    #[must_use]
    pub fn to_form(&self) -> EmployeeForm {
        EmployeeForm {
            employee_id: self.employee_id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            department: self.department.to_string(),
            position: self.position.clone(),
            joining_date: crate::utils::date_format::format_timestamp(self.joining_date)
                .unwrap_or_default(),
            base_salary: self.base_salary.to_string(),
            bank_account: self.bank_account.clone(),
            tax_id: self.tax_id.clone(),
            address: self.address.clone(),
            status: Some(self.status),
        }
    }
}

/// Raw, user-entered employee fields.
///
/// Every field is text as typed; [`EmployeeForm::validate`] normalizes dates
/// and amounts and reports the first invalid field.
#[derive(Clone, Debug, Default)]
pub struct EmployeeForm {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub department: String,
    pub position: String,
    pub joining_date: String,
    pub base_salary: String,
    pub bank_account: String,
    pub tax_id: String,
    pub address: String,
    /// Set to change the employment status on update.
    pub status: Option<EmployeeStatus>,
}

/// Validated employee payload as sent to the backend.
#[derive(Clone, Debug, Serialize)]
pub struct EmployeeDraft {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub department: Department,
    pub position: String,
    #[serde(with = "timestamp_format")]
    pub joining_date: OffsetDateTime,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_salary: Decimal,
    pub bank_account: String,
    pub tax_id: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EmployeeStatus>,
}

impl EmployeeForm {
    pub fn validate(&self) -> Result<EmployeeDraft> {
        let text = |field: &str, value: &str| required(field, value).map(str::to_string);

        let employee_id = text("employee_id", &self.employee_id)?;
        let first_name = text("first_name", &self.first_name)?;
        let last_name = text("last_name", &self.last_name)?;
        let email = text("email", &self.email)?;
        if !email.contains('@') {
            return Err(Error::validation("email", format!("'{email}' is not an email address")));
        }
        let phone = text("phone", &self.phone)?;

        let department = Department::from(text("department", &self.department)?);
        if !department.is_known() {
            return Err(Error::validation(
                "department",
                format!("unknown department '{department}'"),
            ));
        }

        let position = text("position", &self.position)?;
        let joining_date = parse_timestamp(required("joining_date", &self.joining_date)?)
            .map_err(|e| Error::validation("joining_date", e))?;
        let base_salary = parse_positive_amount("base_salary", &self.base_salary)?;

        Ok(EmployeeDraft {
            employee_id,
            first_name,
            last_name,
            email,
            phone,
            department,
            position,
            joining_date,
            base_salary,
            bank_account: text("bank_account", &self.bank_account)?,
            tax_id: text("tax_id", &self.tax_id)?,
            address: text("address", &self.address)?,
            status: self.status,
        })
    }
}
