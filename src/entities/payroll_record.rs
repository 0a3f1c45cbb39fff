use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entities::deduction::AppliedDeduction;
use crate::error::{Error, Result};
use crate::utils::date_format::timestamp_format_option;

/// Largest difference tolerated between a stored amount and the amount
/// recomputed from its parts. The backend computes in binary floating point.
pub const RECONCILIATION_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayrollStatus {
    #[serde(alias = "draft")]
    Pending,
    #[serde(alias = "paid")]
    Processed,
}

/// The month and year a payroll run covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PayPeriod {
    year: i32,
    month: u8,
}

impl PayPeriod {
    pub fn new(month: u8, year: i32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::validation("month", format!("month must be 1-12, got {month}")));
        }
        if !(1900..=9999).contains(&year) {
            return Err(Error::validation("year", format!("year {year} is out of range")));
        }
        Ok(Self { year, month })
    }

    /// The period containing `at`.
    #[must_use]
    pub fn containing(at: OffsetDateTime) -> Self {
        Self {
            year: at.year(),
            month: u8::from(at.month()),
        }
    }

    #[must_use]
    pub fn month(self) -> u8 {
        self.month
    }

    #[must_use]
    pub fn year(self) -> i32 {
        self.year
    }
}

impl fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PayrollRecord {
    pub id: Uuid,
    pub employee_id: String,
    pub month: u8,
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_salary: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub overtime_hours: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub overtime_rate: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub bonuses: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_salary: Decimal,
    #[serde(default)]
    pub deductions: Vec<AppliedDeduction>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_deductions: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_salary: Decimal,
    pub status: PayrollStatus,
    #[serde(default, with = "timestamp_format_option", skip_serializing_if = "Option::is_none")]
    pub processed_date: Option<OffsetDateTime>,
}

impl PayrollRecord {
    /// The (employee, month, year) period this record pays.
    #[must_use]
    pub fn period(&self) -> (&str, u8, i32) {
        (&self.employee_id, self.month, self.year)
    }

    #[must_use]
    pub fn covers(&self, period: PayPeriod) -> bool {
        self.month == period.month() && self.year == period.year()
    }

    #[must_use]
    pub fn overtime_pay(&self) -> Decimal {
        self.overtime_hours * self.overtime_rate
    }

    /// `base_salary + overtime_hours * overtime_rate + bonuses`
    #[must_use]
    pub fn expected_gross(&self) -> Decimal {
        self.base_salary + self.overtime_pay() + self.bonuses
    }

    /// `gross_salary - total_deductions`
    #[must_use]
    pub fn expected_net(&self) -> Decimal {
        self.gross_salary - self.total_deductions
    }

    /// Checks that gross and net salary agree with their components.
    pub fn reconcile(&self) -> Result<()> {
        let gross_gap = (self.gross_salary - self.expected_gross()).abs();
        if gross_gap > RECONCILIATION_TOLERANCE {
            return Err(Error::Unreconciled {
                record_id: self.id,
                detail: format!(
                    "gross_salary {} but base {} + overtime {} + bonuses {} = {}",
                    self.gross_salary,
                    self.base_salary,
                    self.overtime_pay(),
                    self.bonuses,
                    self.expected_gross()
                ),
            });
        }

        let net_gap = (self.net_salary - self.expected_net()).abs();
        if net_gap > RECONCILIATION_TOLERANCE {
            return Err(Error::Unreconciled {
                record_id: self.id,
                detail: format!(
                    "net_salary {} but gross {} - deductions {} = {}",
                    self.net_salary,
                    self.gross_salary,
                    self.total_deductions,
                    self.expected_net()
                ),
            });
        }

        if !self.deductions.is_empty() {
            let itemized: Decimal = self.deductions.iter().map(|d| d.amount).sum();
            if (itemized - self.total_deductions).abs() > RECONCILIATION_TOLERANCE {
                return Err(Error::Unreconciled {
                    record_id: self.id,
                    detail: format!(
                        "total_deductions {} but itemized deductions sum to {itemized}",
                        self.total_deductions
                    ),
                });
            }
        }

        Ok(())
    }
}

/// A request to compute payroll for one employee and period.
///
/// Base salary, overtime rate and deductions are derived by the backend.
#[derive(Clone, Debug, Serialize)]
pub struct PayrollRequest {
    pub employee_id: String,
    pub month: u8,
    pub year: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub overtime_hours: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub bonuses: Decimal,
}

impl PayrollRequest {
    /// A request with no overtime and no bonuses.
    #[must_use]
    pub fn new(employee_id: impl Into<String>, period: PayPeriod) -> Self {
        Self {
            employee_id: employee_id.into(),
            month: period.month(),
            year: period.year(),
            overtime_hours: Decimal::ZERO,
            bonuses: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn with_overtime_hours(mut self, hours: Decimal) -> Self {
        self.overtime_hours = hours;
        self
    }

    #[must_use]
    pub fn with_bonuses(mut self, bonuses: Decimal) -> Self {
        self.bonuses = bonuses;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.employee_id.trim().is_empty() {
            return Err(Error::validation("employee_id", "this field is required"));
        }
        PayPeriod::new(self.month, self.year)?;
        if self.overtime_hours.is_sign_negative() && !self.overtime_hours.is_zero() {
            return Err(Error::validation("overtime_hours", "overtime hours cannot be negative"));
        }
        if self.bonuses.is_sign_negative() && !self.bonuses.is_zero() {
            return Err(Error::validation("bonuses", "bonuses cannot be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record() -> PayrollRecord {
        serde_json::from_value(serde_json::json!({
            "id": "7d1b0c3e-5f6a-4b8c-9d0e-1f2a3b4c5d6e",
            "employee_id": "EMP0001",
            "month": 6,
            "year": 2024,
            "base_salary": 5000.0,
            "overtime_hours": 5.0,
            "overtime_rate": 20.0,
            "bonuses": 200.0,
            "gross_salary": 5300.0,
            "deductions": [
                {"name": "Federal Income Tax", "type": "tax", "amount": 1166.0},
                {"name": "Health Insurance", "type": "insurance", "amount": 350.0}
            ],
            "total_deductions": 1516.0,
            "net_salary": 3784.0,
            "status": "processed",
            "processed_date": "2024-06-30T12:00:00.000001"
        }))
        .unwrap()
    }

    #[test]
    fn backend_record_reconciles() {
        let record = record();
        assert_eq!(record.expected_gross(), dec!(5300));
        assert_eq!(record.expected_net(), dec!(3784));
        assert!(record.reconcile().is_ok());
        assert_eq!(record.period(), ("EMP0001", 6, 2024));
    }

    #[test]
    fn float_noise_is_tolerated() {
        let mut record = record();
        record.net_salary = dec!(3783.9999999999995);
        assert!(record.reconcile().is_ok());
    }

    #[test]
    fn mismatched_net_is_flagged() {
        let mut record = record();
        record.net_salary = dec!(3800);
        assert!(matches!(record.reconcile(), Err(Error::Unreconciled { .. })));
    }

    #[test]
    fn request_validation() {
        let period = PayPeriod::new(6, 2024).unwrap();
        assert!(PayrollRequest::new("EMP0001", period).validate().is_ok());
        assert!(
            PayrollRequest::new("EMP0001", period)
                .with_overtime_hours(dec!(-1))
                .validate()
                .is_err()
        );
        assert!(PayrollRequest::new("", period).validate().is_err());
        assert!(PayPeriod::new(13, 2024).is_err());
        assert!(PayPeriod::new(0, 2024).is_err());
    }

    #[test]
    fn request_serializes_exactly_the_caller_fields() {
        let request = PayrollRequest::new("EMP0001", PayPeriod::new(6, 2024).unwrap())
            .with_overtime_hours(dec!(5))
            .with_bonuses(dec!(200));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "employee_id": "EMP0001",
                "month": 6,
                "year": 2024,
                "overtime_hours": 5.0,
                "bonuses": 200.0
            })
        );
    }
}
