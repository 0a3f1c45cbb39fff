use rust_decimal::Decimal;

use crate::entities::payroll_record::RECONCILIATION_TOLERANCE;
use crate::entities::{AppliedDeduction, Deduction, PayrollRecord};
use crate::error::{Error, Result};

/// Working hours in a month, used to derive the hourly overtime rate.
pub const STANDARD_MONTHLY_HOURS: Decimal = Decimal::from_parts(160, 0, 0, false, 0);

/// A client-side payroll computation following the backend's rules:
/// overtime is paid at the hourly base rate, and every catalog deduction is
/// applied to gross salary.
#[derive(Clone, Debug, PartialEq)]
pub struct PayrollBreakdown {
    pub base_salary: Decimal,
    pub overtime_hours: Decimal,
    pub overtime_rate: Decimal,
    pub bonuses: Decimal,
    pub gross_salary: Decimal,
    pub deductions: Vec<AppliedDeduction>,
    pub total_deductions: Decimal,
    pub net_salary: Decimal,
}

impl PayrollBreakdown {
    /// Hourly rate for overtime on a given monthly base salary.
    #[must_use]
    pub fn overtime_rate_for(base_salary: Decimal) -> Decimal {
        base_salary / STANDARD_MONTHLY_HOURS
    }

    #[must_use]
    pub fn compute(
        base_salary: Decimal,
        overtime_hours: Decimal,
        overtime_rate: Decimal,
        bonuses: Decimal,
        catalog: &[Deduction],
    ) -> Self {
        let gross_salary = base_salary + overtime_hours * overtime_rate + bonuses;
        let deductions: Vec<_> = catalog.iter().map(|d| d.apply(gross_salary)).collect();
        let total_deductions = deductions.iter().map(|d| d.amount).sum::<Decimal>();

        Self {
            base_salary,
            overtime_hours,
            overtime_rate,
            bonuses,
            gross_salary,
            deductions,
            total_deductions,
            net_salary: gross_salary - total_deductions,
        }
    }

    /// The breakdown the catalog implies for an already processed record.
    #[must_use]
    pub fn for_record(record: &PayrollRecord, catalog: &[Deduction]) -> Self {
        Self::compute(
            record.base_salary,
            record.overtime_hours,
            record.overtime_rate,
            record.bonuses,
            catalog,
        )
    }

    /// Fails with `Error::Unreconciled` if `record` disagrees with this breakdown.
    pub fn check(&self, record: &PayrollRecord) -> Result<()> {
        let pairs = [
            ("gross_salary", self.gross_salary, record.gross_salary),
            ("total_deductions", self.total_deductions, record.total_deductions),
            ("net_salary", self.net_salary, record.net_salary),
        ];

        for (field, expected, actual) in pairs {
            if (expected - actual).abs() > RECONCILIATION_TOLERANCE {
                return Err(Error::Unreconciled {
                    record_id: record.id,
                    detail: format!("{field} is {actual}, catalog implies {expected}"),
                });
            }
        }
        Ok(())
    }
}
