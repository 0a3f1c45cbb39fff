use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Organization-wide summary for the current month.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DashboardAnalytics {
    /// Active employees only.
    pub total_employees: u64,
    /// Sum of net salary over this month's processed records.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub monthly_payroll_cost: Decimal,
    #[serde(default)]
    pub processed_payrolls: u64,
    pub pending_reimbursements: u64,
    /// Deduction totals keyed by deduction type.
    #[serde(default)]
    pub deductions_breakdown: BTreeMap<String, Decimal>,
}

impl DashboardAnalytics {
    #[must_use]
    pub fn total_deducted(&self) -> Decimal {
        self.deductions_breakdown.values().copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn breakdown_values_accept_floats() {
        let analytics: DashboardAnalytics = serde_json::from_value(serde_json::json!({
            "total_employees": 4,
            "monthly_payroll_cost": 3784.0,
            "pending_reimbursements": 2,
            "deductions_breakdown": {"tax": 1166.0, "insurance": 350.0},
            "processed_payrolls": 1
        }))
        .unwrap();
        assert_eq!(analytics.total_deducted(), dec!(1516));
        assert_eq!(analytics.monthly_payroll_cost, dec!(3784));
    }
}
