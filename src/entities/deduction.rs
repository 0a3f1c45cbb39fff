use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category of a deduction. Unknown categories are preserved verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeductionKind {
    Tax,
    /// Provident fund contribution.
    Pf,
    Insurance,
    Other(String),
}

impl DeductionKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Tax => "tax",
            Self::Pf => "pf",
            Self::Insurance => "insurance",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for DeductionKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "tax" => Self::Tax,
            "pf" => Self::Pf,
            "insurance" => Self::Insurance,
            _ => Self::Other(value),
        }
    }
}

impl From<DeductionKind> for String {
    fn from(value: DeductionKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DeductionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry of the deduction catalog. The catalog is owned by the backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Deduction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeductionKind,
    /// Fixed amount, used when `is_percentage` is false.
    #[serde(default, with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    /// Percentage of gross salary, used when `is_percentage` is true.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub percentage: Option<Decimal>,
    #[serde(default)]
    pub is_percentage: bool,
    #[serde(default = "default_mandatory")]
    pub is_mandatory: bool,
}

fn default_mandatory() -> bool {
    true
}

impl Deduction {
    /// Amount this deduction takes from a given gross salary.
    #[must_use]
    pub fn amount_for(&self, gross_salary: Decimal) -> Decimal {
        if self.is_percentage {
            gross_salary * self.percentage.unwrap_or_default() / Decimal::ONE_HUNDRED
        } else {
            self.amount
        }
    }

    /// This deduction as applied to a given gross salary.
    #[must_use]
    pub fn apply(&self, gross_salary: Decimal) -> AppliedDeduction {
        AppliedDeduction {
            name: self.name.clone(),
            kind: self.kind.clone(),
            amount: self.amount_for(gross_salary),
        }
    }
}

/// A deduction as recorded on a payroll record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppliedDeduction {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DeductionKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}
