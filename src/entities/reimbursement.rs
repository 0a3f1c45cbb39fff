use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::utils::date_format::{timestamp_format, timestamp_format_option};
use crate::utils::serde_helpers::{empty_string_as_none, parse_positive_amount, required};

/// Expense categories offered when submitting a claim.
pub const CATEGORIES: [&str; 6] = ["travel", "medical", "food", "equipment", "training", "other"];

/// Lifecycle of a reimbursement claim.
///
/// `Pending` moves to exactly one of `Approved` or `Rejected`; both are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReimbursementStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReimbursementStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Approved | Self::Rejected)
        )
    }

    /// Returns `target` if the move is allowed from this state.
    pub fn transition(self, id: Uuid, target: Self) -> Result<Self> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(Error::InvalidState {
                id,
                status: self,
                requested: target,
            })
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReimbursementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reimbursement {
    pub id: Uuid,
    pub employee_id: String,
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub receipt_url: Option<String>,
    pub status: ReimbursementStatus,
    #[serde(with = "timestamp_format")]
    pub submitted_date: OffsetDateTime,
    #[serde(default, with = "timestamp_format_option", skip_serializing_if = "Option::is_none")]
    pub processed_date: Option<OffsetDateTime>,
    /// User id of the reviewer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<String>,
}

impl Reimbursement {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ReimbursementStatus::Pending
    }

    /// Category with its first letter capitalized, e.g. `Travel`.
    #[must_use]
    pub fn category_label(&self) -> String {
        let mut chars = self.category.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// A claim as typed by an employee.
#[derive(Clone, Debug, Default)]
pub struct ClaimForm {
    pub category: String,
    pub amount: String,
    pub description: String,
    pub receipt_url: Option<String>,
}

/// Validated claim payload. The backend attaches the submitter's employee id.
#[derive(Clone, Debug, Serialize)]
pub struct NewClaim {
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_url: Option<String>,
}

impl ClaimForm {
    pub fn validate(&self) -> Result<NewClaim> {
        let category = required("category", &self.category)?.to_lowercase();
        let amount = parse_positive_amount("amount", &self.amount)?;
        let description = required("description", &self.description)?.to_string();
        let receipt_url = self
            .receipt_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string);

        Ok(NewClaim {
            category,
            amount,
            description,
            receipt_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn only_pending_claims_move() {
        use ReimbursementStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        for terminal in [Approved, Rejected] {
            assert!(terminal.is_terminal());
            for target in [Pending, Approved, Rejected] {
                assert!(!terminal.can_transition_to(target));
            }
        }
        assert!(!Pending.can_transition_to(Pending));

        let id = Uuid::new_v4();
        assert!(matches!(
            Approved.transition(id, Rejected),
            Err(Error::InvalidState { status: Approved, requested: Rejected, .. })
        ));
    }

    #[test]
    fn claim_amounts_must_be_positive() {
        let mut form = ClaimForm {
            category: "Travel".into(),
            amount: "0".into(),
            description: "Taxi".into(),
            receipt_url: Some(String::new()),
        };
        assert!(matches!(form.validate(), Err(Error::Validation { .. })));

        form.amount = "42.50".into();
        let claim = form.validate().unwrap();
        assert_eq!(claim.amount, dec!(42.50));
        assert_eq!(claim.category, "travel");
        assert!(claim.receipt_url.is_none());
    }

    #[test]
    fn backend_claims_deserialize() {
        let claim: Reimbursement = serde_json::from_value(serde_json::json!({
            "id": "0f8b1c2d-3e4f-4a5b-8c6d-7e8f9a0b1c2d",
            "employee_id": "EMP0001",
            "category": "medical",
            "amount": 120.5,
            "description": "Prescription",
            "receipt_url": "",
            "status": "pending",
            "submitted_date": "2024-06-03T08:15:00.421000",
            "processed_date": null,
            "processed_by": null
        }))
        .unwrap();
        assert!(claim.is_pending());
        assert_eq!(claim.category_label(), "Medical");
        assert_eq!(claim.amount, dec!(120.5));
        assert!(claim.receipt_url.is_none());
    }
}
