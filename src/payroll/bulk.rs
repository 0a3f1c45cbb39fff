use futures::future::join_all;

use crate::entities::{PayPeriod, PayrollRecord, PayrollRequest};
use crate::error::{Error, Result};
use crate::payroll::PayrollApi;

/// An employee whose payroll could not be processed in a bulk run.
#[derive(Debug)]
pub struct BulkFailure {
    pub employee_id: String,
    pub error: Error,
}

/// Per-employee results of a bulk run. Partial completion is normal.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub succeeded: Vec<PayrollRecord>,
    pub failed: Vec<BulkFailure>,
}

impl BulkOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Employee ids to retry individually.
    pub fn retry_ids(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(|f| f.employee_id.as_str())
    }
}

impl FromIterator<(String, Result<PayrollRecord>)> for BulkOutcome {
    fn from_iter<I: IntoIterator<Item = (String, Result<PayrollRecord>)>>(iter: I) -> Self {
        let mut outcome = Self::default();
        for (employee_id, result) in iter {
            match result {
                Ok(record) => outcome.succeeded.push(record),
                Err(error) => outcome.failed.push(BulkFailure { employee_id, error }),
            }
        }
        outcome
    }
}

impl PayrollApi<'_> {
    /// Processes `period` for every employee at once, with no overtime or bonuses.
    ///
    /// Requests run concurrently and independently; one failure never
    /// cancels the others.
    #[instrument(skip(self, employee_ids, period), fields(count = employee_ids.len(), %period))]
    pub async fn process_bulk(&self, employee_ids: &[String], period: PayPeriod) -> BulkOutcome {
        let runs = employee_ids.iter().map(|employee_id| async move {
            let request = PayrollRequest::new(employee_id.clone(), period);
            let result = self.process(&request).await;
            if let Err(e) = &result {
                warn!(%employee_id, error = %e, "payroll failed in bulk run");
            }
            (employee_id.clone(), result)
        });

        let outcome: BulkOutcome = join_all(runs).await.into_iter().collect();
        info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk payroll finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_are_listed_for_retry() {
        let outcome: BulkOutcome = vec![
            ("EMP1".to_string(), Err(Error::validation("employee_id", "bad"))),
            ("EMP2".to_string(), Err(Error::validation("employee_id", "bad"))),
        ]
        .into_iter()
        .collect();
        assert!(!outcome.is_complete());
        assert_eq!(outcome.attempted(), 2);
        assert_eq!(outcome.retry_ids().collect::<Vec<_>>(), ["EMP1", "EMP2"]);
    }
}
