//! Expense claims: submission by employees, review by administrators.

use serde::Serialize;
use uuid::Uuid;

use crate::endpoints::ApiEndpoint;
use crate::entities::{ClaimForm, Reimbursement, ReimbursementStatus};
use crate::error::{Error, Result};
use crate::role::Capability;
use crate::session::SessionContext;

/// Claim submission for an employee linked to an employee record.
#[derive(Clone, Copy, Debug)]
pub struct ClaimsApi<'a> {
    session: &'a SessionContext,
}

impl<'a> ClaimsApi<'a> {
    pub(crate) fn new(session: &'a SessionContext) -> Self {
        Self { session }
    }

    /// Submits a claim. New claims are always `pending`.
    #[instrument(skip(self, form), fields(category = %form.category))]
    pub async fn submit(&self, form: &ClaimForm) -> Result<Reimbursement> {
        let claim = form.validate()?;
        let reimbursement: Reimbursement = self
            .session
            .client()
            .post_endpoint(ApiEndpoint::Reimbursements, &claim)
            .await?;
        info!(id = %reimbursement.id, amount = %reimbursement.amount, "submitted claim");
        Ok(reimbursement)
    }

    /// The caller's own claims.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Reimbursement>> {
        self.session.client().get(ApiEndpoint::Reimbursements).await
    }
}

#[derive(Serialize)]
struct StatusUpdate {
    status: ReimbursementStatus,
}

/// Claim review, for administrators.
#[derive(Clone, Copy, Debug)]
pub struct ReviewApi<'a> {
    session: &'a SessionContext,
}

impl<'a> ReviewApi<'a> {
    pub(crate) fn new(session: &'a SessionContext) -> Self {
        Self { session }
    }

    /// Every claim, in any state.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Reimbursement>> {
        self.session.client().get(ApiEndpoint::Reimbursements).await
    }

    /// Claims awaiting a decision.
    #[instrument(skip(self))]
    pub async fn pending(&self) -> Result<Vec<Reimbursement>> {
        let claims = self.list().await?;
        Ok(claims.into_iter().filter(Reimbursement::is_pending).collect())
    }

    #[instrument(skip(self))]
    pub async fn find(&self, id: Uuid) -> Result<Reimbursement> {
        self.list()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound {
                entity: "Reimbursement".to_string(),
                id: id.to_string(),
                url: None,
                response_body: None,
            })
    }

    /// Approves a pending claim and returns it as stored afterwards.
    #[instrument(skip(self))]
    pub async fn approve(&self, id: Uuid) -> Result<Reimbursement> {
        self.decide(id, ReimbursementStatus::Approved).await
    }

    /// Rejects a pending claim and returns it as stored afterwards.
    #[instrument(skip(self))]
    pub async fn reject(&self, id: Uuid) -> Result<Reimbursement> {
        self.decide(id, ReimbursementStatus::Rejected).await
    }

    async fn decide(&self, id: Uuid, target: ReimbursementStatus) -> Result<Reimbursement> {
        let current = self.find(id).await?;
        current.status.transition(id, target)?;

        let client = self.session.client();
        let written: Result<serde_json::Value> = match target {
            ReimbursementStatus::Approved => {
                client
                    .put_endpoint(ApiEndpoint::ApproveReimbursement(id), &serde_json::json!({}))
                    .await
            }
            _ => {
                client
                    .put_endpoint(ApiEndpoint::Reimbursement(id), &StatusUpdate { status: target })
                    .await
            }
        };

        match written {
            Ok(_) => {}
            // Someone else decided first, unless the claim is still pending.
            Err(conflict @ Error::Conflict { .. }) => {
                let latest = self.find(id).await?;
                if !latest.status.is_terminal() {
                    return Err(conflict);
                }
                return Err(Error::InvalidState {
                    id,
                    status: latest.status,
                    requested: target,
                });
            }
            Err(e) => return Err(e.for_entity("Reimbursement", id)),
        }

        let updated = self.find(id).await?;
        info!(%id, status = %updated.status, "claim decided");
        Ok(updated)
    }
}

impl SessionContext {
    /// Claim submission. The user must be linked to an employee record.
    pub fn claims(&self) -> Result<ClaimsApi<'_>> {
        self.require(Capability::SubmitClaims)?;
        self.require_employee_link(Capability::SubmitClaims.as_str())?;
        Ok(ClaimsApi::new(self))
    }

    pub fn review(&self) -> Result<ReviewApi<'_>> {
        self.require(Capability::ReviewClaims)?;
        Ok(ReviewApi::new(self))
    }
}
