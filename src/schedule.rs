use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{BnplError, Result};
use crate::plan::Plan;
use crate::split::split_evenly;
use crate::types::{
    CustomerId, InstallmentId, InstallmentPlanId, InstallmentPlanStatus, InstallmentStatus, PlanId,
};

/// one customer's enrollment in a plan template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentPlan {
    pub id: InstallmentPlanId,
    pub plan_id: PlanId,
    pub customer_id: CustomerId,
    pub start_date: NaiveDate,
    pub status: InstallmentPlanStatus,
    pub created_at: DateTime<Utc>,
}

impl InstallmentPlan {
    /// create an enrollment shell with no installments yet
    pub fn new(
        plan_id: PlanId,
        customer_id: CustomerId,
        start_date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            plan_id,
            customer_id,
            start_date,
            status: InstallmentPlanStatus::Active,
            created_at,
        }
    }
}

/// one scheduled payment within an enrollment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub installment_plan_id: InstallmentPlanId,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub sequence_number: u32,
    pub status: InstallmentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

/// Generate the full installment schedule for a batch of enrollment shells.
///
/// Enrollments whose parent plan carries corrupted data (zero count or a
/// non-positive total) are skipped with a log entry; upstream validation
/// should have rejected them, and one bad plan must not sink a bulk
/// enrollment of otherwise valid ones. A splitter failure or an invariant
/// violation in any generated row aborts the whole batch so that nothing
/// is committed partially.
pub fn generate_installments(batch: &[(&Plan, &InstallmentPlan)]) -> Result<Vec<Installment>> {
    let mut installments = Vec::new();

    for (plan, enrollment) in batch {
        if plan.installment_count == 0 {
            error!(
                plan_id = %plan.id,
                merchant_id = %plan.merchant_id,
                "skipping enrollment: plan has zero installment count"
            );
            continue;
        }
        if !plan.total_amount.is_positive() {
            error!(
                plan_id = %plan.id,
                merchant_id = %plan.merchant_id,
                total_amount = %plan.total_amount,
                "skipping enrollment: plan total amount is not positive"
            );
            continue;
        }

        let amounts = split_evenly(plan.total_amount, plan.installment_count)?;

        for (idx, amount) in amounts.into_iter().enumerate() {
            let sequence_number = idx as u32 + 1;
            let offset = Duration::days(i64::from(plan.installment_period_days) * idx as i64);
            let due_date = enrollment
                .start_date
                .checked_add_signed(offset)
                .ok_or_else(|| BnplError::InstallmentGenerationFailed {
                    message: format!(
                        "due date overflow at sequence {sequence_number} for enrollment {}",
                        enrollment.id
                    ),
                })?;

            installments.push(Installment {
                id: Uuid::new_v4(),
                installment_plan_id: enrollment.id,
                amount,
                due_date,
                sequence_number,
                status: InstallmentStatus::Pending,
                paid_at: None,
            });
        }
    }

    validate_batch(&installments)?;

    Ok(installments)
}

/// Check model invariants over a generated batch before it is persisted.
///
/// Unreachable given a correct splitter, but the bulk path bypasses
/// per-row construction checks, so the invariants are re-verified here.
fn validate_batch(installments: &[Installment]) -> Result<()> {
    let mut seen_sequences: HashSet<(InstallmentPlanId, u32)> = HashSet::new();
    let mut seen_due_dates: HashSet<(InstallmentPlanId, NaiveDate)> = HashSet::new();

    for installment in installments {
        if !installment.amount.is_positive() {
            return Err(generation_failed(installment, "non-positive amount"));
        }
        if installment.sequence_number == 0 {
            return Err(generation_failed(installment, "sequence number zero"));
        }
        if !seen_sequences.insert((installment.installment_plan_id, installment.sequence_number)) {
            return Err(generation_failed(installment, "duplicate sequence number"));
        }
        if !seen_due_dates.insert((installment.installment_plan_id, installment.due_date)) {
            return Err(generation_failed(installment, "duplicate due date"));
        }
    }

    Ok(())
}

fn generation_failed(installment: &Installment, reason: &str) -> BnplError {
    error!(
        installment_plan_id = %installment.installment_plan_id,
        sequence_number = installment.sequence_number,
        amount = %installment.amount,
        due_date = %installment.due_date,
        reason,
        "generated installment failed validation"
    );
    BnplError::InstallmentGenerationFailed {
        message: format!(
            "installment {} of enrollment {} failed validation: {reason}",
            installment.sequence_number, installment.installment_plan_id
        ),
    }
}
