use crate::errors::{BnplError, Result};
use crate::schedule::{Installment, InstallmentPlan};
use crate::types::{InstallmentPlanStatus, InstallmentStatus};

/// Decide whether an installment may be paid right now.
///
/// `siblings` must hold every installment of the same enrollment (the
/// candidate itself may be included; it is never its own predecessor).
/// Rules are evaluated in order and the first failing rule wins:
/// already paid, enrollment not active, any earlier installment unpaid.
///
/// The non-raising form backs list rendering; the raising form gates the
/// payment write. Both delegate to the same evaluation so the two can
/// never drift apart.
pub fn validate_payable(
    installment: &Installment,
    enrollment: &InstallmentPlan,
    siblings: &[&Installment],
) -> Result<()> {
    if installment.status == InstallmentStatus::Paid {
        return Err(BnplError::AlreadyPaid {
            installment_id: installment.id,
            paid_at: installment.paid_at,
        });
    }

    if enrollment.status != InstallmentPlanStatus::Active {
        return Err(BnplError::PlanNotActive {
            status: enrollment.status,
        });
    }

    let mut unpaid_sequences: Vec<u32> = siblings
        .iter()
        .filter(|s| {
            s.installment_plan_id == installment.installment_plan_id
                && s.sequence_number < installment.sequence_number
                && s.status.is_unpaid()
        })
        .map(|s| s.sequence_number)
        .collect();

    if !unpaid_sequences.is_empty() {
        unpaid_sequences.sort_unstable();
        return Err(BnplError::PreviousUnpaid {
            attempted_sequence: installment.sequence_number,
            unpaid_sequences,
        });
    }

    Ok(())
}

/// query form of [`validate_payable`]
pub fn is_payable(
    installment: &Installment,
    enrollment: &InstallmentPlan,
    siblings: &[&Installment],
) -> bool {
    validate_payable(installment, enrollment, siblings).is_ok()
}
