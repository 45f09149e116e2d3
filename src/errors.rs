use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::decimal::Money;
use crate::types::{InstallmentId, InstallmentPlanStatus};

#[derive(Error, Debug)]
pub enum BnplError {
    #[error("cannot split {total} into {count} positive installments")]
    RoundingInfeasible {
        total: Money,
        count: u32,
    },

    #[error("installment generation failed: {message}")]
    InstallmentGenerationFailed {
        message: String,
    },

    #[error("installment already paid")]
    AlreadyPaid {
        installment_id: InstallmentId,
        paid_at: Option<DateTime<Utc>>,
    },

    #[error("cannot pay because the installment plan is not active: {status:?}")]
    PlanNotActive {
        status: InstallmentPlanStatus,
    },

    #[error("previous installments must be paid before installment {attempted_sequence}")]
    PreviousUnpaid {
        attempted_sequence: u32,
        unpaid_sequences: Vec<u32>,
    },

    #[error("{entity} not found")]
    NotFound {
        entity: &'static str,
    },

    #[error("plan is still referenced by {enrollment_count} installment plan(s)")]
    PlanReferenced {
        enrollment_count: usize,
    },

    #[error("invalid plan: {message}")]
    InvalidPlan {
        message: String,
    },
}

impl BnplError {
    /// expected business-rule rejection, surfaced as a conflict rather than logged as a bug
    pub fn is_business_rejection(&self) -> bool {
        matches!(
            self,
            BnplError::AlreadyPaid { .. }
                | BnplError::PlanNotActive { .. }
                | BnplError::PreviousUnpaid { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BnplError>;
