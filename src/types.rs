use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// unique identifier for a plan template
pub type PlanId = Uuid;

/// unique identifier for a customer's enrollment
pub type InstallmentPlanId = Uuid;

/// unique identifier for a single installment
pub type InstallmentId = Uuid;

/// unique identifier for a merchant account
pub type MerchantId = Uuid;

/// unique identifier for a customer account
pub type CustomerId = Uuid;

/// lifecycle status of a plan template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// created but not yet offered to customers
    Draft,
    /// enrollments may be generated from it
    Active,
    /// retired template, existing enrollments keep running
    Archived,
}

/// lifecycle status of an enrollment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentPlanStatus {
    /// installments outstanding, payments accepted
    Active,
    /// every installment paid
    Completed,
    /// reserved for manual operation, never set by the core
    Defaulted,
}

/// payment status of a single installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Late,
    Failed,
}

impl InstallmentStatus {
    /// unpaid statuses block payment of later installments in the sequence
    pub fn is_unpaid(&self) -> bool {
        matches!(
            self,
            InstallmentStatus::Pending | InstallmentStatus::Late | InstallmentStatus::Failed
        )
    }
}

/// authenticated caller, resolved by the identity collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    Merchant { id: MerchantId, verified: bool },
    Customer { id: CustomerId },
}

impl Principal {
    pub fn merchant(id: MerchantId) -> Self {
        Principal::Merchant { id, verified: true }
    }

    pub fn customer(id: CustomerId) -> Self {
        Principal::Customer { id }
    }
}
