use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{BnplError, Result};
use crate::types::{MerchantId, PlanId, PlanStatus};

/// default interval in days between installments
pub const DEFAULT_INSTALLMENT_PERIOD_DAYS: u32 = 30;

/// merchant-supplied parameters for a new plan template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanParams {
    pub name: String,
    pub total_amount: Money,
    pub installment_count: u32,
    pub installment_period_days: u32,
}

impl PlanParams {
    pub fn new(name: impl Into<String>, total_amount: Money, installment_count: u32) -> Self {
        Self {
            name: name.into(),
            total_amount,
            installment_count,
            installment_period_days: DEFAULT_INSTALLMENT_PERIOD_DAYS,
        }
    }

    pub fn with_period_days(mut self, days: u32) -> Self {
        self.installment_period_days = days;
        self
    }
}

/// payment plan template owned by a merchant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub merchant_id: MerchantId,
    pub name: String,
    pub total_amount: Money,
    pub installment_count: u32,
    pub installment_period_days: u32,
    pub status: PlanStatus,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// validate parameters and build a new template
    pub fn new(
        merchant_id: MerchantId,
        params: PlanParams,
        status: PlanStatus,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if params.name.trim().is_empty() {
            return Err(BnplError::InvalidPlan {
                message: "plan name must not be empty".to_string(),
            });
        }
        if !params.total_amount.is_positive() {
            return Err(BnplError::InvalidPlan {
                message: format!(
                    "total amount must be greater than zero, got {}",
                    params.total_amount
                ),
            });
        }
        if params.installment_count == 0 {
            return Err(BnplError::InvalidPlan {
                message: "installment count must be greater than zero".to_string(),
            });
        }
        if params.installment_period_days == 0 {
            return Err(BnplError::InvalidPlan {
                message: "installment period must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            merchant_id,
            name: params.name,
            total_amount: params.total_amount,
            installment_count: params.installment_count,
            installment_period_days: params.installment_period_days,
            status,
            created_at,
        })
    }

    pub fn archive(&mut self) {
        self.status = PlanStatus::Archived;
    }
}
