use std::collections::BTreeMap;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::debug;

use crate::decimal::Money;
use crate::eligibility::validate_payable;
use crate::errors::{BnplError, Result};
use crate::events::{Event, EventStore};
use crate::plan::{Plan, PlanParams};
use crate::schedule::{generate_installments, Installment, InstallmentPlan};
use crate::types::{
    CustomerId, InstallmentId, InstallmentPlanId, InstallmentPlanStatus, InstallmentStatus,
    MerchantId, PlanId, PlanStatus, Principal,
};

/// Aggregate root holding the three related tables of the BNPL core:
/// plan templates, customer enrollments, and installments.
///
/// Every mutating operation behaves as one transaction: it validates and
/// stages everything first, then commits, so a failure anywhere leaves the
/// book exactly as it was. State changes are also emitted as [`Event`]s for
/// callers that need to observe side effects without hidden control flow.
#[derive(Debug, Default)]
pub struct PlanBook {
    pub(crate) plans: BTreeMap<PlanId, Plan>,
    pub(crate) installment_plans: BTreeMap<InstallmentPlanId, InstallmentPlan>,
    pub(crate) installments: BTreeMap<InstallmentId, Installment>,
    pub events: EventStore,
}

impl PlanBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a plan template and enroll customers into it in one atomic unit.
    ///
    /// The template, one enrollment shell per customer, and the full
    /// installment schedule are all staged and validated before anything is
    /// inserted. A splitter or validation failure therefore rolls back the
    /// entire call, including the plan itself.
    pub fn create_plan(
        &mut self,
        principal: Principal,
        params: PlanParams,
        customers: &[CustomerId],
        start_date: Option<NaiveDate>,
        time_provider: &SafeTimeProvider,
    ) -> Result<PlanId> {
        let merchant_id = match principal {
            Principal::Merchant { id, verified: true } => id,
            Principal::Merchant { verified: false, .. } => {
                return Err(BnplError::InvalidPlan {
                    message: "merchant account is not verified".to_string(),
                })
            }
            Principal::Customer { .. } => {
                return Err(BnplError::InvalidPlan {
                    message: "only merchant accounts can create plans".to_string(),
                })
            }
        };

        if customers.is_empty() {
            return Err(BnplError::InvalidPlan {
                message: "at least one customer must be enrolled".to_string(),
            });
        }

        let now = time_provider.now();
        let today = now.date_naive();
        let start_date = start_date.unwrap_or(today);
        if start_date < today {
            return Err(BnplError::InvalidPlan {
                message: format!("start date {start_date} must not be in the past"),
            });
        }

        // stage everything before touching the book
        let plan = Plan::new(merchant_id, params, PlanStatus::Active, now)?;
        let enrollments: Vec<InstallmentPlan> = customers
            .iter()
            .map(|&customer_id| InstallmentPlan::new(plan.id, customer_id, start_date, now))
            .collect();

        let batch: Vec<(&Plan, &InstallmentPlan)> =
            enrollments.iter().map(|e| (&plan, e)).collect();
        let installments = generate_installments(&batch)?;

        // commit
        debug!(
            plan_id = %plan.id,
            enrollments = enrollments.len(),
            installments = installments.len(),
            "committing plan with generated schedule"
        );
        let plan_id = plan.id;
        self.events.emit(Event::PlanCreated {
            plan_id,
            merchant_id,
            total_amount: plan.total_amount,
            installment_count: plan.installment_count,
            timestamp: now,
        });
        self.plans.insert(plan_id, plan);

        for enrollment in enrollments {
            self.events.emit(Event::CustomerEnrolled {
                installment_plan_id: enrollment.id,
                plan_id,
                customer_id: enrollment.customer_id,
                start_date: enrollment.start_date,
                timestamp: now,
            });
            let rows: Vec<&Installment> = installments
                .iter()
                .filter(|i| i.installment_plan_id == enrollment.id)
                .collect();
            if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
                self.events.emit(Event::InstallmentsGenerated {
                    installment_plan_id: enrollment.id,
                    count: rows.len() as u32,
                    first_due: first.due_date,
                    last_due: last.due_date,
                });
            }
            self.installment_plans.insert(enrollment.id, enrollment);
        }

        for installment in installments {
            self.installments.insert(installment.id, installment);
        }

        Ok(plan_id)
    }

    /// Pay one installment on behalf of the owning customer.
    ///
    /// Authorization precedes eligibility: an installment that does not
    /// exist or belongs to another customer reports `NotFound` either way,
    /// so existence is never leaked. On success only the status and paid-at
    /// fields change, and the completion evaluator runs before the call
    /// returns so the enrollment status is never observably stale.
    pub fn pay_installment(
        &mut self,
        customer_id: CustomerId,
        installment_id: InstallmentId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Installment> {
        let installment = self
            .installments
            .get(&installment_id)
            .ok_or(BnplError::NotFound {
                entity: "installment",
            })?;

        let enrollment = self
            .installment_plans
            .get(&installment.installment_plan_id)
            .ok_or(BnplError::NotFound {
                entity: "installment",
            })?;

        if enrollment.customer_id != customer_id {
            return Err(BnplError::NotFound {
                entity: "installment",
            });
        }

        let siblings: Vec<&Installment> = self
            .installments
            .values()
            .filter(|i| i.installment_plan_id == enrollment.id)
            .collect();
        validate_payable(installment, enrollment, &siblings)?;

        let enrollment_id = enrollment.id;
        let plan_id = enrollment.plan_id;
        let now = time_provider.now();

        // the payment mutates exactly two fields
        let paid = {
            let row = self
                .installments
                .get_mut(&installment_id)
                .ok_or(BnplError::NotFound {
                    entity: "installment",
                })?;
            row.status = InstallmentStatus::Paid;
            row.paid_at = Some(now);
            row.clone()
        };

        self.events.emit(Event::InstallmentPaid {
            installment_id,
            installment_plan_id: enrollment_id,
            sequence_number: paid.sequence_number,
            amount: paid.amount,
            paid_at: now,
        });

        self.evaluate_completion(enrollment_id, plan_id, time_provider);

        Ok(paid)
    }

    /// Promote the enrollment to completed once every installment is paid.
    /// No-op while anything remains unpaid and no-op if already completed.
    fn evaluate_completion(
        &mut self,
        enrollment_id: InstallmentPlanId,
        plan_id: PlanId,
        time_provider: &SafeTimeProvider,
    ) {
        let all_paid = self
            .installments
            .values()
            .filter(|i| i.installment_plan_id == enrollment_id)
            .all(|i| i.status == InstallmentStatus::Paid);
        if !all_paid {
            return;
        }

        if let Some(enrollment) = self.installment_plans.get_mut(&enrollment_id) {
            if enrollment.status != InstallmentPlanStatus::Completed {
                enrollment.status = InstallmentPlanStatus::Completed;
                self.events.emit(Event::InstallmentPlanCompleted {
                    installment_plan_id: enrollment_id,
                    plan_id,
                    timestamp: time_provider.now(),
                });
            }
        }
    }

    /// Archive a merchant's own template. Existing enrollments keep running.
    pub fn archive_plan(
        &mut self,
        merchant_id: MerchantId,
        plan_id: PlanId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let plan = self
            .plans
            .get_mut(&plan_id)
            .filter(|p| p.merchant_id == merchant_id)
            .ok_or(BnplError::NotFound { entity: "plan" })?;
        plan.archive();
        self.events.emit(Event::PlanArchived {
            plan_id,
            timestamp: time_provider.now(),
        });
        Ok(())
    }

    /// Remove a template. Refused while any enrollment still references it.
    pub fn remove_plan(&mut self, plan_id: PlanId) -> Result<()> {
        if !self.plans.contains_key(&plan_id) {
            return Err(BnplError::NotFound { entity: "plan" });
        }
        let enrollment_count = self
            .installment_plans
            .values()
            .filter(|e| e.plan_id == plan_id)
            .count();
        if enrollment_count > 0 {
            return Err(BnplError::PlanReferenced { enrollment_count });
        }
        self.plans.remove(&plan_id);
        Ok(())
    }

    /// Remove a customer, cascading to their enrollments and installments.
    /// Returns the number of enrollments removed.
    pub fn remove_customer(&mut self, customer_id: CustomerId) -> usize {
        let removed: Vec<InstallmentPlanId> = self
            .installment_plans
            .values()
            .filter(|e| e.customer_id == customer_id)
            .map(|e| e.id)
            .collect();
        for enrollment_id in &removed {
            self.installment_plans.remove(enrollment_id);
            self.installments
                .retain(|_, i| i.installment_plan_id != *enrollment_id);
        }
        removed.len()
    }

    pub fn plan(&self, plan_id: PlanId) -> Option<&Plan> {
        self.plans.get(&plan_id)
    }

    pub fn installment_plan(&self, id: InstallmentPlanId) -> Option<&InstallmentPlan> {
        self.installment_plans.get(&id)
    }

    pub fn installment(&self, id: InstallmentId) -> Option<&Installment> {
        self.installments.get(&id)
    }

    /// installments of one enrollment, ordered by sequence number
    pub fn installments_of(&self, enrollment_id: InstallmentPlanId) -> Vec<&Installment> {
        let mut rows: Vec<&Installment> = self
            .installments
            .values()
            .filter(|i| i.installment_plan_id == enrollment_id)
            .collect();
        rows.sort_by_key(|i| i.sequence_number);
        rows
    }

    /// outstanding (unpaid) balance of one enrollment
    pub fn outstanding_balance(&self, enrollment_id: InstallmentPlanId) -> Money {
        self.installments
            .values()
            .filter(|i| i.installment_plan_id == enrollment_id && i.status.is_unpaid())
            .fold(Money::ZERO, |acc, i| acc + i.amount)
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}
