use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::book::PlanBook;
use crate::decimal::Money;
use crate::eligibility::is_payable;
use crate::schedule::{Installment, InstallmentPlan};
use crate::types::{
    CustomerId, InstallmentId, InstallmentPlanId, InstallmentPlanStatus, InstallmentStatus,
    PlanId, Principal,
};

/// customer-facing status filter for installment listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    /// pending and not yet past due
    Upcoming,
    /// paid, or past due regardless of status
    Past,
}

/// one row of a customer's installment listing, with the actionable flag
/// and enough template context to render it standalone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallmentView {
    pub id: InstallmentId,
    pub amount: Money,
    pub due_date: NaiveDate,
    pub status: InstallmentStatus,
    pub sequence_number: u32,
    pub paid_at: Option<DateTime<Utc>>,
    pub installment_plan_id: InstallmentPlanId,
    pub plan_id: PlanId,
    pub plan_name: String,
    pub is_payable: bool,
}

impl PlanBook {
    /// Resolve the enrollments visible to a principal.
    ///
    /// Merchants see every enrollment generated from their templates;
    /// customers see their own active and completed enrollments. Archived
    /// templates are deliberately not filtered out on the customer side:
    /// an archived template can still back a running enrollment. Newest
    /// first.
    pub fn plans_for(&self, principal: Principal) -> Vec<&InstallmentPlan> {
        let mut rows: Vec<&InstallmentPlan> = match principal {
            Principal::Merchant { id, .. } => self
                .installment_plans
                .values()
                .filter(|e| {
                    self.plans
                        .get(&e.plan_id)
                        .is_some_and(|p| p.merchant_id == id)
                })
                .collect(),
            Principal::Customer { id } => self
                .installment_plans
                .values()
                .filter(|e| {
                    e.customer_id == id
                        && matches!(
                            e.status,
                            InstallmentPlanStatus::Active | InstallmentPlanStatus::Completed
                        )
                })
                .collect(),
        };
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    /// Customer installments, optionally filtered, ordered by due date.
    ///
    /// `Upcoming` means still pending and due today or later; `Past` means
    /// paid (whenever that happened) or already past due even if unpaid.
    pub fn installments_for_customer(
        &self,
        customer_id: CustomerId,
        filter: Option<StatusFilter>,
        today: NaiveDate,
    ) -> Vec<&Installment> {
        let mut rows: Vec<&Installment> = self
            .installments
            .values()
            .filter(|i| {
                self.installment_plans
                    .get(&i.installment_plan_id)
                    .is_some_and(|e| e.customer_id == customer_id)
            })
            .filter(|i| match filter {
                Some(StatusFilter::Upcoming) => {
                    i.status == InstallmentStatus::Pending && i.due_date >= today
                }
                Some(StatusFilter::Past) => {
                    i.status == InstallmentStatus::Paid || i.due_date < today
                }
                None => true,
            })
            .collect();
        rows.sort_by_key(|i| (i.due_date, i.sequence_number));
        rows
    }

    /// listing rows with the non-raising payment-eligibility flag attached
    pub fn installment_views_for_customer(
        &self,
        customer_id: CustomerId,
        filter: Option<StatusFilter>,
        today: NaiveDate,
    ) -> Vec<InstallmentView> {
        self.installments_for_customer(customer_id, filter, today)
            .into_iter()
            .filter_map(|installment| {
                let enrollment = self.installment_plans.get(&installment.installment_plan_id)?;
                let plan = self.plans.get(&enrollment.plan_id)?;
                let siblings: Vec<&Installment> = self
                    .installments
                    .values()
                    .filter(|i| i.installment_plan_id == enrollment.id)
                    .collect();
                Some(InstallmentView {
                    id: installment.id,
                    amount: installment.amount,
                    due_date: installment.due_date,
                    status: installment.status,
                    sequence_number: installment.sequence_number,
                    paid_at: installment.paid_at,
                    installment_plan_id: enrollment.id,
                    plan_id: plan.id,
                    plan_name: plan.name.clone(),
                    is_payable: is_payable(installment, enrollment, &siblings),
                })
            })
            .collect()
    }

    /// pending installments due exactly on the given date, for the
    /// reminder-delivery collaborator
    pub fn pending_due_on(&self, date: NaiveDate) -> Vec<&Installment> {
        let mut rows: Vec<&Installment> = self
            .installments
            .values()
            .filter(|i| i.status == InstallmentStatus::Pending && i.due_date == date)
            .collect();
        rows.sort_by_key(|i| (i.installment_plan_id, i.sequence_number));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use uuid::Uuid;

    use crate::plan::PlanParams;

    fn clock(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        ))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded_book() -> (PlanBook, Uuid, Uuid, Uuid) {
        // merchant with two customers on a 3 x 100.00 monthly plan from 2024-01-01
        let time = clock(2024, 1, 1);
        let mut book = PlanBook::new();
        let merchant = Uuid::new_v4();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        book.create_plan(
            Principal::merchant(merchant),
            PlanParams::new("Gym membership", Money::from_major(300), 3),
            &[alice, bob],
            Some(date(2024, 1, 1)),
            &time,
        )
        .unwrap();

        (book, merchant, alice, bob)
    }

    #[test]
    fn test_merchant_sees_all_enrollments_customer_sees_own() {
        let (book, merchant, alice, bob) = seeded_book();

        assert_eq!(book.plans_for(Principal::merchant(merchant)).len(), 2);
        assert_eq!(book.plans_for(Principal::customer(alice)).len(), 1);
        assert_eq!(book.plans_for(Principal::customer(bob)).len(), 1);
        assert!(book
            .plans_for(Principal::customer(Uuid::new_v4()))
            .is_empty());
        assert!(book
            .plans_for(Principal::merchant(Uuid::new_v4()))
            .is_empty());
    }

    #[test]
    fn test_upcoming_and_past_filters() {
        let (mut book, _, alice, _) = seeded_book();
        let time = clock(2024, 1, 1);

        // due dates are jan 1, jan 31, mar 1; pay the first one
        let enrollment_id = book.plans_for(Principal::customer(alice))[0].id;
        let first = book.installments_of(enrollment_id)[0].id;
        book.pay_installment(alice, first, &time).unwrap();

        // viewed from feb 15: jan 31 is past due, mar 1 upcoming, jan 1 paid
        let today = date(2024, 2, 15);
        let upcoming = book.installments_for_customer(alice, Some(StatusFilter::Upcoming), today);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].due_date, date(2024, 3, 1));

        let past = book.installments_for_customer(alice, Some(StatusFilter::Past), today);
        assert_eq!(past.len(), 2);
        assert_eq!(past[0].due_date, date(2024, 1, 1));
        assert_eq!(past[1].due_date, date(2024, 1, 31));

        let all = book.installments_for_customer(alice, None, today);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_views_flag_exactly_one_actionable_installment() {
        let (book, _, alice, _) = seeded_book();

        let views = book.installment_views_for_customer(alice, None, date(2024, 1, 1));
        assert_eq!(views.len(), 3);
        assert!(views[0].is_payable);
        assert!(!views[1].is_payable);
        assert!(!views[2].is_payable);
        assert_eq!(views[0].plan_name, "Gym membership");
        assert_eq!(views[0].sequence_number, 1);
    }

    #[test]
    fn test_pending_due_on_feeds_reminders() {
        let (mut book, _, alice, _) = seeded_book();
        let time = clock(2024, 1, 1);

        // both customers owe an installment on jan 31
        assert_eq!(book.pending_due_on(date(2024, 1, 31)).len(), 2);
        assert!(book.pending_due_on(date(2024, 2, 1)).is_empty());

        // paying does not affect other due dates, and paid rows drop out
        let enrollment_id = book.plans_for(Principal::customer(alice))[0].id;
        let first = book.installments_of(enrollment_id)[0].id;
        book.pay_installment(alice, first, &time).unwrap();
        assert_eq!(book.pending_due_on(date(2024, 1, 1)).len(), 1);
    }
}
