use hourglass_rs::SafeTimeProvider;
use tracing::info;

use crate::book::PlanBook;
use crate::events::Event;
use crate::types::InstallmentStatus;

impl PlanBook {
    /// Mark every pending installment whose due date has passed as late.
    ///
    /// One conditional pass over the installment table: the predicate
    /// re-filters on pending status, so a row paid between scheduling and
    /// the sweep is never reverted and running the sweep twice is a no-op.
    /// Enrollment and template statuses are left untouched; an overdue
    /// installment does not default a plan. Returns the number of rows
    /// transitioned.
    pub fn sweep_overdue(&mut self, time_provider: &SafeTimeProvider) -> usize {
        let today = time_provider.now().date_naive();

        let mut transitioned = 0;
        for installment in self.installments.values_mut() {
            if installment.status == InstallmentStatus::Pending && installment.due_date < today {
                installment.status = InstallmentStatus::Late;
                transitioned += 1;
            }
        }

        if transitioned > 0 {
            self.events.emit(Event::InstallmentsMarkedLate {
                count: transitioned,
                as_of: today,
            });
        }

        transitioned
    }

    /// Scheduler entry point. There is no user in this call path, so the
    /// outcome is logged rather than surfaced.
    pub fn run_scheduled_sweep(&mut self, time_provider: &SafeTimeProvider) {
        let transitioned = self.sweep_overdue(time_provider);
        info!(transitioned, "overdue sweep finished");
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use hourglass_rs::{SafeTimeProvider, TimeSource};
    use uuid::Uuid;

    use super::*;
    use crate::decimal::Money;
    use crate::plan::PlanParams;
    use crate::types::{InstallmentPlanStatus, Principal};

    fn clock(y: i32, m: u32, d: u32) -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap(),
        ))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded_book(customer: Uuid) -> PlanBook {
        // 3 x 100.00 every 30 days from 2024-01-01
        let time = clock(2024, 1, 1);
        let mut book = PlanBook::new();
        book.create_plan(
            Principal::merchant(Uuid::new_v4()),
            PlanParams::new("Swept plan", Money::from_major(300), 3),
            &[customer],
            Some(date(2024, 1, 1)),
            &time,
        )
        .unwrap();
        book
    }

    #[test]
    fn test_only_past_due_pending_rows_transition() {
        let customer = Uuid::new_v4();
        let mut book = seeded_book(customer);

        // feb 15: jan 1 and jan 31 are overdue, mar 1 is not
        let time = clock(2024, 2, 15);
        assert_eq!(book.sweep_overdue(&time), 2);

        let enrollment_id = book.plans_for(Principal::customer(customer))[0].id;
        let statuses: Vec<InstallmentStatus> = book
            .installments_of(enrollment_id)
            .iter()
            .map(|i| i.status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                InstallmentStatus::Late,
                InstallmentStatus::Late,
                InstallmentStatus::Pending,
            ]
        );
    }

    #[test]
    fn test_due_today_is_not_overdue() {
        let customer = Uuid::new_v4();
        let mut book = seeded_book(customer);

        let time = clock(2024, 1, 1);
        assert_eq!(book.sweep_overdue(&time), 0);

        let time = clock(2024, 1, 2);
        assert_eq!(book.sweep_overdue(&time), 1);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let customer = Uuid::new_v4();
        let mut book = seeded_book(customer);

        let time = clock(2024, 2, 15);
        assert_eq!(book.sweep_overdue(&time), 2);
        assert_eq!(book.sweep_overdue(&time), 0);

        let events = book.take_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, Event::InstallmentsMarkedLate { .. }))
                .count(),
            1
        );
    }

    #[test]
    fn test_paid_rows_are_never_reverted() {
        let customer = Uuid::new_v4();
        let mut book = seeded_book(customer);

        let pay_time = clock(2024, 1, 1);
        let enrollment_id = book.plans_for(Principal::customer(customer))[0].id;
        let first = book.installments_of(enrollment_id)[0].id;
        book.pay_installment(customer, first, &pay_time).unwrap();

        let sweep_time = clock(2024, 2, 15);
        assert_eq!(book.sweep_overdue(&sweep_time), 1);
        assert_eq!(
            book.installment(first).unwrap().status,
            InstallmentStatus::Paid
        );
    }

    #[test]
    fn test_sweep_does_not_touch_plan_statuses() {
        let customer = Uuid::new_v4();
        let mut book = seeded_book(customer);

        let time = clock(2025, 1, 1);
        assert_eq!(book.sweep_overdue(&time), 3);

        let enrollment = book.plans_for(Principal::customer(customer))[0];
        assert_eq!(enrollment.status, InstallmentPlanStatus::Active);
    }

    #[test]
    fn test_late_installments_stay_payable_in_order() {
        let customer = Uuid::new_v4();
        let mut book = seeded_book(customer);

        let time = clock(2024, 2, 15);
        book.run_scheduled_sweep(&time);

        let enrollment_id = book.plans_for(Principal::customer(customer))[0].id;
        let ids: Vec<_> = book
            .installments_of(enrollment_id)
            .iter()
            .map(|i| i.id)
            .collect();
        for id in ids {
            book.pay_installment(customer, id, &time).unwrap();
        }
        assert_eq!(
            book.installment_plan(enrollment_id).unwrap().status,
            InstallmentPlanStatus::Completed
        );
    }
}
