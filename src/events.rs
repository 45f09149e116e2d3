use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{CustomerId, InstallmentId, InstallmentPlanId, MerchantId, PlanId};

/// all events emitted by plan book operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    PlanCreated {
        plan_id: PlanId,
        merchant_id: MerchantId,
        total_amount: Money,
        installment_count: u32,
        timestamp: DateTime<Utc>,
    },
    CustomerEnrolled {
        installment_plan_id: InstallmentPlanId,
        plan_id: PlanId,
        customer_id: CustomerId,
        start_date: NaiveDate,
        timestamp: DateTime<Utc>,
    },
    InstallmentsGenerated {
        installment_plan_id: InstallmentPlanId,
        count: u32,
        first_due: NaiveDate,
        last_due: NaiveDate,
    },
    InstallmentPaid {
        installment_id: InstallmentId,
        installment_plan_id: InstallmentPlanId,
        sequence_number: u32,
        amount: Money,
        paid_at: DateTime<Utc>,
    },
    InstallmentPlanCompleted {
        installment_plan_id: InstallmentPlanId,
        plan_id: PlanId,
        timestamp: DateTime<Utc>,
    },
    InstallmentsMarkedLate {
        count: usize,
        as_of: NaiveDate,
    },
    PlanArchived {
        plan_id: PlanId,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_take_events_drains_store() {
        let mut store = EventStore::new();
        store.emit(Event::PlanArchived {
            plan_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        });

        assert_eq!(store.events().len(), 1);
        let taken = store.take_events();
        assert_eq!(taken.len(), 1);
        assert!(store.events().is_empty());
    }
}
