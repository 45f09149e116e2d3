pub mod book;
pub mod decimal;
pub mod eligibility;
pub mod errors;
pub mod events;
pub mod plan;
pub mod queries;
pub mod schedule;
pub mod split;
pub mod sweep;
pub mod types;

// re-export key types
pub use book::PlanBook;
pub use decimal::Money;
pub use eligibility::{is_payable, validate_payable};
pub use errors::{BnplError, Result};
pub use events::{Event, EventStore};
pub use plan::{Plan, PlanParams, DEFAULT_INSTALLMENT_PERIOD_DAYS};
pub use queries::{InstallmentView, StatusFilter};
pub use schedule::{generate_installments, Installment, InstallmentPlan};
pub use split::split_evenly;
pub use types::{
    CustomerId, InstallmentId, InstallmentPlanId, InstallmentPlanStatus, InstallmentStatus,
    MerchantId, PlanId, PlanStatus, Principal,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
