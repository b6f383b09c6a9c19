mod engine;
mod types;

pub use engine::{DEFAULT_PLAN_PAYMENT, evaluate_default_plan, simulate, sweep_payments};
pub use types::{LoanOutcome, LoanQuery, PaymentSweepResult, Simulation, SweepEntry};
