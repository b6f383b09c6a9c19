use chrono::NaiveDate;
use serde::Serialize;

/// Validated parameters for one loan estimate request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoanQuery {
    pub initial_balance: f64,
    /// Annual interest rate in percent, e.g. 5.4 means 5.4%.
    pub annual_interest_rate: f64,
    /// Carried through for display only; never enters the arithmetic.
    pub graduation_date: NaiveDate,
}

/// Raw result of running the amortization loop for one fixed payment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulation {
    pub total_paid: f64,
    /// 1-based period counter, advanced on every simulated period
    /// including the one that clears the balance. 31 means the cap
    /// stopped the loop.
    pub periods_elapsed: u32,
    /// Remaining balance; 0 unless the 30-period cap was hit first.
    pub final_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanOutcome {
    pub initial_balance: f64,
    pub annual_interest_rate: f64,
    pub graduation_date: NaiveDate,
    pub total_paid: f64,
    pub periods_elapsed: u32,
    pub final_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepEntry {
    pub payment: u64,
    pub total_paid: f64,
}

/// Payment-to-total table built by sweeping candidate fixed payments.
/// Entries are kept in generation order (ascending payment).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSweepResult {
    pub step: u64,
    pub entries: Vec<SweepEntry>,
}
