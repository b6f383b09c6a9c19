use super::types::{LoanOutcome, LoanQuery, PaymentSweepResult, Simulation, SweepEntry};

/// Fixed minimum payment used for the headline "default plan" result.
pub const DEFAULT_PLAN_PAYMENT: f64 = 2500.0;

const PERIOD_CAP: u32 = 30;

/// Runs the amortization loop for one fixed payment: interest accrues as a
/// simple percentage on the pre-payment balance once per period, then the
/// payment (capped at the remaining balance) is subtracted, for at most 30
/// periods.
pub fn simulate(initial_balance: f64, annual_interest_rate: f64, payment: f64) -> Simulation {
    let mut balance = initial_balance;
    let mut total_paid = 0.0;
    let mut period = 1u32;

    while balance > 0.0 {
        if period > PERIOD_CAP {
            break;
        }
        balance += balance * annual_interest_rate * 0.01;
        if balance > payment {
            balance -= payment;
            total_paid += payment;
        } else {
            // Final instalment covers exactly the remaining balance.
            total_paid += balance;
            balance = 0.0;
        }
        period += 1;
    }

    Simulation {
        total_paid,
        periods_elapsed: period,
        final_balance: balance,
    }
}

pub fn evaluate_default_plan(query: LoanQuery) -> LoanOutcome {
    let run = simulate(
        query.initial_balance,
        query.annual_interest_rate,
        DEFAULT_PLAN_PAYMENT,
    );

    LoanOutcome {
        initial_balance: query.initial_balance,
        annual_interest_rate: query.annual_interest_rate,
        graduation_date: query.graduation_date,
        total_paid: run.total_paid,
        periods_elapsed: run.periods_elapsed,
        final_balance: run.final_balance,
    }
}

/// Sweeps candidate fixed payments `0, step, 2*step, ..` below the floored
/// balance, running one simulation per candidate.
pub fn sweep_payments(query: LoanQuery) -> PaymentSweepResult {
    let stop = query.initial_balance.max(0.0).floor() as u64;
    // A balance under 100 would floor the stride to zero; clamp to 1 so the
    // progression stays finite.
    let step = (stop / 100).max(1);

    let mut entries = Vec::with_capacity(stop.div_ceil(step) as usize);
    let mut payment = 0u64;
    while payment < stop {
        let run = simulate(
            query.initial_balance,
            query.annual_interest_rate,
            payment as f64,
        );
        entries.push(SweepEntry {
            payment,
            total_paid: run.total_paid,
        });
        payment += step;
    }

    PaymentSweepResult { step, entries }
}
