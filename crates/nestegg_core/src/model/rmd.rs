//! Required Minimum Distribution (RMD) tables and calculations
//!
//! The IRS requires minimum withdrawals from tax-deferred accounts
//! starting at age 73. Divisors come from the Uniform Lifetime Table.

use serde::{Deserialize, Serialize};

/// Age at which mandatory distributions begin.
pub const RMD_START_AGE: u32 = 73;

/// Lowest age with a table entry. Divisors exist for 72 so plans started a
/// year early still resolve; below this the factor is 0 (no RMD).
pub const RMD_TABLE_MIN_AGE: u32 = 72;

/// Highest tabulated age; older ages fall back to the table minimum (2.0).
pub const RMD_TABLE_MAX_AGE: u32 = 120;

/// IRS Uniform Lifetime Table, ages 72 through 120.
const UNIFORM_LIFETIME: [f64; 49] = [
    27.4, // 72
    26.5, 25.5, 24.6, 23.7, 22.9, 22.0, 21.1, // 73-79
    20.2, 19.4, 18.5, 17.7, 16.8, 16.0, 15.2, 14.4, 13.7, 12.9, // 80-89
    12.2, 11.5, 10.8, 10.1, 9.5, 8.9, 8.4, 7.8, 7.3, 6.8, // 90-99
    6.4, 6.0, 5.6, 5.2, 4.9, 4.6, 4.3, 4.1, 3.9, 3.7, // 100-109
    3.5, 3.4, 3.3, 3.1, 3.0, 2.9, 2.8, 2.7, 2.5, 2.3, // 110-119
    2.0, // 120
];

/// Distribution divisor for an age.
///
/// Returns 0 below the table (no mandatory distribution). Ages past 120
/// degrade to the table minimum rather than erroring.
#[must_use]
pub fn factor(age: u32) -> f64 {
    if age < RMD_TABLE_MIN_AGE {
        return 0.0;
    }
    let idx = ((age - RMD_TABLE_MIN_AGE) as usize).min(UNIFORM_LIFETIME.len() - 1);
    UNIFORM_LIFETIME[idx]
}

/// Annual mandatory distribution for a balance and age.
///
/// Returns `(amount, percent_of_balance)`; both are 0 when no distribution
/// is required (age below the table, or zero balance).
#[must_use]
pub fn required_distribution(balance: f64, age: u32) -> (f64, f64) {
    let divisor = factor(age);
    if divisor == 0.0 || balance <= 0.0 {
        return (0.0, 0.0);
    }
    (balance / divisor, 100.0 / divisor)
}

/// One year in the forward RMD schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RmdYear {
    pub age: u32,
    /// Years from now until this distribution.
    pub years_from_now: u32,
    /// Tax-deferred balance just before the distribution.
    pub balance_before: f64,
    pub amount: f64,
    /// Distribution as a percentage of the balance.
    pub percent: f64,
}

/// Mandatory-distribution analysis: the current-year requirement plus a
/// forward schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RmdAnalysis {
    /// This year's required amount, 0 when below the start age.
    pub current_amount: f64,
    /// This year's required percentage of the tax-deferred balance.
    pub current_percent: f64,
    /// Projected distributions for up to 20 future RMD years.
    pub schedule: Vec<RmdYear>,
    /// Sum of the first 10 scheduled distributions.
    pub first_decade_total: f64,
}

/// Maximum number of future RMD years projected.
const SCHEDULE_YEARS: u32 = 20;

/// Build the mandatory-distribution analysis for a plan.
///
/// The forward schedule compounds the remaining tax-deferred balance by the
/// assumed monthly return between distributions and subtracts each year's
/// distribution. It is bounded by both the 20-year schedule window and the
/// projection horizon.
#[must_use]
pub fn analyze_rmd(
    tax_deferred_balance: f64,
    current_age: u32,
    annual_return: f64,
    projection_years: u32,
) -> RmdAnalysis {
    let (current_amount, current_percent) =
        if current_age >= RMD_START_AGE {
            required_distribution(tax_deferred_balance, current_age)
        } else {
            (0.0, 0.0)
        };

    let monthly_return = annual_return / 100.0 / 12.0;
    let mut schedule = Vec::new();
    let mut balance = tax_deferred_balance;
    let first_rmd_age = current_age.max(RMD_START_AGE);
    let mut scheduled = 0;

    for years_from_now in (first_rmd_age - current_age)..=projection_years {
        if scheduled >= SCHEDULE_YEARS || balance <= 0.0 {
            break;
        }
        let age = current_age + years_from_now;

        // Grow the balance through the months since the previous entry
        // (or since now, for the first entry).
        let months_growth = if schedule.is_empty() {
            years_from_now * 12
        } else {
            12
        };
        balance *= (1.0 + monthly_return).powi(months_growth as i32);

        let (amount, percent) = required_distribution(balance, age);
        if amount == 0.0 {
            break;
        }
        schedule.push(RmdYear {
            age,
            years_from_now,
            balance_before: balance,
            amount,
            percent,
        });
        balance -= amount;
        scheduled += 1;
    }

    let first_decade_total = schedule.iter().take(10).map(|y| y.amount).sum();

    RmdAnalysis {
        current_amount,
        current_percent,
        schedule,
        first_decade_total,
    }
}
