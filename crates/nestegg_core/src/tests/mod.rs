//! Test modules, one file per engine area.

mod analysis;
mod monte_carlo;
mod valuation;

use crate::model::Settings;

/// A comfortable baseline plan: $1M portfolio, $4k/month expenses, 6%
/// return, 3% inflation, 30-year horizon, no income sources.
pub(crate) fn comfortable_settings() -> Settings {
    Settings {
        portfolio_value: 1_000_000.0,
        current_age: 65,
        percent_tax_deferred: 60.0,
        monthly_living_expenses: 4_000.0,
        inflation_rate: 3.0,
        investment_return: 6.0,
        discount_rate: 5.0,
        projection_years: 30,
        ..Settings::default()
    }
}

/// A plan that cannot work: $100k portfolio against $10k/month expenses.
pub(crate) fn doomed_settings() -> Settings {
    Settings {
        portfolio_value: 100_000.0,
        monthly_living_expenses: 10_000.0,
        ..comfortable_settings()
    }
}
