//! Cash-flow evaluation: total income and expenses for a simulation month.
//!
//! These are pure functions of `(settings, month)`. COLA and inflation
//! compound by elapsed whole years (integer division of months by 12),
//! never monthly.

use crate::model::{ExpenseBreakdown, HealthcareModel, Settings};

/// Total income across all sources for a simulation month.
#[must_use]
pub fn total_income(settings: &Settings, month: u32) -> f64 {
    settings
        .income_sources
        .iter()
        .map(|source| source.amount_at(month))
        .sum()
}

/// Healthcare cost for a simulation month under the active model.
#[must_use]
pub fn healthcare_cost(settings: &Settings, month: u32) -> f64 {
    match &settings.healthcare {
        HealthcareModel::None => 0.0,
        HealthcareModel::Legacy {
            monthly_cost,
            annual_inflation,
        } => {
            let years = month / 12;
            monthly_cost * (1.0 + annual_inflation / 100.0).powi(years as i32)
        }
        HealthcareModel::PerPerson { people } => {
            people.iter().map(|p| p.monthly_cost_at(month)).sum()
        }
    }
}

/// Expense breakdown for a simulation month.
///
/// The living baseline compounds annually by inflation net of the spending
/// decline rate; each active expense source adds its own (optionally
/// inflated) amount.
#[must_use]
pub fn expense_breakdown(settings: &Settings, month: u32) -> ExpenseBreakdown {
    let years = month / 12;
    let effective_rate =
        (settings.inflation_rate - settings.spending_decline_rate) / 100.0;
    let living = settings.monthly_living_expenses * (1.0 + effective_rate).powi(years as i32);

    let healthcare = healthcare_cost(settings, month);

    let other = settings
        .expense_sources
        .iter()
        .map(|source| source.amount_at(month, settings.inflation_rate))
        .sum();

    ExpenseBreakdown {
        living,
        healthcare,
        other,
    }
}

/// Total expenses across all streams for a simulation month.
#[must_use]
pub fn total_expenses(settings: &Settings, month: u32) -> f64 {
    expense_breakdown(settings, month).total()
}
