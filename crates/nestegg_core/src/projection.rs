//! Deterministic month-by-month projection engine.
//!
//! A state machine over discrete monthly steps: growth is applied before
//! withdrawals, withdrawals follow a strict priority order (mandatory
//! distribution, then taxable, then tax-deferred), and depletion is sticky.
//! The stochastic engine drives the same [`BalanceState`] with randomized
//! inputs so both share one withdrawal-ordering implementation.

use crate::cash_flows::{expense_breakdown, total_income};
use crate::model::rmd::{required_distribution, RMD_START_AGE};
use crate::model::{ProjectionMonth, ProjectionResult, Settings};

/// Mutable balance state advanced one month at a time.
#[derive(Debug, Clone, Copy)]
pub struct BalanceState {
    pub tax_deferred: f64,
    pub taxable: f64,
    pub depleted: bool,
    pub depletion_month: Option<u32>,
}

/// Cash movements produced by one monthly step.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthFlows {
    pub growth: f64,
    pub withdrawal: f64,
    pub rmd: f64,
}

impl BalanceState {
    /// Split a portfolio into its tax-deferred and taxable parts.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tax_deferred: settings.tax_deferred_balance(),
            taxable: settings.taxable_balance(),
            depleted: false,
            depletion_month: None,
        }
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.tax_deferred + self.taxable
    }

    /// Advance one month: grow both balances, then settle the month's net
    /// need and the forced mandatory distribution.
    ///
    /// Withdrawal order when need is positive: the month's mandatory-
    /// distribution share first (capped by need and by the tax-deferred
    /// balance, any excess reinvested into taxable), then taxable, then
    /// tax-deferred. When need is non-positive the distribution is still
    /// forced out and lands in taxable as post-tax reinvestment.
    ///
    /// Once depleted, balances stay at zero for all later months.
    pub fn step_month(
        &mut self,
        month: u32,
        income: f64,
        expenses: f64,
        monthly_return: f64,
        monthly_rmd: f64,
    ) -> MonthFlows {
        if self.depleted {
            return MonthFlows::default();
        }

        let growth = self.total() * monthly_return;
        self.tax_deferred *= 1.0 + monthly_return;
        self.taxable *= 1.0 + monthly_return;

        let rmd_taken = monthly_rmd.min(self.tax_deferred).max(0.0);
        self.tax_deferred -= rmd_taken;

        let net_need = expenses - income;
        let mut withdrawal = 0.0;

        if net_need > 0.0 {
            let from_rmd = rmd_taken.min(net_need);
            // Excess distribution is forced cash, reinvested post-tax.
            self.taxable += rmd_taken - from_rmd;
            withdrawal += from_rmd;

            let mut remaining = net_need - from_rmd;
            let from_taxable = remaining.min(self.taxable);
            self.taxable -= from_taxable;
            withdrawal += from_taxable;
            remaining -= from_taxable;

            let from_deferred = remaining.min(self.tax_deferred);
            self.tax_deferred -= from_deferred;
            withdrawal += from_deferred;
            remaining -= from_deferred;

            if remaining > f64::EPSILON {
                self.tax_deferred = 0.0;
                self.taxable = 0.0;
            }
        } else {
            self.taxable += rmd_taken;
        }

        // A zero balance only counts as depletion when the month actually
        // needed money; an empty portfolio fully covered by income lives on.
        if self.total() <= 0.0 && net_need > 0.0 {
            self.tax_deferred = 0.0;
            self.taxable = 0.0;
            self.depleted = true;
            self.depletion_month = Some(month);
        }

        MonthFlows {
            growth,
            withdrawal,
            rmd: rmd_taken,
        }
    }

    /// This year's mandatory distribution, as a monthly share, for the age
    /// reached at a year boundary. 0 below the start age or without a
    /// tax-deferred balance.
    #[must_use]
    pub fn monthly_rmd_share(&self, age: u32) -> f64 {
        if age < RMD_START_AGE || self.tax_deferred <= 0.0 {
            return 0.0;
        }
        let (annual, _) = required_distribution(self.tax_deferred, age);
        annual / 12.0
    }
}

/// Run the deterministic projection over the full horizon.
#[must_use]
pub fn project(settings: &Settings) -> ProjectionResult {
    let months = settings.projection_months();
    let monthly_return = settings.investment_return / 100.0 / 12.0;

    let mut state = BalanceState::from_settings(settings);
    let mut monthly_rmd = 0.0;
    let mut snapshots = Vec::with_capacity(months as usize);

    for month in 0..months {
        // Year boundary: recompute this year's mandatory distribution from
        // the current tax-deferred balance and the age reached.
        if month % 12 == 0 {
            let age = u32::from(settings.current_age) + month / 12;
            monthly_rmd = state.monthly_rmd_share(age);
        }

        let income = total_income(settings, month);
        let expenses = expense_breakdown(settings, month);

        let flows = state.step_month(month, income, expenses.total(), monthly_return, monthly_rmd);

        snapshots.push(ProjectionMonth {
            month,
            year: f64::from(month) / 12.0,
            tax_deferred_balance: state.tax_deferred,
            taxable_balance: state.taxable,
            total_balance: state.total(),
            expenses,
            income,
            withdrawal: flows.withdrawal,
            rmd: flows.rmd,
            growth: flows.growth,
            depleted: state.depleted,
        });
    }

    let final_balance = state.total();
    let depletion_month = state.depletion_month;
    let longevity_years = depletion_month.map(|m| f64::from(m) / 12.0);

    ProjectionResult {
        months: snapshots,
        final_balance,
        depletion_month,
        longevity_years,
        survives: depletion_month.is_none(),
    }
}
