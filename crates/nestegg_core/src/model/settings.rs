//! Plan settings: the single input record for every analysis entry point.
//!
//! Settings are owned by the caller and passed by reference into the engine;
//! analysis functions never mutate them in place. Sensitivity and
//! failure-point searches work on cloned copies.

use serde::{Deserialize, Serialize};

/// A recurring income stream (pension, social security, part-time work).
///
/// The base amount applies unmodified until a whole year has elapsed since
/// `start_month`, then grows geometrically by `(1 + cola)^years_active`.
/// COLA compounds yearly, never monthly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeSource {
    pub id: String,
    pub name: String,
    /// Monthly base amount in dollars.
    pub monthly_amount: f64,
    /// Month offset at which the stream begins (0 = immediately).
    #[serde(default)]
    pub start_month: u32,
    /// Month offset at which the stream ends; absent = perpetual.
    #[serde(default)]
    pub end_month: Option<u32>,
    /// Annual cost-of-living adjustment, in percent.
    #[serde(default)]
    pub annual_cola: f64,
}

impl IncomeSource {
    /// Amount contributed in a given simulation month, 0 outside the
    /// active window.
    #[must_use]
    pub fn amount_at(&self, month: u32) -> f64 {
        if month < self.start_month {
            return 0.0;
        }
        if let Some(end) = self.end_month {
            if month >= end {
                return 0.0;
            }
        }
        let years_active = (month - self.start_month) / 12;
        self.monthly_amount * (1.0 + self.annual_cola / 100.0).powi(years_active as i32)
    }
}

/// A recurring expense stream beyond the living-expense baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSource {
    pub id: String,
    pub name: String,
    /// Monthly amount in dollars.
    pub monthly_amount: f64,
    /// Year offset at which the expense begins (0 = immediately).
    #[serde(default)]
    pub start_year: u32,
    /// Year offset at which the expense ends; absent or 0 = perpetual.
    #[serde(default)]
    pub end_year: Option<u32>,
    /// Whether the amount compounds with general inflation from its start.
    #[serde(default)]
    pub inflation_adjusted: bool,
    /// Marks the expense as reducible under stress. Carried for callers;
    /// not read by the projection engine.
    #[serde(default)]
    pub discretionary: bool,
}

impl ExpenseSource {
    /// True when the expense applies in the given simulation year.
    #[must_use]
    pub fn active_in_year(&self, year: u32) -> bool {
        if year < self.start_year {
            return false;
        }
        match self.end_year {
            Some(end) if end > 0 => year < end,
            _ => true,
        }
    }

    /// Amount contributed in a given simulation month.
    #[must_use]
    pub fn amount_at(&self, month: u32, annual_inflation: f64) -> f64 {
        let year = month / 12;
        if !self.active_in_year(year) {
            return 0.0;
        }
        if self.inflation_adjusted {
            let years_active = year - self.start_year;
            self.monthly_amount * (1.0 + annual_inflation / 100.0).powi(years_active as i32)
        } else {
            self.monthly_amount
        }
    }
}

/// Coverage category for a healthcare person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageKind {
    Medicare,
    Marketplace,
    EmployerSubsidized,
}

/// Default Medicare eligibility age.
pub const DEFAULT_ELIGIBILITY_AGE: u8 = 65;

fn default_eligibility_age() -> u8 {
    DEFAULT_ELIGIBILITY_AGE
}

/// One covered person in the multi-person healthcare model.
///
/// Costs follow a one-time regime switch: pre-eligibility base and inflation
/// until the person's simulated age crosses `eligibility_age`, then the
/// post-eligibility base and inflation for the rest of the horizon. The cost
/// for any month is derived from `(month, person)` alone; nothing is cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthcarePerson {
    pub age: u8,
    pub coverage: CoverageKind,
    /// Current monthly cost, before eligibility.
    pub monthly_cost: f64,
    /// Annual inflation applied before eligibility, in percent.
    pub pre_eligibility_inflation: f64,
    /// Monthly cost at the eligibility age, in today's dollars.
    pub eligibility_monthly_cost: f64,
    /// Annual inflation applied after eligibility, in percent.
    pub post_eligibility_inflation: f64,
    #[serde(default = "default_eligibility_age")]
    pub eligibility_age: u8,
}

impl HealthcarePerson {
    /// Healthcare cost for this person in a given simulation month.
    #[must_use]
    pub fn monthly_cost_at(&self, month: u32) -> f64 {
        let years_elapsed = month / 12;
        let age_now = u32::from(self.age) + years_elapsed;

        if age_now < u32::from(self.eligibility_age) {
            return self.monthly_cost
                * (1.0 + self.pre_eligibility_inflation / 100.0).powi(years_elapsed as i32);
        }

        // Post-eligibility inflation compounds only for the years spent past
        // the eligibility age; a person already eligible at month 0 compounds
        // for the full elapsed span.
        let years_to_eligibility =
            u32::from(self.eligibility_age.saturating_sub(self.age));
        let post_years = years_elapsed.saturating_sub(years_to_eligibility);
        self.eligibility_monthly_cost
            * (1.0 + self.post_eligibility_inflation / 100.0).powi(post_years as i32)
    }
}

/// Healthcare cost model, resolved at the data-model boundary.
///
/// The legacy scalar fields and the per-person list cannot coexist; callers
/// with old settings records go through [`Settings::migrate_healthcare`]
/// once rather than the evaluator branching on "is the list empty".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum HealthcareModel {
    /// No modeled healthcare costs.
    #[default]
    None,
    /// Single scalar cost with one inflation rate, kept for old records.
    Legacy {
        monthly_cost: f64,
        annual_inflation: f64,
    },
    /// Per-person costs with an eligibility regime switch.
    PerPerson { people: Vec<HealthcarePerson> },
}

/// Full plan settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Total portfolio value in dollars.
    pub portfolio_value: f64,
    /// Current age in whole years.
    pub current_age: u8,
    /// Percentage of the portfolio held in tax-deferred accounts (0-100).
    pub percent_tax_deferred: f64,
    /// Baseline monthly living expenses in dollars.
    pub monthly_living_expenses: f64,
    /// General annual inflation, in percent.
    pub inflation_rate: f64,
    /// Legacy healthcare annual inflation, in percent. Read only through
    /// [`Settings::migrate_healthcare`].
    #[serde(default)]
    pub healthcare_inflation_rate: f64,
    /// Annual decline in real spending, in percent (retirees tend to spend
    /// less as they age).
    #[serde(default)]
    pub spending_decline_rate: f64,
    /// Assumed annual investment return, in percent.
    pub investment_return: f64,
    /// Annual discount rate for present-value analysis, in percent.
    pub discount_rate: f64,
    /// Projection horizon in years.
    pub projection_years: u32,
    #[serde(default)]
    pub income_sources: Vec<IncomeSource>,
    #[serde(default)]
    pub expense_sources: Vec<ExpenseSource>,
    #[serde(default)]
    pub healthcare: HealthcareModel,
    /// Legacy scalar monthly healthcare cost; superseded by `healthcare`.
    #[serde(default)]
    pub legacy_healthcare_monthly_cost: Option<f64>,
}

impl Settings {
    /// Tax-deferred portion of the portfolio.
    #[must_use]
    pub fn tax_deferred_balance(&self) -> f64 {
        self.portfolio_value * self.percent_tax_deferred / 100.0
    }

    /// Taxable portion of the portfolio.
    #[must_use]
    pub fn taxable_balance(&self) -> f64 {
        self.portfolio_value - self.tax_deferred_balance()
    }

    /// Projection horizon in months.
    #[must_use]
    pub fn projection_months(&self) -> u32 {
        self.projection_years * 12
    }

    /// Resolve the legacy scalar healthcare fields into the tagged model.
    ///
    /// A populated `healthcare` model always wins; the scalar fields are
    /// consulted only when the model is `None`. Call once at the boundary
    /// when loading old settings records.
    #[must_use]
    pub fn migrate_healthcare(mut self) -> Self {
        if matches!(self.healthcare, HealthcareModel::None) {
            if let Some(cost) = self.legacy_healthcare_monthly_cost {
                if cost > 0.0 {
                    self.healthcare = HealthcareModel::Legacy {
                        monthly_cost: cost,
                        annual_inflation: self.healthcare_inflation_rate,
                    };
                }
            }
        }
        self.legacy_healthcare_monthly_cost = None;
        self
    }

    /// Scale every modeled healthcare cost by a factor. Used by the
    /// sensitivity scenarios.
    pub fn scale_healthcare_costs(&mut self, factor: f64) {
        match &mut self.healthcare {
            HealthcareModel::None => {}
            HealthcareModel::Legacy { monthly_cost, .. } => *monthly_cost *= factor,
            HealthcareModel::PerPerson { people } => {
                for person in people {
                    person.monthly_cost *= factor;
                    person.eligibility_monthly_cost *= factor;
                }
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            portfolio_value: 0.0,
            current_age: 65,
            percent_tax_deferred: 0.0,
            monthly_living_expenses: 0.0,
            inflation_rate: 0.0,
            healthcare_inflation_rate: 0.0,
            spending_decline_rate: 0.0,
            investment_return: 0.0,
            discount_rate: 0.0,
            projection_years: 30,
            income_sources: Vec::new(),
            expense_sources: Vec::new(),
            healthcare: HealthcareModel::None,
            legacy_healthcare_monthly_cost: None,
        }
    }
}
