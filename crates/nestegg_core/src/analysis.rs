//! Top-level analysis assembly and the caller-owned result cache.

use std::hash::Hasher;
use std::time::{Duration, Instant};

use rand::RngCore;
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

use crate::model::rmd::analyze_rmd;
use crate::model::{Analysis, Settings, SimulationParams, DEFAULT_TRIALS};
use crate::monte_carlo::run_monte_carlo;
use crate::projection::project;
use crate::sensitivity::{failure_point_analysis, sensitivity_analysis};
use crate::valuation::{budget_fit, present_value_analysis, sustainability_score};

/// Options for a full analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Monte Carlo trial count; 0 or unspecified falls back to the default.
    pub trials: usize,
    pub simulation: SimulationParams,
    /// Base seed for the stochastic engine. Fresh entropy when absent, so
    /// production runs differ while tests can pin a value.
    pub seed: Option<u64>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            simulation: SimulationParams::default(),
            seed: None,
        }
    }
}

impl AnalysisOptions {
    fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| rand::rngs::OsRng.next_u64())
    }
}

/// Run the complete analysis with default options.
#[must_use]
pub fn analyze(settings: &Settings) -> Analysis {
    analyze_with(settings, &AnalysisOptions::default())
}

/// Run the complete analysis: deterministic projection, budget fit, present
/// values, sustainability score, sensitivity, failure points, Monte Carlo,
/// and the mandatory-distribution schedule.
#[must_use]
pub fn analyze_with(settings: &Settings, options: &AnalysisOptions) -> Analysis {
    let projection = project(settings);
    let budget = budget_fit(settings);
    let score = sustainability_score(budget.required_withdrawal_rate, projection.survives);

    let rmd = analyze_rmd(
        settings.tax_deferred_balance(),
        u32::from(settings.current_age),
        settings.investment_return,
        settings.projection_years,
    );

    let monte_carlo = run_monte_carlo(
        settings,
        options.trials,
        &options.simulation,
        options.resolved_seed(),
    );

    Analysis {
        projection,
        budget_fit: budget,
        present_value: present_value_analysis(settings),
        score,
        sensitivity: sensitivity_analysis(settings),
        failure_points: failure_point_analysis(settings),
        monte_carlo,
        rmd,
    }
}

/// Hash a settings snapshot into a cache key.
///
/// Floats are hashed by bit pattern; two settings records hash equal only
/// when every field is bit-identical.
#[must_use]
pub fn settings_cache_key(settings: &Settings, options: &AnalysisOptions) -> u64 {
    let mut hasher = FxHasher::default();

    let write_f64 = |hasher: &mut FxHasher, v: f64| hasher.write_u64(v.to_bits());

    write_f64(&mut hasher, settings.portfolio_value);
    hasher.write_u8(settings.current_age);
    write_f64(&mut hasher, settings.percent_tax_deferred);
    write_f64(&mut hasher, settings.monthly_living_expenses);
    write_f64(&mut hasher, settings.inflation_rate);
    write_f64(&mut hasher, settings.healthcare_inflation_rate);
    write_f64(&mut hasher, settings.spending_decline_rate);
    write_f64(&mut hasher, settings.investment_return);
    write_f64(&mut hasher, settings.discount_rate);
    hasher.write_u32(settings.projection_years);

    for source in &settings.income_sources {
        hasher.write(source.id.as_bytes());
        write_f64(&mut hasher, source.monthly_amount);
        hasher.write_u32(source.start_month);
        hasher.write_u32(source.end_month.map_or(u32::MAX, |m| m));
        write_f64(&mut hasher, source.annual_cola);
    }
    for source in &settings.expense_sources {
        hasher.write(source.id.as_bytes());
        write_f64(&mut hasher, source.monthly_amount);
        hasher.write_u32(source.start_year);
        hasher.write_u32(source.end_year.map_or(u32::MAX, |y| y));
        hasher.write_u8(u8::from(source.inflation_adjusted));
        hasher.write_u8(u8::from(source.discretionary));
    }
    match &settings.healthcare {
        crate::model::HealthcareModel::None => hasher.write_u8(0),
        crate::model::HealthcareModel::Legacy {
            monthly_cost,
            annual_inflation,
        } => {
            hasher.write_u8(1);
            write_f64(&mut hasher, *monthly_cost);
            write_f64(&mut hasher, *annual_inflation);
        }
        crate::model::HealthcareModel::PerPerson { people } => {
            hasher.write_u8(2);
            for person in people {
                hasher.write_u8(person.age);
                hasher.write_u8(person.coverage as u8);
                write_f64(&mut hasher, person.monthly_cost);
                write_f64(&mut hasher, person.pre_eligibility_inflation);
                write_f64(&mut hasher, person.eligibility_monthly_cost);
                write_f64(&mut hasher, person.post_eligibility_inflation);
                hasher.write_u8(person.eligibility_age);
            }
        }
    }

    hasher.write_usize(options.trials);
    let sim = &options.simulation;
    write_f64(&mut hasher, sim.return_volatility);
    write_f64(&mut hasher, sim.crash_probability);
    write_f64(&mut hasher, sim.crash_mean_return);
    write_f64(&mut hasher, sim.crash_volatility);
    write_f64(&mut hasher, sim.recovery_boost);
    write_f64(&mut hasher, sim.spending_shock_probability);
    write_f64(&mut hasher, sim.spending_shock_min);
    write_f64(&mut hasher, sim.spending_shock_max);
    write_f64(&mut hasher, sim.health_shock_probability);
    write_f64(&mut hasher, sim.health_shock_min);
    write_f64(&mut hasher, sim.health_shock_max);
    hasher.write_u32(sim.longevity_variation_years);
    hasher.write_u32(sim.min_horizon_years);
    hasher.write_u64(options.seed.map_or(u64::MAX, |s| s));

    hasher.finish()
}

struct CacheEntry {
    analysis: Analysis,
    computed_at: Instant,
}

/// Explicit, caller-owned memoization of full analyses.
///
/// Keyed by a settings hash with a freshness check against the configured
/// TTL. The engine itself stays pure; callers decide where the cache lives
/// and how long entries stay valid.
pub struct AnalysisCache {
    entries: FxHashMap<u64, CacheEntry>,
    ttl: Duration,
}

impl AnalysisCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: FxHashMap::default(),
            ttl,
        }
    }

    /// Return the cached analysis when fresh, otherwise compute, store, and
    /// return it.
    ///
    /// Unseeded option bundles share one key, so repeated unseeded calls
    /// reuse the first run's Monte Carlo draws until the entry expires.
    pub fn get_or_compute(&mut self, settings: &Settings, options: &AnalysisOptions) -> &Analysis {
        let key = settings_cache_key(settings, options);

        let fresh = self
            .entries
            .get(&key)
            .is_some_and(|entry| entry.computed_at.elapsed() < self.ttl);
        if !fresh {
            self.entries.insert(
                key,
                CacheEntry {
                    analysis: analyze_with(settings, options),
                    computed_at: Instant::now(),
                },
            );
        }

        &self.entries[&key].analysis
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
