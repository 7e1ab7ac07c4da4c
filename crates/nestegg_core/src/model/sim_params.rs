//! Tunable parameters for the stochastic simulation engine.

use serde::{Deserialize, Serialize};

/// Default number of Monte Carlo trials.
pub const DEFAULT_TRIALS: usize = 1000;

/// Simulation-parameter bundle for the stochastic engine.
///
/// All fields default to the reference values documented on each field;
/// callers override only what they need.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Standard deviation of annual returns around the baseline, in
    /// percentage points. Reference: 15.
    pub return_volatility: f64,
    /// Annual probability of a market crash. Reference: 0.05.
    pub crash_probability: f64,
    /// Mean annual return in a crash year, in percent. Reference: -30.
    pub crash_mean_return: f64,
    /// Standard deviation of the crash-year return noise, in percentage
    /// points. Reference: 8.
    pub crash_volatility: f64,
    /// Added to the baseline mean return in the year after a crash, in
    /// percentage points. Reference: 6.
    pub recovery_boost: f64,
    /// Annual probability of a discretionary spending shock. Reference: 0.10.
    pub spending_shock_probability: f64,
    /// Uniform dollar range of a spending shock. Reference: 2,000-15,000.
    pub spending_shock_min: f64,
    pub spending_shock_max: f64,
    /// Annual probability of a health-cost shock. Reference: 0.05.
    pub health_shock_probability: f64,
    /// Uniform dollar range of a health shock. Reference: 5,000-50,000.
    pub health_shock_min: f64,
    pub health_shock_max: f64,
    /// Maximum absolute random offset applied to the projection horizon,
    /// in years. Reference: 5.
    pub longevity_variation_years: u32,
    /// Floor for the varied horizon, in years. Reference: 10.
    pub min_horizon_years: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            return_volatility: 15.0,
            crash_probability: 0.05,
            crash_mean_return: -30.0,
            crash_volatility: 8.0,
            recovery_boost: 6.0,
            spending_shock_probability: 0.10,
            spending_shock_min: 2_000.0,
            spending_shock_max: 15_000.0,
            health_shock_probability: 0.05,
            health_shock_min: 5_000.0,
            health_shock_max: 50_000.0,
            longevity_variation_years: 5,
            min_horizon_years: 10,
        }
    }
}
