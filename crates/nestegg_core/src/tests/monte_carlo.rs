//! Stochastic engine tests: seeded determinism, aggregate ordering, and the
//! sequence-risk and distribution summaries.

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::model::{SimulationParams, DEFAULT_TRIALS};
use crate::monte_carlo::{run_monte_carlo, run_trial};

use super::{comfortable_settings, doomed_settings};

#[test]
fn test_identical_seeds_produce_identical_trials() {
    let settings = comfortable_settings();
    let params = SimulationParams::default();

    let mut rng_a = SmallRng::seed_from_u64(42);
    let mut rng_b = SmallRng::seed_from_u64(42);
    let a = run_trial(&settings, &params, &mut rng_a);
    let b = run_trial(&settings, &params, &mut rng_b);

    assert_eq!(a.final_balance, b.final_balance);
    assert_eq!(a.survives, b.survives);
    assert_eq!(a.depletion_year, b.depletion_year);
}

#[test]
fn test_identical_base_seeds_produce_identical_stats() {
    let settings = comfortable_settings();
    let params = SimulationParams::default();

    let a = run_monte_carlo(&settings, 200, &params, 7);
    let b = run_monte_carlo(&settings, 200, &params, 7);
    assert_eq!(a, b);
}

#[test]
fn test_percentiles_are_ordered() {
    let stats = run_monte_carlo(
        &comfortable_settings(),
        500,
        &SimulationParams::default(),
        1,
    );

    assert!(stats.worst_case <= stats.p10_final_balance);
    assert!(stats.p10_final_balance <= stats.p25_final_balance);
    assert!(stats.p25_final_balance <= stats.median_final_balance);
    assert!(stats.median_final_balance <= stats.p75_final_balance);
    assert!(stats.p75_final_balance <= stats.p90_final_balance);
    assert!(stats.p90_final_balance <= stats.best_case);
}

#[test]
fn test_zero_trials_falls_back_to_default() {
    let stats = run_monte_carlo(
        &comfortable_settings(),
        0,
        &SimulationParams::default(),
        3,
    );
    assert_eq!(stats.trials, DEFAULT_TRIALS);
}

#[test]
fn test_success_rate_bounds() {
    let comfortable = run_monte_carlo(
        &comfortable_settings(),
        300,
        &SimulationParams::default(),
        11,
    );
    assert!(comfortable.success_rate >= 0.0 && comfortable.success_rate <= 100.0);

    let doomed = run_monte_carlo(&doomed_settings(), 300, &SimulationParams::default(), 11);
    assert_eq!(doomed.success_rate, 0.0);
    assert!(doomed.mean_years_to_depletion < 2.0);
}

#[test]
fn test_sequence_buckets_partition_all_trials() {
    let stats = run_monte_carlo(
        &comfortable_settings(),
        400,
        &SimulationParams::default(),
        5,
    );
    let risk = &stats.sequence_risk;
    let bucketed = risk.no_crash.trials
        + risk.early_crash.trials
        + risk.mid_crash.trials
        + risk.late_crash.trials;
    assert_eq!(bucketed, stats.trials);
    assert_eq!(
        stats.trials_with_crash,
        stats.trials - risk.no_crash.trials
    );
}

#[test]
fn test_distribution_counts_sum_to_trials() {
    let stats = run_monte_carlo(
        &comfortable_settings(),
        250,
        &SimulationParams::default(),
        9,
    );
    let counted: usize = stats.distribution.buckets.iter().map(|b| b.count).sum();
    assert_eq!(counted, stats.trials);

    // Bottom bucket and catch-all top bucket are always present.
    let first = stats.distribution.buckets.first().unwrap();
    assert_eq!(first.lower, 0.0);
    let last = stats.distribution.buckets.last().unwrap();
    assert_eq!(last.upper, None);
}

#[test]
fn test_returns_are_clamped() {
    // Absurd volatility still cannot push a year outside the +/-50% band;
    // with zero expenses the balance can at worst halve each year.
    let mut settings = comfortable_settings();
    settings.monthly_living_expenses = 0.0;
    settings.projection_years = 10;

    let params = SimulationParams {
        return_volatility: 500.0,
        // Shocks withdraw dollars regardless of returns; silence them so
        // the floor below reflects returns alone.
        spending_shock_probability: 0.0,
        health_shock_probability: 0.0,
        ..SimulationParams::default()
    };
    let stats = run_monte_carlo(&settings, 100, &params, 13);
    let floor = 1_000_000.0 * (1.0 - 0.5 / 12.0_f64).powi(12 * 16);
    assert!(stats.worst_case > floor);
}

#[test]
fn test_crash_probability_one_marks_every_trial() {
    let params = SimulationParams {
        crash_probability: 1.0,
        ..SimulationParams::default()
    };
    let stats = run_monte_carlo(&comfortable_settings(), 100, &params, 17);
    assert_eq!(stats.trials_with_crash, stats.trials);
    // Every trial's first crash lands in year 0, the early bucket.
    assert_eq!(stats.sequence_risk.early_crash.trials, stats.trials);
}

#[test]
fn test_longevity_variation_respects_minimum_horizon() {
    let mut settings = comfortable_settings();
    settings.projection_years = 2;

    let params = SimulationParams {
        longevity_variation_years: 10,
        min_horizon_years: 10,
        ..SimulationParams::default()
    };
    // Horizon 2 with +/-10 variation must still run at least 10 years; a
    // doomed variant of this plan therefore cannot deplete later than the
    // varied horizon allows, and the run must not panic on short inputs.
    let stats = run_monte_carlo(&settings, 50, &params, 19);
    assert_eq!(stats.trials, 50);
}

#[test]
fn test_buffer_recommendation_is_within_bands() {
    let stats = run_monte_carlo(
        &comfortable_settings(),
        400,
        &SimulationParams::default(),
        23,
    );
    let risk = &stats.sequence_risk;
    assert!((1..=4).contains(&risk.recommended_buffer_years));
    let annual_expenses = 4_000.0 * 12.0;
    assert!(
        (risk.recommended_buffer_amount
            - f64::from(risk.recommended_buffer_years) * annual_expenses)
            .abs()
            < 1e-6
    );
    assert!(risk.sustainable_monthly_spend >= 0.0);
}
