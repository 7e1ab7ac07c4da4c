//! Stochastic simulation engine.
//!
//! Runs N independent trials over randomized return/shock sequences and
//! aggregates distributional and sequence-of-returns statistics. Each trial
//! owns its random source; the fan-out is batched across rayon workers with
//! per-batch seeded generators so results are reproducible from a base seed.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use rand_distr::{Distribution as _, Normal};

use crate::cash_flows::{expense_breakdown, total_income};
use crate::model::{
    BalanceBucket, CrashTiming, Distribution, MonteCarloStats, SequenceRiskBreakdown, Settings,
    SimulationParams, TrialOutcome,
};
use crate::projection::BalanceState;

/// Annual returns are clamped to this band, in percent.
const RETURN_CLAMP: f64 = 50.0;

/// Uniform jitter applied to living-expense inflation each year, in
/// percentage points.
const LIVING_INFLATION_JITTER: f64 = 1.0;

/// Uniform jitter applied to healthcare inflation each year, in percentage
/// points.
const HEALTHCARE_INFLATION_JITTER: f64 = 2.0;

/// Assumed safe withdrawal rate for the cash-buffer recommendation.
const SAFE_WITHDRAWAL_RATE: f64 = 0.04;

fn sample_normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return mean;
    }
    Normal::new(mean, std_dev).map_or(mean, |dist| dist.sample(rng))
}

fn sample_uniform<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if max > min {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

fn crash_timing(year: u32) -> CrashTiming {
    match year {
        0..=4 => CrashTiming::Early,
        5..=14 => CrashTiming::Mid,
        _ => CrashTiming::Late,
    }
}

/// Pre-generated annual return sequence with crash bookkeeping.
struct ReturnSequence {
    returns: Vec<f64>,
    early_crashes: u32,
    mid_crashes: u32,
    late_crashes: u32,
    first_crash: Option<CrashTiming>,
}

fn generate_returns<R: Rng + ?Sized>(
    rng: &mut R,
    years: u32,
    baseline: f64,
    params: &SimulationParams,
) -> ReturnSequence {
    let mut seq = ReturnSequence {
        returns: Vec::with_capacity(years as usize),
        early_crashes: 0,
        mid_crashes: 0,
        late_crashes: 0,
        first_crash: None,
    };

    let mut recovery_year = false;
    for year in 0..years {
        let annual = if recovery_year {
            // The year after a crash reverts with a boosted mean.
            recovery_year = false;
            sample_normal(rng, baseline + params.recovery_boost, params.return_volatility)
        } else if rng.gen::<f64>() < params.crash_probability {
            recovery_year = true;
            let timing = crash_timing(year);
            match timing {
                CrashTiming::Early => seq.early_crashes += 1,
                CrashTiming::Mid => seq.mid_crashes += 1,
                CrashTiming::Late => seq.late_crashes += 1,
            }
            if seq.first_crash.is_none() {
                seq.first_crash = Some(timing);
            }
            sample_normal(rng, params.crash_mean_return, params.crash_volatility)
        } else {
            sample_normal(rng, baseline, params.return_volatility)
        };

        seq.returns.push(annual.clamp(-RETURN_CLAMP, RETURN_CLAMP));
    }

    seq
}

/// Run one trial.
///
/// The monthly walk reuses the deterministic engine's [`BalanceState`], so
/// withdrawal ordering and depletion semantics are identical; only the
/// inputs (returns, inflation jitter, shocks, horizon) are randomized.
pub fn run_trial<R: Rng + ?Sized>(
    settings: &Settings,
    params: &SimulationParams,
    rng: &mut R,
) -> TrialOutcome {
    let variation = params.longevity_variation_years as i64;
    let offset = if variation > 0 {
        rng.gen_range(-variation..=variation)
    } else {
        0
    };
    let years = (i64::from(settings.projection_years) + offset)
        .max(i64::from(params.min_horizon_years)) as u32;

    let seq = generate_returns(rng, years, settings.investment_return, params);

    let mut state = BalanceState::from_settings(settings);
    let mut monthly_rmd = 0.0;
    let mut living_jitter = 1.0;
    let mut healthcare_jitter = 1.0;
    let mut monthly_shock = 0.0;
    let mut monthly_return = 0.0;
    let mut spending_shocks = 0;
    let mut health_shocks = 0;

    for month in 0..years * 12 {
        let year = month / 12;
        if month % 12 == 0 {
            monthly_return = seq.returns[year as usize] / 100.0 / 12.0;

            let age = u32::from(settings.current_age) + year;
            monthly_rmd = state.monthly_rmd_share(age);

            // Inflation variation: bounded uniform noise on this year's
            // rates, compounded into running jitter factors.
            if year > 0 {
                let living_pp =
                    sample_uniform(rng, -LIVING_INFLATION_JITTER, LIVING_INFLATION_JITTER);
                let health_pp = sample_uniform(
                    rng,
                    -HEALTHCARE_INFLATION_JITTER,
                    HEALTHCARE_INFLATION_JITTER,
                );
                living_jitter *= 1.0 + living_pp / 100.0;
                healthcare_jitter *= 1.0 + health_pp / 100.0;
            }

            // Independent annual shock rolls, pro-rated across the year.
            monthly_shock = 0.0;
            if rng.gen::<f64>() < params.spending_shock_probability {
                spending_shocks += 1;
                monthly_shock +=
                    sample_uniform(rng, params.spending_shock_min, params.spending_shock_max)
                        / 12.0;
            }
            if rng.gen::<f64>() < params.health_shock_probability {
                health_shocks += 1;
                monthly_shock +=
                    sample_uniform(rng, params.health_shock_min, params.health_shock_max) / 12.0;
            }
        }

        let breakdown = expense_breakdown(settings, month);
        let expenses = breakdown.living * living_jitter
            + breakdown.healthcare * healthcare_jitter
            + breakdown.other
            + monthly_shock;
        let income = total_income(settings, month);

        state.step_month(month, income, expenses, monthly_return, monthly_rmd);
        if state.depleted {
            break;
        }
    }

    let depletion_year = state.depletion_month.map_or(0, |m| m / 12);

    TrialOutcome {
        final_balance: state.total(),
        depletion_year,
        survives: state.depletion_month.is_none(),
        early_crashes: seq.early_crashes,
        mid_crashes: seq.mid_crashes,
        late_crashes: seq.late_crashes,
        first_crash: seq.first_crash,
        spending_shocks,
        health_shocks,
    }
}

const MAX_BATCH_SIZE: usize = 100;

/// Run `trials` independent trials from a base seed and aggregate.
///
/// Non-positive trial counts fall back to [`crate::model::DEFAULT_TRIALS`].
#[must_use]
pub fn run_monte_carlo(
    settings: &Settings,
    trials: usize,
    params: &SimulationParams,
    seed: u64,
) -> MonteCarloStats {
    let trials = if trials == 0 {
        crate::model::DEFAULT_TRIALS
    } else {
        trials
    };
    let num_batches = trials.div_ceil(MAX_BATCH_SIZE);

    let run_batch = |batch: usize| {
        let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(batch as u64));
        let batch_size = if batch == num_batches - 1 {
            trials - batch * MAX_BATCH_SIZE
        } else {
            MAX_BATCH_SIZE
        };
        (0..batch_size)
            .map(|_| {
                let trial_seed = rng.next_u64();
                let mut trial_rng = SmallRng::seed_from_u64(trial_seed);
                run_trial(settings, params, &mut trial_rng)
            })
            .collect::<Vec<_>>()
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<TrialOutcome> = {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
        (0..num_batches).into_par_iter().flat_map(run_batch).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<TrialOutcome> = (0..num_batches).flat_map(run_batch).collect();

    aggregate(settings, &outcomes)
}

/// Nearest-rank percentile over a sorted slice. Monotone in `q`, so the
/// worst <= p10 <= ... <= best ordering always holds.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() - 1) as f64 * q).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Histogram bucket edges in dollars: finer below $3M, coarser above.
const BUCKET_EDGES: [f64; 10] = [
    0.0,
    100_000.0,
    250_000.0,
    500_000.0,
    750_000.0,
    1_000_000.0,
    1_500_000.0,
    2_000_000.0,
    3_000_000.0,
    5_000_000.0,
];

fn bucket_label(lower: f64, upper: Option<f64>) -> String {
    let fmt = |v: f64| {
        if v >= 1_000_000.0 {
            format!("${:.1}M", v / 1_000_000.0)
        } else {
            format!("${:.0}k", v / 1_000.0)
        }
    };
    match upper {
        Some(upper) => format!("{}-{}", fmt(lower), fmt(upper)),
        None => format!("{}+", fmt(lower)),
    }
}

fn build_distribution(balances: &[f64]) -> Distribution {
    let mut buckets: Vec<BalanceBucket> = BUCKET_EDGES
        .windows(2)
        .map(|pair| BalanceBucket {
            label: bucket_label(pair[0], Some(pair[1])),
            lower: pair[0],
            upper: Some(pair[1]),
            count: 0,
        })
        .collect();
    // Catch-all top bucket; the bottom bucket is already always present.
    let top_edge = BUCKET_EDGES[BUCKET_EDGES.len() - 1];
    buckets.push(BalanceBucket {
        label: bucket_label(top_edge, None),
        lower: top_edge,
        upper: None,
        count: 0,
    });

    for &balance in balances {
        let idx = buckets
            .iter()
            .position(|b| b.upper.map_or(true, |upper| balance < upper))
            .unwrap_or(buckets.len() - 1);
        buckets[idx].count += 1;
    }

    Distribution { buckets }
}

/// Cash-buffer recommendation in years, from fixed bands of the
/// early-vs-none survival impact magnitude (percentage points).
fn buffer_years(early_vs_none_impact: f64) -> u32 {
    let impact = early_vs_none_impact.abs();
    if impact < 5.0 {
        1
    } else if impact < 10.0 {
        2
    } else if impact < 20.0 {
        3
    } else {
        4
    }
}

fn sequence_risk(settings: &Settings, outcomes: &[TrialOutcome]) -> SequenceRiskBreakdown {
    let mut risk = SequenceRiskBreakdown::default();

    for outcome in outcomes {
        let bucket = match outcome.first_crash {
            None => &mut risk.no_crash,
            Some(CrashTiming::Early) => &mut risk.early_crash,
            Some(CrashTiming::Mid) => &mut risk.mid_crash,
            Some(CrashTiming::Late) => &mut risk.late_crash,
        };
        bucket.record(outcome.survives);
    }
    risk.no_crash.finalize();
    risk.early_crash.finalize();
    risk.mid_crash.finalize();
    risk.late_crash.finalize();

    risk.early_vs_late_impact = risk.late_crash.survival_rate - risk.early_crash.survival_rate;
    risk.early_vs_none_impact = risk.no_crash.survival_rate - risk.early_crash.survival_rate;

    let annual_expenses = crate::cash_flows::total_expenses(settings, 0) * 12.0;
    risk.recommended_buffer_years = buffer_years(risk.early_vs_none_impact);
    risk.recommended_buffer_amount = f64::from(risk.recommended_buffer_years) * annual_expenses;
    let remainder = (settings.portfolio_value - risk.recommended_buffer_amount).max(0.0);
    risk.sustainable_monthly_spend = remainder * SAFE_WITHDRAWAL_RATE / 12.0;

    risk
}

fn aggregate(settings: &Settings, outcomes: &[TrialOutcome]) -> MonteCarloStats {
    let trials = outcomes.len();
    if trials == 0 {
        return MonteCarloStats::default();
    }

    let mut balances: Vec<f64> = outcomes.iter().map(|o| o.final_balance).collect();
    balances.sort_by(f64::total_cmp);

    let survivors = outcomes.iter().filter(|o| o.survives).count();
    let failures: Vec<&TrialOutcome> = outcomes.iter().filter(|o| !o.survives).collect();
    let mean_years_to_depletion = if failures.is_empty() {
        0.0
    } else {
        failures.iter().map(|o| f64::from(o.depletion_year)).sum::<f64>() / failures.len() as f64
    };

    let trials_f = trials as f64;
    let total_crashes: u32 = outcomes.iter().map(TrialOutcome::total_crashes).sum();

    MonteCarloStats {
        trials,
        success_rate: 100.0 * survivors as f64 / trials_f,
        mean_final_balance: balances.iter().sum::<f64>() / trials_f,
        median_final_balance: percentile(&balances, 0.50),
        p10_final_balance: percentile(&balances, 0.10),
        p25_final_balance: percentile(&balances, 0.25),
        p75_final_balance: percentile(&balances, 0.75),
        p90_final_balance: percentile(&balances, 0.90),
        worst_case: balances[0],
        best_case: balances[balances.len() - 1],
        mean_years_to_depletion,
        trials_with_crash: outcomes.iter().filter(|o| o.first_crash.is_some()).count(),
        avg_crashes_per_trial: f64::from(total_crashes) / trials_f,
        avg_spending_shocks_per_trial: outcomes
            .iter()
            .map(|o| f64::from(o.spending_shocks))
            .sum::<f64>()
            / trials_f,
        avg_health_shocks_per_trial: outcomes
            .iter()
            .map(|o| f64::from(o.health_shocks))
            .sum::<f64>()
            / trials_f,
        sequence_risk: sequence_risk(settings, outcomes),
        distribution: build_distribution(&balances),
    }
}
