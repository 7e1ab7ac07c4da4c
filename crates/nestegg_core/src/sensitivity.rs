//! Sensitivity scenarios and failure-point search.
//!
//! Both re-run the deterministic projection on mutated copies of the
//! settings. The failure-point search uses one generic bisection routine
//! parameterized by getter, setter, extreme bound, and precision rather
//! than four near-duplicate implementations.

use crate::model::{
    FailurePoint, FailurePointAnalysis, ProjectionResult, SafetyBand, SensitivityResult,
    Settings,
};
use crate::projection::project;
use crate::valuation::{budget_fit, sustainability_score};

/// Run the projection and score a settings snapshot.
fn evaluate(settings: &Settings) -> (ProjectionResult, u8) {
    let projection = project(settings);
    let fit = budget_fit(settings);
    let score = sustainability_score(fit.required_withdrawal_rate, projection.survives);
    (projection, score.score)
}

/// The fixed list of named single-parameter perturbations.
fn scenarios() -> Vec<(&'static str, fn(&mut Settings))> {
    vec![
        ("Return -2pp", |s| s.investment_return -= 2.0),
        ("Return +2pp", |s| s.investment_return += 2.0),
        ("Inflation +1pp", |s| s.inflation_rate += 1.0),
        ("Inflation -1pp", |s| s.inflation_rate -= 1.0),
        ("Expenses +10%", |s| s.monthly_living_expenses *= 1.10),
        ("Healthcare +50%", |s| s.scale_healthcare_costs(1.5)),
    ]
}

/// Perturb each assumption in turn and report the resulting outcome and
/// score delta versus the unperturbed baseline.
#[must_use]
pub fn sensitivity_analysis(settings: &Settings) -> Vec<SensitivityResult> {
    let (_, baseline_score) = evaluate(settings);

    scenarios()
        .into_iter()
        .map(|(name, mutate)| {
            let mut perturbed = settings.clone();
            mutate(&mut perturbed);
            let (projection, score) = evaluate(&perturbed);
            SensitivityResult {
                name: name.to_string(),
                final_balance: projection.final_balance,
                longevity_years: projection.longevity_years,
                survives: projection.survives,
                score,
                score_delta: i16::from(score) - i16::from(baseline_score),
            }
        })
        .collect()
}

/// One bisectable assumption.
struct SearchParam {
    name: &'static str,
    get: fn(&Settings) -> f64,
    set: fn(&mut Settings, f64),
    /// Parameter-specific worst plausible value; the search never goes
    /// past it.
    extreme: fn(&Settings) -> f64,
    precision: f64,
}

fn search_params() -> Vec<SearchParam> {
    vec![
        SearchParam {
            name: "Investment return",
            get: |s| s.investment_return,
            set: |s, v| s.investment_return = v,
            extreme: |_| -10.0,
            precision: 0.1,
        },
        SearchParam {
            name: "Inflation rate",
            get: |s| s.inflation_rate,
            set: |s, v| s.inflation_rate = v,
            extreme: |_| 15.0,
            precision: 0.1,
        },
        SearchParam {
            name: "Monthly expenses",
            get: |s| s.monthly_living_expenses,
            set: |s, v| s.monthly_living_expenses = v,
            extreme: |s| (s.monthly_living_expenses * 4.0).max(20_000.0),
            precision: 50.0,
        },
        SearchParam {
            name: "Portfolio value",
            get: |s| s.portfolio_value,
            set: |s, v| s.portfolio_value = v,
            extreme: |_| 0.0,
            precision: 1_000.0,
        },
    ]
}

fn survives_with(settings: &Settings, param: &SearchParam, value: f64) -> bool {
    let mut candidate = settings.clone();
    (param.set)(&mut candidate, value);
    project(&candidate).survives
}

/// Classify the margin between the current value and the threshold.
fn classify_margin(margin_percent: f64) -> SafetyBand {
    if margin_percent >= 20.0 {
        SafetyBand::Safe
    } else if margin_percent >= 5.0 {
        SafetyBand::Marginal
    } else {
        SafetyBand::Critical
    }
}

/// Bisect between the current (surviving) value and the extreme bound for
/// the exact survive/fail threshold.
///
/// Returns the extreme bound itself when even it survives: a conservative
/// threshold rather than a search past the plausible range.
fn bisect(settings: &Settings, param: &SearchParam) -> FailurePoint {
    let current = (param.get)(settings);
    let extreme = (param.extreme)(settings);

    let threshold = if survives_with(settings, param, extreme) {
        extreme
    } else {
        // Invariant: `ok` survives, `bad` fails.
        let mut ok = current;
        let mut bad = extreme;
        while (ok - bad).abs() > param.precision {
            let mid = (ok + bad) / 2.0;
            if survives_with(settings, param, mid) {
                ok = mid;
            } else {
                bad = mid;
            }
        }
        bad
    };

    let margin = (current - threshold).abs();
    let margin_percent = if current.abs() > f64::EPSILON {
        margin / current.abs() * 100.0
    } else {
        0.0
    };

    FailurePoint {
        parameter: param.name.to_string(),
        current_value: current,
        threshold,
        margin,
        margin_percent,
        safety: classify_margin(margin_percent),
    }
}

/// Locate the survive/fail threshold for each key assumption.
///
/// Undefined when the baseline already fails: the result carries
/// `baseline_survives = false` and no thresholds.
#[must_use]
pub fn failure_point_analysis(settings: &Settings) -> FailurePointAnalysis {
    if !project(settings).survives {
        return FailurePointAnalysis {
            baseline_survives: false,
            thresholds: Vec::new(),
        };
    }

    let thresholds = search_params()
        .iter()
        .map(|param| bisect(settings, param))
        .collect();

    FailurePointAnalysis {
        baseline_survives: true,
        thresholds,
    }
}
