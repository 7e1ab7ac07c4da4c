//! Result types produced by the engine.
//!
//! Everything here is derived, recomputed per invocation, and carries no
//! cross-request identity. All types serialize so external collaborators
//! (HTTP, persistence) can transport them.

use serde::{Deserialize, Serialize};

use super::rmd::RmdAnalysis;

/// Expense breakdown for a single projected month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ExpenseBreakdown {
    pub living: f64,
    pub healthcare: f64,
    pub other: f64,
}

impl ExpenseBreakdown {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.living + self.healthcare + self.other
    }
}

/// Immutable snapshot of one projected month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionMonth {
    pub month: u32,
    /// Month expressed as a fractional year from the start.
    pub year: f64,
    pub tax_deferred_balance: f64,
    pub taxable_balance: f64,
    pub total_balance: f64,
    pub expenses: ExpenseBreakdown,
    pub income: f64,
    /// Amount withdrawn to meet need this month.
    pub withdrawal: f64,
    /// Mandatory-distribution share forced out this month.
    pub rmd: f64,
    /// Investment growth applied this month.
    pub growth: f64,
    pub depleted: bool,
}

/// Full deterministic projection: the monthly sequence plus summary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectionResult {
    pub months: Vec<ProjectionMonth>,
    pub final_balance: f64,
    /// First month the total balance reached zero, if any.
    pub depletion_month: Option<u32>,
    /// Depletion month as a fractional year ("longevity").
    pub longevity_years: Option<f64>,
    pub survives: bool,
}

/// Month-0 budget decomposition: how much of the spending gap the mandatory
/// distribution covers, and what residual the portfolio must fund.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BudgetFit {
    pub monthly_expenses: f64,
    pub monthly_income: f64,
    /// Monthly share of this year's mandatory distribution.
    pub monthly_rmd: f64,
    /// Pre-distribution gap (expenses minus income, floored at 0).
    pub gap: f64,
    /// Portion of the gap covered by the mandatory distribution.
    pub rmd_covers: f64,
    /// Forced distribution beyond the gap: non-discretionary cash that is
    /// reinvested, not spent.
    pub rmd_surplus: f64,
    /// Gap remaining after the mandatory distribution.
    pub residual_gap: f64,
    /// Annualized withdrawal rate required to fund the residual gap, in
    /// percent of the portfolio.
    pub required_withdrawal_rate: f64,
}

/// One valued cash-flow stream in the present-value analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvComponent {
    pub name: String,
    pub present_value: f64,
}

/// Present-value decomposition of all expense and income streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PvAnalysis {
    pub pv_expenses: f64,
    pub pv_income: f64,
    /// Expenses minus income: the liability the portfolio must fund.
    pub pv_gap: f64,
    pub expense_components: Vec<PvComponent>,
    pub income_components: Vec<PvComponent>,
}

/// Qualitative sustainability label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SustainabilityLabel {
    Excellent,
    Good,
    Fair,
    Caution,
    Poor,
    Critical,
}

/// Banded 0-100 summary of how comfortably the required withdrawal rate
/// sits relative to safe-withdrawal guidance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SustainabilityScore {
    pub score: u8,
    pub label: SustainabilityLabel,
    pub required_withdrawal_rate: f64,
    pub survives: bool,
}

impl Default for SustainabilityScore {
    fn default() -> Self {
        Self {
            score: 0,
            label: SustainabilityLabel::Critical,
            required_withdrawal_rate: 0.0,
            survives: false,
        }
    }
}

/// Outcome of one named single-parameter perturbation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityResult {
    pub name: String,
    pub final_balance: f64,
    pub longevity_years: Option<f64>,
    pub survives: bool,
    pub score: u8,
    /// Score change versus the unperturbed baseline.
    pub score_delta: i16,
}

/// Safety classification for a failure-point margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SafetyBand {
    Safe,
    Marginal,
    Critical,
}

/// Exact survive/fail threshold for one assumption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailurePoint {
    pub parameter: String,
    pub current_value: f64,
    /// Value at which the plan flips from surviving to failing, located to
    /// within the search precision (or the extreme bound if even that
    /// survives).
    pub threshold: f64,
    /// Absolute distance between current value and threshold.
    pub margin: f64,
    /// Margin relative to the current value, in percent.
    pub margin_percent: f64,
    pub safety: SafetyBand,
}

/// Failure-point results, gated on a surviving baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FailurePointAnalysis {
    /// Thresholds are undefined when the baseline already fails; callers
    /// must check this flag before trusting them.
    pub baseline_survives: bool,
    pub thresholds: Vec<FailurePoint>,
}

/// Timing bucket for a market crash within a trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashTiming {
    /// Years 0-4.
    Early,
    /// Years 5-14.
    Mid,
    /// Year 15 onward.
    Late,
}

/// Outcome of a single Monte Carlo trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub final_balance: f64,
    /// Year of depletion, 0 when the trial survived.
    pub depletion_year: u32,
    pub survives: bool,
    pub early_crashes: u32,
    pub mid_crashes: u32,
    pub late_crashes: u32,
    /// Timing of the earliest crash, if any.
    pub first_crash: Option<CrashTiming>,
    pub spending_shocks: u32,
    pub health_shocks: u32,
}

impl TrialOutcome {
    #[must_use]
    pub fn total_crashes(&self) -> u32 {
        self.early_crashes + self.mid_crashes + self.late_crashes
    }
}

/// One histogram bucket of final balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceBucket {
    pub label: String,
    /// Inclusive lower bound in dollars.
    pub lower: f64,
    /// Exclusive upper bound; `None` for the catch-all top bucket.
    pub upper: Option<f64>,
    pub count: usize,
}

/// Final-balance distribution for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Distribution {
    pub buckets: Vec<BalanceBucket>,
}

/// Survival statistics for one sequence-risk bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SequenceBucket {
    pub trials: usize,
    pub survivors: usize,
    /// Survival rate in percent; 0 for an empty bucket.
    pub survival_rate: f64,
}

impl SequenceBucket {
    pub(crate) fn record(&mut self, survived: bool) {
        self.trials += 1;
        if survived {
            self.survivors += 1;
        }
    }

    pub(crate) fn finalize(&mut self) {
        self.survival_rate = if self.trials > 0 {
            100.0 * self.survivors as f64 / self.trials as f64
        } else {
            0.0
        };
    }
}

/// Sequence-of-returns risk: survival rates partitioned by earliest-crash
/// timing, plus a recommended cash buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SequenceRiskBreakdown {
    pub no_crash: SequenceBucket,
    pub early_crash: SequenceBucket,
    pub mid_crash: SequenceBucket,
    pub late_crash: SequenceBucket,
    /// Late-crash survival minus early-crash survival, in percentage points.
    pub early_vs_late_impact: f64,
    /// No-crash survival minus early-crash survival, in percentage points.
    pub early_vs_none_impact: f64,
    /// Recommended cash buffer in years of annual expenses.
    pub recommended_buffer_years: u32,
    /// The buffer converted to dollars at month-0 expenses.
    pub recommended_buffer_amount: f64,
    /// Monthly spend the remaining portfolio sustains at a 4% withdrawal.
    pub sustainable_monthly_spend: f64,
}

/// Aggregate statistics over all Monte Carlo trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MonteCarloStats {
    pub trials: usize,
    /// Share of trials that survived the horizon, in percent.
    pub success_rate: f64,
    pub mean_final_balance: f64,
    pub median_final_balance: f64,
    pub p10_final_balance: f64,
    pub p25_final_balance: f64,
    pub p75_final_balance: f64,
    pub p90_final_balance: f64,
    pub worst_case: f64,
    pub best_case: f64,
    /// Mean years to depletion among failed trials; 0 when none failed.
    pub mean_years_to_depletion: f64,
    pub trials_with_crash: usize,
    pub avg_crashes_per_trial: f64,
    pub avg_spending_shocks_per_trial: f64,
    pub avg_health_shocks_per_trial: f64,
    pub sequence_risk: SequenceRiskBreakdown,
    pub distribution: Distribution,
}

/// The full analysis aggregate returned to external callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Analysis {
    pub projection: ProjectionResult,
    pub budget_fit: BudgetFit,
    pub present_value: PvAnalysis,
    pub score: SustainabilityScore,
    pub sensitivity: Vec<SensitivityResult>,
    pub failure_points: FailurePointAnalysis,
    pub monte_carlo: MonteCarloStats,
    pub rmd: RmdAnalysis,
}
