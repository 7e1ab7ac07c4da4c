//! Data model: plan settings in, analysis results out.

pub mod results;
pub mod rmd;
pub mod settings;
pub mod sim_params;

pub use results::{
    Analysis, BalanceBucket, BudgetFit, CrashTiming, Distribution, ExpenseBreakdown,
    FailurePoint, FailurePointAnalysis, MonteCarloStats, ProjectionMonth, ProjectionResult,
    PvAnalysis, PvComponent, SafetyBand, SensitivityResult, SequenceBucket,
    SequenceRiskBreakdown, SustainabilityLabel, SustainabilityScore, TrialOutcome,
};
pub use rmd::{RmdAnalysis, RmdYear, RMD_START_AGE};
pub use settings::{
    CoverageKind, ExpenseSource, HealthcareModel, HealthcarePerson, IncomeSource, Settings,
};
pub use sim_params::{SimulationParams, DEFAULT_TRIALS};
