//! Retirement sufficiency simulation library
//!
//! This crate projects a personal portfolio forward month-by-month to answer
//! whether a plan survives its horizon. It provides:
//! - A deterministic projection engine with tax-deferred/taxable withdrawal
//!   ordering and Required Minimum Distribution (RMD) modeling
//! - Closed-form annuity valuation and a budget-fit decomposition
//! - Sensitivity scenarios and binary-search failure thresholds
//! - A Monte Carlo layer with market crashes, spending/health shocks, and
//!   sequence-of-returns risk analysis
//!
//! All computation is synchronous and CPU-bound; the only boundary is the
//! in-process call contract taking a [`model::Settings`] value and returning
//! a [`model::Analysis`] aggregate.
//!
//! ```ignore
//! use nestegg_core::{analyze_with, AnalysisOptions, model::Settings};
//!
//! let settings = Settings {
//!     portfolio_value: 1_000_000.0,
//!     current_age: 65,
//!     monthly_living_expenses: 4_000.0,
//!     investment_return: 6.0,
//!     inflation_rate: 3.0,
//!     projection_years: 30,
//!     ..Settings::default()
//! };
//! let analysis = analyze_with(&settings, &AnalysisOptions::default());
//! assert!(analysis.projection.survives);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod cash_flows;
pub mod monte_carlo;
pub mod projection;
pub mod sensitivity;
pub mod valuation;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use analysis::{analyze, analyze_with, AnalysisCache, AnalysisOptions};
