//! Valuation tests: annuity present-value identities, budget-fit
//! decomposition, and sustainability scoring.

use crate::model::{HealthcareModel, IncomeSource, SustainabilityLabel};
use crate::valuation::{
    budget_fit, present_value_analysis, present_value_annuity, sustainability_score,
};

use super::comfortable_settings;

#[test]
fn test_pv_zero_rates_is_payment_times_n() {
    assert!((present_value_annuity(1_000.0, 0.0, 0.0, 0, 120) - 120_000.0).abs() < 1e-6);
}

#[test]
fn test_pv_equal_growth_and_discount_is_payment_times_n() {
    for rate in [1.0, 3.0, 5.0, 7.5] {
        let pv = present_value_annuity(2_500.0, rate, rate, 0, 240);
        assert!(
            (pv - 2_500.0 * 240.0).abs() < 1e-6,
            "equal-rate identity failed at {rate}%"
        );
    }
}

#[test]
fn test_pv_zero_discount_with_growth_sums_geometric_series() {
    let pv = present_value_annuity(1_000.0, 0.0, 12.0, 0, 24);
    // 1% monthly growth over 24 payments.
    let expected: f64 = (0..24).map(|k| 1_000.0 * 1.01_f64.powi(k)).sum();
    assert!((pv - expected).abs() < 1e-6);
}

#[test]
fn test_pv_standard_annuity_closed_form() {
    let pv = present_value_annuity(1_000.0, 6.0, 0.0, 0, 360);
    let r = 0.06 / 12.0;
    let expected = 1_000.0 * (1.0 - (1.0_f64 + r).powf(-360.0)) / r;
    assert!((pv - expected).abs() < 1e-6);
}

#[test]
fn test_pv_future_start_is_discounted_back() {
    let immediate = present_value_annuity(1_000.0, 6.0, 0.0, 0, 120);
    let deferred = present_value_annuity(1_000.0, 6.0, 0.0, 60, 120);
    let r = 0.06_f64 / 12.0;
    assert!(deferred < immediate);
    assert!((deferred - immediate / (1.0 + r).powf(60.0)).abs() < 1e-6);
}

#[test]
fn test_pv_zero_payments_is_zero() {
    assert_eq!(present_value_annuity(1_000.0, 5.0, 2.0, 0, 0), 0.0);
    assert_eq!(present_value_annuity(0.0, 5.0, 2.0, 0, 120), 0.0);
}

#[test]
fn test_pv_analysis_sums_components() {
    let mut settings = comfortable_settings();
    settings.healthcare = HealthcareModel::Legacy {
        monthly_cost: 800.0,
        annual_inflation: 6.0,
    };
    settings.income_sources = vec![IncomeSource {
        id: "ss".to_string(),
        name: "Social Security".to_string(),
        monthly_amount: 2_200.0,
        start_month: 24,
        end_month: None,
        annual_cola: 2.0,
    }];

    let pv = present_value_analysis(&settings);
    let expense_sum: f64 = pv.expense_components.iter().map(|c| c.present_value).sum();
    let income_sum: f64 = pv.income_components.iter().map(|c| c.present_value).sum();

    assert!((pv.pv_expenses - expense_sum).abs() < 1e-6);
    assert!((pv.pv_income - income_sum).abs() < 1e-6);
    assert!((pv.pv_gap - (expense_sum - income_sum)).abs() < 1e-6);
    assert_eq!(pv.expense_components.len(), 2);
    assert!(pv.pv_income > 0.0);
}

#[test]
fn test_budget_fit_rmd_covers_gap_with_surplus() {
    let mut settings = comfortable_settings();
    settings.current_age = 75;
    settings.percent_tax_deferred = 100.0;
    settings.portfolio_value = 2_000_000.0;

    let fit = budget_fit(&settings);
    // Age 75 divisor is 24.6 on the full $2M: about $6,775/month.
    let expected_rmd = 2_000_000.0 / 24.6 / 12.0;
    assert!((fit.monthly_rmd - expected_rmd).abs() < 0.01);
    assert!((fit.gap - 4_000.0).abs() < 1e-9);
    // The distribution covers the whole gap with surplus left over.
    assert!((fit.rmd_covers - 4_000.0).abs() < 1e-9);
    assert!((fit.rmd_surplus - (expected_rmd - 4_000.0)).abs() < 0.01);
    assert_eq!(fit.residual_gap, 0.0);
    assert_eq!(fit.required_withdrawal_rate, 0.0);
}

#[test]
fn test_budget_fit_rmd_partially_covers_gap() {
    let mut settings = comfortable_settings();
    settings.current_age = 75;
    settings.percent_tax_deferred = 100.0;

    let fit = budget_fit(&settings);
    // Age 75 divisor is 24.6 on $1M: about $3,387/month against a $4k gap.
    let expected_rmd = 1_000_000.0 / 24.6 / 12.0;
    assert!((fit.rmd_covers - expected_rmd).abs() < 0.01);
    assert_eq!(fit.rmd_surplus, 0.0);
    assert!((fit.residual_gap - (4_000.0 - expected_rmd)).abs() < 0.01);
    assert!(fit.required_withdrawal_rate > 0.0);
}

#[test]
fn test_budget_fit_residual_withdrawal_rate() {
    let settings = comfortable_settings();

    let fit = budget_fit(&settings);
    // No income, no RMD at 65: the full $4k gap annualizes to 4.8%.
    assert_eq!(fit.monthly_rmd, 0.0);
    assert!((fit.required_withdrawal_rate - 4.8).abs() < 1e-9);
}

#[test]
fn test_budget_fit_zero_portfolio_rate_is_zero() {
    let mut settings = comfortable_settings();
    settings.portfolio_value = 0.0;

    let fit = budget_fit(&settings);
    assert_eq!(fit.required_withdrawal_rate, 0.0);
}

#[test]
fn test_score_bands() {
    assert_eq!(sustainability_score(0.0, true).label, SustainabilityLabel::Excellent);
    assert_eq!(sustainability_score(2.5, true).label, SustainabilityLabel::Excellent);
    assert_eq!(sustainability_score(3.5, true).label, SustainabilityLabel::Good);
    assert_eq!(sustainability_score(4.5, true).label, SustainabilityLabel::Fair);
    assert_eq!(sustainability_score(5.5, true).label, SustainabilityLabel::Caution);
    assert_eq!(sustainability_score(7.0, true).label, SustainabilityLabel::Poor);
    assert_eq!(sustainability_score(12.0, true).label, SustainabilityLabel::Critical);
}

#[test]
fn test_score_monotone_in_rate() {
    let rates = [0.0, 2.0, 3.5, 4.5, 5.5, 7.0, 12.0];
    let scores: Vec<u8> = rates
        .iter()
        .map(|&r| sustainability_score(r, true).score)
        .collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn test_non_survivor_scores_zero_regardless_of_rate() {
    let score = sustainability_score(1.0, false);
    assert_eq!(score.score, 0);
    assert_eq!(score.label, SustainabilityLabel::Critical);
}
