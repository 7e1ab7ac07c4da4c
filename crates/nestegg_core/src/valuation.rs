//! Closed-form valuation: annuity present values, budget-fit analysis, and
//! the sustainability score. No simulation loop here.

use crate::cash_flows::{total_expenses, total_income};
use crate::model::rmd::required_distribution;
use crate::model::{
    BudgetFit, HealthcareModel, PvAnalysis, PvComponent, Settings, SustainabilityLabel,
    SustainabilityScore, RMD_START_AGE,
};

/// Rates closer than this are treated as equal to avoid dividing by ~0.
const RATE_EPSILON: f64 = 1e-10;

/// Present value of a (possibly growing) level monthly payment stream
/// starting `start_month` months in the future.
///
/// `discount_rate` and `growth_rate` are annual percentages. Four cases in
/// priority order: zero discount, growth equal to discount, growing
/// annuity, standard annuity. The result is discounted back to today when
/// payments begin in the future.
#[must_use]
pub fn present_value_annuity(
    payment: f64,
    discount_rate: f64,
    growth_rate: f64,
    start_month: u32,
    num_payments: u32,
) -> f64 {
    if num_payments == 0 || payment == 0.0 {
        return 0.0;
    }

    let r = discount_rate / 100.0 / 12.0;
    let g = growth_rate / 100.0 / 12.0;
    let n = f64::from(num_payments);

    let pv_at_start = if r == 0.0 {
        if g > 0.0 {
            // Plain sum of a geometric payment series.
            payment * (((1.0 + g).powf(n) - 1.0) / g)
        } else {
            payment * n
        }
    } else if (r - g).abs() < RATE_EPSILON {
        payment * n
    } else if g > 0.0 {
        payment * (1.0 - ((1.0 + g) / (1.0 + r)).powf(n)) / (r - g)
    } else {
        payment * (1.0 - (1.0 + r).powf(-n)) / r
    };

    if start_month > 0 && r != 0.0 {
        pv_at_start / (1.0 + r).powf(f64::from(start_month))
    } else {
        pv_at_start
    }
}

/// Value every expense and income stream and sum into the PV analysis.
#[must_use]
pub fn present_value_analysis(settings: &Settings) -> PvAnalysis {
    let horizon = settings.projection_months();
    let mut expense_components = Vec::new();
    let mut income_components = Vec::new();

    let living_growth = settings.inflation_rate - settings.spending_decline_rate;
    expense_components.push(PvComponent {
        name: "Living expenses".to_string(),
        present_value: present_value_annuity(
            settings.monthly_living_expenses,
            settings.discount_rate,
            living_growth,
            0,
            horizon,
        ),
    });

    match &settings.healthcare {
        HealthcareModel::None => {}
        HealthcareModel::Legacy {
            monthly_cost,
            annual_inflation,
        } => {
            expense_components.push(PvComponent {
                name: "Healthcare".to_string(),
                present_value: present_value_annuity(
                    *monthly_cost,
                    settings.discount_rate,
                    *annual_inflation,
                    0,
                    horizon,
                ),
            });
        }
        HealthcareModel::PerPerson { people } => {
            // Value each regime as its own stream: pre-eligibility costs
            // until the switch, post-eligibility costs from the switch on.
            for (i, person) in people.iter().enumerate() {
                let months_to_eligibility =
                    u32::from(person.eligibility_age.saturating_sub(person.age)) * 12;
                let pre_months = months_to_eligibility.min(horizon);
                let post_months = horizon - pre_months;

                let mut pv = present_value_annuity(
                    person.monthly_cost,
                    settings.discount_rate,
                    person.pre_eligibility_inflation,
                    0,
                    pre_months,
                );
                pv += present_value_annuity(
                    person.eligibility_monthly_cost,
                    settings.discount_rate,
                    person.post_eligibility_inflation,
                    pre_months,
                    post_months,
                );
                expense_components.push(PvComponent {
                    name: format!("Healthcare (person {})", i + 1),
                    present_value: pv,
                });
            }
        }
    }

    for source in &settings.expense_sources {
        let start_month = source.start_year * 12;
        if start_month >= horizon {
            continue;
        }
        let end_month = match source.end_year {
            Some(end) if end > 0 => (end * 12).min(horizon),
            _ => horizon,
        };
        let growth = if source.inflation_adjusted {
            settings.inflation_rate
        } else {
            0.0
        };
        expense_components.push(PvComponent {
            name: source.name.clone(),
            present_value: present_value_annuity(
                source.monthly_amount,
                settings.discount_rate,
                growth,
                start_month,
                end_month.saturating_sub(start_month),
            ),
        });
    }

    for source in &settings.income_sources {
        if source.start_month >= horizon {
            continue;
        }
        let end_month = source.end_month.map_or(horizon, |end| end.min(horizon));
        income_components.push(PvComponent {
            name: source.name.clone(),
            present_value: present_value_annuity(
                source.monthly_amount,
                settings.discount_rate,
                source.annual_cola,
                source.start_month,
                end_month.saturating_sub(source.start_month),
            ),
        });
    }

    let pv_expenses: f64 = expense_components.iter().map(|c| c.present_value).sum();
    let pv_income: f64 = income_components.iter().map(|c| c.present_value).sum();

    PvAnalysis {
        pv_expenses,
        pv_income,
        pv_gap: pv_expenses - pv_income,
        expense_components,
        income_components,
    }
}

/// Decompose the month-0 budget: the pre-distribution gap versus how much
/// of it the mandatory distribution covers, and the annualized withdrawal
/// rate required to fund the rest from the portfolio.
#[must_use]
pub fn budget_fit(settings: &Settings) -> BudgetFit {
    let monthly_expenses = total_expenses(settings, 0);
    let monthly_income = total_income(settings, 0);

    let age = u32::from(settings.current_age);
    let monthly_rmd = if age >= RMD_START_AGE {
        let (annual, _) = required_distribution(settings.tax_deferred_balance(), age);
        annual / 12.0
    } else {
        0.0
    };

    let gap = (monthly_expenses - monthly_income).max(0.0);
    let rmd_covers = monthly_rmd.min(gap);
    let rmd_surplus = (monthly_rmd - rmd_covers).max(0.0);
    let residual_gap = gap - rmd_covers;

    let required_withdrawal_rate = if settings.portfolio_value > 0.0 {
        residual_gap * 12.0 / settings.portfolio_value * 100.0
    } else {
        0.0
    };

    BudgetFit {
        monthly_expenses,
        monthly_income,
        monthly_rmd,
        gap,
        rmd_covers,
        rmd_surplus,
        residual_gap,
        required_withdrawal_rate,
    }
}

/// Map a required withdrawal rate and survival flag onto the fixed 0-100
/// sustainability bands. Non-survivors score 0 regardless of rate.
#[must_use]
pub fn sustainability_score(required_withdrawal_rate: f64, survives: bool) -> SustainabilityScore {
    let (score, label) = if !survives {
        (0, SustainabilityLabel::Critical)
    } else if required_withdrawal_rate <= 0.0 {
        (100, SustainabilityLabel::Excellent)
    } else if required_withdrawal_rate <= 3.0 {
        (90, SustainabilityLabel::Excellent)
    } else if required_withdrawal_rate <= 4.0 {
        (75, SustainabilityLabel::Good)
    } else if required_withdrawal_rate <= 5.0 {
        (60, SustainabilityLabel::Fair)
    } else if required_withdrawal_rate <= 6.0 {
        (45, SustainabilityLabel::Caution)
    } else if required_withdrawal_rate <= 8.0 {
        (25, SustainabilityLabel::Poor)
    } else {
        (10, SustainabilityLabel::Critical)
    };

    SustainabilityScore {
        score,
        label,
        required_withdrawal_rate,
        survives,
    }
}
