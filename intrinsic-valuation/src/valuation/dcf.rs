//! Discounted-cash-flow valuation.
//!
//! Five-year FCF projection at the historical FCF CAGR, discounted at a
//! CAPM-based WACC, plus a perpetuity-growth terminal value.

use super::types::DcfResult;
use crate::data::{BalanceReport, FinancialStatements, FundamentalsBundle, IncomeReport};
use crate::numeric::{clamp, Metric};

/// Projection horizon in years
pub const PROJECTION_YEARS: usize = 5;

/// Cash-flow reports considered for history (most recent first upstream)
const HISTORY_YEARS: usize = 5;

/// Minimum FCF points for a CAGR
const MIN_CAGR_POINTS: usize = 3;

pub const GROWTH_BOUNDS: (f64, f64) = (-0.10, 0.20);
pub const TERMINAL_GROWTH_BOUNDS: (f64, f64) = (-0.02, 0.03);
pub const BETA_BOUNDS: (f64, f64) = (0.5, 2.0);
pub const TAX_BOUNDS: (f64, f64) = (0.0, 0.35);
pub const COST_OF_DEBT_BOUNDS: (f64, f64) = (0.01, 0.12);

const DEFAULT_BETA: f64 = 1.0;
const DEFAULT_TAX_RATE: f64 = 0.21;

/// DCF configuration.
#[derive(Debug, Clone)]
pub struct DcfConfig {
    /// Risk-free rate for CAPM
    pub risk_free_rate: f64,
    /// Equity risk premium for CAPM
    pub equity_risk_premium: f64,
    /// Growth used when the historical CAGR is unavailable
    pub default_growth: f64,
}

impl Default for DcfConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.04,
            equity_risk_premium: 0.05,
            default_growth: 0.03,
        }
    }
}

impl DcfConfig {
    pub fn from_config(config: &intrinsic_common::ValuationConfig) -> Self {
        Self {
            risk_free_rate: config.risk_free_rate,
            equity_risk_premium: config.equity_risk_premium,
            default_growth: config.default_growth,
        }
    }
}

/// Capital structure from the latest balance sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CapitalStructure {
    total_debt: f64,
    cash: f64,
}

/// DCF engine.
pub struct DcfEngine {
    config: DcfConfig,
}

impl DcfEngine {
    pub fn new() -> Self {
        Self::with_config(DcfConfig::default())
    }

    pub fn with_config(config: DcfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DcfConfig {
        &self.config
    }

    /// Compute from a one-pager bundle. `price` drives only the upside.
    pub fn compute_from_bundle(&self, bundle: &FundamentalsBundle, price: Option<f64>) -> DcfResult {
        self.compute(&bundle.statements, price)
    }

    /// Compute a DCF valuation. Never fails; gaps become `Unavailable`.
    pub fn compute(&self, statements: &FinancialStatements, price: Option<f64>) -> DcfResult {
        // 1. FCF history, oldest first
        let history = fcf_history(statements);
        let last_fcf = history.last().copied();

        // 2. Growth
        let growth = clamp(
            historical_growth(&history).unwrap_or(self.config.default_growth),
            GROWTH_BOUNDS.0,
            GROWTH_BOUNDS.1,
        );
        let terminal_growth = clamp(growth, TERMINAL_GROWTH_BOUNDS.0, TERMINAL_GROWTH_BOUNDS.1);

        // 3. Balance sheet
        let capital = capital_structure(statements.balance.first());

        // 4. Income statement
        let latest_income = statements.income.first();
        let interest_expense = latest_income
            .and_then(|r| r.interest_expense)
            .map_or(0.0, f64::abs);
        let ebitda = latest_income.and_then(|r| r.ebitda);
        let tax_rate = effective_tax_rate(latest_income);

        // 5. Overview
        let overview = &statements.overview;
        let shares = overview
            .shares_outstanding
            .map_or(Metric::Unavailable, Metric::positive);
        let market_cap = overview.market_capitalization.filter(|v| v.is_finite());
        let beta = overview
            .beta
            .filter(|b| b.is_finite())
            .map_or(DEFAULT_BETA, |b| clamp(b, BETA_BOUNDS.0, BETA_BOUNDS.1));

        // 6. Cost of capital
        let cost_of_equity = self.config.risk_free_rate + beta * self.config.equity_risk_premium;
        let cost_of_debt = if capital.total_debt > 0.0 {
            clamp(
                interest_expense / capital.total_debt,
                COST_OF_DEBT_BOUNDS.0,
                COST_OF_DEBT_BOUNDS.1,
            )
        } else {
            0.0
        };

        // 7. WACC
        let equity_weight_base = market_cap.unwrap_or(0.0);
        let debt = capital.total_debt;
        let total = match equity_weight_base + debt {
            v if v == 0.0 => 1.0,
            v => v,
        };
        let wacc = (equity_weight_base / total) * cost_of_equity
            + (debt / total) * cost_of_debt * (1.0 - tax_rate);

        // 8-11. Projection, discounting and terminal value
        let projection = last_fcf.map(|fcf| project(fcf, growth, wacc, terminal_growth));

        let (projected_fcf, pv_sum_fcf, pv_terminal_value) = match &projection {
            Some(p) => (
                p.fcf.clone(),
                Metric::from_finite(p.pv_sum),
                Metric::from_finite(p.pv_terminal),
            ),
            None => (Vec::new(), Metric::Unavailable, Metric::Unavailable),
        };

        let enterprise_value = match (pv_sum_fcf, pv_terminal_value) {
            (Metric::Value(a), Metric::Value(b)) => Metric::from_finite(a + b),
            _ => Metric::Unavailable,
        };
        let equity_value = enterprise_value.map(|ev| ev - capital.total_debt + capital.cash);
        let intrinsic_value = match (equity_value, shares) {
            (Metric::Value(eq), Metric::Value(s)) => Metric::from_finite(eq / s),
            _ => Metric::Unavailable,
        };

        // 12. Cross-checks
        let ev_to_ebitda = match (ebitda, market_cap) {
            (Some(e), Some(mc)) if e > 0.0 => {
                Metric::from_finite((mc + capital.total_debt - capital.cash) / e)
            }
            _ => Metric::Unavailable,
        };
        let price_to_fcf = match (last_fcf, market_cap) {
            (Some(fcf), Some(mc)) if fcf > 0.0 => Metric::from_finite(mc / fcf),
            _ => Metric::Unavailable,
        };

        // 13. Upside
        let upside_percent = match (intrinsic_value, price) {
            (Metric::Value(iv), Some(p)) if p.is_finite() && p != 0.0 => {
                Metric::from_finite((iv - p) / p * 100.0)
            }
            _ => Metric::Unavailable,
        };

        DcfResult {
            intrinsic_value,
            upside_percent,
            wacc,
            growth_cagr: growth,
            terminal_growth,
            last_free_cash_flow: Metric::from(last_fcf),
            total_debt: capital.total_debt,
            cash_and_equivalents: capital.cash,
            shares_outstanding: shares,
            ev_to_ebitda,
            price_to_fcf,
            beta,
            tax_rate,
            cost_of_equity,
            cost_of_debt,
            projected_fcf,
            pv_sum_fcf,
            pv_terminal_value,
            enterprise_value,
            equity_value,
        }
    }
}

impl Default for DcfEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Steps
// ============================================================================

/// FCF for up to the five most recent reports where both fields are known,
/// oldest first.
pub fn fcf_history(statements: &FinancialStatements) -> Vec<f64> {
    let mut history: Vec<f64> = statements
        .cash_flow
        .iter()
        .take(HISTORY_YEARS)
        .filter_map(|r| {
            let ocf = r.operating_cashflow?;
            let capex = r.capital_expenditures?;
            let fcf = ocf - capex.abs();
            fcf.is_finite().then_some(fcf)
        })
        .collect();
    history.reverse();
    history
}

/// CAGR over the history, or `None` with too few points or a non-positive start.
pub fn historical_growth(history: &[f64]) -> Option<f64> {
    if history.len() < MIN_CAGR_POINTS {
        return None;
    }
    let first = *history.first()?;
    let last = *history.last()?;
    cagr(first, last, (history.len() - 1) as f64)
}

/// `(last / first)^(1 / years) - 1`
pub fn cagr(first: f64, last: f64, years: f64) -> Option<f64> {
    if !first.is_finite() || !last.is_finite() || years <= 0.0 || first <= 0.0 {
        return None;
    }
    let rate = (last / first).powf(1.0 / years) - 1.0;
    rate.is_finite().then_some(rate)
}

fn non_zero(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x != 0.0)
}

fn capital_structure(balance: Option<&BalanceReport>) -> CapitalStructure {
    let Some(b) = balance else {
        return CapitalStructure {
            total_debt: 0.0,
            cash: 0.0,
        };
    };

    let short = non_zero(b.short_term_debt)
        .or(non_zero(b.short_long_term_debt_total))
        .unwrap_or(0.0)
        .max(0.0);
    let long = non_zero(b.long_term_debt).unwrap_or(0.0).max(0.0);
    let cash = non_zero(b.cash_and_equivalents)
        .or(non_zero(b.cash_and_short_term_investments))
        .unwrap_or(0.0)
        .max(0.0);

    CapitalStructure {
        total_debt: short + long,
        cash,
    }
}

/// `|tax| / pre-tax income`, bounded; 21% without a positive pre-tax income
/// or a known tax expense.
pub fn effective_tax_rate(income: Option<&IncomeReport>) -> f64 {
    let Some(report) = income else {
        return DEFAULT_TAX_RATE;
    };
    match (report.income_before_tax, report.income_tax_expense) {
        (Some(pretax), Some(tax)) if pretax > 0.0 => {
            clamp(tax.abs() / pretax, TAX_BOUNDS.0, TAX_BOUNDS.1)
        }
        _ => DEFAULT_TAX_RATE,
    }
}

struct Projection {
    fcf: Vec<f64>,
    pv_sum: f64,
    pv_terminal: f64,
}

fn project(last_fcf: f64, growth: f64, wacc: f64, terminal_growth: f64) -> Projection {
    let fcf: Vec<f64> = (1..=PROJECTION_YEARS)
        .map(|t| last_fcf * (1.0 + growth).powi(t as i32))
        .collect();

    let pv_sum = fcf
        .iter()
        .enumerate()
        .map(|(i, f)| f / (1.0 + wacc).powi(i as i32 + 1))
        .sum();

    let final_fcf = fcf.last().copied().unwrap_or(0.0);
    let pv_terminal = if wacc > terminal_growth {
        let tv = final_fcf * (1.0 + terminal_growth) / (wacc - terminal_growth);
        tv / (1.0 + wacc).powi(PROJECTION_YEARS as i32)
    } else {
        0.0
    };

    Projection {
        fcf,
        pv_sum,
        pv_terminal,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CashFlowReport, CompanyOverview};

    fn cash_flow(year: u32, ocf: f64, capex: f64) -> CashFlowReport {
        CashFlowReport {
            fiscal_date_ending: format!("{}-12-31", year),
            operating_cashflow: Some(ocf),
            capital_expenditures: Some(capex),
        }
    }

    /// FCF 100, 110, 121, 133.1, 146.41 oldest first; newest first upstream.
    fn growing_statements() -> FinancialStatements {
        FinancialStatements {
            overview: CompanyOverview {
                shares_outstanding: Some(100.0),
                market_capitalization: Some(10_000.0),
                beta: Some(1.2),
                ..Default::default()
            },
            cash_flow: vec![
                cash_flow(2023, 166.41, -20.0),
                cash_flow(2022, 153.1, 20.0),
                cash_flow(2021, 141.0, -20.0),
                cash_flow(2020, 130.0, -20.0),
                cash_flow(2019, 120.0, -20.0),
                cash_flow(2018, 1.0, 0.0),
            ],
            income: vec![IncomeReport {
                fiscal_date_ending: "2023-12-31".into(),
                ebitda: Some(500.0),
                interest_expense: Some(-50.0),
                income_before_tax: Some(400.0),
                income_tax_expense: Some(80.0),
                ..Default::default()
            }],
            balance: vec![BalanceReport {
                fiscal_date_ending: "2023-12-31".into(),
                short_term_debt: Some(0.0),
                short_long_term_debt_total: Some(200.0),
                long_term_debt: Some(800.0),
                cash_and_equivalents: None,
                cash_and_short_term_investments: Some(300.0),
            }],
        }
    }

    #[test]
    fn test_fcf_history_oldest_first() {
        let history = fcf_history(&growing_statements());
        assert_eq!(history.len(), 5);
        assert!((history[0] - 100.0).abs() < 1e-9);
        assert!((history[4] - 146.41).abs() < 1e-9);
    }

    #[test]
    fn test_full_computation() {
        let result = DcfEngine::new().compute(&growing_statements(), Some(100.0));

        assert!((result.growth_cagr - 0.10).abs() < 1e-9);
        assert_eq!(result.terminal_growth, 0.03);
        assert_eq!(result.total_debt, 1_000.0);
        assert_eq!(result.cash_and_equivalents, 300.0);
        assert_eq!(result.tax_rate, 0.2);
        assert_eq!(result.beta, 1.2);
        assert!((result.cost_of_equity - 0.10).abs() < 1e-12);
        assert!((result.cost_of_debt - 0.05).abs() < 1e-12);

        let expected_wacc = (10_000.0 / 11_000.0) * 0.10 + (1_000.0 / 11_000.0) * 0.05 * 0.8;
        assert!((result.wacc - expected_wacc).abs() < 1e-12);

        assert_eq!(result.projected_fcf.len(), PROJECTION_YEARS);
        assert!((result.projected_fcf[0] - 161.051).abs() < 1e-6);

        let ev = result.enterprise_value.value().unwrap();
        let equity = result.equity_value.value().unwrap();
        assert!((equity - (ev - 1_000.0 + 300.0)).abs() < 1e-6);
        let iv = result.intrinsic_value.value().unwrap();
        assert!((iv - equity / 100.0).abs() < 1e-9);

        let upside = result.upside_percent.value().unwrap();
        assert!((upside - (iv - 100.0)).abs() < 1e-9);

        assert!((result.ev_to_ebitda.value().unwrap() - 10_700.0 / 500.0).abs() < 1e-9);
        assert!((result.price_to_fcf.value().unwrap() - 10_000.0 / 146.41).abs() < 1e-9);
    }

    #[test]
    fn test_fewer_than_three_points_uses_default_growth() {
        let mut statements = growing_statements();
        statements.cash_flow.truncate(2);
        let result = DcfEngine::new().compute(&statements, None);
        assert_eq!(result.growth_cagr, 0.03);
    }

    #[test]
    fn test_growth_clamped() {
        let mut statements = growing_statements();
        statements.cash_flow = vec![
            cash_flow(2023, 1_000.0, 0.0),
            cash_flow(2022, 100.0, 0.0),
            cash_flow(2021, 10.0, 0.0),
        ];
        let result = DcfEngine::new().compute(&statements, None);
        assert_eq!(result.growth_cagr, 0.20);

        statements.cash_flow = vec![
            cash_flow(2023, 10.0, 0.0),
            cash_flow(2022, 100.0, 0.0),
            cash_flow(2021, 1_000.0, 0.0),
        ];
        let result = DcfEngine::new().compute(&statements, None);
        assert_eq!(result.growth_cagr, -0.10);
        assert_eq!(result.terminal_growth, -0.02);
    }

    #[test]
    fn test_non_positive_start_uses_default_growth() {
        assert_eq!(cagr(-10.0, 20.0, 2.0), None);
        assert_eq!(cagr(0.0, 20.0, 2.0), None);
        assert_eq!(historical_growth(&[-10.0, 5.0, 20.0]), None);
    }

    #[test]
    fn test_missing_price_leaves_upside_null() {
        let result = DcfEngine::new().compute(&growing_statements(), None);
        assert_eq!(result.upside_percent, Metric::Unavailable);
        assert!(result.intrinsic_value.is_available());

        let result = DcfEngine::new().compute(&growing_statements(), Some(0.0));
        assert_eq!(result.upside_percent, Metric::Unavailable);
    }

    #[test]
    fn test_wacc_not_above_terminal_growth_zeroes_terminal_value() {
        // No market cap and no debt: WACC is 0, below the 3% terminal growth
        let mut statements = growing_statements();
        statements.overview.market_capitalization = None;
        statements.balance.clear();

        let result = DcfEngine::new().compute(&statements, None);
        assert_eq!(result.wacc, 0.0);
        assert_eq!(result.pv_terminal_value, Metric::Value(0.0));
        assert_eq!(result.price_to_fcf, Metric::Unavailable);
        assert_eq!(result.ev_to_ebitda, Metric::Unavailable);
    }

    #[test]
    fn test_no_fundamentals() {
        let result = DcfEngine::new().compute(&FinancialStatements::default(), Some(50.0));

        assert_eq!(result.growth_cagr, 0.03);
        assert_eq!(result.beta, 1.0);
        assert_eq!(result.tax_rate, 0.21);
        assert_eq!(result.cost_of_debt, 0.0);
        assert_eq!(result.last_free_cash_flow, Metric::Unavailable);
        assert!(result.projected_fcf.is_empty());
        assert_eq!(result.enterprise_value, Metric::Unavailable);
        assert_eq!(result.intrinsic_value, Metric::Unavailable);
        assert_eq!(result.upside_percent, Metric::Unavailable);
        assert_eq!(result.shares_outstanding, Metric::Unavailable);

        let json = serde_json::to_string(&result).unwrap();
        assert!(!json.contains("NaN"));
    }

    #[test]
    fn test_cost_of_debt_bounds() {
        let mut statements = growing_statements();
        statements.income[0].interest_expense = Some(1.0);
        let result = DcfEngine::new().compute(&statements, None);
        assert_eq!(result.cost_of_debt, 0.01);

        statements.income[0].interest_expense = Some(900.0);
        let result = DcfEngine::new().compute(&statements, None);
        assert_eq!(result.cost_of_debt, 0.12);
    }

    #[test]
    fn test_tax_rate_fallbacks() {
        let loss = IncomeReport {
            income_before_tax: Some(-10.0),
            income_tax_expense: Some(5.0),
            ..Default::default()
        };
        assert_eq!(effective_tax_rate(Some(&loss)), 0.21);

        let unknown = IncomeReport {
            income_before_tax: Some(100.0),
            income_tax_expense: None,
            ..Default::default()
        };
        assert_eq!(effective_tax_rate(Some(&unknown)), 0.21);

        let heavy = IncomeReport {
            income_before_tax: Some(100.0),
            income_tax_expense: Some(-60.0),
            ..Default::default()
        };
        assert_eq!(effective_tax_rate(Some(&heavy)), 0.35);
    }
}
