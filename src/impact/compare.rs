//! Product comparison
//!
//! Side-by-side comparison of two assessed products on one metric, and the
//! cumulative-impact break-even point between them.

use serde::{Deserialize, Serialize};

use crate::models::Product;

use super::metric::Metric;
use super::phases::PhaseBreakdown;
use super::source::TracedValue;
use super::ImpactReport;

/// Crossover times at or beyond this many years are not reported
pub const BREAK_EVEN_HORIZON_YEARS: f64 = 100.0;

const SLOPE_EPSILON: f64 = 1e-6;

/// A product together with its computed impacts
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub product: &'a Product,
    pub report: &'a ImpactReport,
}

/// Result of comparing two products on one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub metric: Metric,
    pub unit: String,
    pub product_a: String,
    pub product_b: String,
    pub value_a: f64,
    pub value_b: f64,
    pub difference: f64,
    pub percent_difference: f64,
    pub winner: String,
    pub items_per_year_a: f64,
    pub items_per_year_b: f64,
    pub years_until_replacement_a: f64,
    pub years_until_replacement_b: f64,
    pub break_even_year: Option<f64>,
    pub by_phase_a: AnnualPhaseImpact,
    pub by_phase_b: AnnualPhaseImpact,
}

/// One year of impact on a single metric, split by lifecycle phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnualPhaseImpact {
    pub production: TracedValue,
    pub transport: TracedValue,
    pub end_of_life: TracedValue,
    #[serde(rename = "use")]
    pub use_phase: TracedValue,
    pub total: f64,
}

/// Cumulative impact as a line over time: `initial + slope * years`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakEven {
    pub initial: f64,
    pub slope: f64,
}

/// How many items are used up per year
pub fn items_per_year(product: &Product) -> f64 {
    product.effective_uses_per_year() / product.effective_lifespan_uses()
}

/// How long one item lasts, in years
pub fn years_until_replacement(product: &Product) -> f64 {
    product.effective_lifespan_uses() / product.effective_uses_per_year()
}

/// Scale a product's per-item phases to one year of use.
///
/// Production, transport and end-of-life are per item and scale by
/// [`items_per_year`]. The use phase is already annual. Sources are kept as
/// computed.
pub fn annualized_by_phase(product: &Product, phases: &PhaseBreakdown, metric: Metric) -> AnnualPhaseImpact {
    let items = items_per_year(product);
    let per_year = |traced: &TracedValue| TracedValue {
        value: traced.value * items,
        sources: traced.sources.clone(),
    };

    let production = per_year(phases.production.get(metric));
    let transport = per_year(phases.transport.get(metric));
    let end_of_life = per_year(phases.end_of_life.get(metric));
    let use_phase = phases.use_phase.get(metric).clone();
    let total = production.value + transport.value + end_of_life.value + use_phase.value;

    AnnualPhaseImpact {
        production,
        transport,
        end_of_life,
        use_phase,
        total,
    }
}

/// Consumables are replaced after a single use
fn is_consumable(product: &Product) -> bool {
    product.effective_lifespan_uses() <= 1.0
}

/// Model a product's cumulative impact for `metric`.
///
/// Consumables start at zero and accrue the whole annualized burden.
/// Durables start at their upfront burden and accrue only their use phase.
pub fn break_even_params(candidate: &Candidate, metric: Metric) -> BreakEven {
    let product = candidate.product;
    let report = candidate.report;
    let consumable = is_consumable(product);

    match (metric, consumable) {
        (Metric::Cost, true) => BreakEven {
            initial: 0.0,
            slope: product.purchase_price_usd * items_per_year(product),
        },
        (Metric::Cost, false) => BreakEven {
            initial: product.purchase_price_usd,
            slope: report.impacts_by_phase.use_phase.cost_usd.value,
        },
        (_, true) => BreakEven {
            initial: 0.0,
            slope: report.impacts.get(metric).value,
        },
        (_, false) => BreakEven {
            initial: report.impacts_by_phase.upfront(metric),
            slope: report.impacts_by_phase.use_phase.get(metric).value,
        },
    }
}

/// Year at which the two cumulative lines cross, if within the horizon
pub fn break_even_year(first: BreakEven, second: BreakEven) -> Option<f64> {
    let slope_diff = first.slope - second.slope;
    if slope_diff.abs() <= SLOPE_EPSILON {
        return None;
    }

    let years = (second.initial - first.initial) / slope_diff;
    if years > 0.0 && years < BREAK_EVEN_HORIZON_YEARS {
        Some(years)
    } else {
        None
    }
}

/// Compare two products on annualized totals. The lower impact wins; ties
/// go to `a`.
pub fn compare_products(a: &Candidate, b: &Candidate, metric: Metric) -> Comparison {
    let value_a = a.report.impacts.get(metric).value;
    let value_b = b.report.impacts.get(metric).value;
    let difference = value_a - value_b;
    let percent_difference = if value_b == 0.0 {
        0.0
    } else {
        difference / value_b * 100.0
    };
    let winner = if value_a <= value_b { a.product } else { b.product };

    Comparison {
        metric,
        unit: metric.unit().to_string(),
        product_a: a.product.name.clone(),
        product_b: b.product.name.clone(),
        value_a,
        value_b,
        difference,
        percent_difference,
        winner: winner.name.clone(),
        items_per_year_a: items_per_year(a.product),
        items_per_year_b: items_per_year(b.product),
        years_until_replacement_a: years_until_replacement(a.product),
        years_until_replacement_b: years_until_replacement(b.product),
        break_even_year: break_even_year(break_even_params(a, metric), break_even_params(b, metric)),
        by_phase_a: annualized_by_phase(a.product, &a.report.impacts_by_phase, metric),
        by_phase_b: annualized_by_phase(b.product, &b.report.impacts_by_phase, metric),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impact::assess;
    use crate::impact::component::tests::{component, cotton, plastic};
    use crate::impact::metric::Impacts;
    use crate::impact::phases::tests::product;

    #[test]
    fn test_replacement_rates() {
        let napkin = product("Paper Napkin", 365.0, 1.0, Impacts::zero());
        assert_eq!(items_per_year(&napkin), 365.0);

        let bag = product("Tote", 50.0, 500.0, Impacts::zero());
        assert_eq!(items_per_year(&bag), 0.1);
        assert_eq!(years_until_replacement(&bag), 10.0);

        let unset = product("Unset", 0.0, 0.0, Impacts::zero());
        assert_eq!(items_per_year(&unset), 1.0);
        assert_eq!(years_until_replacement(&unset), 1.0);
    }

    #[test]
    fn test_lower_impact_wins() {
        let paper = product("Paper Bag", 100.0, 1.0, Impacts::zero());
        let tote = product("Cotton Tote", 100.0, 500.0, Impacts::zero());
        let paper_report = assess(&paper, &[component(1, plastic(), 50.0)]);
        let tote_report = assess(&tote, &[component(2, cotton(), 200.0)]);

        let a = Candidate { product: &paper, report: &paper_report };
        let b = Candidate { product: &tote, report: &tote_report };
        let result = compare_products(&a, &b, Metric::GreenhouseGas);

        // paper: 0.15 * 100 = 15 kg/yr, tote: (0.4 / 500) * 100 = 0.08 kg/yr
        assert_eq!(result.winner, "Cotton Tote");
        assert!((result.by_phase_a.total - result.value_a).abs() < 1e-9);
        assert!((result.by_phase_b.production.value - 0.08).abs() < 1e-9);
        assert!((result.difference - (15.0 - 0.08)).abs() < 1e-9);
        assert!((result.percent_difference - (15.0 - 0.08) / 0.08 * 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_annual_phases_add_up_to_total() {
        let use_factors = Impacts { water_liters: 0.2, energy_kwh: 0.01, cost_usd: 0.05, ..Impacts::zero() };
        let bag = product("Hybrid Bag", 75.0, 300.0, use_factors);
        let mut credited = plastic();
        credited.factors.transport.greenhouse_gas_kg = 0.3;
        let report = assess(&bag, &[component(1, cotton(), 400.0), component(2, credited, 100.0)]);

        for metric in Metric::ALL {
            let annual = annualized_by_phase(&bag, &report.impacts_by_phase, metric);
            let expected = report.impacts.get(metric).value;
            assert!((annual.total - expected).abs() < 1e-9, "{}: {} != {}", metric.key(), annual.total, expected);
        }

        let ghg = annualized_by_phase(&bag, &report.impacts_by_phase, Metric::GreenhouseGas);
        assert!((ghg.production.value - 1.1 * 0.25).abs() < 1e-9);
        assert!((ghg.transport.value - 0.03 * 0.25).abs() < 1e-9);
        assert_eq!(ghg.production.sources.len(), 2);
        assert_eq!(ghg.production.sources[0].value, 0.8);
        let water = annualized_by_phase(&bag, &report.impacts_by_phase, Metric::Water);
        assert!((water.use_phase.value - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_annual_phases_coerce_zero_frequency() {
        let unset = product("Unset", 0.0, 0.0, Impacts::zero());
        let report = assess(&unset, &[component(1, cotton(), 200.0)]);
        let annual = annualized_by_phase(&unset, &report.impacts_by_phase, Metric::GreenhouseGas);

        assert!((annual.production.value - 0.4).abs() < 1e-9);
        assert!((annual.total - report.impacts.greenhouse_gas_kg.value).abs() < 1e-9);
    }

    #[test]
    fn test_tie_goes_to_first_and_zero_baseline() {
        let a_product = product("A", 1.0, 1.0, Impacts::zero());
        let b_product = product("B", 1.0, 1.0, Impacts::zero());
        let report = assess(&a_product, &[]);

        let a = Candidate { product: &a_product, report: &report };
        let b = Candidate { product: &b_product, report: &report };
        let result = compare_products(&a, &b, Metric::Water);

        assert_eq!(result.winner, "A");
        assert_eq!(result.percent_difference, 0.0);
        assert_eq!(result.break_even_year, None);
    }

    #[test]
    fn test_cost_break_even_between_consumable_and_durable() {
        let mut paper = product("Paper Napkin", 365.0, 1.0, Impacts::zero());
        paper.purchase_price_usd = 0.05;
        let mut cloth = product("Cloth Napkin", 365.0, 365.0, Impacts { cost_usd: 0.01, ..Impacts::zero() });
        cloth.purchase_price_usd = 8.0;

        let paper_report = assess(&paper, &[]);
        let cloth_report = assess(&cloth, &[]);
        let paper_line = break_even_params(&Candidate { product: &paper, report: &paper_report }, Metric::Cost);
        let cloth_line = break_even_params(&Candidate { product: &cloth, report: &cloth_report }, Metric::Cost);

        assert_eq!(paper_line.initial, 0.0);
        assert!((paper_line.slope - 18.25).abs() < 1e-9);
        assert_eq!(cloth_line.initial, 8.0);
        assert!((cloth_line.slope - 3.65).abs() < 1e-9);

        let years = break_even_year(paper_line, cloth_line).unwrap();
        assert!((years - 8.0 / (18.25 - 3.65)).abs() < 1e-9);
    }

    #[test]
    fn test_durable_environmental_line_uses_upfront_burden() {
        let tote = product("Cotton Tote", 50.0, 500.0, Impacts::zero());
        let report = assess(&tote, &[component(1, cotton(), 200.0)]);
        let line = break_even_params(&Candidate { product: &tote, report: &report }, Metric::Water);

        assert!((line.initial - 2000.0).abs() < 1e-9);
        assert_eq!(line.slope, 0.0);
    }

    #[test]
    fn test_break_even_outside_horizon() {
        let parallel = break_even_year(BreakEven { initial: 0.0, slope: 2.0 }, BreakEven { initial: 5.0, slope: 2.0 });
        assert_eq!(parallel, None);

        let far = break_even_year(BreakEven { initial: 0.0, slope: 1.01 }, BreakEven { initial: 5.0, slope: 1.0 });
        assert_eq!(far, None);

        let past = break_even_year(BreakEven { initial: 10.0, slope: 2.0 }, BreakEven { initial: 5.0, slope: 1.0 });
        assert_eq!(past, None);
    }
}
