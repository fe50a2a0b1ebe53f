//! Annualizer
//!
//! Spreads the one-time manufacturing and disposal burden over the product's
//! service life, expressed per year, and adds the annual use-phase impact:
//!
//! ```text
//! total = ((production + transport + end_of_life) / lifespan_uses) * uses_per_year + use
//! ```

use crate::models::{Product, ResolvedComponent};

use super::metric::{MaterialPhase, Metric};
use super::phases::{compute_phase_breakdown, PhaseBreakdown};
use super::source::{fmt_number, SourceEntry, TracedImpacts};

pub const UPFRONT_ITEM: &str = "Manufacturing & End-of-Life (Annualized)";
pub const USE_PHASE_ITEM: &str = "Use Phase (Annual)";

/// Annualized impact per metric, with provenance
pub type TotalImpact = TracedImpacts;

/// Fold an already computed phase breakdown into annualized totals
pub fn annualize(product: &Product, breakdown: &PhaseBreakdown) -> TotalImpact {
    let lifespan_uses = product.effective_lifespan_uses();
    let uses_per_year = product.effective_uses_per_year();
    let mut total = TotalImpact::default();

    for metric in Metric::ALL {
        let upfront = breakdown.upfront(metric);
        let annualized_upfront = (upfront / lifespan_uses) * uses_per_year;
        let use_phase = breakdown.use_phase.get(metric);
        let traced = total.get_mut(metric);

        traced.accumulate(annualized_upfront, || {
            let sub_sources = MaterialPhase::ALL
                .iter()
                .flat_map(|phase| breakdown.material_phase(*phase).get(metric).sources.iter().cloned())
                .collect();

            SourceEntry::new(
                UPFRONT_ITEM,
                annualized_upfront,
                format!(
                    "({} / {} uses) * {} uses/yr",
                    fmt_number(upfront),
                    fmt_number(lifespan_uses),
                    fmt_number(uses_per_year)
                ),
                "",
            )
            .with_sub_sources(sub_sources)
        });

        traced.accumulate(use_phase.value, || {
            SourceEntry::new(USE_PHASE_ITEM, use_phase.value, "Annual direct use impact", "")
                .with_sub_sources(use_phase.sources.clone())
        });
    }

    total
}

/// Annualized total impact of a product
pub fn compute_total_impact(product: &Product, components: &[ResolvedComponent]) -> TotalImpact {
    annualize(product, &compute_phase_breakdown(product, components))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impact::component::tests::{component, cotton, plastic};
    use crate::impact::metric::Impacts;
    use crate::impact::phases::tests::product;

    #[test]
    fn test_t_shirt_total() {
        let shirt = product("T-Shirt", 50.0, 100.0, Impacts::zero());
        let total = compute_total_impact(&shirt, &[component(1, cotton(), 200.0)]);

        assert!((total.greenhouse_gas_kg.value - 0.2).abs() < 1e-9);
        assert!((total.water_liters.value - 1000.0).abs() < 1e-9);

        let sources = &total.greenhouse_gas_kg.sources;
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].item, UPFRONT_ITEM);
        let subs = sources[0].sub_sources.as_ref().unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].item, "Cotton");
    }

    #[test]
    fn test_hybrid_bag_upfront() {
        let bag = product("Hybrid Bag", 75.0, 300.0, Impacts::zero());
        let components = [component(1, cotton(), 400.0), component(2, plastic(), 100.0)];
        let breakdown = compute_phase_breakdown(&bag, &components);

        assert!((breakdown.upfront(Metric::GreenhouseGas) - 1.1).abs() < 1e-9);
        assert!((breakdown.upfront(Metric::Water) - 4010.0).abs() < 1e-9);

        let total = annualize(&bag, &breakdown);
        assert!((total.greenhouse_gas_kg.value - (1.1 / 300.0) * 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_annualization_identity() {
        let mut wool = cotton();
        wool.factors.transport = Impacts { greenhouse_gas_kg: 0.3, cost_usd: 0.2, ..Impacts::zero() };
        wool.factors.end_of_life = Impacts { greenhouse_gas_kg: 0.1, ..Impacts::zero() };
        let sweater = product("Sweater", 40.0, 120.0, Impacts { water_liters: 15.0, energy_kwh: 0.9, ..Impacts::zero() });
        let components = [component(1, wool, 650.0), component(2, plastic(), 20.0)];

        let breakdown = compute_phase_breakdown(&sweater, &components);
        let total = annualize(&sweater, &breakdown);

        for metric in Metric::ALL {
            let expected = ((breakdown.production.get(metric).value
                + breakdown.transport.get(metric).value
                + breakdown.end_of_life.get(metric).value)
                / 120.0)
                * 40.0
                + breakdown.use_phase.get(metric).value;
            assert_eq!(total.get(metric).value, expected);
        }
    }

    #[test]
    fn test_zero_divisors_act_as_one() {
        let zeroed = product("Napkin", 0.0, 0.0, Impacts { water_liters: 0.5, ..Impacts::zero() });
        let ones = product("Napkin", 1.0, 1.0, Impacts { water_liters: 0.5, ..Impacts::zero() });
        let components = [component(1, cotton(), 30.0)];

        let a = compute_total_impact(&zeroed, &components);
        let b = compute_total_impact(&ones, &components);
        assert_eq!(a.values(), b.values());
        assert!(a.values().iter().all(|(_, v)| v.is_finite()));
    }

    #[test]
    fn test_empty_product_is_zero() {
        let total = compute_total_impact(&product("Nothing", 10.0, 5.0, Impacts::zero()), &[]);
        for (_, traced) in total.iter() {
            assert_eq!(traced.value, 0.0);
            assert!(traced.sources.is_empty());
        }
    }

    #[test]
    fn test_use_phase_entry_carries_direct_use() {
        let mug = product("Mug", 365.0, 3000.0, Impacts { energy_kwh: 0.02, ..Impacts::zero() });
        let total = compute_total_impact(&mug, &[]);

        let sources = &total.energy_kwh.sources;
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].item, USE_PHASE_ITEM);
        assert_eq!(sources[0].sub_sources.as_ref().unwrap()[0].item, "Direct Use (Annual)");
    }

    #[test]
    fn test_computation_is_deterministic() {
        let bag = product("Hybrid Bag", 75.0, 300.0, Impacts { cost_usd: 0.01, ..Impacts::zero() });
        let components = [component(1, cotton(), 400.0), component(2, plastic(), 100.0)];

        let first = serde_json::to_string(&compute_total_impact(&bag, &components)).unwrap();
        let second = serde_json::to_string(&compute_total_impact(&bag, &components)).unwrap();
        assert_eq!(first, second);
    }
}
