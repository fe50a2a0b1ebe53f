//! Lifecycle impact engine
//!
//! Turns per-material, per-phase factors and per-product usage parameters
//! into annualized totals for five metrics, broken down by phase and by
//! contributing source. Everything here is a pure function of the records
//! it is handed; loading them is the caller's concern.

pub mod compare;
pub mod component;
pub mod metric;
pub mod phases;
pub mod source;
pub mod total;

use serde::{Deserialize, Serialize};

use crate::models::{Product, ResolvedComponent};

pub use compare::{
    annualized_by_phase, break_even_params, break_even_year, compare_products, items_per_year,
    years_until_replacement, AnnualPhaseImpact, BreakEven, Candidate, Comparison,
};
pub use metric::{non_zero_or_one, Impacts, MaterialPhase, Metric, MetricSet, PerPhase, PhaseFactors};
pub use phases::{compute_phase_breakdown, PhaseBreakdown};
pub use source::{fmt_number, SourceEntry, TracedImpacts, TracedValue};
pub use total::{annualize, compute_total_impact, TotalImpact};

/// Annualized totals together with the phase breakdown they came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    pub impacts: TotalImpact,
    pub impacts_by_phase: PhaseBreakdown,
}

/// Compute both the phase breakdown and the annualized totals in one pass
pub fn assess(product: &Product, components: &[ResolvedComponent]) -> ImpactReport {
    let impacts_by_phase = compute_phase_breakdown(product, components);
    let impacts = annualize(product, &impacts_by_phase);

    tracing::debug!(
        product = %product.slug,
        components = components.len(),
        greenhouse_gas_kg = impacts.greenhouse_gas_kg.value,
        "Assessed product impact"
    );

    ImpactReport {
        impacts,
        impacts_by_phase,
    }
}
