//! Phase aggregator
//!
//! Sums component contributions into production, transport and end-of-life
//! totals, and derives the annual use phase from the product's per-use
//! factors. Components are visited in the order given and phases in
//! declaration order, so source lists are deterministic.

use serde::{Deserialize, Serialize};

use crate::models::{Product, ResolvedComponent};

use super::metric::{MaterialPhase, Metric};
use super::source::{fmt_number, SourceEntry, TracedImpacts};

pub const DIRECT_USE_ITEM: &str = "Direct Use (Annual)";

/// Traced totals for all four lifecycle phases of a product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseBreakdown {
    pub production: TracedImpacts,
    pub transport: TracedImpacts,
    pub end_of_life: TracedImpacts,
    #[serde(rename = "use")]
    pub use_phase: TracedImpacts,
}

impl PhaseBreakdown {
    pub fn material_phase(&self, phase: MaterialPhase) -> &TracedImpacts {
        match phase {
            MaterialPhase::Production => &self.production,
            MaterialPhase::Transport => &self.transport,
            MaterialPhase::EndOfLife => &self.end_of_life,
        }
    }

    pub fn material_phase_mut(&mut self, phase: MaterialPhase) -> &mut TracedImpacts {
        match phase {
            MaterialPhase::Production => &mut self.production,
            MaterialPhase::Transport => &mut self.transport,
            MaterialPhase::EndOfLife => &mut self.end_of_life,
        }
    }

    /// production + transport + end-of-life for one metric
    pub fn upfront(&self, metric: Metric) -> f64 {
        MaterialPhase::ALL
            .iter()
            .map(|phase| self.material_phase(*phase).get(metric).value)
            .sum()
    }
}

/// Compute the full phase -> metric -> {value, sources} structure for a product
pub fn compute_phase_breakdown(product: &Product, components: &[ResolvedComponent]) -> PhaseBreakdown {
    let mut breakdown = PhaseBreakdown::default();

    for component in components {
        let weight_kg = component.weight_kg();

        for phase in MaterialPhase::ALL {
            let totals = breakdown.material_phase_mut(phase);

            for metric in Metric::ALL {
                let factor = component.material.factors.factor(phase, metric);
                let contribution = component.phase_impact(phase, metric);

                totals.get_mut(metric).accumulate(contribution, || {
                    SourceEntry::new(
                        component.material.name.as_str(),
                        contribution,
                        format!("{} kg * {}", fmt_number(weight_kg), fmt_number(factor)),
                        component.material.citation(phase),
                    )
                });
            }
        }
    }

    let uses_per_year = product.effective_uses_per_year();
    for metric in Metric::ALL {
        let per_use = *product.use_factors.get(metric);
        let annual = per_use * uses_per_year;

        breakdown.use_phase.get_mut(metric).accumulate(annual, || {
            SourceEntry::new(
                DIRECT_USE_ITEM,
                annual,
                format!("{} / use * {} uses/yr", fmt_number(per_use), fmt_number(uses_per_year)),
                product.use_citation(),
            )
        });
    }

    breakdown
}
