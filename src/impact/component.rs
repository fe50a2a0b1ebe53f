//! Component impact calculator
//!
//! A component contributes `weight_kg * factor` for each (phase, metric).

use crate::models::ResolvedComponent;

use super::metric::{Impacts, MaterialPhase, Metric};

pub const GRAMS_PER_KG: f64 = 1000.0;

impl ResolvedComponent {
    pub fn weight_kg(&self) -> f64 {
        self.weight_grams / GRAMS_PER_KG
    }

    /// Contribution of this component to one phase and metric
    pub fn phase_impact(&self, phase: MaterialPhase, metric: Metric) -> f64 {
        self.weight_kg() * self.material.factors.factor(phase, metric)
    }

    /// Contribution summed over production, transport and end-of-life
    pub fn lifetime_impact(&self, metric: Metric) -> f64 {
        MaterialPhase::ALL
            .iter()
            .map(|phase| self.phase_impact(*phase, metric))
            .sum()
    }

    /// Single-phase contribution, or the lifetime sum when `phase` is None
    pub fn impact(&self, phase: Option<MaterialPhase>, metric: Metric) -> f64 {
        match phase {
            Some(phase) => self.phase_impact(phase, metric),
            None => self.lifetime_impact(metric),
        }
    }

    /// Lifetime impact for all five metrics
    pub fn lifetime_impacts(&self) -> Impacts {
        Impacts::from_fn(|metric| self.lifetime_impact(metric))
    }
}
