//! Provenance entries
//!
//! Every computed total carries the list of inputs that produced it.

use serde::{Deserialize, Serialize};

use super::metric::MetricSet;

/// One contribution to a computed total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// What contributed (material name, "Direct Use (Annual)", ...)
    pub item: String,
    pub value: f64,
    /// Human-readable formula, e.g. `0.2 kg * 2.0`
    pub calculation: String,
    /// Citation text; empty when none was entered
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_sources: Option<Vec<SourceEntry>>,
}

impl SourceEntry {
    pub fn new(
        item: impl Into<String>,
        value: f64,
        calculation: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            item: item.into(),
            value,
            calculation: calculation.into(),
            source: source.into(),
            sub_sources: None,
        }
    }

    pub fn with_sub_sources(mut self, sub_sources: Vec<SourceEntry>) -> Self {
        self.sub_sources = Some(sub_sources);
        self
    }
}

/// A metric total together with its provenance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TracedValue {
    pub value: f64,
    pub sources: Vec<SourceEntry>,
}

impl TracedValue {
    /// Add a contribution. Only strictly positive contributions are recorded
    /// in `sources`; every contribution counts toward `value`.
    pub fn accumulate(&mut self, contribution: f64, entry: impl FnOnce() -> SourceEntry) {
        self.value += contribution;
        if contribution > 0.0 {
            self.sources.push(entry());
        }
    }
}

/// Traced totals for all five metrics
pub type TracedImpacts = MetricSet<TracedValue>;

impl MetricSet<TracedValue> {
    /// Just the numbers
    pub fn values(&self) -> MetricSet<f64> {
        self.map(|_, traced| traced.value)
    }
}

/// Format a number for a `calculation` string using the shortest
/// representation that round-trips (`0.2`, `2.0`, `10000.0`).
pub fn fmt_number(value: f64) -> String {
    format!("{:?}", value)
}
