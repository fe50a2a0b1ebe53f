//! Impact metrics and lifecycle phases
//!
//! Fixed-shape containers keyed by [`Metric`] and [`MaterialPhase`]. Every
//! calculation produces all five metrics, and every material carries all
//! three phases, so these are plain structs rather than maps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the five impact metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "greenhouse_gas_kg")]
    GreenhouseGas,
    #[serde(rename = "water_liters")]
    Water,
    #[serde(rename = "energy_kwh")]
    Energy,
    #[serde(rename = "land_m2")]
    Land,
    #[serde(rename = "cost_usd")]
    Cost,
}

impl Metric {
    /// All metrics, in output order
    pub const ALL: [Metric; 5] = [
        Metric::GreenhouseGas,
        Metric::Water,
        Metric::Energy,
        Metric::Land,
        Metric::Cost,
    ];

    /// JSON key used in every exported impact structure
    pub fn key(&self) -> &'static str {
        match self {
            Metric::GreenhouseGas => "greenhouse_gas_kg",
            Metric::Water => "water_liters",
            Metric::Energy => "energy_kwh",
            Metric::Land => "land_m2",
            Metric::Cost => "cost_usd",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::GreenhouseGas => "kg CO2e",
            Metric::Water => "L",
            Metric::Energy => "kWh",
            Metric::Land => "m2",
            Metric::Cost => "USD",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = String;

    /// Accepts the JSON key or a short alias (`co2e`, `ghg`, `water`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "greenhouse_gas_kg" | "greenhouse_gas" | "co2e" | "ghg" => Ok(Metric::GreenhouseGas),
            "water_liters" | "water" => Ok(Metric::Water),
            "energy_kwh" | "energy" => Ok(Metric::Energy),
            "land_m2" | "land" => Ok(Metric::Land),
            "cost_usd" | "cost" => Ok(Metric::Cost),
            other => Err(format!("Unknown impact metric: {}", other)),
        }
    }
}

/// A lifecycle phase carried by a material's factor table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialPhase {
    #[default]
    Production,
    Transport,
    EndOfLife,
}

impl MaterialPhase {
    /// Material phases in declaration order
    pub const ALL: [MaterialPhase; 3] = [
        MaterialPhase::Production,
        MaterialPhase::Transport,
        MaterialPhase::EndOfLife,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            MaterialPhase::Production => "production",
            MaterialPhase::Transport => "transport",
            MaterialPhase::EndOfLife => "end_of_life",
        }
    }
}

impl fmt::Display for MaterialPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// One value per metric. Serializes as an object with the five metric keys;
/// keys missing on input take the default value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, bound(deserialize = "T: Deserialize<'de> + Default"))]
pub struct MetricSet<T> {
    pub greenhouse_gas_kg: T,
    pub water_liters: T,
    pub energy_kwh: T,
    pub land_m2: T,
    pub cost_usd: T,
}

impl<T> MetricSet<T> {
    pub fn from_fn(mut f: impl FnMut(Metric) -> T) -> Self {
        Self {
            greenhouse_gas_kg: f(Metric::GreenhouseGas),
            water_liters: f(Metric::Water),
            energy_kwh: f(Metric::Energy),
            land_m2: f(Metric::Land),
            cost_usd: f(Metric::Cost),
        }
    }

    pub fn try_from_fn<E>(mut f: impl FnMut(Metric) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            greenhouse_gas_kg: f(Metric::GreenhouseGas)?,
            water_liters: f(Metric::Water)?,
            energy_kwh: f(Metric::Energy)?,
            land_m2: f(Metric::Land)?,
            cost_usd: f(Metric::Cost)?,
        })
    }

    pub fn get(&self, metric: Metric) -> &T {
        match metric {
            Metric::GreenhouseGas => &self.greenhouse_gas_kg,
            Metric::Water => &self.water_liters,
            Metric::Energy => &self.energy_kwh,
            Metric::Land => &self.land_m2,
            Metric::Cost => &self.cost_usd,
        }
    }

    pub fn get_mut(&mut self, metric: Metric) -> &mut T {
        match metric {
            Metric::GreenhouseGas => &mut self.greenhouse_gas_kg,
            Metric::Water => &mut self.water_liters,
            Metric::Energy => &mut self.energy_kwh,
            Metric::Land => &mut self.land_m2,
            Metric::Cost => &mut self.cost_usd,
        }
    }

    /// Iterate in `Metric::ALL` order
    pub fn iter(&self) -> impl Iterator<Item = (Metric, &T)> + '_ {
        Metric::ALL.into_iter().map(move |m| (m, self.get(m)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Metric, &T) -> U) -> MetricSet<U> {
        MetricSet::from_fn(|m| f(m, self.get(m)))
    }
}

/// Plain numeric impact (or factor) per metric
pub type Impacts = MetricSet<f64>;

impl MetricSet<f64> {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn scale(&self, multiplier: f64) -> Self {
        self.map(|_, v| v * multiplier)
    }

    pub fn add(&self, other: &Impacts) -> Self {
        self.map(|m, v| v + other.get(m))
    }
}

impl std::ops::Add for MetricSet<f64> {
    type Output = Impacts;

    fn add(self, other: Impacts) -> Impacts {
        Impacts::add(&self, &other)
    }
}

impl std::ops::Mul<f64> for MetricSet<f64> {
    type Output = Impacts;

    fn mul(self, multiplier: f64) -> Impacts {
        self.scale(multiplier)
    }
}

impl std::iter::Sum for MetricSet<f64> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Impacts::zero(), |acc, n| acc + n)
    }
}

/// One value per material phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerPhase<T> {
    pub production: T,
    pub transport: T,
    pub end_of_life: T,
}

impl<T> PerPhase<T> {
    pub fn from_fn(mut f: impl FnMut(MaterialPhase) -> T) -> Self {
        Self {
            production: f(MaterialPhase::Production),
            transport: f(MaterialPhase::Transport),
            end_of_life: f(MaterialPhase::EndOfLife),
        }
    }

    pub fn try_from_fn<E>(mut f: impl FnMut(MaterialPhase) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            production: f(MaterialPhase::Production)?,
            transport: f(MaterialPhase::Transport)?,
            end_of_life: f(MaterialPhase::EndOfLife)?,
        })
    }

    pub fn get(&self, phase: MaterialPhase) -> &T {
        match phase {
            MaterialPhase::Production => &self.production,
            MaterialPhase::Transport => &self.transport,
            MaterialPhase::EndOfLife => &self.end_of_life,
        }
    }

    pub fn get_mut(&mut self, phase: MaterialPhase) -> &mut T {
        match phase {
            MaterialPhase::Production => &mut self.production,
            MaterialPhase::Transport => &mut self.transport,
            MaterialPhase::EndOfLife => &mut self.end_of_life,
        }
    }
}

/// A material's factor matrix: impact per kg, by (phase, metric)
pub type PhaseFactors = PerPhase<Impacts>;

impl PerPhase<Impacts> {
    pub fn factor(&self, phase: MaterialPhase, metric: Metric) -> f64 {
        *self.get(phase).get(metric)
    }
}

/// Replace a zero divisor/multiplier with 1
pub fn non_zero_or_one(value: f64) -> f64 {
    if value == 0.0 {
        1.0
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_keys_serialize_in_fixed_order() {
        let set = Impacts::from_fn(|m| Metric::ALL.iter().position(|x| *x == m).unwrap() as f64);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(
            json,
            r#"{"greenhouse_gas_kg":0.0,"water_liters":1.0,"energy_kwh":2.0,"land_m2":3.0,"cost_usd":4.0}"#
        );
        for m in Metric::ALL {
            assert_eq!(serde_json::to_value(m).unwrap(), m.key());
        }
    }

    #[test]
    fn test_missing_metric_keys_default() {
        let set: Impacts = serde_json::from_str(r#"{"water_liters": 5.0}"#).unwrap();
        assert_eq!(set.water_liters, 5.0);
        assert_eq!(set.cost_usd, 0.0);

        let partial: MetricSet<Option<f64>> = serde_json::from_str(r#"{"land_m2": 0.3}"#).unwrap();
        assert_eq!(partial.land_m2, Some(0.3));
        assert_eq!(partial.energy_kwh, None);
    }

    #[test]
    fn test_metric_from_str_aliases() {
        assert_eq!("co2e".parse::<Metric>().unwrap(), Metric::GreenhouseGas);
        assert_eq!("WATER_LITERS".parse::<Metric>().unwrap(), Metric::Water);
        assert_eq!("cost".parse::<Metric>().unwrap(), Metric::Cost);
        assert!("noise".parse::<Metric>().is_err());
    }

    #[test]
    fn test_impacts_arithmetic() {
        let a = Impacts { greenhouse_gas_kg: 1.0, water_liters: 10.0, ..Impacts::zero() };
        let b = Impacts { greenhouse_gas_kg: 2.0, cost_usd: 3.0, ..Impacts::zero() };
        let sum: Impacts = vec![a, b].into_iter().sum();
        assert_eq!(sum.greenhouse_gas_kg, 3.0);
        assert_eq!(sum.water_liters, 10.0);
        assert_eq!(sum.cost_usd, 3.0);
        assert_eq!((a * 2.0).water_liters, 20.0);
    }

    #[test]
    fn test_factor_matrix_lookup() {
        let mut factors = PhaseFactors::default();
        *factors.get_mut(MaterialPhase::Transport).get_mut(Metric::Energy) = 0.7;
        assert_eq!(factors.factor(MaterialPhase::Transport, Metric::Energy), 0.7);
        assert_eq!(factors.factor(MaterialPhase::Production, Metric::Energy), 0.0);
    }

    #[test]
    fn test_non_zero_or_one() {
        assert_eq!(non_zero_or_one(0.0), 1.0);
        assert_eq!(non_zero_or_one(-0.0), 1.0);
        assert_eq!(non_zero_or_one(50.0), 50.0);
    }
}
