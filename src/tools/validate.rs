//! Data-entry validation
//!
//! The impact engine accepts any numbers it is given. Catalog edits coming
//! through the tools are checked here first: names must be non-empty and
//! quantities finite and non-negative.

use crate::impact::{MetricSet, PhaseFactors};

/// Trimmed, non-empty text
pub fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{} cannot be empty", field));
    }
    Ok(trimmed)
}

/// Lowercase letters, digits and hyphens only
pub fn require_slug(value: &str) -> Result<&str, String> {
    let slug = require_text("Slug", value)?;
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(format!(
            "Slug '{}' may only contain lowercase letters, digits and hyphens",
            slug
        ));
    }
    Ok(slug)
}

pub fn require_non_negative(field: &str, value: f64) -> Result<f64, String> {
    if !value.is_finite() {
        return Err(format!("{} must be a finite number", field));
    }
    if value < 0.0 {
        return Err(format!("{} must not be negative (got {})", field, value));
    }
    Ok(value)
}

pub fn optional_non_negative(field: &str, value: Option<f64>) -> Result<Option<f64>, String> {
    value.map(|v| require_non_negative(field, v)).transpose()
}

/// Check every value of a per-metric set; `prefix` names the set in errors
pub fn require_metric_set(prefix: &str, values: &MetricSet<f64>) -> Result<(), String> {
    for (metric, value) in values.iter() {
        require_non_negative(&format!("{} {}", prefix, metric), *value)?;
    }
    Ok(())
}

pub fn optional_metric_set(prefix: &str, values: &MetricSet<Option<f64>>) -> Result<(), String> {
    for (metric, value) in values.iter() {
        optional_non_negative(&format!("{} {}", prefix, metric), *value)?;
    }
    Ok(())
}

pub fn require_phase_factors(factors: &PhaseFactors) -> Result<(), String> {
    require_metric_set("production", &factors.production)?;
    require_metric_set("transport", &factors.transport)?;
    require_metric_set("end_of_life", &factors.end_of_life)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impact::Impacts;

    #[test]
    fn test_text_is_trimmed() {
        assert_eq!(require_text("Name", "  Cotton ").unwrap(), "Cotton");
        assert_eq!(require_text("Name", "   ").unwrap_err(), "Name cannot be empty");
    }

    #[test]
    fn test_slug_rules() {
        assert_eq!(require_slug("cloth-napkin-2").unwrap(), "cloth-napkin-2");
        assert!(require_slug("Cloth Napkin").is_err());
        assert!(require_slug("").is_err());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(require_non_negative("Weight", 0.0).unwrap(), 0.0);
        assert!(require_non_negative("Weight", -1.0).is_err());
        assert!(require_non_negative("Weight", f64::NAN).is_err());
        assert!(require_non_negative("Weight", f64::INFINITY).is_err());
        assert_eq!(optional_non_negative("Price", None).unwrap(), None);
    }

    #[test]
    fn test_factor_errors_name_phase_and_metric() {
        let mut factors = PhaseFactors::default();
        factors.transport = Impacts { water_liters: -3.0, ..Impacts::zero() };

        let err = require_phase_factors(&factors).unwrap_err();
        assert!(err.starts_with("transport water_liters"), "{}", err);
    }
}
