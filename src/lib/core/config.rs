//! Run-wide settings shared by the decoder, comparator and orchestrator.
//!
//! A [`Settings`] value is built once from the command line and passed by
//! reference into every component; nothing reads process-wide state.

use crate::core::error::{Result, TriageError};
use std::fmt;
use std::str::FromStr;

/// Mapping population design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossType {
    #[default]
    Back,
    Out,
}

impl CrossType {
    /// Numerator of the HME cutoff formula.
    pub fn cutoff_factor(&self) -> f64 {
        match self {
            CrossType::Back => 1.0,
            CrossType::Out => 2.0,
        }
    }
}

impl FromStr for CrossType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "back" => Ok(CrossType::Back),
            "out" => Ok(CrossType::Out),
            _ => Err(format!("Invalid cross type: {}. Valid types: back, out", s)),
        }
    }
}

impl fmt::Display for CrossType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CrossType::Back => write!(f, "back"),
            CrossType::Out => write!(f, "out"),
        }
    }
}

/// Immutable thresholds and switches for one triage run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Lower bound of the heterozygous band (inclusive).
    pub ht_low: f64,
    /// Upper bound of the heterozygous band (inclusive).
    pub ht_high: f64,
    /// Minimum coverage for a pileup position to be considered.
    pub min_depth: u32,
    /// Minimum reads supporting a non-reference base.
    pub min_non_ref_count: u32,
    /// Minimum reads supporting an indel.
    pub min_indel_count_support: u32,
    /// Keep variants at `N` reference bases.
    pub ambiguous_ref_bases: bool,
    pub mapping_quality: u8,
    pub base_quality: u8,
    /// Allele fractions at or below this value are treated as noise.
    pub noise: f64,
    pub hmes_adjust: f64,
    pub bfr_adjust: f64,
    pub cross_type: CrossType,
    pub polyploidy: bool,
    pub only_frag_with_vars: bool,
    pub filter_out_low_hmes: bool,
    /// Top percentage of BFR scores kept by the adaptive cutoff.
    pub bfr_proportion: f64,
    /// Background non-reference ratio above which a homozygous call is discarded.
    pub bg_bulk_noise: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            ht_low: 0.25,
            ht_high: 0.75,
            min_depth: 6,
            min_non_ref_count: 3,
            min_indel_count_support: 3,
            ambiguous_ref_bases: false,
            mapping_quality: 20,
            base_quality: 15,
            noise: 0.1,
            hmes_adjust: 0.5,
            bfr_adjust: 0.05,
            cross_type: CrossType::Back,
            polyploidy: false,
            only_frag_with_vars: true,
            filter_out_low_hmes: true,
            bfr_proportion: 0.1,
            bg_bulk_noise: 0.35,
        }
    }
}

impl Settings {
    /// Validate all thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a fraction threshold is not finite or falls outside `[0, 1]`
    /// - `ht_low` is greater than `ht_high`
    /// - an adjustment factor is not strictly positive
    /// - `bfr_proportion` falls outside `(0, 100]`
    pub fn validate(&self) -> Result<()> {
        validate_threshold("ht_low", self.ht_low, 0.0, 1.0)?;
        validate_threshold("ht_high", self.ht_high, 0.0, 1.0)?;
        validate_threshold("noise", self.noise, 0.0, 1.0)?;
        validate_threshold("bg_bulk_noise", self.bg_bulk_noise, 0.0, 1.0)?;
        validate_threshold("bfr_proportion", self.bfr_proportion, 0.0, 100.0)?;

        if self.ht_low > self.ht_high {
            return Err(TriageError::InvalidInput(format!(
                "ht_low ({}) must not exceed ht_high ({})",
                self.ht_low, self.ht_high
            )));
        }

        for (name, value) in [("hmes_adjust", self.hmes_adjust), ("bfr_adjust", self.bfr_adjust)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TriageError::InvalidInput(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        if self.bfr_proportion == 0.0 {
            return Err(TriageError::InvalidInput(
                "bfr_proportion must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn validate_threshold(name: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(TriageError::InvalidInput(format!(
            "{} must be a finite number",
            name
        )));
    }

    if value < min || value > max {
        return Err(TriageError::ThresholdValidation {
            field: name.to_string(),
            min,
            max,
            value,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn rejects_inverted_band() {
        let settings = Settings {
            ht_low: 0.8,
            ht_high: 0.2,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(TriageError::InvalidInput(_))
        ));
    }

    #[test]
    fn rejects_out_of_range_noise() {
        let settings = Settings {
            noise: 1.5,
            ..Settings::default()
        };
        match settings.validate() {
            Err(TriageError::ThresholdValidation { field, .. }) => assert_eq!(field, "noise"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn rejects_zero_adjustment() {
        let settings = Settings {
            hmes_adjust: 0.0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn cross_type_parsing() {
        assert_eq!(CrossType::from_str("back").unwrap(), CrossType::Back);
        assert_eq!(CrossType::from_str("OUT").unwrap(), CrossType::Out);
        assert!(CrossType::from_str("side").is_err());
        assert_eq!(CrossType::Out.to_string(), "out");
        assert_eq!(CrossType::Out.cutoff_factor(), 2.0);
    }
}
