use crate::core::config::Settings;
use std::fmt;

/// Zygosity band of a variant allele fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Zygosity {
    Het,
    Hom,
}

impl Zygosity {
    /// Classify a fraction into the configured bands.
    ///
    /// `[ht_low, ht_high]` is heterozygous, above `ht_high` homozygous, and
    /// anything below `ht_low` gets no call.
    #[inline]
    pub fn classify(fraction: f64, settings: &Settings) -> Option<Zygosity> {
        if fraction >= settings.ht_low && fraction <= settings.ht_high {
            Some(Zygosity::Het)
        } else if fraction > settings.ht_high {
            Some(Zygosity::Hom)
        } else {
            None
        }
    }
}

impl fmt::Display for Zygosity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Zygosity::Het => write!(f, "het"),
            Zygosity::Hom => write!(f, "hom"),
        }
    }
}
