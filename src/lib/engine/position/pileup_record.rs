//! Decoding of samtools mpileup lines into allele-fraction records.
//!
//! This module provides the [`AlleleFractionRecord`] struct, the per-position
//! summary every downstream comparison works on. It includes:
//!
//! - Reference sequence name and 1-based position
//! - Reference base and usable coverage
//! - Allele fractions keyed by [`Allele`], reference included
//! - The variant flag and the non-reference read ratio
//!
//! Records are produced once per input line and never modified afterwards.
//!
//! # Pileup columns
//!
//! `contig  pos  ref  depth  bases  base_quals  [map_quals]`
//!
//! The bases column is walked token by token. Read-start markers (`^` plus its
//! mapping-quality byte) and read-end markers (`$`) are dropped, `.`/`,` count as
//! reference, `*` counts as a deletion and `+n`/`-n` tokens count one insertion or
//! deletion each. Indel tokens carry no quality byte.

use crate::core::config::Settings;
use crate::core::error::{Result, TriageError};
use crate::engine::position::{non_ref_fractions, Allele, BaseFractions};
use smartstring::{LazyCompact, SmartString};

const PHRED_OFFSET: u8 = 33;

/// Hold all allele information for one position of one input source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlleleFractionRecord {
    /// Reference sequence name.
    pub ref_seq: SmartString<LazyCompact>,
    /// 1-based position in the sequence.
    pub pos: u32,
    /// The reference base at this position.
    pub ref_base: char,
    /// Depth after discarding low quality bases.
    pub coverage: u32,
    /// Fraction of coverage supporting each allele above the noise level.
    pub base_fractions: BaseFractions,
    /// Any non-reference allele clears the depth, support and noise thresholds.
    pub is_variant: bool,
    /// Proportion of coverage not supporting the reference.
    pub non_ref_ratio: f64,
}

/// Raw allele counts accumulated while walking the bases column.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct BaseCounts {
    reference: u32,
    a: u32,
    c: u32,
    g: u32,
    t: u32,
    n: u32,
    ins: u32,
    del: u32,
    discarded: u32,
}

impl BaseCounts {
    #[inline]
    fn add(&mut self, allele: Allele) {
        match allele {
            Allele::Ref => self.reference += 1,
            Allele::A => self.a += 1,
            Allele::C => self.c += 1,
            Allele::G => self.g += 1,
            Allele::T => self.t += 1,
            Allele::N => self.n += 1,
            Allele::Ins => self.ins += 1,
            Allele::Del => self.del += 1,
        }
    }

    fn substitutions(&self) -> u32 {
        self.a + self.c + self.g + self.t + self.n
    }

    fn indels(&self) -> u32 {
        self.ins + self.del
    }

    fn iter(&self) -> impl Iterator<Item = (Allele, u32)> {
        [
            (Allele::Ref, self.reference),
            (Allele::A, self.a),
            (Allele::C, self.c),
            (Allele::G, self.g),
            (Allele::T, self.t),
            (Allele::N, self.n),
            (Allele::Ins, self.ins),
            (Allele::Del, self.del),
        ]
        .into_iter()
    }
}

impl AlleleFractionRecord {
    /// Build a record from already-summarised values.
    pub fn new(
        ref_seq: &str,
        pos: u32,
        base_fractions: BaseFractions,
        is_variant: bool,
        non_ref_ratio: f64,
    ) -> Self {
        AlleleFractionRecord {
            ref_seq: SmartString::from(ref_seq),
            pos,
            base_fractions,
            is_variant,
            non_ref_ratio,
            ..Default::default()
        }
    }

    /// Decode one mpileup line.
    ///
    /// # Arguments
    ///
    /// * `line` - a tab separated mpileup line, with or without the mapping quality column
    /// * `settings` - depth, quality, support and noise thresholds for the run
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::Parse`] when a column is missing, a number does not
    /// parse, or the bases column holds an unexpected byte.
    pub fn from_pileup_line(line: &str, settings: &Settings) -> Result<Self> {
        let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
        if fields.len() < 5 {
            return Err(TriageError::Parse(format!(
                "pileup line has {} columns, expected at least 5: {}",
                fields.len(),
                line
            )));
        }

        let pos: u32 = fields[1]
            .parse()
            .map_err(|_| TriageError::Parse(format!("invalid pileup position: {}", fields[1])))?;
        let depth: u32 = fields[3]
            .parse()
            .map_err(|_| TriageError::Parse(format!("invalid pileup depth: {}", fields[3])))?;
        let ref_base = fields[2].chars().next().unwrap_or('N').to_ascii_uppercase();
        let base_quals = fields.get(5).map(|s| s.as_bytes()).unwrap_or(&[]);
        let map_quals = fields.get(6).map(|s| s.as_bytes()).unwrap_or(&[]);

        let counts = count_bases(fields[4].as_bytes(), base_quals, map_quals, settings)?;
        let coverage = depth.saturating_sub(counts.discarded);

        let mut base_fractions = BaseFractions::new();
        if coverage > 0 && coverage >= settings.min_depth {
            for (allele, count) in counts.iter() {
                if count == 0 {
                    continue;
                }
                let frac = count as f64 / coverage as f64;
                if frac > settings.noise {
                    base_fractions.insert(allele, frac);
                }
            }
        }

        let non_ref_count = counts.substitutions() + counts.indels();
        let non_ref_ratio = if coverage > 0 {
            (non_ref_count as f64 / coverage as f64).min(1.0)
        } else {
            0.0
        };

        let ref_ok = ref_base != 'N' || settings.ambiguous_ref_bases;
        let supported = counts.substitutions() >= settings.min_non_ref_count
            || counts.indels() >= settings.min_indel_count_support;
        let above_noise = non_ref_fractions(&base_fractions).next().is_some();
        let is_variant = coverage >= settings.min_depth && ref_ok && supported && above_noise;

        Ok(AlleleFractionRecord {
            ref_seq: SmartString::from(fields[0]),
            pos,
            ref_base,
            coverage,
            base_fractions,
            is_variant,
            non_ref_ratio,
        })
    }
}

/// Walk the bases column, counting each observation that passes the quality filters.
fn count_bases(
    bases: &[u8],
    base_quals: &[u8],
    map_quals: &[u8],
    settings: &Settings,
) -> Result<BaseCounts> {
    let mut counts = BaseCounts::default();
    // index of the next quality byte; one per read observation
    let mut qpos = 0usize;
    let mut i = 0usize;

    while i < bases.len() {
        let b = bases[i];
        match b {
            b'^' => {
                i += 2;
                continue;
            }
            b'$' => {
                i += 1;
                continue;
            }
            b'+' | b'-' => {
                let digits_start = i + 1;
                let mut j = digits_start;
                while j < bases.len() && bases[j].is_ascii_digit() {
                    j += 1;
                }
                let len: usize = std::str::from_utf8(&bases[digits_start..j])
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| {
                        TriageError::Parse(format!(
                            "indel token without length at byte {} of {}",
                            i,
                            String::from_utf8_lossy(bases)
                        ))
                    })?;
                counts.add(if b == b'+' { Allele::Ins } else { Allele::Del });
                i = j.checked_add(len).ok_or_else(|| {
                    TriageError::Parse(format!(
                        "indel length {} out of range in {}",
                        len,
                        String::from_utf8_lossy(bases)
                    ))
                })?;
                continue;
            }
            _ => {}
        }

        let allele = match b {
            b'.' | b',' => Some(Allele::Ref),
            b'*' => Some(Allele::Del),
            b'>' | b'<' => None,
            other => match Allele::from_base(other) {
                Some(allele) => Some(allele),
                None => {
                    return Err(TriageError::Parse(format!(
                        "unexpected byte '{}' in pileup bases {}",
                        other as char,
                        String::from_utf8_lossy(bases)
                    )))
                }
            },
        };

        let low_base_qual = base_quals
            .get(qpos)
            .map_or(false, |q| q.saturating_sub(PHRED_OFFSET) < settings.base_quality);
        let low_map_qual = map_quals
            .get(qpos)
            .map_or(false, |q| q.saturating_sub(PHRED_OFFSET) < settings.mapping_quality);
        qpos += 1;
        i += 1;

        match allele {
            Some(allele) if !low_base_qual && !low_map_qual => counts.add(allele),
            // reference skips and filtered bases do not contribute coverage
            _ => counts.discarded += 1,
        }
    }

    Ok(counts)
}
