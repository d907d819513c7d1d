//! Zygosity bucketing, background subtraction and pileup rendering for VCF input.

use crate::core::config::Settings;
use crate::core::error::Result;
use crate::engine::Zygosity;
use crate::pipeline::vcf::dialect::get_allele_depth;
use crate::pipeline::vcf::record::{read_variant_records, VcfRecord};
use log::{debug, info};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::path::Path;

/// Quality byte written for every read of a rendered pileup line.
pub const PLACEHOLDER_QUALITY: char = 'D';

/// Heterozygous and homozygous positions of one contig, position -> allele frequency.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZygosityBuckets {
    pub het: BTreeMap<u32, f64>,
    pub hom: BTreeMap<u32, f64>,
}

static EMPTY_BUCKETS: ZygosityBuckets = ZygosityBuckets {
    het: BTreeMap::new(),
    hom: BTreeMap::new(),
};

impl ZygosityBuckets {
    pub fn contains(&self, pos: u32) -> bool {
        self.het.contains_key(&pos) || self.hom.contains_key(&pos)
    }

    pub fn is_empty(&self) -> bool {
        self.het.is_empty() && self.hom.is_empty()
    }
}

/// Bucketed VCF calls for every contig with at least one banded record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariantCalls {
    contigs: FxHashMap<String, ZygosityBuckets>,
}

impl VariantCalls {
    /// Buckets for `contig`; contigs without calls yield empty buckets.
    pub fn get(&self, contig: &str) -> &ZygosityBuckets {
        self.contigs.get(contig).unwrap_or(&EMPTY_BUCKETS)
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ZygosityBuckets)> {
        self.contigs.iter()
    }

    fn insert(&mut self, contig: &str, pos: u32, freq: f64, zygosity: Zygosity) {
        let buckets = self.contigs.entry(contig.to_string()).or_default();
        match zygosity {
            Zygosity::Het => buckets.het.insert(pos, freq),
            Zygosity::Hom => buckets.hom.insert(pos, freq),
        };
    }

    /// Drop every homozygous call that `background` also calls homozygous.
    pub fn subtract(&mut self, background: &VariantCalls) {
        for (contig, buckets) in self.contigs.iter_mut() {
            let bg_hom = &background.get(contig).hom;
            buckets.hom.retain(|pos, _| !bg_hom.contains_key(pos));
        }
    }
}

impl<const N: usize> From<[(&str, ZygosityBuckets); N]> for VariantCalls {
    fn from(entries: [(&str, ZygosityBuckets); N]) -> Self {
        VariantCalls {
            contigs: entries
                .into_iter()
                .map(|(contig, buckets)| (contig.to_string(), buckets))
                .collect(),
        }
    }
}

/// Read a VCF and bucket its records by contig and zygosity band.
///
/// Records below the heterozygous band are dropped.
pub fn get_vars<P: AsRef<Path>>(vcf: P, settings: &Settings) -> Result<VariantCalls> {
    let mut calls = VariantCalls::default();
    for record in read_variant_records(vcf.as_ref())? {
        let record = record?;
        let freq = get_allele_depth(&record)?.frequency();
        if let Some(zygosity) = Zygosity::classify(freq, settings) {
            calls.insert(&record.chrom, record.pos, freq, zygosity);
        }
    }
    debug!(
        "Bucketed calls on {} contigs from {}",
        calls.len(),
        vcf.as_ref().display()
    );
    Ok(calls)
}

/// Bucket the mutant VCF and subtract homozygous calls shared with each background VCF.
///
/// Background files are applied one after another.
pub fn filtering<P: AsRef<Path>, Q: AsRef<Path>>(
    mutant: P,
    backgrounds: &[Q],
    settings: &Settings,
) -> Result<VariantCalls> {
    let mut calls = get_vars(mutant, settings)?;
    for background in backgrounds {
        let bg_calls = get_vars(background, settings)?;
        calls.subtract(&bg_calls);
        info!(
            "Subtracted shared homozygous calls of {}",
            background.as_ref().display()
        );
    }
    Ok(calls)
}

/// Render a record as a single pileup line.
///
/// The bases column repeats `.` once per reference read followed by the
/// variant token once per alternate read. Deletions render as `-<n><seq>` with
/// the reference trimmed to its first base, insertions as `+<n><seq>`.
pub fn to_pileup(record: &VcfRecord) -> Result<String> {
    let depth = get_allele_depth(record)?;
    let ref_len = record.ref_allele.len();
    let alt_len = record.alt_allele.len();

    let mut ref_base = record.ref_allele.as_str();
    let alt_token = if ref_len > alt_len {
        let seq = &record.ref_allele[alt_len..];
        ref_base = &record.ref_allele[..1];
        format!("-{}{}", seq.len(), seq)
    } else if ref_len < alt_len {
        let seq = &record.alt_allele[ref_len..];
        format!("+{}{}", seq.len(), seq)
    } else {
        record.alt_allele.clone()
    };

    let mut bases = ".".repeat(depth.reference as usize);
    bases.push_str(&alt_token.repeat(depth.alternate as usize));
    let quality = PLACEHOLDER_QUALITY
        .to_string()
        .repeat(depth.total() as usize);

    Ok([
        record.chrom.clone(),
        record.pos.to_string(),
        ref_base.to_string(),
        depth.total().to_string(),
        bases,
        quality,
    ]
    .join("\t"))
}
