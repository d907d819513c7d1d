//! Variant-caller dialects for reading allele depths out of VCF records.
//!
//! Callers report read support differently. Each [`AlleleDepthDialect`] pairs a
//! presence check with an extractor, and [`DIALECTS`] lists them in the fixed
//! order they are tried; the first dialect whose check passes decides the depths.
//!
//! | order | dialect            | fields used                       |
//! |-------|--------------------|-----------------------------------|
//! | 1     | Bcftools/Samtools  | `INFO/DP4` strand pairs           |
//! | 2     | VarScan            | `FORMAT/RD` and scalar `FORMAT/AD`|
//! | 3     | GATK               | `FORMAT/AD` as `ref,alt`          |
//! | 4     | VCF 4.0-4.2        | `INFO/AF` and `INFO/DP`           |

use crate::core::error::{Result, TriageError};
use crate::pipeline::vcf::record::{FieldValues, VcfRecord};
use rustc_hash::FxHashMap;

/// Reference and alternate read support at one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlleleDepth {
    pub reference: u32,
    pub alternate: u32,
}

impl AlleleDepth {
    #[inline]
    pub fn total(&self) -> u64 {
        u64::from(self.reference) + u64::from(self.alternate)
    }

    /// `alt / (ref + alt)`; 0.0 when there is no support at all.
    #[inline]
    pub fn frequency(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.alternate as f64 / total as f64,
        }
    }
}

/// A detection predicate and depth extractor for one caller dialect.
pub struct AlleleDepthDialect {
    pub name: &'static str,
    detect: fn(&VcfRecord) -> bool,
    extract: fn(&VcfRecord) -> Result<AlleleDepth>,
}

impl AlleleDepthDialect {
    #[inline]
    pub fn matches(&self, record: &VcfRecord) -> bool {
        (self.detect)(record)
    }

    #[inline]
    pub fn extract(&self, record: &VcfRecord) -> Result<AlleleDepth> {
        (self.extract)(record)
    }
}

/// Supported dialects in detection order.
pub static DIALECTS: [AlleleDepthDialect; 4] = [
    AlleleDepthDialect {
        name: "Bcftools(Samtools)",
        detect: |record| record.info.contains_key("DP4"),
        extract: extract_dp4,
    },
    AlleleDepthDialect {
        name: "VarScan",
        detect: |record| record.sample.contains_key("RD"),
        extract: extract_rd_ad,
    },
    AlleleDepthDialect {
        name: "GATK",
        detect: |record| record.sample.get("AD").map_or(false, |ad| ad.len() > 1),
        extract: extract_ad_pair,
    },
    AlleleDepthDialect {
        name: "Vcf 4.0, 4.1 and 4.2",
        detect: |record| record.info.contains_key("AF") && record.info.contains_key("DP"),
        extract: extract_af_dp,
    },
];

/// A read count; missing values count as zero.
#[inline]
fn count(value: Option<f64>) -> u32 {
    value.map_or(0, |v| v.round() as u32)
}

fn nth(values: &FieldValues, i: usize) -> Option<f64> {
    values.get(i).copied().flatten()
}

fn field<'a>(
    map: &'a FxHashMap<&'static str, FieldValues>,
    record: &VcfRecord,
    key: &str,
) -> Result<&'a FieldValues> {
    map.get(key).ok_or_else(|| {
        TriageError::Parse(format!("missing {} field at {}", key, record.locus()))
    })
}

fn sum_counts(record: &VcfRecord, key: &str, counts: &[Option<f64>]) -> Result<u32> {
    counts.iter().try_fold(0u32, |sum, v| {
        sum.checked_add(count(*v)).ok_or_else(|| {
            TriageError::Parse(format!("{} counts overflow at {}", key, record.locus()))
        })
    })
}

fn extract_dp4(record: &VcfRecord) -> Result<AlleleDepth> {
    let values = field(&record.info, record, "DP4")?;
    if values.len() != 4 {
        return Err(TriageError::Parse(format!(
            "DP4 must hold four counts at {}",
            record.locus()
        )));
    }
    Ok(AlleleDepth {
        reference: sum_counts(record, "DP4", &values[..2])?,
        alternate: sum_counts(record, "DP4", &values[2..])?,
    })
}

fn extract_rd_ad(record: &VcfRecord) -> Result<AlleleDepth> {
    Ok(AlleleDepth {
        reference: count(nth(field(&record.sample, record, "RD")?, 0)),
        alternate: count(record.sample.get("AD").and_then(|ad| nth(ad, 0))),
    })
}

fn extract_ad_pair(record: &VcfRecord) -> Result<AlleleDepth> {
    let ad = field(&record.sample, record, "AD")?;
    Ok(AlleleDepth {
        reference: count(nth(ad, 0)),
        alternate: count(nth(ad, 1)),
    })
}

/// Multi-allelic `AF` lists contribute their first value.
fn extract_af_dp(record: &VcfRecord) -> Result<AlleleDepth> {
    let freq = nth(field(&record.info, record, "AF")?, 0).unwrap_or(0.0);
    let depth = count(nth(field(&record.info, record, "DP")?, 0));
    let alternate = (f64::from(depth) * freq).round() as u32;
    Ok(AlleleDepth {
        reference: depth.saturating_sub(alternate),
        alternate,
    })
}

/// Normalise a record's read support using the first matching dialect.
///
/// # Errors
///
/// [`TriageError::UnsupportedFormat`] when no dialect recognises the record.
pub fn get_allele_depth(record: &VcfRecord) -> Result<AlleleDepth> {
    let dialect = DIALECTS
        .iter()
        .find(|dialect| dialect.matches(record))
        .ok_or_else(|| TriageError::UnsupportedFormat {
            record: record.locus(),
        })?;
    log::trace!("{} read as {} record", record.locus(), dialect.name);
    dialect.extract(record)
}

/// Allele frequency of a record, `alt / (ref + alt)`.
pub fn get_allele_freq(record: &VcfRecord) -> Result<f64> {
    Ok(get_allele_depth(record)?.frequency())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::vcf::record::fixtures::record;
    use proptest::prelude::*;

    #[test]
    fn gatk_allele_frequency() {
        let v = record("chr1\t10740313\t.\tA\tG\t188.30\tPASS\tAF=1.00;DP=11\tGT:AD:DP\t1/1:1,10:7");
        let freq = get_allele_freq(&v).unwrap();
        assert_eq!((freq * 1000.0).round() / 1000.0, 0.909);
    }

    #[test]
    fn samtools_allele_frequency() {
        let v = record("3\t2611\t.\tC\tCCTTCCA\t217\t.\tDP=49;DP4=18,8,8,2");
        let freq = get_allele_freq(&v).unwrap();
        assert_eq!((freq * 1000.0).round() / 1000.0, 0.278);
    }

    #[test]
    fn vcf4_allele_frequency() {
        let v = record("20\t14370\t.\tG\tA\t29\tPASS\tDP=14;AF=0.5\tGT:DP\t0|0:1");
        assert_eq!(get_allele_freq(&v).unwrap(), 0.5);
    }

    #[test]
    fn varscan_allele_frequency() {
        let v = record("frag1\t100\t.\tT\tC\t.\tPASS\t.\tGT:DP:RD:AD\t0/1:20:15:5");
        let depth = get_allele_depth(&v).unwrap();
        assert_eq!(depth, AlleleDepth { reference: 15, alternate: 5 });
        assert_eq!(depth.frequency(), 0.25);
    }

    #[test]
    fn unsupported_record_is_rejected() {
        let v = record("20\t14370\t.\tG\tA\t29\tPASS\tDP=14\tGT:DP\t0/1:1");
        match get_allele_freq(&v) {
            Err(TriageError::UnsupportedFormat { record }) => assert_eq!(record, "20:14370"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn scalar_ad_alone_is_not_gatk() {
        let v = record("20\t14370\t.\tG\tA\t29\tPASS\t.\tGT:AD\t0/1:5");
        assert!(matches!(
            get_allele_depth(&v),
            Err(TriageError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn dialects_agree_on_equivalent_inputs() {
        let lines = [
            "c\t1\t.\tA\tT\t.\tPASS\tDP4=4,3,5,2",
            "c\t1\t.\tA\tT\t.\tPASS\t.\tGT:RD:AD\t0/1:7:7",
            "c\t1\t.\tA\tT\t.\tPASS\t.\tGT:AD\t0/1:7,7",
            "c\t1\t.\tA\tT\t.\tPASS\tAF=0.5;DP=14",
        ];
        for line in lines {
            assert_eq!(
                get_allele_depth(&record(line)).unwrap(),
                AlleleDepth { reference: 7, alternate: 7 },
                "{}",
                line
            );
        }
    }

    #[test]
    fn dp4_wins_over_sample_fields() {
        let v = record("c\t1\t.\tA\tT\t.\tPASS\tDP4=1,1,1,1;AF=1.0;DP=4\tGT:AD\t0/1:0,9");
        assert_eq!(
            get_allele_depth(&v).unwrap(),
            AlleleDepth { reference: 2, alternate: 2 }
        );
    }

    #[test]
    fn short_dp4_is_a_parse_error() {
        let mut v = record("c\t1\t.\tA\tT\t.\tPASS\tDP4=1,1,1,1");
        v.info.insert("DP4", vec![Some(1.0), Some(1.0), Some(1.0)]);
        assert!(matches!(get_allele_depth(&v), Err(TriageError::Parse(_))));
    }

    #[test]
    fn gatk_no_call_has_zero_depth() {
        let v = record("frag1\t9\t.\tA\tT\t.\tPASS\t.\tGT:AD:DP\t./.:.,.:0");
        let depth = get_allele_depth(&v).unwrap();
        assert_eq!(depth, AlleleDepth::default());
        assert_eq!(depth.frequency(), 0.0);
    }

    #[test]
    fn missing_af_or_dp_counts_as_zero() {
        let mut v = VcfRecord {
            chrom: "frag1".to_string(),
            pos: 9,
            ref_allele: "A".to_string(),
            alt_allele: "T".to_string(),
            ..VcfRecord::default()
        };
        v.info.insert("AF", vec![None]);
        v.info.insert("DP", vec![Some(14.0)]);
        assert_eq!(get_allele_freq(&v).unwrap(), 0.0);

        v.info.insert("AF", vec![Some(0.5)]);
        v.info.insert("DP", vec![None]);
        assert_eq!(get_allele_depth(&v).unwrap(), AlleleDepth::default());
    }

    #[test]
    fn multi_valued_af_uses_first_value() {
        let v = record("frag1\t9\t.\tA\tT,C\t.\tPASS\tAF=0.5,0.25;DP=14");
        assert_eq!(
            get_allele_depth(&v).unwrap(),
            AlleleDepth { reference: 7, alternate: 7 }
        );
    }

    #[test]
    fn oversized_dp4_counts_are_parse_errors() {
        let mut v = record("c\t1\t.\tA\tT\t.\tPASS\tDP4=1,1,1,1");
        v.info.insert("DP4", vec![Some(4e9), Some(4e9), Some(1.0), Some(1.0)]);
        assert!(matches!(get_allele_depth(&v), Err(TriageError::Parse(_))));
    }

    proptest! {
        #[test]
        fn frequency_is_a_proportion(reference in any::<u32>(), alternate in any::<u32>()) {
            prop_assume!(u64::from(reference) + u64::from(alternate) > 0);
            let freq = AlleleDepth { reference, alternate }.frequency();
            prop_assert!((0.0..=1.0).contains(&freq));
        }
    }
}
