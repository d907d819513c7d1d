//! One-sample VCF records read through `noodles`.

use crate::core::error::{Result, TriageError};
use crate::core::io::get_line_reader;
use noodles::vcf;
use noodles::vcf::variant::record_buf::info::field::{
    value::Array as InfoArray, Value as InfoValue,
};
use noodles::vcf::variant::record_buf::samples::sample::{
    value::Array as SampleArray, Value as SampleValue,
};
use noodles::vcf::variant::RecordBuf;
use rustc_hash::FxHashMap;
use std::io::{self, BufRead};
use std::path::Path;

/// INFO keys the allele-depth dialects read.
pub const INFO_DEPTH_KEYS: [&str; 3] = ["DP4", "AF", "DP"];
/// FORMAT keys the allele-depth dialects read from the first sample.
pub const SAMPLE_DEPTH_KEYS: [&str; 2] = ["RD", "AD"];

/// Numeric values of one field; missing (`.`) entries are `None`.
pub type FieldValues = Vec<Option<f64>>;

/// The fields of one VCF record the normaliser needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VcfRecord {
    pub chrom: String,
    /// 1-based position.
    pub pos: u32,
    pub ref_allele: String,
    /// First alternate allele, `.` when the record has none.
    pub alt_allele: String,
    /// Depth-related INFO fields present on the record.
    pub info: FxHashMap<&'static str, FieldValues>,
    /// Depth-related FORMAT fields of the first sample.
    pub sample: FxHashMap<&'static str, FieldValues>,
}

impl VcfRecord {
    /// `true` when the record carries an alternate allele.
    #[inline]
    pub fn has_alt(&self) -> bool {
        self.alt_allele != "."
    }

    /// Short `chrom:pos` label for log and error messages.
    pub fn locus(&self) -> String {
        format!("{}:{}", self.chrom, self.pos)
    }
}

impl TryFrom<&RecordBuf> for VcfRecord {
    type Error = TriageError;

    fn try_from(record: &RecordBuf) -> Result<Self> {
        let chrom = record.reference_sequence_name().to_string();
        let pos = record
            .variant_start()
            .and_then(|start| u32::try_from(usize::from(start)).ok())
            .ok_or_else(|| TriageError::Parse(format!("invalid vcf position on {}", chrom)))?;
        let locus = format!("{}:{}", chrom, pos);

        let mut info = FxHashMap::default();
        for key in INFO_DEPTH_KEYS {
            if let Some(value) = record.info().get(key) {
                let values = value.map_or(Ok(vec![None]), |v| info_values(v, &locus, key))?;
                info.insert(key, values);
            }
        }

        let mut sample = FxHashMap::default();
        if let Some(first) = record.samples().values().next() {
            for key in SAMPLE_DEPTH_KEYS {
                if let Some(value) = first.get(key) {
                    let values =
                        value.map_or(Ok(vec![None]), |v| sample_values(v, &locus, key))?;
                    sample.insert(key, values);
                }
            }
        }

        let alt_allele = record
            .alternate_bases()
            .as_ref()
            .first()
            .cloned()
            .unwrap_or_else(|| ".".to_string());

        Ok(VcfRecord {
            chrom,
            pos,
            ref_allele: record.reference_bases().to_string(),
            alt_allele,
            info,
            sample,
        })
    }
}

fn parse_number(raw: &str, locus: &str, key: &str) -> Result<Option<f64>> {
    match raw.trim() {
        "" | "." => Ok(None),
        raw => raw.parse().map(Some).map_err(|_| {
            TriageError::Parse(format!("invalid {} value '{}' at {}", key, raw, locus))
        }),
    }
}

fn split_numbers(raw: &str, locus: &str, key: &str) -> Result<FieldValues> {
    raw.split(',').map(|v| parse_number(v, locus, key)).collect()
}

fn info_values(value: &InfoValue, locus: &str, key: &str) -> Result<FieldValues> {
    Ok(match value {
        InfoValue::Integer(n) => vec![Some(f64::from(*n))],
        InfoValue::Float(x) => vec![Some(f64::from(*x))],
        InfoValue::String(s) => split_numbers(s, locus, key)?,
        InfoValue::Array(InfoArray::Integer(values)) => {
            values.iter().map(|v| v.map(f64::from)).collect()
        }
        InfoValue::Array(InfoArray::Float(values)) => {
            values.iter().map(|v| v.map(f64::from)).collect()
        }
        InfoValue::Array(InfoArray::String(values)) => values
            .iter()
            .map(|v| v.as_deref().map_or(Ok(None), |s| parse_number(s, locus, key)))
            .collect::<Result<_>>()?,
        _ => Vec::new(),
    })
}

fn sample_values(value: &SampleValue, locus: &str, key: &str) -> Result<FieldValues> {
    Ok(match value {
        SampleValue::Integer(n) => vec![Some(f64::from(*n))],
        SampleValue::Float(x) => vec![Some(f64::from(*x))],
        SampleValue::String(s) => split_numbers(s, locus, key)?,
        SampleValue::Array(SampleArray::Integer(values)) => {
            values.iter().map(|v| v.map(f64::from)).collect()
        }
        SampleValue::Array(SampleArray::Float(values)) => {
            values.iter().map(|v| v.map(f64::from)).collect()
        }
        SampleValue::Array(SampleArray::String(values)) => values
            .iter()
            .map(|v| v.as_deref().map_or(Ok(None), |s| parse_number(s, locus, key)))
            .collect::<Result<_>>()?,
        _ => Vec::new(),
    })
}

fn vcf_error(e: io::Error) -> TriageError {
    match e.kind() {
        io::ErrorKind::InvalidData => TriageError::Parse(format!("invalid vcf record: {}", e)),
        _ => TriageError::Io(e),
    }
}

/// Records of a VCF stream that carry an alternate allele.
pub struct VariantRecords<R: BufRead> {
    reader: vcf::io::Reader<R>,
    header: vcf::Header,
    buf: RecordBuf,
}

impl<R: BufRead> VariantRecords<R> {
    /// Read the header of `inner` and position the stream on the first record.
    pub fn new(inner: R) -> Result<Self> {
        let mut reader = vcf::io::Reader::new(inner);
        let header = reader.read_header().map_err(vcf_error)?;
        Ok(VariantRecords {
            reader,
            header,
            buf: RecordBuf::default(),
        })
    }
}

impl<R: BufRead> Iterator for VariantRecords<R> {
    type Item = Result<VcfRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_record_buf(&self.header, &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => match VcfRecord::try_from(&self.buf) {
                    Ok(record) if record.has_alt() => return Some(Ok(record)),
                    Ok(_) => continue,
                    Err(e) => return Some(Err(e)),
                },
                Err(e) => return Some(Err(vcf_error(e))),
            }
        }
    }
}

/// Stream the records of a plain or gzipped VCF file that carry an alternate allele.
///
/// A path of `-` reads from stdin.
pub fn read_variant_records<P: AsRef<Path>>(
    path: P,
) -> Result<VariantRecords<Box<dyn BufRead>>> {
    VariantRecords::new(get_line_reader(path)?)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Meta lines declaring every field the test records use.
    pub(crate) const META: &str = "##fileformat=VCFv4.2
##INFO=<ID=DP,Number=1,Type=Integer,Description=\"Combined depth across samples\">
##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele frequency\">
##INFO=<ID=DP4,Number=4,Type=Integer,Description=\"Ref-forward, ref-reverse, alt-forward and alt-reverse bases\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read depth\">
##FORMAT=<ID=AD,Number=R,Type=Integer,Description=\"Read depth for each allele\">
##FORMAT=<ID=RD,Number=1,Type=Integer,Description=\"Depth of reference-supporting bases\">
";

    pub(crate) const SITES_COLUMNS: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
    pub(crate) const SAMPLE_COLUMNS: &str =
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsample\n";

    /// A complete one-sample VCF around `body`.
    pub(crate) fn vcf_text(body: &str) -> String {
        format!("{}{}{}", META, SAMPLE_COLUMNS, body)
    }

    /// Read a single body line, sites-only or with one sample.
    pub(crate) fn record(line: &str) -> VcfRecord {
        let columns = if line.split('\t').count() > 8 {
            SAMPLE_COLUMNS
        } else {
            SITES_COLUMNS
        };
        let text = format!("{}{}{}\n", META, columns, line);
        let mut records = VariantRecords::new(text.as_bytes()).unwrap();
        records.next().unwrap().unwrap()
    }
}
