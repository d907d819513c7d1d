//! Tab separated tables of the positions behind each selected contig.

use crate::core::error::Result;
use crate::core::fs::{is_bgzipped, make_parent_dirs};
use crate::core::io::get_writer;
use crate::pipeline::compare::Contig;
use crate::pipeline::variants::ScoreKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

const COMPRESSION_LEVEL: u32 = 6;
const HEADER: [&str; 5] = ["contig", "position", "zygosity", "ratio", "score"];

/// One reported position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantRow<'a> {
    pub contig: &'a str,
    pub position: u32,
    pub zygosity: &'static str,
    pub ratio: f64,
    pub score: f64,
}

/// Rows for `contigs` in the given order, positions ascending within a contig.
///
/// Hme rows carry the homozygous and heterozygous positions, bfr rows the
/// hemizygous ones.
pub fn selection_rows<'a>(contigs: &[&'a Contig], kind: ScoreKind) -> Vec<VariantRow<'a>> {
    let mut rows = Vec::new();
    for &contig in contigs {
        let score = kind.score_of(contig);
        let start = rows.len();
        let mut push = |positions: &BTreeMap<u32, f64>, zygosity: &'static str| {
            rows.extend(positions.iter().map(|(pos, ratio)| VariantRow {
                contig: contig.id.as_str(),
                position: *pos,
                zygosity,
                ratio: *ratio,
                score,
            }))
        };
        match kind {
            ScoreKind::Hme => {
                push(&contig.hm_pos, "hom");
                push(&contig.ht_pos, "het");
            }
            ScoreKind::Bfr => push(&contig.hemi_pos, "hemi"),
        }
        rows[start..].sort_by_key(|row| row.position);
    }
    rows
}

/// Write the rows of `contigs` to `path`, BGZF compressed for a `.gz` path.
///
/// Returns the number of rows written.
pub fn write_selection<P: AsRef<Path>>(
    path: P,
    contigs: &[&Contig],
    kind: ScoreKind,
    threads: usize,
) -> Result<usize> {
    let path = path.as_ref();
    make_parent_dirs(path)?;
    let mut writer = get_writer(
        &Some(path),
        is_bgzipped(path),
        false,
        threads,
        COMPRESSION_LEVEL,
    )?;
    writer.write_record(HEADER)?;

    let rows = selection_rows(contigs, kind);
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    log::info!(
        "Wrote {} {} positions from {} fragments to {}",
        rows.len(),
        kind,
        contigs.len(),
        path.display()
    );
    Ok(rows.len())
}
