//! Per-contig pileup storage and bulk comparison.
//!
//! A [`ContigPileupStore`] keeps the variant records of one contig from each
//! input source and turns them into classified positions. Positions end up in
//! exactly one of the homozygous, heterozygous or hemizygous buckets.

use crate::core::config::Settings;
use crate::engine::{dominant_variant, get_bfr, AlleleFractionRecord, Zygosity};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;

/// Variant records of one source, keyed by 1-based position.
pub type PositionRecords = FxHashMap<u32, AlleleFractionRecord>;

/// Position -> ratio (allele fraction or BFR), ordered by position.
pub type PositionRatios = BTreeMap<u32, f64>;

/// The four sequencing inputs of a bulk segregant experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    MutBulk,
    BgBulk,
    MutParent,
    BgParent,
}

impl InputSource {
    pub const ALL: [InputSource; 4] = [
        InputSource::MutBulk,
        InputSource::BgBulk,
        InputSource::MutParent,
        InputSource::BgParent,
    ];
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InputSource::MutBulk => write!(f, "mut_bulk"),
            InputSource::BgBulk => write!(f, "bg_bulk"),
            InputSource::MutParent => write!(f, "mut_parent"),
            InputSource::BgParent => write!(f, "bg_parent"),
        }
    }
}

/// Classification result of one contig.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassifiedPositions {
    pub hom: PositionRatios,
    pub het: PositionRatios,
    pub hemi: PositionRatios,
}

/// Zygosity of a variant fraction under the run's bands.
#[inline]
pub fn var_mode(fraction: f64, settings: &Settings) -> Option<Zygosity> {
    Zygosity::classify(fraction, settings)
}

/// Variant records for one contig from every input source.
#[derive(Debug, Clone, Default)]
pub struct ContigPileupStore {
    pub id: String,
    pub mut_bulk: PositionRecords,
    pub bg_bulk: PositionRecords,
    pub mut_parent: PositionRecords,
    pub bg_parent: PositionRecords,
    /// Hemizygous positions from the parents, position -> BFR.
    pub parent_hemi: PositionRatios,
}

impl ContigPileupStore {
    pub fn new(id: &str) -> Self {
        ContigPileupStore {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn records_mut(&mut self, source: InputSource) -> &mut PositionRecords {
        match source {
            InputSource::MutBulk => &mut self.mut_bulk,
            InputSource::BgBulk => &mut self.bg_bulk,
            InputSource::MutParent => &mut self.mut_parent,
            InputSource::BgParent => &mut self.bg_parent,
        }
    }

    /// Store a record under its position for `source`.
    pub fn store(&mut self, source: InputSource, record: AlleleFractionRecord) {
        self.records_mut(source).insert(record.pos, record);
    }

    /// Classify the mutant bulk call at `pos` against the background bulk.
    ///
    /// The dominant non-reference allele decides the zygosity. A position that
    /// is homozygous in both bulks is discarded.
    pub fn compare_pileup(&self, pos: u32, settings: &Settings) -> Option<(Zygosity, f64)> {
        let record = self.mut_bulk.get(&pos)?;
        let (_, ratio) = dominant_variant(&record.base_fractions)?;
        let mut_type = var_mode(ratio, settings)?;

        if let Some(bg) = self.bg_bulk.get(&pos) {
            let bg_type = dominant_variant(&bg.base_fractions)
                .and_then(|(_, frac)| var_mode(frac, settings));
            if mut_type == Zygosity::Hom && bg_type == Some(Zygosity::Hom) {
                return None;
            }
        }

        Some((mut_type, ratio))
    }

    /// Mark hemizygous positions from the mutant and background parents.
    ///
    /// Positions shared by both parents use both fraction maps and are consumed
    /// from the background parent store; the rest use their own parent alone.
    pub fn hemisnps_in_parent(&mut self, settings: &Settings) {
        let adjust = settings.bfr_adjust;
        let mut hemi = PositionRatios::new();

        for (pos, record) in &self.mut_parent {
            let bfr = match self.bg_parent.remove(pos) {
                Some(bg) => get_bfr(&record.base_fractions, Some(&bg.base_fractions), adjust),
                None => get_bfr(&record.base_fractions, None, adjust),
            };
            hemi.insert(*pos, bfr);
        }

        for (pos, record) in &self.bg_parent {
            hemi.entry(*pos)
                .or_insert_with(|| get_bfr(&record.base_fractions, None, adjust));
        }

        self.parent_hemi = hemi;
    }

    /// Classify every mutant bulk position of the contig.
    pub fn bulks_compared(&self, settings: &Settings) -> ClassifiedPositions {
        let mut classified = ClassifiedPositions::default();

        for (pos, record) in &self.mut_bulk {
            if settings.polyploidy && self.parent_hemi.contains_key(pos) {
                let bg = self.bg_bulk.get(pos).map(|r| &r.base_fractions);
                let bfr = get_bfr(&record.base_fractions, bg, settings.bfr_adjust);
                classified.hemi.insert(*pos, bfr);
            } else if let Some((zygosity, ratio)) = self.compare_pileup(*pos, settings) {
                match zygosity {
                    Zygosity::Hom => classified.hom.insert(*pos, ratio),
                    Zygosity::Het => classified.het.insert(*pos, ratio),
                };
            }
        }

        classified
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Allele, BaseFractions};

    fn record(pos: u32, entries: &[(Allele, f64)]) -> AlleleFractionRecord {
        let fractions: BaseFractions = entries.iter().copied().collect();
        let non_ref = fractions
            .iter()
            .filter(|(a, _)| !a.is_ref())
            .map(|(_, f)| *f)
            .sum::<f64>();
        AlleleFractionRecord::new("frag1", pos, fractions, true, non_ref)
    }

    fn store_with(mutant: &[AlleleFractionRecord], background: &[AlleleFractionRecord]) -> ContigPileupStore {
        let mut store = ContigPileupStore::new("frag1");
        for r in mutant {
            store.store(InputSource::MutBulk, r.clone());
        }
        for r in background {
            store.store(InputSource::BgBulk, r.clone());
        }
        store
    }

    #[test]
    fn classifies_hom_and_het() {
        let store = store_with(
            &[
                record(10, &[(Allele::A, 0.95)]),
                record(20, &[(Allele::Ref, 0.5), (Allele::T, 0.5)]),
                record(30, &[(Allele::Ref, 0.85), (Allele::C, 0.15)]),
            ],
            &[],
        );
        let classified = store.bulks_compared(&Settings::default());
        assert_eq!(classified.hom, [(10, 0.95)].into_iter().collect());
        assert_eq!(classified.het, [(20, 0.5)].into_iter().collect());
        assert!(classified.hemi.is_empty());
    }

    #[test]
    fn reference_only_or_empty_maps_give_no_call() {
        let store = store_with(&[record(5, &[(Allele::Ref, 1.0)]), record(6, &[])], &[]);
        let settings = Settings::default();
        assert_eq!(store.compare_pileup(5, &settings), None);
        assert_eq!(store.compare_pileup(6, &settings), None);
        assert_eq!(store.compare_pileup(7, &settings), None);
    }

    #[test]
    fn multi_allelic_collapses_to_dominant_allele() {
        let store = store_with(
            &[record(3, &[(Allele::Ref, 0.2), (Allele::A, 0.3), (Allele::G, 0.5)])],
            &[],
        );
        assert_eq!(
            store.compare_pileup(3, &Settings::default()),
            Some((Zygosity::Het, 0.5))
        );
    }

    #[test]
    fn shared_homozygous_call_is_discarded() {
        let store = store_with(
            &[record(10, &[(Allele::A, 1.0)])],
            &[record(10, &[(Allele::A, 0.9), (Allele::Ref, 0.1)])],
        );
        assert_eq!(store.compare_pileup(10, &Settings::default()), None);
        assert!(store.bulks_compared(&Settings::default()).hom.is_empty());
    }

    #[test]
    fn background_het_keeps_mutant_hom() {
        let store = store_with(
            &[record(10, &[(Allele::A, 1.0)])],
            &[record(10, &[(Allele::Ref, 0.6), (Allele::A, 0.4)])],
        );
        assert_eq!(
            store.compare_pileup(10, &Settings::default()),
            Some((Zygosity::Hom, 1.0))
        );
    }

    #[test]
    fn background_reference_key_does_not_count_as_variant() {
        // a background that is mostly reference must not read as homozygous
        let store = store_with(
            &[record(10, &[(Allele::A, 1.0)])],
            &[record(10, &[(Allele::Ref, 0.95)])],
        );
        assert_eq!(
            store.compare_pileup(10, &Settings::default()),
            Some((Zygosity::Hom, 1.0))
        );
    }

    #[test]
    fn mutant_het_survives_background_hom() {
        let store = store_with(
            &[record(10, &[(Allele::Ref, 0.5), (Allele::A, 0.5)])],
            &[record(10, &[(Allele::A, 1.0)])],
        );
        assert_eq!(
            store.compare_pileup(10, &Settings::default()),
            Some((Zygosity::Het, 0.5))
        );
    }

    #[test]
    fn hemisnps_cover_union_of_parents() {
        let mut store = ContigPileupStore::new("frag1");
        store.store(
            InputSource::MutParent,
            record(1, &[(Allele::Ref, 0.75), (Allele::A, 0.25)]),
        );
        store.store(
            InputSource::MutParent,
            record(2, &[(Allele::Ref, 0.5), (Allele::C, 0.5)]),
        );
        store.store(
            InputSource::BgParent,
            record(2, &[(Allele::Ref, 0.75), (Allele::C, 0.25)]),
        );
        store.store(
            InputSource::BgParent,
            record(3, &[(Allele::Ref, 0.5), (Allele::T, 0.5)]),
        );

        let settings = Settings::default();
        store.hemisnps_in_parent(&settings);

        assert_eq!(store.parent_hemi.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!((store.parent_hemi[&1] - 0.8 / 0.3).abs() < 1e-12);
        assert!((store.parent_hemi[&2] - 0.8 / 0.3).abs() < 1e-12);
        assert!((store.parent_hemi[&3] - 1.0).abs() < 1e-12);
        // the shared position was consumed from the background parent
        assert!(!store.bg_parent.contains_key(&2));
        assert!(store.bg_parent.contains_key(&3));
    }

    #[test]
    fn polyploid_hemi_positions_use_bulk_bfr() {
        let mut store = store_with(
            &[
                record(1, &[(Allele::Ref, 0.5), (Allele::A, 0.5)]),
                record(2, &[(Allele::A, 0.95)]),
            ],
            &[record(1, &[(Allele::Ref, 0.75), (Allele::A, 0.25)])],
        );
        store.store(
            InputSource::MutParent,
            record(1, &[(Allele::Ref, 0.5), (Allele::A, 0.5)]),
        );

        let settings = Settings {
            polyploidy: true,
            ..Settings::default()
        };
        store.hemisnps_in_parent(&settings);
        let classified = store.bulks_compared(&settings);

        assert_eq!(classified.hemi.len(), 1);
        assert!((classified.hemi[&1] - 0.8 / 0.3).abs() < 1e-12);
        assert!(!classified.het.contains_key(&1));
        assert_eq!(classified.hom, [(2, 0.95)].into_iter().collect());

        // without polyploidy the same position is compared normally
        let diploid = store.bulks_compared(&Settings::default());
        assert!(diploid.hemi.is_empty());
        assert_eq!(diploid.het, [(1, 0.5)].into_iter().collect());
    }

    #[test]
    fn buckets_are_disjoint() {
        let mut store = store_with(
            &[
                record(1, &[(Allele::Ref, 0.5), (Allele::A, 0.5)]),
                record(2, &[(Allele::A, 0.95)]),
                record(3, &[(Allele::Ref, 0.6), (Allele::G, 0.4)]),
            ],
            &[],
        );
        store.store(InputSource::MutParent, record(3, &[(Allele::Ref, 0.5), (Allele::G, 0.5)]));
        let settings = Settings {
            polyploidy: true,
            ..Settings::default()
        };
        store.hemisnps_in_parent(&settings);
        let c = store.bulks_compared(&settings);
        for pos in 1..=3 {
            let hits = [c.hom.contains_key(&pos), c.het.contains_key(&pos), c.hemi.contains_key(&pos)]
                .iter()
                .filter(|hit| **hit)
                .count();
            assert!(hits <= 1, "position {} in {} buckets", pos, hits);
        }
    }
}
