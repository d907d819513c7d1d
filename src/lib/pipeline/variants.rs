//! Whole-assembly orchestration: extraction, comparison, scoring and contig selection.
//!
//! A [`Variants`] value moves forward through its stages:
//!
//! ```text
//! Loaded -> Extracted -> Compared -> Selected (per score kind) -> Verified (hme only)
//! ```
//!
//! Asking for a stage that already ran is a no-op. Asking for a later stage
//! first runs the comparison it depends on.

use crate::core::config::Settings;
use crate::core::error::Result;
use crate::core::io::get_line_reader;
use crate::engine::AlleleFractionRecord;
use crate::pipeline::assembly::{check_entries, read_assembly, AssemblyEntry};
use crate::pipeline::compare::{Contig, ContigPileupStore, InputSource};
use crate::pipeline::vcf::{filtering, read_variant_records, to_pileup, VariantCalls};
use log::{debug, info, warn};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::fmt;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Cutoff reported when low-score filtering is switched off.
pub const DISABLED_CUTOFF: f64 = 1.1;

/// Format of the per-source input files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    #[default]
    Pileup,
    Vcf,
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pileup" => Ok(InputFormat::Pileup),
            "vcf" => Ok(InputFormat::Vcf),
            _ => Err(format!("Invalid input format: {}. Valid formats: pileup, vcf", s)),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InputFormat::Pileup => write!(f, "pileup"),
            InputFormat::Vcf => write!(f, "vcf"),
        }
    }
}

/// Input files of one run; every source is optional.
#[derive(Debug, Clone, Default)]
pub struct InputFiles {
    pub mut_bulk: Option<PathBuf>,
    pub bg_bulk: Vec<PathBuf>,
    pub mut_parent: Option<PathBuf>,
    pub bg_parent: Option<PathBuf>,
    pub format: InputFormat,
}

impl InputFiles {
    pub fn paths(&self, source: InputSource) -> Vec<&Path> {
        match source {
            InputSource::MutBulk => self.mut_bulk.iter().map(PathBuf::as_path).collect(),
            InputSource::BgBulk => self.bg_bulk.iter().map(PathBuf::as_path).collect(),
            InputSource::MutParent => self.mut_parent.iter().map(PathBuf::as_path).collect(),
            InputSource::BgParent => self.bg_parent.iter().map(PathBuf::as_path).collect(),
        }
    }

    pub fn has_parents(&self) -> bool {
        self.mut_parent.is_some() || self.bg_parent.is_some()
    }
}

/// The two per-contig ranking scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreKind {
    Hme,
    Bfr,
}

impl ScoreKind {
    /// Score of `contig` for this kind; 0.0 before comparison.
    pub fn score_of(&self, contig: &Contig) -> f64 {
        match self {
            ScoreKind::Hme => contig.hme_score(),
            ScoreKind::Bfr => contig.bfr_score(),
        }
        .unwrap_or(0.0)
    }
}

impl fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScoreKind::Hme => write!(f, "hme"),
            ScoreKind::Bfr => write!(f, "bfr"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Loaded,
    Extracted,
    Compared,
}

/// Contigs kept for one score kind, as indices in assembly order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub contigs: Vec<usize>,
    /// `None` when there was no candidate to derive a cutoff from.
    pub cutoff: Option<f64>,
}

static EMPTY_SELECTION: Selection = Selection {
    contigs: Vec::new(),
    cutoff: None,
};

#[derive(Debug, Default)]
struct ExtractTally {
    stored: usize,
    unknown: usize,
}

/// Top-`proportion` percent cutoff of a score distribution.
///
/// Scores are ranked in descending order and the one at rank
/// `max(floor(n * proportion / 100), 1)` is returned, so the best score
/// always survives. `None` for an empty distribution.
pub fn bfr_cutoff<I: IntoIterator<Item = f64>>(scores: I, proportion: f64) -> Option<f64> {
    let mut scores: Vec<f64> = scores.into_iter().collect();
    if scores.is_empty() {
        return None;
    }
    scores.sort_by(|a, b| b.total_cmp(a));
    let rank = ((scores.len() as f64 * proportion / 100.0).floor() as usize).max(1);
    scores.get(rank.min(scores.len()) - 1).copied()
}

/// Whole-assembly state of one triage run.
#[derive(Debug)]
pub struct Variants {
    settings: Settings,
    stage: Stage,
    contigs: Vec<Contig>,
    stores: Vec<ContigPileupStore>,
    index: FxHashMap<String, usize>,
    hme_selection: Option<Selection>,
    bfr_selection: Option<Selection>,
    verified: bool,
}

impl Variants {
    /// Read the assembly and create one empty contig and store per entry.
    pub fn load<P: AsRef<Path>>(assembly: P, settings: Settings) -> Result<Self> {
        let entries = read_assembly(assembly.as_ref())?;
        let variants = Self::from_entries(entries, settings)?;
        info!(
            "Loaded {} fragments from {}",
            variants.len(),
            assembly.as_ref().display()
        );
        Ok(variants)
    }

    /// # Errors
    ///
    /// `EmptyAssemblyEntry` or `DuplicateAssemblyEntry`
    /// for a malformed assembly.
    pub fn from_entries(entries: Vec<AssemblyEntry>, settings: Settings) -> Result<Self> {
        check_entries(&entries)?;

        let mut index = FxHashMap::default();
        let mut contigs = Vec::with_capacity(entries.len());
        let mut stores = Vec::with_capacity(entries.len());
        for (i, entry) in entries.into_iter().enumerate() {
            stores.push(ContigPileupStore::new(&entry.id));
            contigs.push(Contig::new(&entry.id, entry.length));
            index.insert(entry.id, i);
        }

        Ok(Variants {
            settings,
            stage: Stage::Loaded,
            contigs,
            stores,
            index,
            hme_selection: None,
            bfr_selection: None,
            verified: false,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }

    pub fn contigs(&self) -> &[Contig] {
        &self.contigs
    }

    pub fn contig(&self, id: &str) -> Option<&Contig> {
        self.index.get(id).map(|&i| &self.contigs[i])
    }

    pub fn store(&self, id: &str) -> Option<&ContigPileupStore> {
        self.index.get(id).map(|&i| &self.stores[i])
    }

    /// Read every configured source and keep its variant records.
    ///
    /// In VCF mode the mutant bulk only keeps positions that survive
    /// background subtraction, so subtraction finishes before any comparison.
    pub fn analyse_pileups(&mut self, inputs: &InputFiles) -> Result<()> {
        if self.stage != Stage::Loaded {
            debug!("Inputs already extracted; skipping");
            return Ok(());
        }

        let mutant_calls = match (inputs.format, &inputs.mut_bulk) {
            (InputFormat::Vcf, Some(path)) => {
                Some(filtering(path, &inputs.bg_bulk, &self.settings)?)
            }
            _ => None,
        };

        for source in InputSource::ALL {
            for path in inputs.paths(source) {
                let tally = match inputs.format {
                    InputFormat::Pileup => self.extract_pileup(source, path)?,
                    InputFormat::Vcf => {
                        let keep = mutant_calls
                            .as_ref()
                            .filter(|_| source == InputSource::MutBulk);
                        self.extract_vcf(source, path, keep)?
                    }
                };
                if tally.unknown > 0 {
                    warn!(
                        "Skipped {} {} records on fragments missing from the assembly",
                        tally.unknown,
                        path.display()
                    );
                }
                info!(
                    "Stored {} variant positions for {} from {}",
                    tally.stored,
                    source,
                    path.display()
                );
            }
        }

        self.stage = Stage::Extracted;
        Ok(())
    }

    fn extract_pileup(&mut self, source: InputSource, path: &Path) -> Result<ExtractTally> {
        let mut tally = ExtractTally::default();
        for line in get_line_reader(path)?.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = AlleleFractionRecord::from_pileup_line(&line, &self.settings)?;
            self.store_variant(source, record, &mut tally);
        }
        Ok(tally)
    }

    fn extract_vcf(
        &mut self,
        source: InputSource,
        path: &Path,
        keep: Option<&VariantCalls>,
    ) -> Result<ExtractTally> {
        let mut tally = ExtractTally::default();
        for record in read_variant_records(path)? {
            let record = record?;
            if let Some(calls) = keep {
                if !calls.get(&record.chrom).contains(record.pos) {
                    continue;
                }
            }
            let line = to_pileup(&record)?;
            let decoded = AlleleFractionRecord::from_pileup_line(&line, &self.settings)?;
            self.store_variant(source, decoded, &mut tally);
        }
        Ok(tally)
    }

    fn store_variant(
        &mut self,
        source: InputSource,
        record: AlleleFractionRecord,
        tally: &mut ExtractTally,
    ) {
        if !record.is_variant {
            return;
        }
        match self.index.get(record.ref_seq.as_str()) {
            Some(&i) => {
                self.stores[i].store(source, record);
                tally.stored += 1;
            }
            None => tally.unknown += 1,
        }
    }

    /// Classify every contig and compute its scores. Runs once.
    ///
    /// Only runs after extraction; called before it, nothing changes.
    pub fn compare_pileups(&mut self) {
        match self.stage {
            Stage::Loaded => {
                warn!("Inputs have not been extracted yet; nothing to compare");
                return;
            }
            Stage::Compared => {
                debug!("Bulks already compared; skipping");
                return;
            }
            Stage::Extracted => {}
        }

        let settings = &self.settings;
        self.contigs
            .par_iter_mut()
            .zip(self.stores.par_iter_mut())
            .for_each(|(contig, store)| {
                if settings.polyploidy
                    && !(store.mut_parent.is_empty() && store.bg_parent.is_empty())
                {
                    store.hemisnps_in_parent(settings);
                }
                contig.assign(store.bulks_compared(settings), settings);
            });

        self.stage = Stage::Compared;
        info!("Compared bulks on {} fragments", self.contigs.len());
    }

    /// Candidate contigs for `kind` before any score cutoff.
    ///
    /// With only-fragments-with-variants on, hme candidates need more than
    /// `2 * hmes_adjust` classified positions and bfr candidates at least one
    /// hemizygous position; otherwise every contig is a candidate.
    pub fn select_contigs(&self, kind: ScoreKind) -> Vec<usize> {
        if !self.settings.only_frag_with_vars {
            info!("No filtering was applied to fragments");
            return (0..self.contigs.len()).collect();
        }

        let min_variants = 2.0 * self.settings.hmes_adjust;
        let selected: Vec<usize> = self
            .contigs
            .iter()
            .enumerate()
            .filter(|(_, contig)| match kind {
                ScoreKind::Hme => contig.variant_num() as f64 > min_variants,
                ScoreKind::Bfr => contig.hemi_num() > 0,
            })
            .map(|(i, _)| i)
            .collect();

        info!(
            "Selected {} out of {} fragments with {} score",
            selected.len(),
            self.contigs.len(),
            kind
        );
        selected
    }

    /// Score cutoff for `kind` over `candidates`.
    pub fn cutoff(&self, kind: ScoreKind, candidates: &[usize]) -> Option<f64> {
        if !self.settings.filter_out_low_hmes {
            return Some(DISABLED_CUTOFF);
        }
        match kind {
            ScoreKind::Hme => {
                Some(self.settings.cross_type.cutoff_factor() / self.settings.hmes_adjust + 1.0)
            }
            ScoreKind::Bfr => bfr_cutoff(
                candidates.iter().map(|&i| kind.score_of(&self.contigs[i])),
                self.settings.bfr_proportion,
            ),
        }
    }

    /// Select contigs for `kind` and drop those scoring below the cutoff.
    ///
    /// Runs the comparison first when needed. The selection is computed once
    /// per kind and cached; before extraction it is empty and not cached.
    pub fn filter_contigs(&mut self, kind: ScoreKind) -> &Selection {
        if self.selection(kind).is_none() {
            self.compare_pileups();
            if self.stage != Stage::Compared {
                return &EMPTY_SELECTION;
            }
            let selection = self.build_selection(kind);
            *self.selection_slot(kind) = Some(selection);
        }
        self.selection_slot(kind).get_or_insert_with(Selection::default)
    }

    fn build_selection(&self, kind: ScoreKind) -> Selection {
        let candidates = self.select_contigs(kind);
        let cutoff = self.cutoff(kind, &candidates);

        let contigs = match cutoff {
            Some(cutoff) if self.settings.filter_out_low_hmes => {
                let kept: Vec<usize> = candidates
                    .into_iter()
                    .filter(|&i| kind.score_of(&self.contigs[i]) >= cutoff)
                    .collect();
                info!(
                    "{} fragments with {} score at or above cutoff {:.4}",
                    kept.len(),
                    kind,
                    cutoff
                );
                kept
            }
            _ => candidates,
        };

        Selection { contigs, cutoff }
    }

    /// Cached selection for `kind`, if it was computed.
    pub fn selection(&self, kind: ScoreKind) -> Option<&Selection> {
        match kind {
            ScoreKind::Hme => self.hme_selection.as_ref(),
            ScoreKind::Bfr => self.bfr_selection.as_ref(),
        }
    }

    fn selection_slot(&mut self, kind: ScoreKind) -> &mut Option<Selection> {
        match kind {
            ScoreKind::Hme => &mut self.hme_selection,
            ScoreKind::Bfr => &mut self.bfr_selection,
        }
    }

    /// Selected contigs for `kind`, computing the selection when needed.
    pub fn selected(&mut self, kind: ScoreKind) -> Vec<&Contig> {
        let indices = self.filter_contigs(kind).contigs.clone();
        indices.into_iter().map(|i| &self.contigs[i]).collect()
    }

    pub fn hmes_frags(&mut self) -> Vec<&Contig> {
        self.selected(ScoreKind::Hme)
    }

    pub fn bfr_frags(&mut self) -> Vec<&Contig> {
        self.selected(ScoreKind::Bfr)
    }

    /// Drop homozygous positions of hme-selected contigs that look segregating
    /// in the background bulk. Runs once and returns the number dropped.
    ///
    /// A position whose mutant record is missing or not flagged as a variant
    /// is dropped as well, without an error.
    pub fn verify_bg_bulk_pileup(&mut self) -> usize {
        if self.verified {
            debug!("Background bulk already verified; skipping");
            return 0;
        }
        self.filter_contigs(ScoreKind::Hme);
        if self.stage != Stage::Compared {
            return 0;
        }

        let threshold = self.settings.bg_bulk_noise;
        let mut dropped = 0;
        if let Some(selection) = &self.hme_selection {
            for &i in &selection.contigs {
                let store = &self.stores[i];
                let contig = &mut self.contigs[i];
                let before = contig.hm_num();
                contig.hm_pos.retain(|pos, _| match store.mut_bulk.get(pos) {
                    Some(record) if record.is_variant => store
                        .bg_bulk
                        .get(pos)
                        .map_or(true, |bg| bg.non_ref_ratio <= threshold),
                    _ => false,
                });
                dropped += before - contig.hm_num();
            }
        }

        self.verified = true;
        info!(
            "Dropped {} homozygous positions noisy in the background bulk",
            dropped
        );
        dropped
    }
}
