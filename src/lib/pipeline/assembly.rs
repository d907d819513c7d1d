//! Assembly FASTA loading.

use crate::core::error::{Result, TriageError};
use crate::core::io::get_line_reader;
use bio::io::fasta;
use rustc_hash::FxHashSet;
use std::path::Path;

/// Identifier and sequence length of one assembly entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyEntry {
    pub id: String,
    pub length: usize,
}

/// Read every entry of a (optionally gzipped) FASTA file in file order.
///
/// Entries are not validated here; [`check_entries`] rejects empty or
/// repeated identifiers.
pub fn read_assembly<P: AsRef<Path>>(path: P) -> Result<Vec<AssemblyEntry>> {
    let path = path.as_ref();
    let reader = fasta::Reader::from_bufread(get_line_reader(path)?);

    let mut entries = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| {
            TriageError::Parse(format!("failed to read fasta {}: {}", path.display(), e))
        })?;
        entries.push(AssemblyEntry {
            id: record.id().to_string(),
            length: record.seq().len(),
        });
    }

    log::debug!("Read {} assembly entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Fail on the first entry without sequence or with a repeated identifier.
pub fn check_entries(entries: &[AssemblyEntry]) -> Result<()> {
    let mut seen = FxHashSet::default();
    for entry in entries {
        if entry.length == 0 {
            return Err(TriageError::EmptyAssemblyEntry(entry.id.clone()));
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(TriageError::DuplicateAssemblyEntry(entry.id.clone()));
        }
    }
    Ok(())
}
