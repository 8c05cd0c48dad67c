//! Merge-rule table: loading, deduplication, and rank lookup.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ahash::AHashMap;
use compact_str::CompactString;

use crate::constants::Pair;
use crate::error::SpeError;

/// Ranked pair-merge rules learned offline by SPE training.
///
/// A smaller rank means the rule was learned earlier and merges with higher
/// priority. When the same pair appears more than once in the source list,
/// only the first occurrence's rank is kept.
#[derive(Debug, Clone, Default)]
pub struct MergeRules {
    ranks: AHashMap<Pair, u32>,
    reverse: AHashMap<CompactString, Pair>,
}

impl MergeRules {
    /// Read rules from a buffered source, one `left right` pair per line.
    ///
    /// `merges` limits the table to the first `n` lines; `None` uses every
    /// line.
    pub fn from_reader<R: BufRead>(reader: R, merges: Option<usize>) -> Result<Self, SpeError> {
        let mut lines = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if merges.is_some_and(|n| lines.len() >= n) {
                break;
            }
            lines.push(line);
        }
        Self::from_lines(lines)
    }

    /// Open a rules file and read it in full (or up to `merges` lines).
    pub fn from_path<P: AsRef<Path>>(path: P, merges: Option<usize>) -> Result<Self, SpeError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file), merges)
    }

    /// Build the table from rule lines already in memory.
    pub fn from_lines<I>(lines: I) -> Result<Self, SpeError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut ranks: AHashMap<Pair, u32> = AHashMap::new();
        let mut total = 0usize;

        for (idx, raw) in lines.into_iter().enumerate() {
            let trimmed = raw.as_ref().trim_matches(['\r', '\n', ' ']);
            let mut parts = trimmed.split(' ');
            let (left, right) = match (parts.next(), parts.next(), parts.next()) {
                (Some(left), Some(right), None) => (left, right),
                _ => {
                    return Err(SpeError::MalformedRule {
                        line: idx + 1,
                        content: trimmed.to_string(),
                    })
                }
            };

            let pair: Pair = (CompactString::from(left), CompactString::from(right));
            // First occurrence of a pair keeps its rank; later duplicates
            // are ignored.
            ranks.entry(pair).or_insert(idx as u32);
            total += 1;
        }

        let mut reverse: AHashMap<CompactString, Pair> = AHashMap::with_capacity(ranks.len());
        for pair in ranks.keys() {
            let merged = CompactString::from(format!("{}{}", pair.0, pair.1));
            reverse.insert(merged, pair.clone());
        }

        log::info!("Loaded {} merge rules from {} lines", ranks.len(), total);
        Ok(Self { ranks, reverse })
    }

    /// Rank of a pair, if the pair is mergeable. Smaller ranks merge first.
    pub fn rank_of(&self, pair: &Pair) -> Option<u32> {
        self.ranks.get(pair).copied()
    }

    /// Constituent pair of a previously merged symbol.
    pub fn decompose(&self, merged: &str) -> Option<&Pair> {
        self.reverse.get(merged)
    }

    /// Number of distinct merge rules.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// True when the table holds no rules.
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}
