//! Top-level SPE tokenizer: isolation, merging, caching, joining.

use std::io::BufRead;
use std::path::Path;
use std::sync::Mutex;

use ahash::AHashSet;
use compact_str::CompactString;
use fancy_regex::Regex;
use rand::Rng;
use rayon::prelude::*;

use crate::constants::SMILES_ATOM_PATTERN;
use crate::encoding::{encode, Cache};
use crate::error::SpeError;
use crate::glossary::GlossaryIsolator;
use crate::rules::MergeRules;

/// Tokenizes SMILES strings with a learned SPE merge table.
///
/// Rules, glossaries, and exclusive tokens are fixed at construction. The
/// only mutable state is the memoization cache behind a mutex, so one
/// instance can serve parallel callers; the cache grows monotonically and
/// is only touched at dropout 0.
pub struct SpeTokenizer {
    rules: MergeRules,
    isolator: GlossaryIsolator,
    exclusive_tokens: Option<AHashSet<CompactString>>,
    compiled_pattern: Regex,
    cache: Mutex<Cache>,
}

impl SpeTokenizer {
    /// Build a tokenizer from an existing rule table.
    pub fn new(
        rules: MergeRules,
        glossaries: &[String],
        exclusive_tokens: Option<&[String]>,
    ) -> Result<Self, SpeError> {
        let isolator = GlossaryIsolator::new(glossaries)?;
        let exclusive_tokens = exclusive_tokens
            .map(|tokens| tokens.iter().map(|t| CompactString::from(t.as_str())).collect());
        log::debug!(
            "SPE tokenizer ready: {} merge rules, {} glossaries",
            rules.len(),
            glossaries.len()
        );
        Ok(Self {
            rules,
            isolator,
            exclusive_tokens,
            compiled_pattern: Regex::new(SMILES_ATOM_PATTERN).expect("Invalid SMILES pattern"),
            cache: Mutex::new(Cache::default()),
        })
    }

    /// Read the rule table from `codes` and build a tokenizer.
    ///
    /// `merges` limits the table to the first `n` rule lines; `None` uses
    /// all of them.
    pub fn from_reader<R: BufRead>(
        codes: R,
        merges: Option<usize>,
        glossaries: &[String],
        exclusive_tokens: Option<&[String]>,
    ) -> Result<Self, SpeError> {
        Self::new(
            MergeRules::from_reader(codes, merges)?,
            glossaries,
            exclusive_tokens,
        )
    }

    /// Read the rule table from a file and build a tokenizer.
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        merges: Option<usize>,
        glossaries: &[String],
        exclusive_tokens: Option<&[String]>,
    ) -> Result<Self, SpeError> {
        Self::new(
            MergeRules::from_path(path, merges)?,
            glossaries,
            exclusive_tokens,
        )
    }

    /// The rule table driving this tokenizer.
    pub fn rules(&self) -> &MergeRules {
        &self.rules
    }

    /// Tokenize a SMILES string into a single-space-joined token stream.
    pub fn tokenize(&self, smi: &str) -> String {
        self.segments(smi, 0.0, &mut rand::rng()).join(" ")
    }

    /// Tokenize with BPE-dropout through the supplied random source.
    ///
    /// `dropout = 0` reproduces the standard segmentation and uses the
    /// cache; `dropout = 1` splits down to primitive symbols. Values
    /// outside [0, 1] are rejected.
    pub fn tokenize_with_dropout<R: Rng + ?Sized>(
        &self,
        smi: &str,
        dropout: f32,
        rng: &mut R,
    ) -> Result<String, SpeError> {
        if !(0.0..=1.0).contains(&dropout) {
            return Err(SpeError::InvalidDropout(dropout));
        }
        Ok(self.segments(smi, dropout, rng).join(" "))
    }

    /// Tokenize a batch in parallel. The same dropout applies to every
    /// input; each worker draws from its own thread-local random source.
    pub fn batch_tokenize(&self, smiles: &[String], dropout: f32) -> Result<Vec<String>, SpeError> {
        if !(0.0..=1.0).contains(&dropout) {
            return Err(SpeError::InvalidDropout(dropout));
        }
        Ok(smiles
            .par_iter()
            .map(|smi| self.segments(smi, dropout, &mut rand::rng()).join(" "))
            .collect())
    }

    fn segments<R: Rng + ?Sized>(
        &self,
        smi: &str,
        dropout: f32,
        rng: &mut R,
    ) -> Vec<CompactString> {
        self.isolator
            .isolate(smi)
            .iter()
            .flat_map(|segment| {
                encode(
                    segment,
                    &self.rules,
                    &self.cache,
                    &self.compiled_pattern,
                    self.exclusive_tokens.as_ref(),
                    self.isolator.full_match_regex(),
                    dropout,
                    rng,
                )
            })
            .collect()
    }
}
