//! Glossary isolation: protecting exact substrings from tokenization.

use fancy_regex::Regex;

use crate::error::SpeError;

/// One glossary with its compiled patterns.
#[derive(Debug)]
struct Glossary {
    /// Unanchored regex used to find occurrences inside a word.
    search: Regex,
    /// Anchored regex matching a word equal to the glossary.
    exact: Regex,
}

/// Splits words into segments so every glossary occurrence stays atomic.
///
/// Glossary strings are compiled verbatim as regex patterns; callers are
/// responsible for escaping metacharacters when they want literal matching.
/// All compilation happens here, at construction.
#[derive(Debug, Default)]
pub struct GlossaryIsolator {
    glossaries: Vec<Glossary>,
    /// `^(g1|...|gN)$`, classifies an entire segment as protected.
    full_match: Option<Regex>,
}

impl GlossaryIsolator {
    /// Compile the supplied glossary patterns, in order.
    pub fn new(patterns: &[String]) -> Result<Self, SpeError> {
        let mut glossaries = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            glossaries.push(Glossary {
                search: compile(pattern)?,
                exact: compile(&format!("^{pattern}$"))?,
            });
        }
        let full_match = if patterns.is_empty() {
            None
        } else {
            Some(compile(&format!("^({})$", patterns.join("|")))?)
        };
        log::debug!("Compiled {} glossary patterns", glossaries.len());
        Ok(Self {
            glossaries,
            full_match,
        })
    }

    /// Regex matching a whole segment against any glossary, if any exist.
    pub fn full_match_regex(&self) -> Option<&Regex> {
        self.full_match.as_ref()
    }

    /// Split `word` so every glossary occurrence is isolated into its own
    /// segment.
    ///
    /// Glossaries apply in supplied order; each one refines the segments
    /// produced by the previous one.
    pub fn isolate(&self, word: &str) -> Vec<String> {
        let mut segments = vec![word.to_string()];
        for gloss in &self.glossaries {
            let mut refined = Vec::with_capacity(segments.len());
            for segment in &segments {
                refined.extend(isolate_one(segment, gloss));
            }
            segments = refined;
        }
        segments
    }
}

fn compile(pattern: &str) -> Result<Regex, SpeError> {
    Regex::new(pattern).map_err(|e| SpeError::InvalidGlossary {
        pattern: pattern.to_string(),
        source: Box::new(e),
    })
}

/// Isolate one glossary inside one word.
fn isolate_one(word: &str, gloss: &Glossary) -> Vec<String> {
    let exact = gloss.exact.is_match(word).unwrap_or(false);
    let occurs = gloss.search.is_match(word).unwrap_or(false);
    if exact || !occurs {
        return vec![word.to_string()];
    }

    // Split on occurrences, keeping each occurrence as its own element.
    // Interior empty strings between adjacent matches never make it in.
    let mut segments = Vec::new();
    let mut last = 0usize;
    for m in gloss.search.find_iter(word).flatten() {
        if m.start() > last {
            segments.push(word[last..m.start()].to_string());
        }
        segments.push(m.as_str().to_string());
        last = m.end();
    }

    // The trailing element is trimmed and kept only when non-empty.
    let ending = word[last..].trim_end_matches(['\r', '\n', ' ']);
    if !ending.is_empty() {
        segments.push(ending.to_string());
    }
    segments
}
