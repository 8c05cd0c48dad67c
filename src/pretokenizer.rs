//! Atomwise splitting of SMILES strings.

use ahash::AHashSet;
use compact_str::CompactString;
use fancy_regex::Regex;

use crate::constants::UNK_TOKEN;

/// Split a SMILES string into atom-level tokens.
///
/// Handles multi-character atoms (Br, Cl), bracket atoms ([C@@H], [N+]),
/// ring closures, bonds, and stereochemistry markers. When `exclusive` is
/// supplied, bracket atoms outside the set are replaced by `[UNK]`.
pub(crate) fn atomwise_tokenize(
    smiles: &str,
    pattern: &Regex,
    exclusive: Option<&AHashSet<CompactString>>,
) -> Vec<CompactString> {
    let mut tokens = Vec::new();
    for m in pattern.find_iter(smiles).flatten() {
        tokens.push(CompactString::from(m.as_str()));
    }
    if let Some(keep) = exclusive {
        for tok in tokens.iter_mut() {
            if tok.starts_with('[') && !keep.contains(tok.as_str()) {
                *tok = CompactString::from(UNK_TOKEN);
            }
        }
    }
    tokens
}
