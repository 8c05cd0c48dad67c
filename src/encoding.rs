//! Applying ranked pair merges to a single segment.

use std::sync::{Mutex, PoisonError};

use ahash::{AHashMap, AHashSet};
use compact_str::CompactString;
use fancy_regex::Regex;
use rand::Rng;

use crate::constants::Pair;
use crate::pretokenizer::atomwise_tokenize;
use crate::rules::MergeRules;

/// Memoized tokenizations, keyed by the original segment.
pub(crate) type Cache = AHashMap<CompactString, Vec<CompactString>>;

/// Encode one segment by applying merge rules in rank order.
///
/// With `dropout > 0` each adjacent pair is considered only when a uniform
/// draw from `rng` exceeds the dropout probability, and the cache is
/// bypassed entirely so stochastic segmentations are never persisted or
/// reused.
#[allow(clippy::too_many_arguments)]
pub(crate) fn encode<R: Rng + ?Sized>(
    orig: &str,
    rules: &MergeRules,
    cache: &Mutex<Cache>,
    pattern: &Regex,
    exclusive: Option<&AHashSet<CompactString>>,
    glossary_regex: Option<&Regex>,
    dropout: f32,
    rng: &mut R,
) -> Vec<CompactString> {
    let deterministic = dropout == 0.0;

    if deterministic {
        let cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = cache.get(orig) {
            return hit.clone();
        }
    }

    // Glossary segments arrive already isolated; this re-check keeps a
    // protected segment atomic even when called directly.
    if let Some(regex) = glossary_regex {
        if regex.is_match(orig).unwrap_or(false) {
            let word = vec![CompactString::from(orig)];
            if deterministic {
                cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(CompactString::from(orig), word.clone());
            }
            return word;
        }
    }

    // A single-character segment cannot be split further.
    let mut chars = orig.chars();
    if chars.next().is_some() && chars.next().is_none() {
        return vec![CompactString::from(orig)];
    }

    let mut word = atomwise_tokenize(orig, pattern, exclusive);

    while word.len() > 1 {
        // Eligible candidates this pass: (rank, start position, pair).
        let mut candidates: Vec<(u32, usize, Pair)> = Vec::new();
        for (i, win) in word.windows(2).enumerate() {
            if dropout > 0.0 && rng.random::<f32>() <= dropout {
                continue;
            }
            let pair: Pair = (win[0].clone(), win[1].clone());
            if let Some(rank) = rules.rank_of(&pair) {
                candidates.push((rank, i, pair));
            }
        }

        // Lowest (rank, position) wins; equal ranks prefer the leftmost.
        let Some(best) = candidates.iter().min_by_key(|&&(rank, pos, _)| (rank, pos)) else {
            break;
        };
        let bigram = best.2.clone();

        // Start positions of every eligible occurrence of the winning pair.
        let positions: Vec<usize> = candidates
            .iter()
            .filter(|(_, _, pair)| *pair == bigram)
            .map(|&(_, pos, _)| pos)
            .collect();

        let merged = CompactString::from(format!("{}{}", bigram.0, bigram.1));
        let mut new_word: Vec<CompactString> = Vec::with_capacity(word.len());
        let mut i = 0usize;
        for &j in &positions {
            // Merges starting inside the previous merge of this pass are
            // invalid; this happens with overlapping pairs (x x x -> xx x).
            if j < i {
                continue;
            }
            new_word.extend_from_slice(&word[i..j]);
            new_word.push(merged.clone());
            i = j + 2;
        }
        new_word.extend_from_slice(&word[i..]);
        word = new_word;
    }

    if deterministic {
        cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(CompactString::from(orig), word.clone());
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SMILES_ATOM_PATTERN;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pattern() -> Regex {
        Regex::new(SMILES_ATOM_PATTERN).unwrap()
    }

    fn rules(lines: &[&str]) -> MergeRules {
        MergeRules::from_lines(lines).unwrap()
    }

    fn toks(symbols: &[&str]) -> Vec<CompactString> {
        symbols.iter().map(|s| CompactString::from(*s)).collect()
    }

    fn run(orig: &str, rules: &MergeRules, cache: &Mutex<Cache>, dropout: f32) -> Vec<CompactString> {
        let mut rng = StdRng::seed_from_u64(7);
        encode(
            orig,
            rules,
            cache,
            &pattern(),
            None,
            None,
            dropout,
            &mut rng,
        )
    }

    #[test]
    fn test_overlapping_pairs_merge_once_per_pass() {
        // C C C with rule (C, C): only the leftmost occurrence merges in
        // the first pass.
        let rules = rules(&["C C"]);
        let cache = Mutex::new(Cache::default());
        let word = run("CCC", &rules, &cache, 0.0);
        assert_eq!(word, toks(&["CC", "C"]));
    }

    #[test]
    fn test_merges_chain_across_passes() {
        let rules = rules(&["C C", "CC O"]);
        let cache = Mutex::new(Cache::default());
        let word = run("CCO", &rules, &cache, 0.0);
        assert_eq!(word, toks(&["CCO"]));
    }

    #[test]
    fn test_lowest_rank_wins() {
        // (C, O) was learned before (C, C), so it merges first.
        let rules = rules(&["C O", "C C"]);
        let cache = Mutex::new(Cache::default());
        let word = run("CCO", &rules, &cache, 0.0);
        assert_eq!(word, toks(&["C", "CO"]));
    }

    #[test]
    fn test_all_occurrences_merge_in_one_pass() {
        let rules = rules(&["C C"]);
        let cache = Mutex::new(Cache::default());
        let word = run("CCOCC", &rules, &cache, 0.0);
        assert_eq!(word, toks(&["CC", "O", "CC"]));
    }

    #[test]
    fn test_no_applicable_rules_yields_primitives() {
        let rules = rules(&["N N"]);
        let cache = Mutex::new(Cache::default());
        let word = run("CCO", &rules, &cache, 0.0);
        assert_eq!(word, toks(&["C", "C", "O"]));
    }

    #[test]
    fn test_single_character_floor() {
        let rules = rules(&["C C"]);
        let cache = Mutex::new(Cache::default());
        let word = run("C", &rules, &cache, 0.0);
        assert_eq!(word, toks(&["C"]));
        // The single-character path is not cached.
        assert!(cache.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cache_hit_and_write() {
        let rules = rules(&["C C"]);
        let cache = Mutex::new(Cache::default());
        let first = run("CCO", &rules, &cache, 0.0);
        assert_eq!(cache.lock().unwrap().len(), 1);
        let second = run("CCO", &rules, &cache, 0.0);
        assert_eq!(first, second);
        assert_eq!(cache.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_dropout_bypasses_cache_read_and_write() {
        let rules = rules(&["C C"]);
        let cache = Mutex::new(Cache::default());
        cache
            .lock()
            .unwrap()
            .insert(CompactString::from("CCO"), toks(&["bogus"]));

        // dropout = 1 suppresses every merge and ignores the poisoned-in
        // cache entry.
        let word = run("CCO", &rules, &cache, 1.0);
        assert_eq!(word, toks(&["C", "C", "O"]));

        // The stale entry is still there, untouched.
        assert_eq!(
            cache.lock().unwrap().get("CCO"),
            Some(&toks(&["bogus"]))
        );
        assert_eq!(cache.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_dropout_one_yields_primitive_sequence() {
        let rules = rules(&["C C", "CC O"]);
        let cache = Mutex::new(Cache::default());
        let word = run("CCO", &rules, &cache, 1.0);
        assert_eq!(word, toks(&["C", "C", "O"]));
        assert!(cache.lock().unwrap().is_empty());
    }

    #[test]
    fn test_glossary_regex_short_circuits() {
        let rules = rules(&["C C"]);
        let cache = Mutex::new(Cache::default());
        let glossary = Regex::new("^(CCO)$").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let word = encode(
            "CCO",
            &rules,
            &cache,
            &pattern(),
            None,
            Some(&glossary),
            0.0,
            &mut rng,
        );
        assert_eq!(word, toks(&["CCO"]));
        assert_eq!(cache.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_token_concatenation_reproduces_input() {
        let rules = rules(&["c c", "c 1", "C Br"]);
        let cache = Mutex::new(Cache::default());
        let orig = "c1ccccc1CBr";
        let word = run(orig, &rules, &cache, 0.0);
        let joined: String = word.iter().map(|t| t.as_str()).collect();
        assert_eq!(joined, orig);
    }

    #[test]
    fn test_intermediate_dropout_preserves_coverage() {
        let rules = rules(&["C C", "CC O", "c c"]);
        let cache = Mutex::new(Cache::default());
        let orig = "CCOc1ccccc1";
        for seed in 0..16 {
            let mut rng = StdRng::seed_from_u64(seed);
            let word = encode(
                orig,
                &rules,
                &cache,
                &pattern(),
                None,
                None,
                0.5,
                &mut rng,
            );
            let joined: String = word.iter().map(|t| t.as_str()).collect();
            assert_eq!(joined, orig);
        }
        assert!(cache.lock().unwrap().is_empty());
    }

    #[test]
    fn test_exclusive_tokens_flow_through() {
        let rules = rules(&["C [UNK]"]);
        let cache = Mutex::new(Cache::default());
        let keep: AHashSet<CompactString> = [CompactString::from("[nH]")].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        let word = encode(
            "C[C@@H]",
            &rules,
            &cache,
            &pattern(),
            Some(&keep),
            None,
            0.0,
            &mut rng,
        );
        assert_eq!(word, toks(&["C[UNK]"]));
    }
}
