//! SMILES Pair Encoding (SPE) tokenization.
//!
//! Applies a precomputed, rank-ordered table of pair-merge rules to
//! atomwise-split SMILES strings. Supports glossary isolation (substrings
//! that must stay atomic), per-instance memoization, and BPE-dropout
//! subword regularization.
//!
//! The merge table is learned offline; this crate only loads and applies
//! it.
//!
//! ```
//! use rustspe::{MergeRules, SpeTokenizer};
//!
//! let rules = MergeRules::from_lines(["C C", "CC O"]).unwrap();
//! let tokenizer = SpeTokenizer::new(rules, &[], None).unwrap();
//! assert_eq!(tokenizer.tokenize("CCO"), "CCO");
//! assert_eq!(tokenizer.tokenize("CCN"), "CC N");
//! ```

pub mod constants;
mod encoding;
pub mod error;
mod glossary;
mod pretokenizer;
#[cfg(feature = "python")]
mod python;
mod rules;
mod tokenizer;

pub use error::SpeError;
pub use glossary::GlossaryIsolator;
pub use rules::MergeRules;
pub use tokenizer::SpeTokenizer;
