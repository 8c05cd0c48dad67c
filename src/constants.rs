//! Constants and type aliases for the SPE tokenizer.

use compact_str::CompactString;

/// SMILES atom-level tokenization regex pattern
/// Matches:
/// - Bracketed atoms: [C@@H], [nH], [O-], etc.
/// - Two-char elements: Br, Cl (must come before B, C)
/// - Single-char elements: C, N, O, S, P, F, I, B
/// - Aromatic atoms: b, c, n, o, s, p
/// - Bonds: =, #, -, :, ~
/// - Stereochemistry: @, /, \
/// - Branches: (, )
/// - Disconnected: .
/// - Ring numbers: single digit or %XX
/// - Other: +, ?, >, *, $
pub const SMILES_ATOM_PATTERN: &str = r"(\[[^\]]+]|Br?|Cl?|N|O|S|P|F|I|b|c|n|o|s|p|\(|\)|\.|=|#|-|\+|\\|\/|:|~|@|\?|>|\*|\$|\%[0-9]{2}|[0-9])";

/// Placeholder emitted for bracket atoms outside the exclusive-token set
pub const UNK_TOKEN: &str = "[UNK]";

/// Type alias for a pair of adjacent symbols (used in merge rules)
pub type Pair = (CompactString, CompactString);
