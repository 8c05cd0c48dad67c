//! Python bindings for the SPE tokenizer.

use ahash::AHashSet;
use compact_str::CompactString;
use fancy_regex::Regex;
use pyo3::exceptions::{PyIOError, PyValueError};
use pyo3::prelude::*;

use crate::constants::SMILES_ATOM_PATTERN;
use crate::error::SpeError;
use crate::pretokenizer;
use crate::tokenizer;

fn to_py_err(err: SpeError) -> PyErr {
    match err {
        SpeError::Io(e) => PyIOError::new_err(e.to_string()),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// SPE tokenizer exposed to Python.
#[pyclass(module = "rustspe", name = "SpeTokenizer")]
pub struct PySpeTokenizer {
    inner: tokenizer::SpeTokenizer,
}

#[pymethods]
impl PySpeTokenizer {
    /// Load a merge-rule file and build a tokenizer.
    ///
    /// `merges=-1` uses every rule line; a positive value keeps only the
    /// most frequent `merges` rules (the first lines of the file).
    #[new]
    #[pyo3(signature = (codes_path, merges=-1, glossaries=None, exclusive_tokens=None))]
    fn new(
        codes_path: &str,
        merges: i64,
        glossaries: Option<Vec<String>>,
        exclusive_tokens: Option<Vec<String>>,
    ) -> PyResult<Self> {
        let limit = match merges {
            -1 => None,
            n if n >= 0 => Some(n as usize),
            n => {
                return Err(PyValueError::new_err(format!(
                    "merges must be -1 or non-negative, got {n}"
                )))
            }
        };
        let glossaries = glossaries.unwrap_or_default();
        // An empty exclusive-token list means "no filtering", matching the
        // reference implementation's truthiness check.
        let exclusive_tokens = exclusive_tokens.filter(|tokens| !tokens.is_empty());
        let inner = tokenizer::SpeTokenizer::from_path(
            codes_path,
            limit,
            &glossaries,
            exclusive_tokens.as_deref(),
        )
        .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Tokenize one SMILES string into a space-joined token stream.
    #[pyo3(signature = (smi, dropout=0.0))]
    fn tokenize(&self, smi: &str, dropout: f32) -> PyResult<String> {
        self.inner
            .tokenize_with_dropout(smi, dropout, &mut rand::rng())
            .map_err(to_py_err)
    }

    /// Tokenize a batch of SMILES strings in parallel.
    #[pyo3(signature = (smiles_list, dropout=0.0))]
    fn batch_tokenize(
        &self,
        py: Python<'_>,
        smiles_list: Vec<String>,
        dropout: f32,
    ) -> PyResult<Vec<String>> {
        py.detach(|| self.inner.batch_tokenize(&smiles_list, dropout))
            .map_err(to_py_err)
    }
}

/// Tokenize a SMILES string into atom-level tokens (Python binding).
///
/// # Example outputs
/// - `atomwise_tokenize("CCO")` returns `["C", "C", "O"]`
/// - `atomwise_tokenize("[C@@H](O)C")` returns `["[C@@H]", "(", "O", ")", "C"]`
#[pyfunction]
#[pyo3(name = "atomwise_tokenize", signature = (smiles, exclusive_tokens=None))]
fn atomwise_tokenize_py(smiles: &str, exclusive_tokens: Option<Vec<String>>) -> Vec<String> {
    let pattern = Regex::new(SMILES_ATOM_PATTERN).expect("Invalid SMILES pattern");
    let exclusive = exclusive_tokens
        .filter(|tokens| !tokens.is_empty())
        .map(|tokens| {
            tokens
                .iter()
                .map(|t| CompactString::from(t.as_str()))
                .collect::<AHashSet<_>>()
        });
    pretokenizer::atomwise_tokenize(smiles, &pattern, exclusive.as_ref())
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

/// SPE tokenization for molecular SMILES with Python bindings.
#[pymodule]
fn rustspe(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();
    m.add_class::<PySpeTokenizer>()?;
    m.add_function(wrap_pyfunction!(atomwise_tokenize_py, m)?)?;
    Ok(())
}
