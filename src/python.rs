//! Python bindings over the core (feature `python`).

use numpy::PyReadonlyArray2;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::alignment::edit_distance_alignment;
use crate::cluster::{flat_cluster, Linkage};
use crate::config::CoreConfig;
use crate::distance::CognateDetector;
use crate::error::CoreError;
use crate::symbols::SymbolTableBuilder;
use crate::wordlist::Wordlist;

impl From<CoreError> for PyErr {
    fn from(err: CoreError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

// ============================================================================
// ALIGNMENT FUNCTIONS
// ============================================================================

/// Normalized edit distance between two IPA strings, segmented into graphemes.
#[pyfunction]
fn edit_distance(ipa_a: &str, ipa_b: &str) -> PyResult<f64> {
    let mut builder = SymbolTableBuilder::new();
    builder.define_segments(ipa_a);
    builder.define_segments(ipa_b);
    let symbols = builder.freeze();

    let alignment = edit_distance_alignment(&symbols.segment(ipa_a)?, &symbols.segment(ipa_b)?);
    Ok(alignment.normalized_distance_score)
}

// ============================================================================
// CLUSTERING FUNCTIONS
// ============================================================================

#[pyfunction]
#[pyo3(name = "flat_cluster")]
fn py_flat_cluster<'py>(
    py: Python<'py>,
    matrix: PyReadonlyArray2<'py, f64>,
    linkage: &str,
    threshold: f64,
) -> PyResult<Vec<Vec<usize>>> {
    let linkage: Linkage = linkage.parse()?;
    let matrix = matrix.as_array().to_owned();
    Ok(py.allow_threads(|| flat_cluster(&matrix, linkage, threshold))?)
}

// ============================================================================
// PIPELINE FUNCTIONS
// ============================================================================

/// Detect cognate sets in `(language, concept, ipa)` records.
///
/// Returns `(set id, concept, record indices)` triples.
#[pyfunction]
#[pyo3(signature = (records, config_json=None, seed=0))]
fn detect_cognates(
    py: Python<'_>,
    records: Vec<(String, String, String)>,
    config_json: Option<&str>,
    seed: u64,
) -> PyResult<Vec<(usize, String, Vec<usize>)>> {
    let config = match config_json {
        Some(json) => CoreConfig::from_json_str(json)?,
        None => CoreConfig::default(),
    };

    let sets = py.allow_threads(move || -> crate::Result<_> {
        let mut builder = SymbolTableBuilder::new();
        for (_, _, ipa) in &records {
            builder.define_segments(ipa);
        }
        let mut wordlist = Wordlist::new(builder.freeze());
        for (language, concept, ipa) in &records {
            wordlist.add_ipa(language, concept, ipa)?;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        CognateDetector::infer(wordlist, config, &mut rng)?.cognate_sets()
    })?;

    Ok(sets
        .into_iter()
        .map(|set| (set.id, set.concept, set.members))
        .collect())
}

// ============================================================================
// MODULE DEFINITION
// ============================================================================

#[pymodule]
fn cognate_core(_py: Python, m: &PyModule) -> PyResult<()> {
    // Alignment functions
    m.add_function(wrap_pyfunction!(edit_distance, m)?)?;

    // Clustering functions
    m.add_function(wrap_pyfunction!(py_flat_cluster, m)?)?;

    // Pipeline functions
    m.add_function(wrap_pyfunction!(detect_cognates, m)?)?;

    Ok(())
}
