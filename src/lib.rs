//! Cognate Core: computational kernel for automatic cognate detection.
//!
//! Provides:
//! - Symbol tables and integer-encoded phonetic strings
//! - Positional information content from trigram statistics
//! - Sound-correspondence models inferred from a wordlist (PMI, self-training)
//! - Edit-distance, Needleman–Wunsch and information-weighted alignment
//! - Flat agglomerative clustering into cognate sets
//!
//! Python bindings are available behind the `python` feature.

pub mod alignment;
pub mod cluster;
pub mod config;
pub mod correspondence;
pub mod distance;
pub mod distribution;
pub mod error;
pub mod inference;
pub mod information;
pub mod record;
pub mod symbols;
pub mod types;
pub mod wordlist;

#[cfg(feature = "python")]
mod python;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use alignment::{
    edit_distance, edit_distance_alignment, information_weighted_alignment, needleman_wunsch,
    normalized_distance, self_similarity,
};
pub use cluster::{flat_cluster, Linkage};
pub use config::{
    AlignmentConfig, ClusteringConfig, CoreConfig, InferenceConfig, InformationConfig,
    ScoreNormalization,
};
pub use correspondence::{CorrespondenceModel, CorrespondenceModels, LayeredScores, PairScoring};
pub use distance::{cognate_sets, concept_distance_matrix, form_distance, CognateDetector};
pub use distribution::PairDistribution;
pub use error::{CoreError, Result};
pub use inference::{
    infer_correspondence_models, infer_global_model, infer_local_models, noise_distribution,
};
pub use information::{train_information_models, InformationModel};
pub use record::{ModelKind, ModelRecord};
pub use symbols::{SymbolTable, SymbolTableBuilder, BOUNDARY, GAP};
pub use types::{CognateSet, EditOp, PhoneticString, PhoneticStringAlignment};
pub use wordlist::{Form, Wordlist};
