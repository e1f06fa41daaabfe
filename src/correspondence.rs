//! Sparse sound-correspondence scores over ordered symbol pairs.
//!
//! The same type serves three roles: one global model, one local model per
//! ordered language pair, and one self model per language. Aligners consult
//! the local (or self) model first and fall back to the global one.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::symbols::SymbolTable;

#[derive(Debug, Clone)]
pub struct CorrespondenceModel {
    symbols: Arc<SymbolTable>,
    scores: FxHashMap<u64, f64>,
}

impl CorrespondenceModel {
    pub fn new(symbols: Arc<SymbolTable>) -> Self {
        Self {
            symbols,
            scores: FxHashMap::default(),
        }
    }

    pub(crate) fn from_scores(symbols: Arc<SymbolTable>, scores: FxHashMap<u64, f64>) -> Self {
        Self { symbols, scores }
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    /// Score of `(a, b)`, 0.0 when unset or out of range
    #[inline]
    pub fn get_score(&self, a: u32, b: u32) -> f64 {
        self.get_score_or_none(a, b).unwrap_or(0.0)
    }

    /// `None` when unset or when either id is outside the table
    #[inline]
    pub fn get_score_or_none(&self, a: u32, b: u32) -> Option<f64> {
        let size = self.symbols.size();
        if a as usize >= size || b as usize >= size {
            return None;
        }
        self.scores.get(&self.symbols.pair_id(a, b)).copied()
    }

    pub fn set_score(&mut self, a: u32, b: u32, score: f64) -> Result<()> {
        let size = self.symbols.size();
        for id in [a, b] {
            if id as usize >= size {
                return Err(CoreError::SymbolOutOfRange { id, size });
            }
        }
        let pair = self.symbols.pair_id(a, b);
        self.scores.insert(pair, score);
        Ok(())
    }

    /// Set a score by pair id; the id must come from this model's table.
    pub(crate) fn set_pair_score(&mut self, pair: u64, score: f64) {
        self.scores.insert(pair, score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// `(pair id, score)` entries sorted by pair id
    pub fn entries(&self) -> Vec<(u64, f64)> {
        let mut entries: Vec<(u64, f64)> = self.scores.iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort_unstable_by_key(|&(pair, _)| pair);
        entries
    }
}

/// Local-over-global score lookup.
#[derive(Debug, Clone, Copy)]
pub struct LayeredScores<'a> {
    pub local: Option<&'a CorrespondenceModel>,
    pub global: &'a CorrespondenceModel,
}

impl<'a> LayeredScores<'a> {
    pub fn new(global: &'a CorrespondenceModel, local: Option<&'a CorrespondenceModel>) -> Self {
        Self { local, global }
    }

    pub fn global_only(global: &'a CorrespondenceModel) -> Self {
        Self { local: None, global }
    }

    #[inline]
    pub fn score(&self, a: u32, b: u32) -> f64 {
        self.local
            .and_then(|model| model.get_score_or_none(a, b))
            .or_else(|| self.global.get_score_or_none(a, b))
            .unwrap_or(0.0)
    }

    fn ensure_compatible(&self) -> Result<()> {
        if let Some(local) = self.local {
            local.symbols().ensure_compatible(self.global.symbols())?;
        }
        Ok(())
    }
}

/// Everything a correspondence-weighted alignment of one language pair reads.
#[derive(Debug, Clone, Copy)]
pub struct PairScoring<'a> {
    /// Scores for the aligned pair itself
    pub pair: LayeredScores<'a>,
    /// Self-similarity scores of the first language
    pub self1: LayeredScores<'a>,
    pub self2: LayeredScores<'a>,
}

impl<'a> PairScoring<'a> {
    /// Every lookup goes to the global model.
    pub fn global_only(global: &'a CorrespondenceModel) -> Self {
        let layered = LayeredScores::global_only(global);
        Self {
            pair: layered,
            self1: layered,
            self2: layered,
        }
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        self.pair.global.symbols()
    }

    /// Fail unless every model involved shares one symbol table.
    pub fn ensure_compatible(&self) -> Result<()> {
        let global = self.pair.global.symbols();
        for layered in [&self.pair, &self.self1, &self.self2] {
            layered.ensure_compatible()?;
            layered.global.symbols().ensure_compatible(global)?;
        }
        Ok(())
    }
}

/// Global, local and self models inferred for one wordlist.
#[derive(Debug, Clone)]
pub struct CorrespondenceModels {
    pub global: CorrespondenceModel,
    /// Keyed by ordered `(language, language)` index pairs
    pub local: FxHashMap<(usize, usize), CorrespondenceModel>,
    /// Indexed by language
    pub self_models: Vec<Option<CorrespondenceModel>>,
}

impl CorrespondenceModels {
    pub fn global_only(global: CorrespondenceModel) -> Self {
        Self {
            global,
            local: FxHashMap::default(),
            self_models: Vec::new(),
        }
    }

    fn self_model(&self, language: usize) -> Option<&CorrespondenceModel> {
        self.self_models.get(language).and_then(Option::as_ref)
    }

    /// Scoring for aligning a form of `lang1` against a form of `lang2`.
    ///
    /// Within one language the self model doubles as the local model.
    pub fn scoring(&self, lang1: usize, lang2: usize) -> PairScoring<'_> {
        let local = if lang1 == lang2 {
            self.self_model(lang1)
        } else {
            self.local.get(&(lang1, lang2))
        };
        PairScoring {
            pair: LayeredScores::new(&self.global, local),
            self1: LayeredScores::new(&self.global, self.self_model(lang1)),
            self2: LayeredScores::new(&self.global, self.self_model(lang2)),
        }
    }
}
