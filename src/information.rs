//! Positional information content from per-language trigram statistics.
//!
//! Every form is padded with two boundary symbols on each side and each
//! trigram of the padded sequence is counted. Each trigram `(x, y, z)` also
//! feeds the gappy patterns `(x, y, -)`, `(x, -, z)` and `(-, y, z)`, which
//! only serve as context mass. The information content of a segment is the
//! negative log of how much of the surrounding context mass is explained by
//! the observed trigrams covering it.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::error::{CoreError, Result};
use crate::symbols::{SymbolTable, BOUNDARY, GAP};
use crate::types::PhoneticString;
use crate::wordlist::Wordlist;

#[derive(Debug, Clone)]
pub struct InformationModel {
    symbols: Arc<SymbolTable>,
    counts: FxHashMap<u64, f64>,
    /// Mass of true (non-gappy) trigrams
    total_trigram_mass: f64,
    smoothing_mass_ratio: f64,
}

impl InformationModel {
    pub fn new(symbols: Arc<SymbolTable>, smoothing_mass_ratio: f64) -> Self {
        Self {
            symbols,
            counts: FxHashMap::default(),
            total_trigram_mass: 0.0,
            smoothing_mass_ratio,
        }
    }

    /// Train on a set of forms, all encoded against `symbols`.
    pub fn train<'a, I>(
        symbols: Arc<SymbolTable>,
        forms: I,
        smoothing_mass_ratio: f64,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = &'a PhoneticString>,
    {
        if !smoothing_mass_ratio.is_finite() || smoothing_mass_ratio <= 0.0 {
            return Err(CoreError::InvalidParameter(format!(
                "smoothing_mass_ratio must be finite and > 0, got {}",
                smoothing_mass_ratio
            )));
        }
        let mut model = Self::new(symbols, smoothing_mass_ratio);
        for form in forms {
            model.add_form(form)?;
        }
        Ok(model)
    }

    /// Rebuild from persisted counts.
    pub(crate) fn from_parts(
        symbols: Arc<SymbolTable>,
        counts: FxHashMap<u64, f64>,
        total_trigram_mass: f64,
        smoothing_mass_ratio: f64,
    ) -> Self {
        Self {
            symbols,
            counts,
            total_trigram_mass,
            smoothing_mass_ratio,
        }
    }

    pub fn add_form(&mut self, form: &PhoneticString) -> Result<()> {
        self.symbols.check(form)?;
        let stripped = form.without_gaps();

        let mut padded = Vec::with_capacity(stripped.len() + 4);
        padded.extend([BOUNDARY, BOUNDARY]);
        padded.extend_from_slice(stripped.segments());
        padded.extend([BOUNDARY, BOUNDARY]);

        for window in padded.windows(3) {
            let (x, y, z) = (window[0], window[1], window[2]);
            self.increment(self.symbols.trigram_id(x, y, z));
            self.increment(self.symbols.trigram_id(x, y, GAP));
            self.increment(self.symbols.trigram_id(x, GAP, z));
            self.increment(self.symbols.trigram_id(GAP, y, z));
            self.total_trigram_mass += 1.0;
        }
        Ok(())
    }

    fn increment(&mut self, id: u64) {
        *self.counts.entry(id).or_insert(0.0) += 1.0;
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    pub fn smoothing_mass_ratio(&self) -> f64 {
        self.smoothing_mass_ratio
    }

    pub fn total_trigram_mass(&self) -> f64 {
        self.total_trigram_mass
    }

    pub fn counts(&self) -> &FxHashMap<u64, f64> {
        &self.counts
    }

    /// Pseudo-count added to every pattern lookup.
    fn smoothing(&self) -> f64 {
        if self.counts.is_empty() {
            0.0
        } else {
            self.smoothing_mass_ratio * self.total_trigram_mass / self.counts.len() as f64
        }
    }

    fn count(&self, a: u32, b: u32, c: u32) -> f64 {
        self.counts
            .get(&self.symbols.trigram_id(a, b, c))
            .copied()
            .unwrap_or(0.0)
    }

    /// Information content of the segment at `position`.
    pub fn information_content(&self, string: &PhoneticString, position: usize) -> Result<f64> {
        let segments = string.segments();
        if position >= segments.len() {
            return Err(CoreError::PositionOutOfBounds {
                position,
                len: segments.len(),
            });
        }
        self.symbols.check(string)?;
        Ok(self.content_at(segments, position))
    }

    fn content_at(&self, segments: &[u32], position: usize) -> f64 {
        let at = |offset: isize| -> u32 {
            let idx = position as isize + offset;
            if idx < 0 || idx as usize >= segments.len() {
                BOUNDARY
            } else {
                segments[idx as usize]
            }
        };
        let (a, b, c, d, e) = (at(-2), at(-1), at(0), at(1), at(2));

        let smoothing = self.smoothing();
        let observed =
            self.count(a, b, c) + self.count(b, c, d) + self.count(c, d, e) + 3.0 * smoothing;
        let context =
            self.count(a, b, GAP) + self.count(b, GAP, d) + self.count(GAP, d, e) + 3.0 * smoothing;

        if context <= 0.0 || observed <= 0.0 {
            // untrained model: no evidence either way
            return 0.0;
        }
        (-(observed / context).ln()).max(0.0)
    }

    /// Information content of every position of `string`.
    ///
    /// Content is computed on the gap-free projection; gap positions get 0.0.
    pub fn information_profile(&self, string: &PhoneticString) -> Result<Vec<f64>> {
        self.symbols.check(string)?;
        let stripped = string.without_gaps();
        let mut stripped_contents =
            (0..stripped.len()).map(|pos| self.content_at(stripped.segments(), pos));

        let profile = string
            .segments()
            .iter()
            .map(|&id| {
                if id == GAP {
                    0.0
                } else {
                    stripped_contents.next().unwrap_or(0.0)
                }
            })
            .collect();
        Ok(profile)
    }
}

/// Train one information model per language of the wordlist, in parallel.
pub fn train_information_models(
    wordlist: &Wordlist,
    smoothing_mass_ratio: f64,
) -> Result<Vec<InformationModel>> {
    (0..wordlist.languages().len())
        .into_par_iter()
        .map(|language| -> Result<InformationModel> {
            let forms = wordlist
                .language_forms(language)
                .iter()
                .map(|&idx| &wordlist.form(idx).string);
            let model =
                InformationModel::train(wordlist.symbols().clone(), forms, smoothing_mass_ratio)?;
            tracing::debug!(
                language = %wordlist.languages()[language],
                trigram_mass = model.total_trigram_mass(),
                patterns = model.counts().len(),
                "trained information model"
            );
            Ok(model)
        })
        .collect()
}
