//! Self-training inference of sound-correspondence models.
//!
//! 1. A Monte Carlo noise baseline aligns random form pairs.
//! 2. Seed candidates are same-concept cross-language pairs within a small
//!    normalized edit distance.
//! 3. The seed model scores each symbol pair by `ln(P_candidate / P_noise)`.
//! 4. A fixed number of re-estimation rounds re-align all candidates with the
//!    current model and recompute the scores.
//! 5. Local (per language pair) and self (per language) models repeat the
//!    scoring on alignments restricted to one language pair.
//!
//! Work is split per concept, per sampling partition or per language pair;
//! each task owns its accumulator and the results are summed afterwards.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::alignment::{edit_distance_alignment, information_weighted_alignment, needleman_wunsch};
use crate::config::{CoreConfig, InferenceConfig};
use crate::correspondence::{CorrespondenceModel, CorrespondenceModels, PairScoring};
use crate::distribution::PairDistribution;
use crate::error::{CoreError, Result};
use crate::information::InformationModel;
use crate::symbols::{SymbolTable, BOUNDARY, GAP};
use crate::types::PhoneticStringAlignment;
use crate::wordlist::Wordlist;

/// Symbol-pair distribution of uniformly random form pairs aligned by edit distance.
///
/// One seed per sampling partition is drawn from `rng`, so a seeded caller
/// reproduces the same baseline regardless of thread scheduling.
pub fn noise_distribution<R: Rng + ?Sized>(
    wordlist: &Wordlist,
    config: &InferenceConfig,
    rng: &mut R,
) -> PairDistribution {
    let num_forms = wordlist.len();
    if num_forms < 2 || config.monte_carlo_samples == 0 {
        return PairDistribution::new();
    }

    let chunks = config.sampling_chunks.max(1);
    let base = config.monte_carlo_samples / chunks;
    let remainder = config.monte_carlo_samples % chunks;
    let tasks: Vec<(u64, usize)> = (0..chunks)
        .map(|k| (rng.gen::<u64>(), base + usize::from(k < remainder)))
        .collect();

    let symbols = wordlist.symbols();
    let partials: Vec<PairDistribution> = tasks
        .into_par_iter()
        .map(|(seed, samples)| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut dist = PairDistribution::new();
            for _ in 0..samples {
                let i = rng.gen_range(0..num_forms);
                let mut j = rng.gen_range(0..num_forms - 1);
                if j >= i {
                    j += 1;
                }
                let alignment =
                    edit_distance_alignment(&wordlist.form(i).string, &wordlist.form(j).string);
                dist.add_alignment(symbols, &alignment);
            }
            dist
        })
        .collect();

    let noise = partials
        .into_iter()
        .fold(PairDistribution::new(), PairDistribution::merge);
    tracing::info!(
        samples = config.monte_carlo_samples,
        observed_pairs = noise.observed().count(),
        "noise baseline sampled"
    );
    noise
}

/// Accepted candidate alignments of one accumulation pass.
#[derive(Debug, Clone, Default)]
pub struct CandidateStats {
    pub distribution: PairDistribution,
    pub accepted: usize,
    pub considered: usize,
}

impl CandidateStats {
    fn merge(self, other: CandidateStats) -> CandidateStats {
        CandidateStats {
            distribution: self.distribution.merge(other.distribution),
            accepted: self.accepted + other.accepted,
            considered: self.considered + other.considered,
        }
    }
}

/// Align every pair and keep those at or below `threshold`.
fn accumulate<I, F>(
    symbols: &SymbolTable,
    pairs: I,
    threshold: f64,
    align: &F,
) -> Result<CandidateStats>
where
    I: IntoIterator<Item = (usize, usize)>,
    F: Fn(usize, usize) -> Result<PhoneticStringAlignment>,
{
    let mut stats = CandidateStats::default();
    for (i, j) in pairs {
        let alignment = align(i, j)?;
        stats.considered += 1;
        if alignment.normalized_distance_score <= threshold {
            stats.accepted += 1;
            stats.distribution.add_alignment(symbols, &alignment);
        }
    }
    Ok(stats)
}

/// Same-concept cross-language candidates, one task per concept.
fn collect_candidates<F>(wordlist: &Wordlist, threshold: f64, align: F) -> Result<CandidateStats>
where
    F: Fn(usize, usize) -> Result<PhoneticStringAlignment> + Sync,
{
    let symbols = wordlist.symbols();
    let partials = (0..wordlist.concepts().len())
        .into_par_iter()
        .map(|concept| {
            accumulate(symbols, wordlist.cross_language_pairs(concept), threshold, &align)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(partials
        .into_iter()
        .fold(CandidateStats::default(), CandidateStats::merge))
}

#[inline]
fn pmi(
    candidates: &PairDistribution,
    noise: &PairDistribution,
    pair: u64,
    smoothing_ratio: f64,
    outcomes: usize,
) -> f64 {
    let observed = candidates.probability(pair, smoothing_ratio, outcomes);
    let expected = noise.probability(pair, smoothing_ratio, outcomes);
    (observed / expected).ln()
}

/// PMI-style score for every ordered pair of non-boundary symbols except gap/gap.
pub fn pmi_model(
    symbols: &Arc<SymbolTable>,
    candidates: &PairDistribution,
    noise: &PairDistribution,
    smoothing_ratio: f64,
) -> CorrespondenceModel {
    let n = symbols.size() as u32;
    let outcomes = symbols.size() * symbols.size();
    let mut scores = FxHashMap::default();

    for a in (0..n).filter(|&a| a != BOUNDARY) {
        for b in (0..n).filter(|&b| b != BOUNDARY) {
            if a == GAP && b == GAP {
                continue;
            }
            let pair = symbols.pair_id(a, b);
            scores.insert(pair, pmi(candidates, noise, pair, smoothing_ratio, outcomes));
        }
    }
    CorrespondenceModel::from_scores(symbols.clone(), scores)
}

/// PMI-style scores restricted to the pairs actually observed in `candidates`;
/// everything else falls through to the global model.
pub fn observed_pmi_model(
    symbols: &Arc<SymbolTable>,
    candidates: &PairDistribution,
    noise: &PairDistribution,
    smoothing_ratio: f64,
) -> CorrespondenceModel {
    let outcomes = symbols.size() * symbols.size();
    let scores = candidates
        .observed()
        .filter(|&pair| pair != symbols.pair_id(GAP, GAP))
        .map(|pair| (pair, pmi(candidates, noise, pair, smoothing_ratio, outcomes)))
        .collect();
    CorrespondenceModel::from_scores(symbols.clone(), scores)
}

/// Seed model plus a fixed number of re-estimation rounds.
pub fn infer_global_model(
    wordlist: &Wordlist,
    config: &CoreConfig,
    noise: &PairDistribution,
) -> Result<CorrespondenceModel> {
    config.validate()?;
    let symbols = wordlist.symbols();
    let inference = &config.inference;

    let seed = collect_candidates(wordlist, inference.seed_threshold, |i, j| {
        Ok(edit_distance_alignment(
            &wordlist.form(i).string,
            &wordlist.form(j).string,
        ))
    })?;
    tracing::info!(
        accepted = seed.accepted,
        considered = seed.considered,
        "seed candidates collected"
    );
    let mut model = pmi_model(symbols, &seed.distribution, noise, inference.pair_smoothing_ratio);

    for iteration in 1..=inference.iterations {
        let scoring = PairScoring::global_only(&model);
        let stats = collect_candidates(wordlist, inference.reestimation_threshold, |i, j| {
            needleman_wunsch(
                &wordlist.form(i).string,
                &wordlist.form(j).string,
                &scoring,
                &config.alignment,
            )
        })?;
        tracing::info!(
            iteration,
            accepted = stats.accepted,
            considered = stats.considered,
            "re-estimated global correspondence model"
        );
        model = pmi_model(symbols, &stats.distribution, noise, inference.pair_smoothing_ratio);
    }

    Ok(model)
}

/// Local models for every ordered language pair and self models for every
/// language, one task per pair.
///
/// With information models supplied, candidates are aligned with the
/// information-weighted aligner instead of plain Needleman–Wunsch.
pub fn infer_local_models(
    wordlist: &Wordlist,
    global: CorrespondenceModel,
    noise: &PairDistribution,
    information: Option<&[InformationModel]>,
    config: &CoreConfig,
) -> Result<CorrespondenceModels> {
    config.validate()?;
    global.symbols().ensure_compatible(wordlist.symbols())?;
    let num_languages = wordlist.languages().len();
    if let Some(models) = information {
        if models.len() != num_languages {
            return Err(CoreError::DimensionMismatch(format!(
                "{} information models for {} languages",
                models.len(),
                num_languages
            )));
        }
    }

    let symbols = wordlist.symbols();
    let inference = &config.inference;
    let tasks: Vec<(usize, usize)> = (0..num_languages)
        .flat_map(|l1| (0..num_languages).map(move |l2| (l1, l2)))
        .collect();

    let results = tasks
        .into_par_iter()
        .map(|(lang1, lang2)| -> Result<((usize, usize), Option<CorrespondenceModel>)> {
            let scoring = PairScoring::global_only(&global);
            let align = |i: usize, j: usize| {
                let (s1, s2) = (&wordlist.form(i).string, &wordlist.form(j).string);
                match information {
                    Some(models) => information_weighted_alignment(
                        s1,
                        s2,
                        &scoring,
                        &models[lang1],
                        &models[lang2],
                        &config.alignment,
                    ),
                    None => needleman_wunsch(s1, s2, &scoring, &config.alignment),
                }
            };
            let pairs = (0..wordlist.concepts().len())
                .flat_map(|concept| wordlist.language_pair_forms(concept, lang1, lang2));
            let stats = accumulate(symbols, pairs, inference.local_threshold, &align)?;

            if stats.distribution.is_empty() {
                return Ok(((lang1, lang2), None));
            }
            let model = observed_pmi_model(
                symbols,
                &stats.distribution,
                noise,
                inference.pair_smoothing_ratio,
            );
            tracing::debug!(
                lang1 = %wordlist.languages()[lang1],
                lang2 = %wordlist.languages()[lang2],
                accepted = stats.accepted,
                scored_pairs = model.len(),
                "built local correspondence model"
            );
            Ok(((lang1, lang2), Some(model)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut local = FxHashMap::default();
    let mut self_models = vec![None; num_languages];
    for ((lang1, lang2), model) in results {
        let Some(model) = model else { continue };
        if lang1 == lang2 {
            self_models[lang1] = Some(model);
        } else {
            local.insert((lang1, lang2), model);
        }
    }

    Ok(CorrespondenceModels {
        global,
        local,
        self_models,
    })
}

/// Full inference: noise baseline, global model, then local and self models.
pub fn infer_correspondence_models<R: Rng + ?Sized>(
    wordlist: &Wordlist,
    config: &CoreConfig,
    information: Option<&[InformationModel]>,
    rng: &mut R,
) -> Result<CorrespondenceModels> {
    config.validate()?;
    let noise = noise_distribution(wordlist, &config.inference, rng);
    let global = infer_global_model(wordlist, config, &noise)?;
    infer_local_models(wordlist, global, &noise, information, config)
}
