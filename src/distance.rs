//! Per-concept distance matrices and cognate-set assignment.
//!
//! Form distances come from the information-weighted aligner, averaged over
//! both alignment directions. Before clustering they are clamped into
//! `[0, max_distance]` and divided by `max_distance`.

use ndarray::Array2;
use rand::Rng;
use rayon::prelude::*;

use crate::alignment::information_weighted_alignment;
use crate::cluster::flat_cluster;
use crate::config::{AlignmentConfig, CoreConfig};
use crate::correspondence::CorrespondenceModels;
use crate::error::{CoreError, Result};
use crate::inference::infer_correspondence_models;
use crate::information::{train_information_models, InformationModel};
use crate::types::CognateSet;
use crate::wordlist::Wordlist;

fn check_information_models(wordlist: &Wordlist, information: &[InformationModel]) -> Result<()> {
    if information.len() != wordlist.languages().len() {
        return Err(CoreError::DimensionMismatch(format!(
            "{} information models for {} languages",
            information.len(),
            wordlist.languages().len()
        )));
    }
    Ok(())
}

/// Symmetric weighted distance between two forms of the wordlist.
pub fn form_distance(
    wordlist: &Wordlist,
    models: &CorrespondenceModels,
    information: &[InformationModel],
    config: &AlignmentConfig,
    form_a: usize,
    form_b: usize,
) -> Result<f64> {
    for idx in [form_a, form_b] {
        if idx >= wordlist.len() {
            return Err(CoreError::InvalidParameter(format!(
                "form index {} out of range for {} forms",
                idx,
                wordlist.len()
            )));
        }
    }
    let (a, b) = (wordlist.form(form_a), wordlist.form(form_b));

    let forward = information_weighted_alignment(
        &a.string,
        &b.string,
        &models.scoring(a.language, b.language),
        &information[a.language],
        &information[b.language],
        config,
    )?;
    let backward = information_weighted_alignment(
        &b.string,
        &a.string,
        &models.scoring(b.language, a.language),
        &information[b.language],
        &information[a.language],
        config,
    )?;
    Ok((forward.normalized_distance_score + backward.normalized_distance_score) / 2.0)
}

/// Rescaled distances between all forms of `concept`, rows in
/// `wordlist.concept_forms(concept)` order.
pub fn concept_distance_matrix(
    wordlist: &Wordlist,
    concept: usize,
    models: &CorrespondenceModels,
    information: &[InformationModel],
    config: &CoreConfig,
) -> Result<Array2<f64>> {
    config.validate()?;
    check_information_models(wordlist, information)?;
    if concept >= wordlist.concepts().len() {
        return Err(CoreError::InvalidParameter(format!(
            "concept index {} out of range for {} concepts",
            concept,
            wordlist.concepts().len()
        )));
    }
    let forms = wordlist.concept_forms(concept);
    let n = forms.len();
    let max_distance = config.clustering.max_distance;
    let mut matrix = Array2::<f64>::zeros((n, n));

    // Upper triangle in parallel
    let pairs: Vec<_> = (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect();

    let distances = pairs
        .par_iter()
        .map(|&(i, j)| {
            form_distance(wordlist, models, information, &config.alignment, forms[i], forms[j])
                .map(|d| d.clamp(0.0, max_distance) / max_distance)
        })
        .collect::<Result<Vec<f64>>>()?;

    for (&(i, j), &d) in pairs.iter().zip(&distances) {
        matrix[[i, j]] = d;
        matrix[[j, i]] = d;
    }

    Ok(matrix)
}

/// Cluster every concept and number the resulting sets consecutively in
/// concept order.
pub fn cognate_sets(
    wordlist: &Wordlist,
    models: &CorrespondenceModels,
    information: &[InformationModel],
    config: &CoreConfig,
) -> Result<Vec<CognateSet>> {
    config.validate()?;
    let clustering = &config.clustering;
    let mut sets = Vec::new();

    for (concept, name) in wordlist.concepts().iter().enumerate() {
        let matrix = concept_distance_matrix(wordlist, concept, models, information, config)?;
        let clusters = flat_cluster(&matrix, clustering.linkage, clustering.threshold)?;
        let forms = wordlist.concept_forms(concept);

        tracing::debug!(
            concept = %name,
            forms = forms.len(),
            sets = clusters.len(),
            "assigned cognate sets"
        );
        for cluster in clusters {
            let members = cluster.into_iter().map(|local| forms[local]).collect();
            sets.push(CognateSet::new(sets.len(), name.clone(), members));
        }
    }

    Ok(sets)
}

/// A wordlist together with everything inferred from it.
#[derive(Debug, Clone)]
pub struct CognateDetector {
    wordlist: Wordlist,
    config: CoreConfig,
    models: CorrespondenceModels,
    information: Vec<InformationModel>,
}

impl CognateDetector {
    /// Train information models and infer correspondence models for `wordlist`.
    pub fn infer<R: Rng + ?Sized>(
        wordlist: Wordlist,
        config: CoreConfig,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;
        let information =
            train_information_models(&wordlist, config.information.smoothing_mass_ratio)?;
        let models = infer_correspondence_models(&wordlist, &config, Some(&information), rng)?;
        tracing::info!(
            languages = wordlist.languages().len(),
            concepts = wordlist.concepts().len(),
            forms = wordlist.len(),
            local_models = models.local.len(),
            "cognate detector ready"
        );
        Ok(Self {
            wordlist,
            config,
            models,
            information,
        })
    }

    /// Assemble a detector from previously trained models.
    pub fn from_parts(
        wordlist: Wordlist,
        config: CoreConfig,
        models: CorrespondenceModels,
        information: Vec<InformationModel>,
    ) -> Result<Self> {
        config.validate()?;
        check_information_models(&wordlist, &information)?;
        models.global.symbols().ensure_compatible(wordlist.symbols())?;
        for model in &information {
            model.symbols().ensure_compatible(wordlist.symbols())?;
        }
        Ok(Self {
            wordlist,
            config,
            models,
            information,
        })
    }

    pub fn wordlist(&self) -> &Wordlist {
        &self.wordlist
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn models(&self) -> &CorrespondenceModels {
        &self.models
    }

    pub fn information_models(&self) -> &[InformationModel] {
        &self.information
    }

    /// Unscaled symmetric distance between two form indices.
    pub fn distance(&self, form_a: usize, form_b: usize) -> Result<f64> {
        form_distance(
            &self.wordlist,
            &self.models,
            &self.information,
            &self.config.alignment,
            form_a,
            form_b,
        )
    }

    pub fn distance_matrix(&self, concept: usize) -> Result<Array2<f64>> {
        concept_distance_matrix(
            &self.wordlist,
            concept,
            &self.models,
            &self.information,
            &self.config,
        )
    }

    pub fn cognate_sets(&self) -> Result<Vec<CognateSet>> {
        cognate_sets(&self.wordlist, &self.models, &self.information, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTableBuilder;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn detector() -> CognateDetector {
        let mut builder = SymbolTableBuilder::new();
        builder.define_segments("patilueskomnrf");
        let mut wordlist = Wordlist::new(builder.freeze());
        let rows = [
            ("one", "pata", "fata"),
            ("two", "pilu", "filu"),
            ("three", "pesa", "fesa"),
            ("four", "poku", "foku"),
            ("five", "mana", "mana"),
            ("six", "tiri", "tiri"),
            ("seven", "kesu", "kesu"),
            ("eight", "sola", "mupo"),
        ];
        for (concept, west, east) in rows {
            wordlist.add_ipa("west", concept, west).unwrap();
            wordlist.add_ipa("east", concept, east).unwrap();
        }
        let mut config = CoreConfig::default();
        config.inference.monte_carlo_samples = 5_000;
        config.inference.sampling_chunks = 4;
        CognateDetector::infer(wordlist, config, &mut ChaCha8Rng::seed_from_u64(5)).unwrap()
    }

    #[test]
    fn test_distance_matrix_shape_and_range() {
        let detector = detector();
        let matrix = detector.distance_matrix(0).unwrap();
        assert_eq!(matrix.dim(), (2, 2));
        assert_eq!(matrix[[0, 0]], 0.0);
        assert_eq!(matrix[[0, 1]], matrix[[1, 0]]);
        assert!(matrix.iter().all(|&d| (0.0..=1.0).contains(&d)));
    }

    #[test]
    fn test_distance_is_symmetric() {
        let detector = detector();
        let forward = detector.distance(0, 1).unwrap();
        let backward = detector.distance(1, 0).unwrap();
        assert!((forward - backward).abs() < 1e-12);
        assert!(detector.distance(0, 99).is_err());
    }

    #[test]
    fn test_unknown_concept_is_an_error() {
        let detector = detector();
        assert!(matches!(
            detector.distance_matrix(99),
            Err(CoreError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_cognate_sets_split_unrelated_forms() {
        let detector = detector();
        let sets = detector.cognate_sets().unwrap();

        let ids: Vec<usize> = sets.iter().map(|set| set.id).collect();
        assert_eq!(ids, (0..sets.len()).collect::<Vec<_>>());

        let five: Vec<_> = sets.iter().filter(|set| set.concept == "five").collect();
        assert_eq!(five.len(), 1);
        assert_eq!(five[0].size, 2);

        let eight: Vec<_> = sets.iter().filter(|set| set.concept == "eight").collect();
        assert_eq!(eight.len(), 2);
    }

    #[test]
    fn test_from_parts_checks_information_models() {
        let detector = detector();
        let result = CognateDetector::from_parts(
            detector.wordlist().clone(),
            detector.config().clone(),
            detector.models().clone(),
            Vec::new(),
        );
        assert!(matches!(result, Err(CoreError::DimensionMismatch(_))));
    }
}
