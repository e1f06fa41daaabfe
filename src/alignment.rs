//! Pairwise phonetic alignment: unweighted edit distance, correspondence-weighted
//! Needleman–Wunsch, and information-weighted alignment.
//!
//! All three fill one `(m+1) x (n+1)` grid with three incoming edges per cell:
//! diagonal (match/substitution), horizontal (insertion, gap in the first
//! string) and vertical (deletion, gap in the second string). Ties prefer
//! diagonal over insertion over deletion.

use ndarray::Array2;

use crate::config::{AlignmentConfig, ScoreNormalization};
use crate::correspondence::{LayeredScores, PairScoring};
use crate::error::Result;
use crate::information::InformationModel;
use crate::symbols::GAP;
use crate::types::{PhoneticString, PhoneticStringAlignment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Diagonal,
    Insertion,
    Deletion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Objective {
    /// Edit costs
    Minimize,
    /// Similarity scores
    Maximize,
}

impl Objective {
    #[inline]
    fn at_least_as_good(self, a: f64, b: f64) -> bool {
        match self {
            Objective::Minimize => a <= b,
            Objective::Maximize => a >= b,
        }
    }

    #[inline]
    fn choose(self, diagonal: f64, insertion: f64, deletion: f64) -> (f64, Move) {
        if self.at_least_as_good(diagonal, insertion) && self.at_least_as_good(diagonal, deletion) {
            (diagonal, Move::Diagonal)
        } else if self.at_least_as_good(insertion, deletion) {
            (insertion, Move::Insertion)
        } else {
            (deletion, Move::Deletion)
        }
    }
}

/// Edge weights of the alignment grid, indexed by 0-based string positions.
trait EdgeScores {
    fn diagonal(&self, i: usize, j: usize) -> f64;
    /// Gap in the first string against `s2[j]`
    fn insertion(&self, j: usize) -> f64;
    /// `s1[i]` against a gap in the second string
    fn deletion(&self, i: usize) -> f64;
}

struct UnitCosts<'a> {
    s1: &'a [u32],
    s2: &'a [u32],
}

impl EdgeScores for UnitCosts<'_> {
    fn diagonal(&self, i: usize, j: usize) -> f64 {
        if self.s1[i] == self.s2[j] {
            0.0
        } else {
            1.0
        }
    }

    fn insertion(&self, _j: usize) -> f64 {
        1.0
    }

    fn deletion(&self, _i: usize) -> f64 {
        1.0
    }
}

struct CorrespondenceScores<'a> {
    s1: &'a [u32],
    s2: &'a [u32],
    scores: LayeredScores<'a>,
}

impl EdgeScores for CorrespondenceScores<'_> {
    fn diagonal(&self, i: usize, j: usize) -> f64 {
        self.scores.score(self.s1[i], self.s2[j])
    }

    fn insertion(&self, j: usize) -> f64 {
        self.scores.score(GAP, self.s2[j])
    }

    fn deletion(&self, i: usize) -> f64 {
        self.scores.score(self.s1[i], GAP)
    }
}

struct InformationWeightedScores<'a> {
    base: CorrespondenceScores<'a>,
    info1: &'a [f64],
    info2: &'a [f64],
}

impl EdgeScores for InformationWeightedScores<'_> {
    fn diagonal(&self, i: usize, j: usize) -> f64 {
        self.base.diagonal(i, j) * root_mean_square(self.info1[i], self.info2[j])
    }

    fn insertion(&self, j: usize) -> f64 {
        self.base.insertion(j) * self.info2[j]
    }

    fn deletion(&self, i: usize) -> f64 {
        self.base.deletion(i) * self.info1[i]
    }
}

#[inline]
fn root_mean_square(a: f64, b: f64) -> f64 {
    ((a * a + b * b) / 2.0).sqrt()
}

/// Fill the grid and backtrack. Returns the gapped strings and the final cell score.
fn align_grid<E: EdgeScores>(
    s1: &[u32],
    s2: &[u32],
    edges: &E,
    objective: Objective,
) -> (PhoneticString, PhoneticString, f64) {
    let len_a = s1.len();
    let len_b = s2.len();

    let mut score = Array2::<f64>::zeros((len_a + 1, len_b + 1));
    let mut moves = Array2::from_elem((len_a + 1, len_b + 1), Move::Diagonal);

    for i in 1..=len_a {
        score[[i, 0]] = score[[i - 1, 0]] + edges.deletion(i - 1);
        moves[[i, 0]] = Move::Deletion;
    }
    for j in 1..=len_b {
        score[[0, j]] = score[[0, j - 1]] + edges.insertion(j - 1);
        moves[[0, j]] = Move::Insertion;
    }

    for i in 1..=len_a {
        for j in 1..=len_b {
            let (best, step) = objective.choose(
                score[[i - 1, j - 1]] + edges.diagonal(i - 1, j - 1),
                score[[i, j - 1]] + edges.insertion(j - 1),
                score[[i - 1, j]] + edges.deletion(i - 1),
            );
            score[[i, j]] = best;
            moves[[i, j]] = step;
        }
    }

    // Backtrack from the final cell to the origin
    let mut i = len_a;
    let mut j = len_b;
    let mut aligned_a = Vec::with_capacity(len_a + len_b);
    let mut aligned_b = Vec::with_capacity(len_a + len_b);

    while i > 0 || j > 0 {
        match moves[[i, j]] {
            Move::Diagonal => {
                aligned_a.push(s1[i - 1]);
                aligned_b.push(s2[j - 1]);
                i -= 1;
                j -= 1;
            }
            Move::Insertion => {
                aligned_a.push(GAP);
                aligned_b.push(s2[j - 1]);
                j -= 1;
            }
            Move::Deletion => {
                aligned_a.push(s1[i - 1]);
                aligned_b.push(GAP);
                i -= 1;
            }
        }
    }

    // Reverse since we backtracked
    aligned_a.reverse();
    aligned_b.reverse();

    (
        PhoneticString::new(aligned_a),
        PhoneticString::new(aligned_b),
        score[[len_a, len_b]],
    )
}

/// Raw Levenshtein distance over symbol ids, two rows at a time.
pub fn edit_distance(a: &[u32], b: &[u32]) -> usize {
    let len_a = a.len();
    let len_b = b.len();

    if len_a == 0 {
        return len_b;
    }
    if len_b == 0 {
        return len_a;
    }

    let mut prev_row: Vec<usize> = (0..=len_b).collect();
    let mut curr_row = vec![0; len_b + 1];

    for (i, seg_a) in a.iter().enumerate() {
        curr_row[0] = i + 1;

        for (j, seg_b) in b.iter().enumerate() {
            let cost = usize::from(seg_a != seg_b);

            curr_row[j + 1] = std::cmp::min(
                std::cmp::min(curr_row[j] + 1, prev_row[j + 1] + 1),
                prev_row[j] + cost,
            );
        }

        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[len_b]
}

/// Unweighted edit-distance alignment; distance is cost / max(len1, len2).
pub fn edit_distance_alignment(
    s1: &PhoneticString,
    s2: &PhoneticString,
) -> PhoneticStringAlignment {
    let edges = UnitCosts {
        s1: s1.segments(),
        s2: s2.segments(),
    };
    let (aligned_a, aligned_b, cost) =
        align_grid(s1.segments(), s2.segments(), &edges, Objective::Minimize);

    let max_len = s1.len().max(s2.len());
    let normalized = if max_len == 0 { 0.0 } else { cost / max_len as f64 };
    PhoneticStringAlignment::new(aligned_a, aligned_b, cost, normalized)
}

/// Sum of a string's diagonal self-correspondence scores.
pub fn self_similarity(string: &PhoneticString, scores: &LayeredScores<'_>) -> f64 {
    string.segments().iter().map(|&x| scores.score(x, x)).sum()
}

fn weighted_self_similarity(
    string: &PhoneticString,
    scores: &LayeredScores<'_>,
    info: &[f64],
) -> f64 {
    string
        .segments()
        .iter()
        .zip(info)
        .map(|(&x, &weight)| scores.score(x, x) * weight)
        .sum()
}

/// Combine an alignment score and two self-similarities into `1 - 2S / (SS1 + SS2)`.
///
/// Two empty strings are at distance 0.0; without positive self-similarity
/// mass the distance is 1.0.
pub fn normalized_distance(
    score: f64,
    alignment_len: usize,
    self_sim1: f64,
    len1: usize,
    self_sim2: f64,
    len2: usize,
    normalization: ScoreNormalization,
) -> f64 {
    if len1 == 0 && len2 == 0 {
        return 0.0;
    }

    let per = |value: f64, len: usize| if len == 0 { 0.0 } else { value / len as f64 };
    let (score, self_sim1, self_sim2) = match normalization {
        ScoreNormalization::Raw => (score, self_sim1, self_sim2),
        ScoreNormalization::LengthNormalized => (
            per(score, alignment_len),
            per(self_sim1, len1),
            per(self_sim2, len2),
        ),
    };

    let denominator = self_sim1 + self_sim2;
    if denominator <= 0.0 {
        return 1.0;
    }
    1.0 - 2.0 * score / denominator
}

fn check_inputs(s1: &PhoneticString, s2: &PhoneticString, scoring: &PairScoring<'_>) -> Result<()> {
    scoring.ensure_compatible()?;
    let symbols = scoring.symbols();
    symbols.check(s1)?;
    symbols.check(s2)?;
    Ok(())
}

/// Correspondence-weighted (Needleman–Wunsch) alignment.
pub fn needleman_wunsch(
    s1: &PhoneticString,
    s2: &PhoneticString,
    scoring: &PairScoring<'_>,
    config: &AlignmentConfig,
) -> Result<PhoneticStringAlignment> {
    check_inputs(s1, s2, scoring)?;

    let edges = CorrespondenceScores {
        s1: s1.segments(),
        s2: s2.segments(),
        scores: scoring.pair,
    };
    let (aligned_a, aligned_b, score) =
        align_grid(s1.segments(), s2.segments(), &edges, Objective::Maximize);

    let distance = normalized_distance(
        score,
        aligned_a.len(),
        self_similarity(s1, &scoring.self1),
        s1.len(),
        self_similarity(s2, &scoring.self2),
        s2.len(),
        config.normalization,
    );
    Ok(PhoneticStringAlignment::new(aligned_a, aligned_b, score, distance))
}

/// Needleman–Wunsch with every edge scaled by the information content of the
/// segments it touches, so agreement at unpredictable positions counts more.
pub fn information_weighted_alignment(
    s1: &PhoneticString,
    s2: &PhoneticString,
    scoring: &PairScoring<'_>,
    info1: &InformationModel,
    info2: &InformationModel,
    config: &AlignmentConfig,
) -> Result<PhoneticStringAlignment> {
    check_inputs(s1, s2, scoring)?;
    info1.symbols().ensure_compatible(scoring.symbols())?;
    info2.symbols().ensure_compatible(scoring.symbols())?;

    let profile1 = info1.information_profile(s1)?;
    let profile2 = info2.information_profile(s2)?;

    let edges = InformationWeightedScores {
        base: CorrespondenceScores {
            s1: s1.segments(),
            s2: s2.segments(),
            scores: scoring.pair,
        },
        info1: &profile1,
        info2: &profile2,
    };
    let (aligned_a, aligned_b, score) =
        align_grid(s1.segments(), s2.segments(), &edges, Objective::Maximize);

    let distance = normalized_distance(
        score,
        aligned_a.len(),
        weighted_self_similarity(s1, &scoring.self1, &profile1),
        s1.len(),
        weighted_self_similarity(s2, &scoring.self2, &profile2),
        s2.len(),
        config.normalization,
    );
    Ok(PhoneticStringAlignment::new(aligned_a, aligned_b, score, distance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correspondence::CorrespondenceModel;
    use crate::symbols::SymbolTable;
    use std::sync::Arc;

    fn table() -> Arc<SymbolTable> {
        SymbolTable::from_tokens(["a", "b", "c", "d"])
    }

    /// +2 for identity, -1 for substitution, -2 for anything against a gap
    fn toy_model(symbols: &Arc<SymbolTable>) -> CorrespondenceModel {
        let mut model = CorrespondenceModel::new(symbols.clone());
        let n = symbols.size() as u32;
        for a in 1..n {
            for b in 1..n {
                let score = if a == GAP || b == GAP {
                    -2.0
                } else if a == b {
                    2.0
                } else {
                    -1.0
                };
                model.set_score(a, b, score).unwrap();
            }
        }
        model
    }

    #[test]
    fn test_edit_distance() {
        let table = table();
        let abc = table.encode(&["a", "b", "c"]).unwrap();
        let abd = table.encode(&["a", "b", "d"]).unwrap();
        assert_eq!(edit_distance(abc.segments(), abd.segments()), 1);
        assert_eq!(edit_distance(abc.segments(), &[]), 3);

        let alignment = edit_distance_alignment(&abc, &abd);
        assert_eq!(alignment.alignment_score, 1.0);
        assert!((alignment.normalized_distance_score - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(alignment.len(), 3);
    }

    #[test]
    fn test_empty_inputs() {
        let empty = PhoneticString::default();
        let alignment = edit_distance_alignment(&empty, &empty);
        assert_eq!(alignment.normalized_distance_score, 0.0);
        assert!(alignment.is_empty());

        let table = table();
        let model = toy_model(&table);
        let scoring = PairScoring::global_only(&model);
        let nw = needleman_wunsch(&empty, &empty, &scoring, &AlignmentConfig::default()).unwrap();
        assert_eq!(nw.normalized_distance_score, 0.0);
    }

    #[test]
    fn test_one_sided_alignment_is_all_gaps() {
        let table = table();
        let ab = table.encode(&["a", "b"]).unwrap();
        let alignment = edit_distance_alignment(&ab, &PhoneticString::default());
        assert_eq!(alignment.str2.segments(), &[GAP, GAP]);
        assert_eq!(alignment.normalized_distance_score, 1.0);
    }

    #[test]
    fn test_tie_prefers_diagonal() {
        // "ab" vs "ba": a substitution path and a gap path both cost 2
        let table = table();
        let ab = table.encode(&["a", "b"]).unwrap();
        let ba = table.encode(&["b", "a"]).unwrap();
        let alignment = edit_distance_alignment(&ab, &ba);
        assert_eq!(alignment.alignment_score, 2.0);
        assert_eq!(alignment.len(), 2);
    }

    #[test]
    fn test_needleman_wunsch_prefers_mismatch_over_gaps() {
        let table = table();
        let model = toy_model(&table);
        let scoring = PairScoring::global_only(&model);
        let ab = table.encode(&["a", "b"]).unwrap();
        let ac = table.encode(&["a", "c"]).unwrap();

        let alignment = needleman_wunsch(&ab, &ac, &scoring, &AlignmentConfig::default()).unwrap();
        assert_eq!(alignment.alignment_score, 1.0);
        assert_eq!(alignment.str1, ab);
        assert_eq!(alignment.str2, ac);
        // 1 - 2 * 1 / (4 + 4)
        assert!((alignment.normalized_distance_score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_length_normalization() {
        let table = table();
        let model = toy_model(&table);
        let scoring = PairScoring::global_only(&model);
        let ab = table.encode(&["a", "b"]).unwrap();
        let ac = table.encode(&["a", "c"]).unwrap();
        let config = AlignmentConfig {
            normalization: ScoreNormalization::LengthNormalized,
        };
        let alignment = needleman_wunsch(&ab, &ac, &scoring, &config).unwrap();
        // 1 - 2 * (1/2) / (4/2 + 4/2)
        assert!((alignment.normalized_distance_score - 0.75).abs() < 1e-12);

        let abc = table.encode(&["a", "b", "c"]).unwrap();
        let raw = needleman_wunsch(&ab, &abc, &scoring, &AlignmentConfig::default()).unwrap();
        let scaled = needleman_wunsch(&ab, &abc, &scoring, &config).unwrap();
        assert!((raw.normalized_distance_score - scaled.normalized_distance_score).abs() > 1e-6);
    }

    #[test]
    fn test_rejects_foreign_symbols() {
        let table = table();
        let model = toy_model(&table);
        let scoring = PairScoring::global_only(&model);
        let bogus = PhoneticString::new(vec![2, 40]);
        let ab = table.encode(&["a", "b"]).unwrap();
        assert!(needleman_wunsch(&bogus, &ab, &scoring, &AlignmentConfig::default()).is_err());
    }

    #[test]
    fn test_normalized_distance_degenerate() {
        assert_eq!(normalized_distance(0.0, 2, 0.0, 2, 0.0, 2, ScoreNormalization::Raw), 1.0);
        assert_eq!(normalized_distance(5.0, 0, 0.0, 0, 0.0, 0, ScoreNormalization::Raw), 0.0);
    }
}
