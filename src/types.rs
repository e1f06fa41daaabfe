//! Shared data structures for the cognate detection core.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::symbols::{SymbolTable, GAP};

/// Ordered sequence of symbol ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PhoneticString {
    segments: Vec<u32>,
}

impl PhoneticString {
    pub fn new(segments: Vec<u32>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[u32] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Copy with every gap symbol removed
    pub fn without_gaps(&self) -> PhoneticString {
        PhoneticString::new(
            self.segments
                .iter()
                .copied()
                .filter(|&id| id != GAP)
                .collect(),
        )
    }

    pub fn to_ipa(&self, symbols: &SymbolTable) -> Result<String> {
        Ok(symbols.decode(self)?.concat())
    }
}

impl From<Vec<u32>> for PhoneticString {
    fn from(segments: Vec<u32>) -> Self {
        Self::new(segments)
    }
}

/// Edit operation in sequence alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    Match,
    Substitute,
    /// Gap charged against the first string
    Insert,
    /// Gap charged against the second string
    Delete,
}

/// Two equal-length gapped strings produced by one pairwise alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PhoneticStringAlignment {
    pub str1: PhoneticString,
    pub str2: PhoneticString,
    /// Accumulated similarity, or edit cost for the unweighted aligner
    pub alignment_score: f64,
    pub normalized_distance_score: f64,
}

impl PhoneticStringAlignment {
    pub fn new(
        str1: PhoneticString,
        str2: PhoneticString,
        alignment_score: f64,
        normalized_distance_score: f64,
    ) -> Self {
        debug_assert_eq!(str1.len(), str2.len());
        Self {
            str1,
            str2,
            alignment_score,
            normalized_distance_score,
        }
    }

    pub fn len(&self) -> usize {
        self.str1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.str1.is_empty()
    }

    /// Aligned symbol pairs, gaps included
    pub fn pairs(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.str1
            .segments()
            .iter()
            .copied()
            .zip(self.str2.segments().iter().copied())
    }

    pub fn operations(&self) -> Vec<EditOp> {
        self.pairs()
            .map(|(a, b)| match (a, b) {
                (GAP, _) => EditOp::Insert,
                (_, GAP) => EditOp::Delete,
                _ if a == b => EditOp::Match,
                _ => EditOp::Substitute,
            })
            .collect()
    }

    /// Two-line rendering, one row per string
    pub fn display(&self, symbols: &SymbolTable) -> Result<String> {
        let top = symbols.decode(&self.str1)?;
        let bottom = symbols.decode(&self.str2)?;
        Ok(format!("{}\n{}", top.join(" "), bottom.join(" ")))
    }
}

/// One cluster of same-concept forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CognateSet {
    pub id: usize,
    pub concept: String,
    /// Form indices into the wordlist
    pub members: Vec<usize>,
    pub size: usize,
}

impl CognateSet {
    pub fn new(id: usize, concept: String, members: Vec<usize>) -> Self {
        let size = members.len();
        Self {
            id,
            concept,
            members,
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_gaps() {
        let string = PhoneticString::new(vec![2, GAP, 3, GAP]);
        assert_eq!(string.without_gaps().segments(), &[2, 3]);
        assert_eq!(string.len(), 4);
    }

    #[test]
    fn test_operations() {
        let alignment = PhoneticStringAlignment::new(
            PhoneticString::new(vec![2, 3, GAP, 4]),
            PhoneticString::new(vec![2, 5, 6, GAP]),
            0.0,
            0.0,
        );
        assert_eq!(
            alignment.operations(),
            vec![EditOp::Match, EditOp::Substitute, EditOp::Insert, EditOp::Delete]
        );
    }

    #[test]
    fn test_display() {
        let table = SymbolTable::from_tokens(["a", "b"]);
        let alignment = PhoneticStringAlignment::new(
            PhoneticString::new(vec![2, 3]),
            PhoneticString::new(vec![2, GAP]),
            1.0,
            0.5,
        );
        assert_eq!(alignment.display(&table).unwrap(), "a b\na -");
    }
}
