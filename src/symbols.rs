//! Bidirectional mapping between phonetic segments and dense integer ids.
//!
//! Ids 0 and 1 are reserved for the word boundary `#` and the gap `-`.
//! Pair and trigram ids are computed relative to the table size, so a table
//! is built once through [`SymbolTableBuilder`] and then frozen; every model
//! keeps an `Arc` to the exact table it was encoded against.

use ahash::AHashMap;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{CoreError, Result};
use crate::types::PhoneticString;

pub const BOUNDARY: u32 = 0;
pub const GAP: u32 = 1;
pub const BOUNDARY_SYMBOL: &str = "#";
pub const GAP_SYMBOL: &str = "-";

/// Accumulates the vocabulary before freezing.
#[derive(Debug, Clone)]
pub struct SymbolTableBuilder {
    id_to_symbol: Vec<String>,
    symbol_to_id: AHashMap<String, u32>,
}

impl SymbolTableBuilder {
    pub fn new() -> Self {
        let mut builder = Self {
            id_to_symbol: Vec::new(),
            symbol_to_id: AHashMap::new(),
        };
        builder.push(BOUNDARY_SYMBOL);
        builder.push(GAP_SYMBOL);
        builder
    }

    fn push(&mut self, token: &str) -> u32 {
        let id = self.id_to_symbol.len() as u32;
        self.id_to_symbol.push(token.to_string());
        self.symbol_to_id.insert(token.to_string(), id);
        id
    }

    /// Append a token, returning its id. Redefining a known token keeps its id.
    pub fn define_symbol(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.symbol_to_id.get(token) {
            tracing::warn!(token, id, "symbol defined twice, keeping existing id");
            return id;
        }
        self.push(token)
    }

    /// Define every grapheme cluster of an IPA string that is not yet known.
    pub fn define_segments(&mut self, ipa: &str) {
        for grapheme in ipa.graphemes(true) {
            if !self.symbol_to_id.contains_key(grapheme) {
                self.push(grapheme);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.id_to_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_symbol.is_empty()
    }

    pub fn freeze(self) -> Arc<SymbolTable> {
        tracing::debug!(size = self.id_to_symbol.len(), "symbol table frozen");
        Arc::new(SymbolTable {
            id_to_symbol: self.id_to_symbol,
            symbol_to_id: self.symbol_to_id,
        })
    }
}

impl Default for SymbolTableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen symbol table.
#[derive(Debug, PartialEq, Eq)]
pub struct SymbolTable {
    id_to_symbol: Vec<String>,
    symbol_to_id: AHashMap<String, u32>,
}

impl SymbolTable {
    /// Build a frozen table from tokens in id order; the reserved symbols are prepended.
    pub fn from_tokens<'a, I>(tokens: I) -> Arc<SymbolTable>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut builder = SymbolTableBuilder::new();
        for token in tokens {
            builder.define_symbol(token);
        }
        builder.freeze()
    }

    /// Rebuild a table from a persisted symbol list (reserved symbols included).
    pub fn from_symbol_list(symbols: &[String]) -> Result<Arc<SymbolTable>> {
        if symbols.len() < 2 || symbols[0] != BOUNDARY_SYMBOL || symbols[1] != GAP_SYMBOL {
            return Err(CoreError::MalformedRecord(
                "symbol list must start with the reserved symbols '#' and '-'".to_string(),
            ));
        }

        let mut symbol_to_id = AHashMap::with_capacity(symbols.len());
        for (id, symbol) in symbols.iter().enumerate() {
            if symbol_to_id.insert(symbol.clone(), id as u32).is_some() {
                return Err(CoreError::DuplicateSymbol(symbol.clone()));
            }
        }

        Ok(Arc::new(SymbolTable {
            id_to_symbol: symbols.to_vec(),
            symbol_to_id,
        }))
    }

    pub fn size(&self) -> usize {
        self.id_to_symbol.len()
    }

    pub fn symbols(&self) -> &[String] {
        &self.id_to_symbol
    }

    pub fn lookup(&self, token: &str) -> Option<u32> {
        self.symbol_to_id.get(token).copied()
    }

    pub fn to_int(&self, token: &str) -> Result<u32> {
        self.lookup(token)
            .ok_or_else(|| CoreError::UnknownSymbol(token.to_string()))
    }

    pub fn to_symbol(&self, id: u32) -> Result<&str> {
        self.id_to_symbol
            .get(id as usize)
            .map(String::as_str)
            .ok_or(CoreError::SymbolOutOfRange {
                id,
                size: self.size(),
            })
    }

    pub fn encode<S: AsRef<str>>(&self, tokens: &[S]) -> Result<PhoneticString> {
        let segments = tokens
            .iter()
            .map(|token| self.to_int(token.as_ref()))
            .collect::<Result<Vec<u32>>>()?;
        Ok(PhoneticString::new(segments))
    }

    /// Split an IPA string into grapheme clusters and encode each one.
    pub fn segment(&self, ipa: &str) -> Result<PhoneticString> {
        let segments = ipa
            .graphemes(true)
            .map(|grapheme| self.to_int(grapheme))
            .collect::<Result<Vec<u32>>>()?;
        Ok(PhoneticString::new(segments))
    }

    pub fn decode(&self, string: &PhoneticString) -> Result<Vec<&str>> {
        string.segments().iter().map(|&id| self.to_symbol(id)).collect()
    }

    /// Fail unless every segment of `string` has an id in this table.
    pub fn check(&self, string: &PhoneticString) -> Result<()> {
        let size = self.size();
        match string.segments().iter().find(|&&id| id as usize >= size) {
            Some(&id) => Err(CoreError::SymbolOutOfRange { id, size }),
            None => Ok(()),
        }
    }

    #[inline]
    pub fn pair_id(&self, a: u32, b: u32) -> u64 {
        self.size() as u64 * a as u64 + b as u64
    }

    #[inline]
    pub fn split_pair_id(&self, pair: u64) -> (u32, u32) {
        let n = self.size() as u64;
        ((pair / n) as u32, (pair % n) as u32)
    }

    #[inline]
    pub fn trigram_id(&self, a: u32, b: u32, c: u32) -> u64 {
        let n = self.size() as u64;
        (a as u64 * n + b as u64) * n + c as u64
    }

    /// Same table instance, or an identical ordered symbol list.
    pub fn is_compatible(self: &Arc<Self>, other: &Arc<SymbolTable>) -> bool {
        Arc::ptr_eq(self, other) || self.id_to_symbol == other.id_to_symbol
    }

    pub fn ensure_compatible(self: &Arc<Self>, other: &Arc<SymbolTable>) -> Result<()> {
        if self.is_compatible(other) {
            Ok(())
        } else {
            Err(CoreError::DimensionMismatch(format!(
                "symbol tables differ (sizes {} and {})",
                self.size(),
                other.size()
            )))
        }
    }
}
