//! In-memory wordlist: `(language, concept, form)` records encoded against one
//! frozen symbol table, with language and concept names interned to indices.

use ahash::AHashMap;
use std::sync::Arc;

use crate::error::Result;
use crate::symbols::SymbolTable;
use crate::types::PhoneticString;

#[derive(Debug, Clone)]
pub struct Form {
    pub language: usize,
    pub concept: usize,
    pub string: PhoneticString,
}

#[derive(Debug, Clone)]
pub struct Wordlist {
    symbols: Arc<SymbolTable>,
    languages: Vec<String>,
    language_index: AHashMap<String, usize>,
    concepts: Vec<String>,
    concept_index: AHashMap<String, usize>,
    forms: Vec<Form>,
    /// Form indices per concept, in insertion order
    by_concept: Vec<Vec<usize>>,
    by_language: Vec<Vec<usize>>,
}

impl Wordlist {
    pub fn new(symbols: Arc<SymbolTable>) -> Self {
        Self {
            symbols,
            languages: Vec::new(),
            language_index: AHashMap::new(),
            concepts: Vec::new(),
            concept_index: AHashMap::new(),
            forms: Vec::new(),
            by_concept: Vec::new(),
            by_language: Vec::new(),
        }
    }

    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    /// Add a record, returning its form index.
    pub fn add_form(
        &mut self,
        language: &str,
        concept: &str,
        string: PhoneticString,
    ) -> Result<usize> {
        self.symbols.check(&string)?;

        let language = match self.language_index.get(language) {
            Some(&idx) => idx,
            None => {
                let idx = self.languages.len();
                self.languages.push(language.to_string());
                self.language_index.insert(language.to_string(), idx);
                self.by_language.push(Vec::new());
                idx
            }
        };
        let concept = match self.concept_index.get(concept) {
            Some(&idx) => idx,
            None => {
                let idx = self.concepts.len();
                self.concepts.push(concept.to_string());
                self.concept_index.insert(concept.to_string(), idx);
                self.by_concept.push(Vec::new());
                idx
            }
        };

        let form_idx = self.forms.len();
        self.forms.push(Form {
            language,
            concept,
            string,
        });
        self.by_concept[concept].push(form_idx);
        self.by_language[language].push(form_idx);
        Ok(form_idx)
    }

    /// Segment an IPA string with the wordlist's table and add it.
    pub fn add_ipa(&mut self, language: &str, concept: &str, ipa: &str) -> Result<usize> {
        let string = self.symbols.segment(ipa)?;
        self.add_form(language, concept, string)
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn concepts(&self) -> &[String] {
        &self.concepts
    }

    pub fn language_id(&self, name: &str) -> Option<usize> {
        self.language_index.get(name).copied()
    }

    pub fn concept_id(&self, name: &str) -> Option<usize> {
        self.concept_index.get(name).copied()
    }

    pub fn forms(&self) -> &[Form] {
        &self.forms
    }

    /// Panics if `idx >= self.len()`.
    pub fn form(&self, idx: usize) -> &Form {
        &self.forms[idx]
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Form indices of `concept`. Panics if the index was not interned.
    pub fn concept_forms(&self, concept: usize) -> &[usize] {
        &self.by_concept[concept]
    }

    /// Panics if the index was not interned.
    pub fn language_forms(&self, language: usize) -> &[usize] {
        &self.by_language[language]
    }

    /// Ordered same-concept form pairs across different languages, both directions.
    pub fn cross_language_pairs(&self, concept: usize) -> Vec<(usize, usize)> {
        let forms = &self.by_concept[concept];
        let mut pairs = Vec::new();
        for &i in forms {
            for &j in forms {
                if self.forms[i].language != self.forms[j].language {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    /// Same-concept pairs restricted to one ordered language pair.
    ///
    /// With `lang1 == lang2` this enumerates every pair of the language's
    /// forms for the concept, the identity pair included.
    pub fn language_pair_forms(
        &self,
        concept: usize,
        lang1: usize,
        lang2: usize,
    ) -> Vec<(usize, usize)> {
        let forms = &self.by_concept[concept];
        let mut pairs = Vec::new();
        for &i in forms.iter().filter(|&&i| self.forms[i].language == lang1) {
            for &j in forms.iter().filter(|&&j| self.forms[j].language == lang2) {
                pairs.push((i, j));
            }
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTableBuilder;

    fn toy() -> Wordlist {
        let mut builder = SymbolTableBuilder::new();
        builder.define_segments("patermdf");
        let mut wordlist = Wordlist::new(builder.freeze());
        wordlist.add_ipa("latin", "father", "pater").unwrap();
        wordlist.add_ipa("german", "father", "vater").unwrap_err();
        wordlist.add_ipa("gothic", "father", "fadar").unwrap();
        wordlist.add_ipa("latin", "mother", "mater").unwrap();
        wordlist
    }

    #[test]
    fn test_interning() {
        let wordlist = toy();
        assert_eq!(wordlist.languages(), &["latin".to_string(), "gothic".to_string()]);
        assert_eq!(wordlist.concepts().len(), 2);
        assert_eq!(wordlist.len(), 3);
        assert_eq!(wordlist.language_forms(0), &[0, 2]);
    }

    #[test]
    fn test_cross_language_pairs() {
        let wordlist = toy();
        let father = wordlist.concept_id("father").unwrap();
        assert_eq!(wordlist.cross_language_pairs(father), vec![(0, 1), (1, 0)]);

        let mother = wordlist.concept_id("mother").unwrap();
        assert!(wordlist.cross_language_pairs(mother).is_empty());
        assert_eq!(wordlist.language_pair_forms(mother, 0, 0), vec![(2, 2)]);
    }
}
