//! Versioned JSON records for persisting trained models.
//!
//! A record carries the full ordered symbol list, so a model can be reloaded
//! either against a table the caller already holds or on its own.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::sync::Arc;

use crate::correspondence::CorrespondenceModel;
use crate::error::{CoreError, Result};
use crate::information::InformationModel;
use crate::symbols::SymbolTable;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Correspondence,
    Information,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub format_version: u32,
    pub kind: ModelKind,
    /// Symbol list in id order, reserved symbols included
    pub symbols: Vec<String>,
    /// `(pair or trigram id, value)` sorted by id
    pub entries: Vec<(u64, f64)>,
    /// Information models only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_mass: Option<f64>,
    /// Information models only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smoothing_mass_ratio: Option<f64>,
}

impl ModelRecord {
    pub fn from_correspondence(model: &CorrespondenceModel) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            kind: ModelKind::Correspondence,
            symbols: model.symbols().symbols().to_vec(),
            entries: model.entries(),
            total_mass: None,
            smoothing_mass_ratio: None,
        }
    }

    pub fn from_information(model: &InformationModel) -> Self {
        let mut entries: Vec<(u64, f64)> = model.counts().iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort_unstable_by_key(|&(id, _)| id);
        Self {
            format_version: FORMAT_VERSION,
            kind: ModelKind::Information,
            symbols: model.symbols().symbols().to_vec(),
            entries,
            total_mass: Some(model.total_trigram_mass()),
            smoothing_mass_ratio: Some(model.smoothing_mass_ratio()),
        }
    }

    /// Rebuild a correspondence model. With `symbols` given, the record must
    /// match that table and the model shares it.
    pub fn into_correspondence(
        self,
        symbols: Option<&Arc<SymbolTable>>,
    ) -> Result<CorrespondenceModel> {
        self.check_header(ModelKind::Correspondence)?;
        let table = self.resolve_table(symbols)?;
        let scores = self.collect_entries(table.size() as u64 * table.size() as u64)?;
        Ok(CorrespondenceModel::from_scores(table, scores))
    }

    pub fn into_information(self, symbols: Option<&Arc<SymbolTable>>) -> Result<InformationModel> {
        self.check_header(ModelKind::Information)?;
        let total_mass = match self.total_mass {
            Some(mass) if mass.is_finite() && mass >= 0.0 => mass,
            other => {
                return Err(CoreError::MalformedRecord(format!(
                    "information record needs a finite non-negative total_mass, got {:?}",
                    other
                )))
            }
        };
        let ratio = match self.smoothing_mass_ratio {
            Some(ratio) if ratio.is_finite() && ratio > 0.0 => ratio,
            other => {
                return Err(CoreError::MalformedRecord(format!(
                    "information record needs a finite positive smoothing_mass_ratio, got {:?}",
                    other
                )))
            }
        };

        let table = self.resolve_table(symbols)?;
        let size = table.size() as u64;
        let counts = self.collect_entries(size * size * size)?;
        if counts.values().any(|&count| count < 0.0) {
            return Err(CoreError::MalformedRecord("negative trigram count".to_string()));
        }
        Ok(InformationModel::from_parts(table, counts, total_mass, ratio))
    }

    fn check_header(&self, expected: ModelKind) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(CoreError::UnsupportedVersion(self.format_version));
        }
        if self.kind != expected {
            return Err(CoreError::MalformedRecord(format!(
                "expected a {:?} record, found {:?}",
                expected, self.kind
            )));
        }
        Ok(())
    }

    fn resolve_table(&self, symbols: Option<&Arc<SymbolTable>>) -> Result<Arc<SymbolTable>> {
        match symbols {
            Some(table) if table.symbols() == self.symbols.as_slice() => Ok(table.clone()),
            Some(table) => Err(CoreError::DimensionMismatch(format!(
                "record has {} symbols, table has {} or a different order",
                self.symbols.len(),
                table.size()
            ))),
            None => SymbolTable::from_symbol_list(&self.symbols),
        }
    }

    fn collect_entries(&self, id_limit: u64) -> Result<FxHashMap<u64, f64>> {
        let mut values = FxHashMap::default();
        for &(id, value) in &self.entries {
            if id >= id_limit {
                return Err(CoreError::MalformedRecord(format!(
                    "entry id {} out of range (limit {})",
                    id, id_limit
                )));
            }
            if !value.is_finite() {
                return Err(CoreError::MalformedRecord(format!("entry {} is not finite", id)));
            }
            if values.insert(id, value).is_some() {
                return Err(CoreError::MalformedRecord(format!("duplicate entry id {}", id)));
            }
        }
        Ok(values)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}
