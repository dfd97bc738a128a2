use crate::{
    config::ExtractionMode,
    extract::{Extracted, RowRecord},
    util::ensure_parent,
};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryData {
    Records(Vec<RowRecord>),
    ByJurisdiction(IndexMap<String, Vec<Vec<String>>>),
}

impl CategoryData {
    fn empty(mode: ExtractionMode) -> Self {
        match mode {
            ExtractionMode::Mapped => Self::Records(Vec::new()),
            ExtractionMode::Positional => Self::ByJurisdiction(IndexMap::new()),
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            Self::Records(r) => r.len(),
            Self::ByJurisdiction(m) => m.values().map(Vec::len).sum(),
        }
    }
}

#[derive(Debug, Error)]
#[error("category {category:?} holds {held} data, cannot merge {incoming} rows")]
pub struct ModeMismatch {
    pub category: String,
    pub held: &'static str,
    pub incoming: &'static str,
}

/// Category label to accumulated rows. Created once per run, grown per
/// (category, jurisdiction) pair, written once at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultDocument {
    categories: IndexMap<String, CategoryData>,
}

impl ResultDocument {
    pub fn new(labels: &[String], mode: ExtractionMode) -> Self {
        let categories = labels
            .iter()
            .map(|l| (l.clone(), CategoryData::empty(mode)))
            .collect();
        Self { categories }
    }

    /// Appends rows for one pair. Unknown categories are created on first use.
    pub fn merge(
        &mut self,
        category: &str,
        jurisdiction: &str,
        rows: Extracted,
    ) -> Result<usize, ModeMismatch> {
        let mode = match rows {
            Extracted::Records(_) => ExtractionMode::Mapped,
            Extracted::Cells(_) => ExtractionMode::Positional,
        };
        let entry = self
            .categories
            .entry(category.to_string())
            .or_insert_with(|| CategoryData::empty(mode));

        match (entry, rows) {
            (CategoryData::Records(held), Extracted::Records(new)) => {
                let n = new.len();
                held.extend(new);
                Ok(n)
            }
            (CategoryData::ByJurisdiction(held), Extracted::Cells(new)) => {
                let n = new.len();
                held.entry(jurisdiction.to_string()).or_default().extend(new);
                Ok(n)
            }
            (CategoryData::Records(_), Extracted::Cells(_)) => Err(ModeMismatch {
                category: category.to_string(),
                held: "mapped",
                incoming: "positional",
            }),
            (CategoryData::ByJurisdiction(_), Extracted::Records(_)) => Err(ModeMismatch {
                category: category.to_string(),
                held: "positional",
                incoming: "mapped",
            }),
        }
    }

    pub fn get(&self, category: &str) -> Option<&CategoryData> {
        self.categories.get(category)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &CategoryData)> {
        self.categories.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn total_rows(&self) -> usize {
        self.categories.values().map(CategoryData::row_count).sum()
    }

    /// UTF-8 JSON, four-space indent, non-ASCII left unescaped.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
        self.serialize(&mut ser).context("serializing result document")?;
        String::from_utf8(buf).context("result document is not UTF-8")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let json = self.to_json()?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}
