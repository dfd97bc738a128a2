//! Reads the results table of a print view into row data.

use crate::{
    browser::{Browser, BrowserError, Locator},
    config::{Action, Config, ExtractionMode},
    normalize::normalize,
    policy::FaultKind,
};
use anyhow::{Context, Result};
use indexmap::IndexMap;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("static selector"));
static DATA_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("static selector"));
static HEADER_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("static selector"));

/// One table row keyed by normalized column header, in column order.
pub type RowRecord = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Extracted {
    Records(Vec<RowRecord>),
    Cells(Vec<Vec<String>>),
}

impl Extracted {
    pub fn empty(mode: ExtractionMode) -> Self {
        match mode {
            ExtractionMode::Mapped => Self::Records(Vec::new()),
            ExtractionMode::Positional => Self::Cells(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Records(r) => r.len(),
            Self::Cells(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("results table unavailable: {0}")]
    Unavailable(#[from] BrowserError),
    #[error("header row has no cells")]
    NoHeaders,
}

impl ExtractError {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::Unavailable(e) => e.kind(),
            Self::NoHeaders => FaultKind::Malformed,
        }
    }
}

pub struct TableExtractor {
    mode: ExtractionMode,
    table: Locator,
    jurisdiction_column: String,
    markers: Vec<Regex>,
}

impl TableExtractor {
    pub fn new(cfg: &Config) -> Result<Self> {
        let markers = cfg
            .extraction
            .summary_markers
            .iter()
            // Cells are matched after normalization, so the patterns are too.
            .map(|p| {
                Regex::new(&normalize(p)).with_context(|| format!("summary marker regex: {p}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            mode: cfg.extraction.mode,
            table: cfg.locators.get(Action::ResultsTable).clone(),
            jurisdiction_column: normalize(&cfg.extraction.jurisdiction_column),
            markers,
        })
    }

    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    /// Best effort: any fault is logged and yields no rows, so one broken
    /// table never stops the walk.
    pub fn extract(&self, browser: &mut dyn Browser, jurisdiction: Option<&str>) -> Extracted {
        self.try_extract(browser, jurisdiction).unwrap_or_else(|e| {
            warn!("table extraction failed: {e}");
            Extracted::empty(self.mode)
        })
    }

    /// Reads and parses the results table, handing any fault back.
    pub fn try_extract(
        &self,
        browser: &mut dyn Browser,
        jurisdiction: Option<&str>,
    ) -> Result<Extracted, ExtractError> {
        let html = browser.outer_html(&self.table)?;
        let rows = self.parse(&html, jurisdiction)?;
        debug!("extracted {} rows from {}", rows.len(), self.table);
        Ok(rows)
    }

    pub fn parse(&self, html: &str, jurisdiction: Option<&str>) -> Result<Extracted, ExtractError> {
        let doc = Html::parse_fragment(html);
        let rows: Vec<ElementRef> = doc.select(&ROW).collect();

        match self.mode {
            ExtractionMode::Positional => Ok(Extracted::Cells(
                rows.iter()
                    .map(|r| row_cells(r, &DATA_CELL))
                    .filter(|cells| self.is_relevant(cells))
                    .collect(),
            )),
            ExtractionMode::Mapped => {
                let Some((head, body)) = rows.split_first() else {
                    return Ok(Extracted::Records(Vec::new()));
                };
                let raw: Vec<String> = row_cells(head, &HEADER_CELL)
                    .into_iter()
                    .enumerate()
                    .map(|(i, h)| if h.is_empty() { format!("column_{i}") } else { h })
                    .collect();
                if raw.is_empty() {
                    return Err(ExtractError::NoHeaders);
                }
                let jurisdiction = jurisdiction.map(|j| normalize(j.trim()));
                let reserved = jurisdiction.as_ref().map(|_| self.jurisdiction_column.as_str());
                let headers = unique_headers(raw, reserved);

                let records = body
                    .iter()
                    .map(|r| row_cells(r, &HEADER_CELL))
                    .filter(|cells| self.is_relevant(cells))
                    .map(|cells| {
                        // Cells past the header count have no key and are dropped.
                        let mut rec: RowRecord = headers.iter().cloned().zip(cells).collect();
                        if let Some(j) = &jurisdiction {
                            rec.insert(self.jurisdiction_column.clone(), j.clone());
                        }
                        rec
                    })
                    .collect();
                Ok(Extracted::Records(records))
            }
        }
    }

    /// Footer and pagination rows have an empty first cell or carry the
    /// record-count marker.
    fn is_relevant(&self, cells: &[String]) -> bool {
        match cells.first() {
            None => false,
            Some(first) if first.is_empty() => false,
            Some(first) => !self.markers.iter().any(|m| m.is_match(first)),
        }
    }
}

/// Repeated header names get a `_2`, `_3`... suffix; `reserved` is treated
/// as already taken.
fn unique_headers(raw: Vec<String>, reserved: Option<&str>) -> Vec<String> {
    let mut taken: HashSet<String> = reserved.map(str::to_string).into_iter().collect();
    raw.into_iter()
        .map(|h| {
            let mut name = h.clone();
            let mut n = 2;
            while taken.contains(&name) {
                name = format!("{h}_{n}");
                n += 1;
            }
            taken.insert(name.clone());
            name
        })
        .collect()
}

fn row_cells(row: &ElementRef, cell: &Selector) -> Vec<String> {
    row.select(cell).map(|c| normalize(&cell_text(&c))).collect()
}

fn cell_text(cell: &ElementRef) -> String {
    let raw: String = cell.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
