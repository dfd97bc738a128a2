use crate::browser::Locator;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub portal: Portal,
    #[serde(default)]
    pub categories: Categories,
    #[serde(default)]
    pub jurisdictions: Jurisdictions,
    #[serde(default)]
    pub locators: Locators,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub settle: Settle,
    #[serde(default)]
    pub extraction: Extraction,
    #[serde(default)]
    pub browser: BrowserOptions,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Portal {
    pub url: String,
}
impl Default for Portal {
    fn default() -> Self {
        Self {
            url: "https://www.gnre.pe.gov.br:444/gnre/portal/consultarTabelas.jsp".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Categories {
    /// Menu link labels, in walk order. Also the key order of the output.
    pub labels: Vec<String>,
}
impl Default for Categories {
    fn default() -> Self {
        Self {
            labels: vec![
                "Receitas".into(),
                "Detalhamento das Receitas".into(),
                "Produtos".into(),
                "Documentos de Origem".into(),
                "Campos Adicionais".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jurisdictions {
    pub all_sentinel: String,
}
impl Default for Jurisdictions {
    fn default() -> Self {
        Self {
            all_sentinel: "Todas as Receitas".into(),
        }
    }
}

/// Named UI actions the walker performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CategoryLink,
    JurisdictionSelect,
    PrintPreview,
    Cancel,
    Close,
    OverlayClose,
    ResultsTable,
    PrintFrame,
}

/// Action name to locator table. Changing a selector on the portal should
/// only ever mean editing this section of the config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Locators {
    pub category_link: Locator,
    pub jurisdiction_select: Locator,
    pub print_preview: Locator,
    pub cancel: Locator,
    pub close: Locator,
    pub overlay_close: Locator,
    pub results_table: Locator,
    pub print_frame: Locator,
}
impl Locators {
    pub fn get(&self, action: Action) -> &Locator {
        match action {
            Action::CategoryLink => &self.category_link,
            Action::JurisdictionSelect => &self.jurisdiction_select,
            Action::PrintPreview => &self.print_preview,
            Action::Cancel => &self.cancel,
            Action::Close => &self.close,
            Action::OverlayClose => &self.overlay_close,
            Action::ResultsTable => &self.results_table,
            Action::PrintFrame => &self.print_frame,
        }
    }
}
impl Default for Locators {
    fn default() -> Self {
        Self {
            category_link: Locator::link_text("{label}"),
            jurisdiction_select: Locator::id("cmbUF"),
            print_preview: Locator::button_text("Visualizar impressão"),
            cancel: Locator::button_text("Cancelar"),
            close: Locator::button_text("Fechar"),
            overlay_close: Locator::button_text("Fechar"),
            results_table: Locator::id("tblContent"),
            print_frame: Locator::id("frameImp"),
        }
    }
}

/// Bounded waits, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeouts {
    pub overlay: u64,
    pub category_link: u64,
    pub jurisdiction_select: u64,
    pub print_preview: u64,
    pub results_table: u64,
    pub close_controls: u64,
    pub print_frame: u64,
    pub poll_interval: u64,
}
impl Timeouts {
    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_interval.max(1))
    }
}
impl Default for Timeouts {
    fn default() -> Self {
        Self {
            overlay: 5_000,
            category_link: 10_000,
            jurisdiction_select: 10_000,
            print_preview: 10_000,
            results_table: 20_000,
            close_controls: 10_000,
            print_frame: 5_000,
            poll_interval: 250,
        }
    }
}

/// Unconditional delays, in milliseconds, for page updates that no
/// readiness check can observe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settle {
    pub before_select: u64,
    pub after_table_visible: u64,
    pub after_extract: u64,
    pub after_close_click: u64,
    pub after_overlay_dismiss: u64,
}
impl Default for Settle {
    fn default() -> Self {
        Self {
            before_select: 1_000,
            after_table_visible: 2_000,
            after_extract: 1_000,
            after_close_click: 1_000,
            after_overlay_dismiss: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Header row supplies keys; each row becomes an object.
    #[default]
    Mapped,
    /// Rows are plain cell lists grouped by jurisdiction.
    Positional,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub mode: ExtractionMode,
    pub jurisdiction_column: String,
    /// Regexes; a row whose first cell matches any of them is a footer.
    pub summary_markers: Vec<String>,
    pub enter_print_frame: bool,
}
impl Default for Extraction {
    fn default() -> Self {
        Self {
            mode: ExtractionMode::Mapped,
            jurisdiction_column: "Jurisdiction".into(),
            summary_markers: vec!["Registros".into()],
            enter_print_frame: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chrome_path: String,
    pub window_width: u32,
    pub window_height: u32,
    pub idle_timeout_seconds: u64,
}
impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_path: "".into(),
            window_width: 1366,
            window_height: 900,
            idle_timeout_seconds: 600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub path: String,
    pub write_index_json: bool,
    pub index_path: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            path: "tabela_dados.json".into(),
            write_index_json: true,
            index_path: "tabela_dados.index.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "gnre-tables.log".into(),
        }
    }
}
