use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::policy::FaultKind;

/// How an element is found on the page. Every variant reduces to an XPath
/// expression, which is what the browser adapter evaluates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    Id(String),
    Tag(String),
    #[serde(rename = "xpath")]
    XPath(String),
    /// An anchor whose visible text equals the value.
    LinkText(String),
    /// A button wrapping a span whose text equals the value.
    ButtonText(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Self::Id(id.into())
    }

    pub fn link_text(text: impl Into<String>) -> Self {
        Self::LinkText(text.into())
    }

    pub fn button_text(text: impl Into<String>) -> Self {
        Self::ButtonText(text.into())
    }

    /// Substitutes `{label}` in the locator value.
    pub fn with_label(&self, label: &str) -> Self {
        let sub = |s: &str| s.replace("{label}", label);
        match self {
            Self::Id(v) => Self::Id(sub(v)),
            Self::Tag(v) => Self::Tag(sub(v)),
            Self::XPath(v) => Self::XPath(sub(v)),
            Self::LinkText(v) => Self::LinkText(sub(v)),
            Self::ButtonText(v) => Self::ButtonText(sub(v)),
        }
    }

    pub fn to_xpath(&self) -> String {
        match self {
            Self::Id(id) => format!("//*[@id={}]", xpath_literal(id)),
            Self::Tag(tag) => format!("//{tag}"),
            Self::XPath(x) => x.clone(),
            Self::LinkText(text) => {
                format!("//a[normalize-space(.)={}]", xpath_literal(text.trim()))
            }
            Self::ButtonText(text) => format!(
                "//button[.//span[normalize-space(text())={}]]",
                xpath_literal(text.trim())
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(v) => write!(f, "id={v}"),
            Self::Tag(v) => write!(f, "tag={v}"),
            Self::XPath(v) => write!(f, "xpath={v}"),
            Self::LinkText(v) => write!(f, "link {v:?}"),
            Self::ButtonText(v) => write!(f, "button {v:?}"),
        }
    }
}

/// XPath 1.0 has no string escapes, so quotes are handled with `concat()`.
fn xpath_literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{s}'");
    }
    if !s.contains('"') {
        return format!("\"{s}\"");
    }
    let parts: Vec<String> = s.split('\'').map(|p| format!("'{p}'")).collect();
    format!("concat({})", parts.join(", \"'\", "))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Present,
    Visible,
    Clickable,
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Present => "present",
            Self::Visible => "visible",
            Self::Clickable => "clickable",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMode {
    /// Real mouse event at the element's position.
    Native,
    /// `element.click()` dispatched from script, which ignores overlays.
    Dispatch,
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("element not found: {0}")]
    NotFound(String),
    #[error("timed out after {waited:?} waiting for {target} to be {readiness}")]
    Timeout {
        target: String,
        readiness: Readiness,
        waited: Duration,
    },
    #[error("click intercepted on {0}")]
    Intercepted(String),
    #[error("page script failed: {0}")]
    Script(String),
    #[error("navigation failed: {0}")]
    Navigation(String),
    #[error("browser session lost: {0}")]
    SessionLost(String),
}

impl BrowserError {
    pub fn kind(&self) -> FaultKind {
        match self {
            Self::NotFound(_) => FaultKind::NotFound,
            Self::Timeout { .. } => FaultKind::Timeout,
            Self::Intercepted(_) => FaultKind::Intercepted,
            Self::Script(_) | Self::Navigation(_) => FaultKind::Script,
            Self::SessionLost(_) => FaultKind::SessionLost,
        }
    }
}
