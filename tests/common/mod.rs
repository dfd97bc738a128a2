#![allow(dead_code)]

use gnre_tables::browser::{Browser, BrowserError, BrowserResult, ClickMode, Locator, Readiness};
use gnre_tables::config::{Config, Locators};

pub const SENTINEL: &str = "Todas";

/// Config with the walk matrix shrunk to the fake portal and every delay
/// cut to a few milliseconds.
pub fn fast_config(categories: &[&str]) -> Config {
    let mut cfg = Config::default();
    cfg.portal.url = "http://portal.test/consultarTabelas.jsp".into();
    cfg.categories.labels = categories.iter().map(|c| c.to_string()).collect();
    cfg.jurisdictions.all_sentinel = SENTINEL.into();

    cfg.timeouts.overlay = 20;
    cfg.timeouts.category_link = 40;
    cfg.timeouts.jurisdiction_select = 40;
    cfg.timeouts.print_preview = 40;
    cfg.timeouts.results_table = 40;
    cfg.timeouts.close_controls = 40;
    cfg.timeouts.print_frame = 40;
    cfg.timeouts.poll_interval = 2;

    cfg.settle.before_select = 0;
    cfg.settle.after_table_visible = 0;
    cfg.settle.after_extract = 0;
    cfg.settle.after_close_click = 0;
    cfg.settle.after_overlay_dismiss = 0;
    cfg
}

/// The results table every pair renders: a header, one data row and the
/// record-count footer.
pub fn default_table(category: &str, jurisdiction: &str) -> String {
    format!(
        r#"<table id="tblContent">
<tr><th>Código</th><th>Descrição</th></tr>
<tr><td>{category}-{jurisdiction}</td><td>Comunicação</td></tr>
<tr><td>Registros: 1 a 1 de 1</td><td></td></tr>
</table>"#
    )
}

type Pair = (String, String);

fn pair(c: &str, j: &str) -> Pair {
    (c.to_string(), j.to_string())
}

/// In-memory stand-in for the portal: a category menu, a per-category
/// dialog with a state dropdown, and a print preview holding the table.
pub struct FakePortal {
    loc: Locators,
    pub links: Vec<String>,
    pub options: Vec<String>,
    pub overlay: bool,
    pub fail_navigation: bool,
    pub blocked_print: Vec<Pair>,
    pub hidden_table: Vec<Pair>,
    pub unreadable_table: Vec<Pair>,
    pub blocked_cancel: bool,
    pub lost_session_on_print: Option<Pair>,
    pub table: fn(&str, &str) -> String,

    open_category: Option<String>,
    selected: Option<String>,
    preview_open: bool,
    in_frame: bool,

    pub navigations: Vec<String>,
    pub selections: Vec<Pair>,
    pub prints: Vec<Pair>,
    pub overlay_dismissals: usize,
    pub frames_entered: usize,
}

impl FakePortal {
    pub fn new(links: &[&str], jurisdictions: &[&str]) -> Self {
        let mut options = vec![SENTINEL.to_string()];
        options.extend(jurisdictions.iter().map(|j| j.to_string()));
        Self {
            loc: Locators::default(),
            links: links.iter().map(|l| l.to_string()).collect(),
            options,
            overlay: false,
            fail_navigation: false,
            blocked_print: Vec::new(),
            hidden_table: Vec::new(),
            unreadable_table: Vec::new(),
            blocked_cancel: false,
            lost_session_on_print: None,
            table: default_table,
            open_category: None,
            selected: None,
            preview_open: false,
            in_frame: false,
            navigations: Vec::new(),
            selections: Vec::new(),
            prints: Vec::new(),
            overlay_dismissals: 0,
            frames_entered: 0,
        }
    }

    pub fn block_print(mut self, category: &str, jurisdiction: &str) -> Self {
        self.blocked_print.push(pair(category, jurisdiction));
        self
    }

    pub fn hide_table(mut self, category: &str, jurisdiction: &str) -> Self {
        self.hidden_table.push(pair(category, jurisdiction));
        self
    }

    pub fn unreadable_table(mut self, category: &str, jurisdiction: &str) -> Self {
        self.unreadable_table.push(pair(category, jurisdiction));
        self
    }

    /// The Cancel control never becomes clickable.
    pub fn block_cancel(mut self) -> Self {
        self.blocked_cancel = true;
        self
    }

    pub fn with_overlay(mut self) -> Self {
        self.overlay = true;
        self
    }

    fn current(&self) -> Option<Pair> {
        Some((self.open_category.clone()?, self.selected.clone()?))
    }

    fn current_in(&self, list: &[Pair]) -> bool {
        self.current().is_some_and(|p| list.contains(&p))
    }

    fn is_link(&self, locator: &Locator) -> Option<String> {
        match locator {
            Locator::LinkText(label) if self.links.contains(label) => Some(label.clone()),
            _ => None,
        }
    }
}

impl Browser for FakePortal {
    fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.navigations.push(url.to_string());
        if self.fail_navigation {
            return Err(BrowserError::Navigation(url.to_string()));
        }
        Ok(())
    }

    fn probe(&mut self, locator: &Locator, readiness: Readiness) -> BrowserResult<bool> {
        if self.is_link(locator).is_some() {
            return Ok(readiness == Readiness::Present
                || (self.open_category.is_none() && !self.overlay));
        }
        let ready = if *locator == self.loc.jurisdiction_select {
            self.open_category.is_some()
        } else if *locator == self.loc.print_preview {
            self.selected.is_some()
                && !self.preview_open
                && (readiness == Readiness::Present || !self.current_in(&self.blocked_print))
        } else if *locator == self.loc.cancel {
            self.preview_open && !self.blocked_cancel
        } else if *locator == self.loc.close {
            self.overlay || self.preview_open || self.open_category.is_some()
        } else if *locator == self.loc.results_table {
            self.preview_open && !self.current_in(&self.hidden_table)
        } else if *locator == self.loc.print_frame {
            self.preview_open
        } else {
            false
        };
        Ok(ready)
    }

    fn texts(&mut self, locator: &Locator) -> BrowserResult<Vec<String>> {
        match locator {
            Locator::Tag(t) if t == "a" => Ok(self.links.clone()),
            _ => Ok(Vec::new()),
        }
    }

    fn click(&mut self, locator: &Locator, _mode: ClickMode) -> BrowserResult<()> {
        if let Some(label) = self.is_link(locator) {
            if self.overlay {
                return Err(BrowserError::Intercepted(locator.to_string()));
            }
            self.open_category = Some(label);
            self.selected = None;
            return Ok(());
        }

        if *locator == self.loc.print_preview {
            if self.selected.is_none() || self.current_in(&self.blocked_print) {
                return Err(BrowserError::Intercepted(locator.to_string()));
            }
            let current = self.current();
            if current.is_some() && current == self.lost_session_on_print {
                return Err(BrowserError::SessionLost("devtools socket closed".into()));
            }
            self.prints.extend(current);
            self.preview_open = true;
            return Ok(());
        }

        if *locator == self.loc.cancel {
            return if self.preview_open && !self.blocked_cancel {
                Ok(())
            } else {
                Err(BrowserError::NotFound(locator.to_string()))
            };
        }

        if *locator == self.loc.close {
            if self.overlay {
                self.overlay = false;
                self.overlay_dismissals += 1;
            } else if self.preview_open {
                self.preview_open = false;
            } else if self.open_category.is_some() {
                self.open_category = None;
                self.selected = None;
            } else {
                return Err(BrowserError::NotFound(locator.to_string()));
            }
            return Ok(());
        }

        Err(BrowserError::NotFound(locator.to_string()))
    }

    fn scroll_into_view(&mut self, _locator: &Locator) -> BrowserResult<()> {
        Ok(())
    }

    fn options(&mut self, select: &Locator) -> BrowserResult<Vec<String>> {
        if *select != self.loc.jurisdiction_select || self.open_category.is_none() {
            return Err(BrowserError::NotFound(select.to_string()));
        }
        Ok(self.options.clone())
    }

    fn select_option(&mut self, select: &Locator, label: &str) -> BrowserResult<()> {
        let Some(category) = self.open_category.clone() else {
            return Err(BrowserError::NotFound(select.to_string()));
        };
        if !self.options.iter().any(|o| o == label) {
            return Err(BrowserError::Script(format!("no option {label}")));
        }
        self.selected = Some(label.to_string());
        self.selections.push(pair(&category, label));
        Ok(())
    }

    fn outer_html(&mut self, locator: &Locator) -> BrowserResult<String> {
        if self.current_in(&self.unreadable_table) {
            return Err(BrowserError::Script("table node detached".into()));
        }
        match self.current() {
            Some((c, j)) if *locator == self.loc.results_table && self.preview_open => {
                Ok((self.table)(&c, &j))
            }
            _ => Err(BrowserError::NotFound(locator.to_string())),
        }
    }

    fn enter_frame(&mut self, frame: &Locator) -> BrowserResult<()> {
        if *frame != self.loc.print_frame || !self.preview_open {
            return Err(BrowserError::NotFound(frame.to_string()));
        }
        self.in_frame = true;
        self.frames_entered += 1;
        Ok(())
    }

    fn exit_frames(&mut self) {
        self.in_frame = false;
    }
}
