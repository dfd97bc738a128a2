use crate::{
    browser::{Browser, BrowserError, ClickMode, Readiness},
    config::{Action, Config},
    extract::{Extracted, TableExtractor},
    guard::DialogGuard,
    policy::{self, Disposition, FaultKind, Step},
    report::{FaultReport, PairReport, RunReport, SkippedCategory, WalkState},
    store::ResultDocument,
    util::settle,
    wait,
};
use anyhow::{Context, Result};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
#[error("{step} failed: {message}")]
pub struct StepFault {
    pub step: Step,
    pub kind: FaultKind,
    pub message: String,
}

impl StepFault {
    fn browser(step: Step, err: BrowserError) -> Self {
        Self {
            step,
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn disposition(&self) -> Disposition {
        policy::decide(self.step, self.kind)
    }

    fn report(&self) -> FaultReport {
        FaultReport {
            step: self.step,
            disposition: self.disposition(),
            message: self.message.clone(),
        }
    }
}

type StepResult<T> = std::result::Result<T, StepFault>;

/// Drives one browser session through every configured category and each
/// of its jurisdictions, accumulating rows into a [`ResultDocument`].
pub struct Walker<B: Browser> {
    cfg: Config,
    browser: B,
    guard: DialogGuard,
    extractor: TableExtractor,
    state: WalkState,
}

impl<B: Browser> Walker<B> {
    pub fn new(cfg: &Config, browser: B) -> Result<Self> {
        Ok(Self {
            cfg: cfg.clone(),
            browser,
            guard: DialogGuard::new(cfg),
            extractor: TableExtractor::new(cfg)?,
            state: WalkState::Idle,
        })
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn into_browser(self) -> B {
        self.browser
    }

    /// Walks the whole matrix. Only failing to open the portal is an error;
    /// every later fault is settled by [`policy::decide`] and reported.
    pub fn run(&mut self, doc: &mut ResultDocument) -> Result<RunReport> {
        let url = self.cfg.portal.url.clone();
        info!("opening {url}");
        self.browser
            .navigate(&url)
            .with_context(|| format!("opening portal {url}"))?;
        self.enter(WalkState::Idle);

        let mut report = RunReport::default();
        let labels = self.cfg.categories.labels.clone();
        for category in &labels {
            match self.walk_category(category, doc, &mut report) {
                Ok(()) => report.categories_walked.push(category.clone()),
                Err(fault) if fault.disposition() == Disposition::AbortRun => {
                    error!("aborting run in category {category:?}: {fault}");
                    report.aborted = Some(fault.report());
                    break;
                }
                Err(fault) => {
                    warn!("skipping category {category:?}: {fault}");
                    report.skipped_categories.push(SkippedCategory {
                        category: category.clone(),
                        fault: fault.report(),
                    });
                }
            }
        }

        self.guard.reset_to_top_context(&mut self.browser);
        self.enter(WalkState::Closed);
        info!(
            "walk finished: {} pairs, {} rows, {} categories skipped",
            report.pairs.len(),
            report.total_rows(),
            report.skipped_categories.len()
        );
        Ok(report)
    }

    fn walk_category(
        &mut self,
        category: &str,
        doc: &mut ResultDocument,
        report: &mut RunReport,
    ) -> StepResult<()> {
        self.open_category(category)?;
        let jurisdictions = self.list_jurisdictions()?;
        info!("category {category:?}: {} jurisdictions", jurisdictions.len());

        for jurisdiction in &jurisdictions {
            let mut pair = PairReport {
                category: category.to_string(),
                jurisdiction: jurisdiction.clone(),
                reached: WalkState::CategorySelected,
                rows: 0,
                faults: Vec::new(),
            };
            let outcome = self.walk_pair(category, jurisdiction, doc, &mut pair);
            if let Err(fault) = &outcome {
                pair.faults.push(fault.report());
            }
            report.pairs.push(pair);

            if let Err(fault) = outcome {
                match fault.disposition() {
                    Disposition::Proceed | Disposition::SkipPair => {
                        warn!("skipping {jurisdiction:?} in {category:?}: {fault}");
                    }
                    Disposition::SkipCategory | Disposition::AbortRun => {
                        self.enter(WalkState::Idle);
                        return Err(fault);
                    }
                }
            }
            self.enter(WalkState::CategorySelected);
        }

        self.enter(WalkState::Idle);
        Ok(())
    }

    fn open_category(&mut self, category: &str) -> StepResult<()> {
        // The overlay can reappear right after the frame reset.
        self.guard.dismiss_overlay(&mut self.browser);
        self.guard.reset_to_top_context(&mut self.browser);
        self.guard.dismiss_overlay(&mut self.browser);

        let link = self
            .cfg
            .locators
            .get(Action::CategoryLink)
            .with_label(category);
        let timeout = Duration::from_millis(self.cfg.timeouts.category_link);
        wait::until(
            &mut self.browser,
            &link,
            Readiness::Clickable,
            timeout,
            self.cfg.timeouts.poll(),
        )
        .and_then(|()| self.browser.click(&link, ClickMode::Native))
        .map_err(|e| StepFault::browser(Step::OpenCategory, e))?;

        self.enter(WalkState::CategorySelected);
        Ok(())
    }

    fn list_jurisdictions(&mut self) -> StepResult<Vec<String>> {
        let fault = |e| StepFault::browser(Step::ListJurisdictions, e);
        self.wait_for(
            Action::JurisdictionSelect,
            Readiness::Present,
            self.cfg.timeouts.jurisdiction_select,
        )
        .map_err(fault)?;
        let options = self
            .browser
            .options(self.cfg.locators.get(Action::JurisdictionSelect))
            .map_err(fault)?;

        let sentinel = self.cfg.jurisdictions.all_sentinel.trim();
        Ok(options
            .into_iter()
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty() && o != sentinel)
            .collect())
    }

    fn walk_pair(
        &mut self,
        category: &str,
        jurisdiction: &str,
        doc: &mut ResultDocument,
        pair: &mut PairReport,
    ) -> StepResult<()> {
        settle(self.cfg.settle.before_select, "before jurisdiction select");
        self.browser
            .select_option(self.cfg.locators.get(Action::JurisdictionSelect), jurisdiction)
            .map_err(|e| StepFault::browser(Step::SelectJurisdiction, e))?;
        self.advance(pair, WalkState::JurisdictionSelected);

        self.press(Action::PrintPreview, self.cfg.timeouts.print_preview)
            .map_err(|e| StepFault::browser(Step::TriggerPrint, e))?;
        self.advance(pair, WalkState::PrintTriggered);

        let rows = match self.await_table(pair) {
            Ok(()) => {
                info!("table found for {jurisdiction:?} in {category:?}");
                self.advance(pair, WalkState::TableVisible);
                settle(self.cfg.settle.after_table_visible, "table visible");
                match self.extractor.try_extract(&mut self.browser, Some(jurisdiction)) {
                    Ok(rows) => rows,
                    Err(e) => {
                        let fault = StepFault {
                            step: Step::Extract,
                            kind: e.kind(),
                            message: e.to_string(),
                        };
                        self.note(pair, fault)?;
                        Extracted::empty(self.extractor.mode())
                    }
                }
            }
            Err(fault) => {
                self.note(pair, fault)?;
                Extracted::empty(self.extractor.mode())
            }
        };
        if self.cfg.extraction.enter_print_frame {
            self.guard.reset_to_top_context(&mut self.browser);
        }
        if rows.is_empty() {
            info!("no relevant rows for {jurisdiction:?} in {category:?}");
        }

        let merged = doc
            .merge(category, jurisdiction, rows)
            .map_err(|e| StepFault {
                step: Step::Merge,
                kind: FaultKind::Store,
                message: e.to_string(),
            });
        if let Ok(n) = merged {
            pair.rows = n;
            self.advance(pair, WalkState::Extracted);
            settle(self.cfg.settle.after_extract, "after extract");
        }

        // Dialogs are closed even when the merge failed.
        self.close_dialogs(pair)?;
        merged.map(|_| ())
    }

    fn await_table(&mut self, pair: &mut PairReport) -> StepResult<()> {
        if self.cfg.extraction.enter_print_frame {
            let entered = self
                .wait_for(
                    Action::PrintFrame,
                    Readiness::Present,
                    self.cfg.timeouts.print_frame,
                )
                .and_then(|()| {
                    self.browser
                        .enter_frame(self.cfg.locators.get(Action::PrintFrame))
                });
            match entered {
                Ok(()) => debug!("switched into print frame"),
                Err(e) => self.note(pair, StepFault::browser(Step::EnterFrame, e))?,
            }
        }

        self.wait_for(
            Action::ResultsTable,
            Readiness::Visible,
            self.cfg.timeouts.results_table,
        )
        .map_err(|e| StepFault::browser(Step::AwaitTable, e))
    }

    fn close_dialogs(&mut self, pair: &mut PairReport) -> StepResult<()> {
        for action in [Action::Cancel, Action::Close] {
            match self.press(action, self.cfg.timeouts.close_controls) {
                Ok(()) => {
                    info!("{} clicked", self.cfg.locators.get(action));
                    settle(self.cfg.settle.after_close_click, "after close click");
                }
                Err(e) => self.note(pair, StepFault::browser(Step::CloseDialogs, e))?,
            }
        }
        self.advance(pair, WalkState::Closed);
        Ok(())
    }

    /// Records a fault the pair can survive; anything worse is handed back.
    fn note(&self, pair: &mut PairReport, fault: StepFault) -> StepResult<()> {
        if fault.disposition() != Disposition::Proceed {
            return Err(fault);
        }
        warn!(
            "{} / {}: {fault}; continuing",
            pair.category, pair.jurisdiction
        );
        pair.faults.push(fault.report());
        Ok(())
    }

    fn wait_for(
        &mut self,
        action: Action,
        readiness: Readiness,
        timeout_ms: u64,
    ) -> std::result::Result<(), BrowserError> {
        wait::until(
            &mut self.browser,
            self.cfg.locators.get(action),
            readiness,
            Duration::from_millis(timeout_ms),
            self.cfg.timeouts.poll(),
        )
    }

    /// Waits for a control, scrolls to it and clicks it from script so a
    /// transient overlay cannot intercept the click.
    fn press(&mut self, action: Action, timeout_ms: u64) -> std::result::Result<(), BrowserError> {
        self.wait_for(action, Readiness::Clickable, timeout_ms)?;
        let loc = self.cfg.locators.get(action);
        if let Err(e) = self.browser.scroll_into_view(loc) {
            debug!("scroll to {loc} failed: {e}");
        }
        self.browser.click(loc, ClickMode::Dispatch)
    }

    fn advance(&mut self, pair: &mut PairReport, state: WalkState) {
        self.enter(state);
        pair.reached = state;
    }

    fn enter(&mut self, state: WalkState) {
        debug!("state {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}
