use crate::{
    browser::{Browser, BrowserError, ClickMode, Locator, Readiness},
    config::{Action, Config},
    util::settle,
    wait,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Clears the overlay dialogs the portal raises after page changes, and
/// returns lookups to the top-level document.
pub struct DialogGuard {
    close: Locator,
    timeout: Duration,
    poll: Duration,
    settle_ms: u64,
}

impl DialogGuard {
    pub fn new(cfg: &Config) -> Self {
        Self {
            close: cfg.locators.get(Action::OverlayClose).clone(),
            timeout: Duration::from_millis(cfg.timeouts.overlay),
            poll: cfg.timeouts.poll(),
            settle_ms: cfg.settle.after_overlay_dismiss,
        }
    }

    /// Returns true when a dialog was found and dismissed. Absence of a
    /// dialog is the normal case and costs at most the overlay timeout.
    pub fn dismiss_overlay(&self, browser: &mut dyn Browser) -> bool {
        match wait::until(browser, &self.close, Readiness::Clickable, self.timeout, self.poll) {
            Ok(()) => {}
            Err(BrowserError::Timeout { .. }) => {
                debug!("no overlay dialog detected");
                return false;
            }
            Err(e) => {
                warn!("overlay check failed: {e}");
                return false;
            }
        }

        if let Err(e) = browser.scroll_into_view(&self.close) {
            debug!("overlay scroll failed: {e}");
        }
        match browser.click(&self.close, ClickMode::Dispatch) {
            Ok(()) => {
                info!("overlay dialog dismissed");
                settle(self.settle_ms, "overlay dismissed");
                true
            }
            Err(e) => {
                warn!("overlay close click failed: {e}");
                false
            }
        }
    }

    pub fn reset_to_top_context(&self, browser: &mut dyn Browser) {
        browser.exit_frames();
        debug!("back to top-level document");
    }
}
