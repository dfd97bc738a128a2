use crate::browser::{Browser, BrowserError, BrowserResult, Locator, Readiness};
use std::time::{Duration, Instant};

/// Polls `locator` until it satisfies `readiness` or `timeout` elapses.
///
/// Lookup errors during polling count as "not ready yet"; only a lost
/// session ends the wait early. The call never sleeps past the deadline.
pub fn until(
    browser: &mut dyn Browser,
    locator: &Locator,
    readiness: Readiness,
    timeout: Duration,
    poll: Duration,
) -> BrowserResult<()> {
    let started = Instant::now();
    loop {
        match browser.probe(locator, readiness) {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e @ BrowserError::SessionLost(_)) => return Err(e),
            Err(_) => {}
        }

        let waited = started.elapsed();
        if waited >= timeout {
            return Err(BrowserError::Timeout {
                target: locator.to_string(),
                readiness,
                waited,
            });
        }
        std::thread::sleep(poll.min(timeout - waited));
    }
}
