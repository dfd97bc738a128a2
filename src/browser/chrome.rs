use super::{Browser, BrowserError, BrowserResult, ClickMode, Locator, Readiness};
use crate::config::Config;
use anyhow::{Result, anyhow};
use headless_chrome::{Browser as Chrome, LaunchOptions, Tab};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A Chrome session driven over the DevTools protocol. Element work is done
/// by evaluating small scripts against the current frame's document; every
/// script answers with a JSON envelope so results come back by value.
pub struct ChromeBrowser {
    // Dropping the handle closes the browser process.
    _chrome: Chrome,
    tab: Arc<Tab>,
    frames: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    error: String,
    #[serde(default)]
    detail: String,
}

impl ChromeBrowser {
    pub fn launch(cfg: &Config) -> Result<Self> {
        let b = &cfg.browser;
        let options = LaunchOptions::default_builder()
            .headless(b.headless)
            .window_size(Some((b.window_width, b.window_height)))
            .idle_browser_timeout(Duration::from_secs(b.idle_timeout_seconds))
            .path(resolve_chrome_path(&b.chrome_path))
            .build()
            .map_err(|e| anyhow!("invalid chrome launch options: {e}"))?;

        let chrome = Chrome::new(options).map_err(|e| anyhow!("launching chrome: {e:#}"))?;
        let tab = chrome
            .new_tab()
            .map_err(|e| anyhow!("opening chrome tab: {e:#}"))?;
        info!("chrome started headless={}", b.headless);

        Ok(Self {
            _chrome: chrome,
            tab,
            frames: Vec::new(),
        })
    }

    fn run<T: DeserializeOwned>(&self, locator: &Locator, body: &str) -> BrowserResult<T> {
        let script = wrap_script(&self.frames, &locator.to_xpath(), body);
        let remote = self
            .tab
            .evaluate(&script, false)
            .map_err(|e| classify_devtools_error(&format!("{e:#}")))?;

        let raw = match remote.value {
            Some(serde_json::Value::String(s)) => s,
            other => {
                return Err(BrowserError::Script(format!(
                    "unexpected script result for {locator}: {other:?}"
                )));
            }
        };
        let env: Envelope = serde_json::from_str(&raw)
            .map_err(|e| BrowserError::Script(format!("bad script envelope: {e}")))?;

        if !env.ok {
            return Err(match env.error.as_str() {
                "not_found" => BrowserError::NotFound(locator.to_string()),
                "frame" => BrowserError::NotFound(format!("frame {}", env.detail)),
                _ => BrowserError::Script(env.detail),
            });
        }
        serde_json::from_value(env.value)
            .map_err(|e| BrowserError::Script(format!("decoding result for {locator}: {e}")))
    }

    fn native_click(&self, locator: &Locator) -> BrowserResult<()> {
        let xpath = locator.to_xpath();
        let el = self
            .tab
            .find_element_by_xpath(&xpath)
            .map_err(|_| BrowserError::NotFound(locator.to_string()))?;
        el.scroll_into_view()
            .and_then(|el| el.click())
            .map_err(|e| BrowserError::Intercepted(format!("{locator}: {e:#}")))?;
        Ok(())
    }
}

impl Browser for ChromeBrowser {
    fn navigate(&mut self, url: &str) -> BrowserResult<()> {
        self.frames.clear();
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| BrowserError::Navigation(format!("{url}: {e:#}")))?;
        Ok(())
    }

    fn probe(&mut self, locator: &Locator, readiness: Readiness) -> BrowserResult<bool> {
        let body = format!(
            r#"const el = nodes[0];
if (!el) return done(false);
const want = {want};
if (want === "present") return done(true);
const st = win.getComputedStyle(el);
const shown = st.visibility !== "hidden" && st.display !== "none"
  && (el.offsetWidth > 0 || el.offsetHeight > 0 || el.getClientRects().length > 0);
if (want === "visible") return done(shown);
return done(shown && !el.disabled && el.getAttribute("aria-disabled") !== "true");"#,
            want = js_str(&readiness.to_string()),
        );
        self.run(locator, &body)
    }

    fn texts(&mut self, locator: &Locator) -> BrowserResult<Vec<String>> {
        self.run(
            locator,
            r#"return done(nodes.map(n => (n.innerText || n.textContent || "").trim()));"#,
        )
    }

    fn click(&mut self, locator: &Locator, mode: ClickMode) -> BrowserResult<()> {
        if mode == ClickMode::Native && self.frames.is_empty() {
            return self.native_click(locator);
        }
        if mode == ClickMode::Native {
            debug!("native click unavailable inside a frame; dispatching on {locator}");
        }
        let _: bool = self.run(
            locator,
            r#"const el = nodes[0];
if (!el) return fail("not_found", "");
el.click();
return done(true);"#,
        )?;
        Ok(())
    }

    fn scroll_into_view(&mut self, locator: &Locator) -> BrowserResult<()> {
        let _: bool = self.run(
            locator,
            r#"const el = nodes[0];
if (!el) return fail("not_found", "");
el.scrollIntoView(true);
return done(true);"#,
        )?;
        Ok(())
    }

    fn options(&mut self, select: &Locator) -> BrowserResult<Vec<String>> {
        self.run(
            select,
            r#"const el = nodes[0];
if (!el) return fail("not_found", "");
return done(Array.from(el.options || []).map(o => (o.text || "").trim()));"#,
        )
    }

    fn select_option(&mut self, select: &Locator, label: &str) -> BrowserResult<()> {
        let body = format!(
            r#"const el = nodes[0];
if (!el) return fail("not_found", "");
const label = {label};
const idx = Array.from(el.options || []).findIndex(o => (o.text || "").trim() === label);
if (idx < 0) return fail("script", "no option " + label);
el.selectedIndex = idx;
el.options[idx].selected = true;
el.dispatchEvent(new Event("change", {{ bubbles: true }}));
return done(true);"#,
            label = js_str(label.trim()),
        );
        let _: bool = self.run(select, &body)?;
        Ok(())
    }

    fn outer_html(&mut self, locator: &Locator) -> BrowserResult<String> {
        self.run(
            locator,
            r#"const el = nodes[0];
if (!el) return fail("not_found", "");
return done(el.outerHTML);"#,
        )
    }

    fn enter_frame(&mut self, frame: &Locator) -> BrowserResult<()> {
        let _: bool = self.run(
            frame,
            r#"const el = nodes[0];
if (!el || !(el.contentDocument || el.contentWindow)) return fail("not_found", "");
return done(true);"#,
        )?;
        self.frames.push(frame.to_xpath());
        Ok(())
    }

    fn exit_frames(&mut self) {
        self.frames.clear();
    }
}

fn wrap_script(frames: &[String], xpath: &str, body: &str) -> String {
    let frames = serde_json::to_string(frames).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
const done = (v) => JSON.stringify({{ ok: true, value: v }});
const fail = (k, d) => JSON.stringify({{ ok: false, error: k, detail: String(d) }});
try {{
  let root = document;
  for (const fx of {frames}) {{
    const f = root.evaluate(fx, root, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue;
    const next = f && (f.contentDocument || (f.contentWindow && f.contentWindow.document));
    if (!next) return fail("frame", fx);
    root = next;
  }}
  const win = root.defaultView || window;
  const snap = root.evaluate({xpath}, root, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
  const nodes = [];
  for (let i = 0; i < snap.snapshotLength; i++) nodes.push(snap.snapshotItem(i));
  {body}
}} catch (e) {{
  return fail("script", e);
}}
}})()"#,
        xpath = js_str(xpath),
    )
}

// Substrings of DevTools errors raised once the connection or the browser
// process is gone.
const SESSION_GONE: &[&str] = &[
    "connection is closed",
    "connection closed",
    "closed channel",
    "channel closed",
    "broken pipe",
    "browser process",
    "target closed",
    "no target with given id",
    "session with given id not found",
];

/// Only a dead connection or browser is fatal. Errors such as a destroyed
/// execution context or a method-call timeout happen while the page
/// re-renders and are retried by the next poll.
fn classify_devtools_error(message: &str) -> BrowserError {
    let lower = message.to_lowercase();
    if SESSION_GONE.iter().any(|m| lower.contains(m)) {
        BrowserError::SessionLost(message.to_string())
    } else {
        BrowserError::Script(message.to_string())
    }
}

fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn resolve_chrome_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        if let Ok(env_val) = std::env::var("CHROME_PATH") {
            let p = expand_tilde(&env_val);
            if p.exists() {
                return Some(p);
            }
        }
        return None;
    }
    Some(expand_tilde(raw))
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}
