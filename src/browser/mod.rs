pub mod chrome;
pub mod types;

pub use types::{BrowserError, ClickMode, Locator, Readiness};

pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// The page-driving primitives the walker needs. Calls are single-shot:
/// bounded waiting is layered on top in [`crate::wait`].
///
/// Element lookups are relative to the current frame context, which starts
/// at the top-level document.
pub trait Browser {
    fn navigate(&mut self, url: &str) -> BrowserResult<()>;

    /// Whether the first element matching `locator` currently satisfies `readiness`.
    fn probe(&mut self, locator: &Locator, readiness: Readiness) -> BrowserResult<bool>;

    /// Trimmed inner text of every matching element, in document order.
    fn texts(&mut self, locator: &Locator) -> BrowserResult<Vec<String>>;

    fn click(&mut self, locator: &Locator, mode: ClickMode) -> BrowserResult<()>;

    fn scroll_into_view(&mut self, locator: &Locator) -> BrowserResult<()>;

    /// Option labels of a `<select>`, in display order.
    fn options(&mut self, select: &Locator) -> BrowserResult<Vec<String>>;

    fn select_option(&mut self, select: &Locator, label: &str) -> BrowserResult<()>;

    fn outer_html(&mut self, locator: &Locator) -> BrowserResult<String>;

    fn enter_frame(&mut self, frame: &Locator) -> BrowserResult<()>;

    /// Back to the top-level document. Never fails.
    fn exit_frames(&mut self);
}
