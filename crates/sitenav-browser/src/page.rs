//! Pages: the displayable objects the browser caches and swaps.
//!
//! A [`Page`] is the browser's binding of one URL and one [`Response`] to a
//! page-type implementation ([`PageContent`]). Page types are collaborators:
//! the core calls their hooks in a fixed order but does not care how they
//! render.

use std::cell::RefCell;
use std::rc::Rc;

use sitenav_site::Resource;
use sitenav_types::error::Result;

use crate::registry::PageType;
use crate::request::Response;
use crate::url::Url;

/// Shared handle to a page. The cache and the display slot hold clones of
/// the same handle, so identity is observable with `Rc::ptr_eq`.
pub type PageRef = Rc<RefCell<Page>>;

/// What a page type produced for display: a title and text lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiHandle {
    pub title: String,
    pub lines: Vec<String>,
}

impl UiHandle {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// All lines joined with newlines.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Input routed to the displayed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// A link inside the page was activated.
    LinkClicked(String),
    /// The page's primary action (e.g. the login button).
    Confirm,
    /// Free-form input for page types that accept it.
    Input(String),
}

/// What the page asks the browser to do in response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    None,
    /// Navigate to a URL, resolved against the page's URL.
    Navigate(String),
    /// Reload this page.
    Reload,
    /// Re-attempt the navigation that produced this page, bypassing the
    /// cache.
    Retry,
}

/// Browser state visible to page hooks.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub url: &'a Url,
    pub loading: bool,
}

/// Contract every page type implements.
pub trait PageContent {
    /// Attach the response the page should display. Called once after
    /// construction and again whenever the page is reloaded in place.
    fn bind(&mut self, response: &Response) -> Result<()>;

    /// Build the page's display. Errors become an exception page.
    fn build_ui(&mut self, response: &Response) -> Result<UiHandle>;

    /// The page became the displayed page.
    fn on_added(&mut self, _ctx: &PageContext<'_>) {}

    /// The page is about to stop being the displayed page.
    fn on_removed(&mut self, _ctx: &PageContext<'_>) {}

    /// Name of the element that should receive focus when shown.
    fn first_focus_target(&self) -> Option<&str> {
        None
    }

    /// React to input. Errors become an exception page.
    fn handle_event(&mut self, _event: &PageEvent) -> Result<PageAction> {
        Ok(PageAction::None)
    }
}

/// A page instance: type, bound response, and the last built display.
pub struct Page {
    kind: PageType,
    response: Response,
    ui: Option<UiHandle>,
    content: Box<dyn PageContent>,
}

impl Page {
    /// Bind `content` to `response`.
    pub fn new(
        kind: PageType,
        response: Response,
        mut content: Box<dyn PageContent>,
    ) -> Result<Self> {
        content.bind(&response)?;
        Ok(Self::prebound(kind, response, content))
    }

    /// Wrap content that was already built from `response`.
    pub(crate) fn prebound(
        kind: PageType,
        response: Response,
        content: Box<dyn PageContent>,
    ) -> Self {
        Self {
            kind,
            response,
            ui: None,
            content,
        }
    }

    pub fn kind(&self) -> PageType {
        self.kind
    }

    /// The URL the page is displayed under.
    pub fn url(&self) -> &Url {
        self.response.url()
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn file(&self) -> Option<&Resource> {
        self.response.file.as_ref()
    }

    /// Title of the last built display, or the file name.
    pub fn title(&self) -> String {
        match &self.ui {
            Some(ui) if !ui.title.is_empty() => ui.title.clone(),
            _ => self.url().file_name().to_string(),
        }
    }

    /// Last built display, if any.
    pub fn ui(&self) -> Option<&UiHandle> {
        self.ui.as_ref()
    }

    /// Show the page under a different URL (e.g. another query) without
    /// reloading its content.
    pub fn set_display_url(&mut self, url: Url) {
        if self.response.request.url != url {
            self.response = self.response.readdressed(url);
            self.ui = None;
        }
    }

    /// Replace the bound response, keeping this page instance.
    pub fn rebind(&mut self, response: Response) -> Result<()> {
        self.content.bind(&response)?;
        self.response = response;
        self.ui = None;
        Ok(())
    }

    /// Build (or rebuild) the display.
    pub fn build_ui(&mut self) -> Result<&UiHandle> {
        let ui = self.content.build_ui(&self.response)?;
        Ok(self.ui.insert(ui))
    }

    pub fn notify_added(&mut self, loading: bool) {
        let ctx = PageContext {
            url: self.response.url(),
            loading,
        };
        self.content.on_added(&ctx);
    }

    pub fn notify_removed(&mut self, loading: bool) {
        let ctx = PageContext {
            url: self.response.url(),
            loading,
        };
        self.content.on_removed(&ctx);
    }

    pub fn first_focus_target(&self) -> Option<String> {
        self.content.first_focus_target().map(str::to_string)
    }

    pub fn handle_event(&mut self, event: &PageEvent) -> Result<PageAction> {
        self.content.handle_event(event)
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("kind", &self.kind)
            .field("url", &self.url().to_string())
            .field("status", &self.response.status)
            .finish()
    }
}
