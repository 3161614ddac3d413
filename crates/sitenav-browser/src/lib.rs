//! Resource browser core: page cache, background loading, history.
//!
//! The [`Browser`] displays one page at a time for a URL. Pages are built
//! by the [`PageRegistry`] from fetched responses, cached per
//! query-stripped URL in a [`PageCache`], and fetched off the UI thread by
//! an [`AsyncLoader`]. [`NavigationHistory`] tracks back/forward.
//!
//! All decisions happen on the thread that owns the `Browser`. Background
//! work only turns a [`Request`] into a [`Response`]; the owner picks the
//! result up with [`Browser::poll`] or [`Browser::wait_for_load`].

pub mod cache;
pub mod config;
pub mod events;
pub mod history;
pub mod loader;
pub mod page;
pub mod pages;
pub mod registry;
pub mod request;
pub mod url;

#[cfg(test)]
pub(crate) mod test_utils;

// -----------------------------------------------------------------------
// Public re-exports
// -----------------------------------------------------------------------

pub use cache::PageCache;
pub use config::{BrowserConfig, ExtensionTable};
pub use events::{BrowserEvent, Listener, ListenerId};
pub use history::{HistoryPosition, NavigationHistory, SuppressGuard};
pub use loader::{
    AsyncLoader, Delivery, Fetcher, LoadOutcome, SiteFetcher, Spawner, ThreadSpawner,
};
pub use page::{Page, PageAction, PageContent, PageContext, PageEvent, PageRef, UiHandle};
pub use registry::{PageConstructor, PageRegistry, PageType};
pub use request::{Request, RequestId, Response, Status};
pub use url::Url;

// -----------------------------------------------------------------------
// Imports
// -----------------------------------------------------------------------

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use sitenav_site::Resource;
use sitenav_types::error::{Result, SitenavError};

use events::Listeners;

// -----------------------------------------------------------------------
// Browser
// -----------------------------------------------------------------------

/// The orchestrator. Owns the display slot, cache, history and loader.
///
/// Not `Send`: a browser lives on the thread that drives it.
pub struct Browser {
    config: BrowserConfig,
    registry: PageRegistry,
    cache: PageCache,
    loader: AsyncLoader,
    history: NavigationHistory,

    /// The displayed page.
    page: Option<PageRef>,
    /// Element the displayed page asked to focus.
    focus: Option<String>,

    loading: bool,
    status: String,
    activity: String,
    listeners: Listeners,
}

impl Browser {
    /// Browser that fetches on named background threads.
    pub fn new(config: BrowserConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        let spawner = ThreadSpawner::new(&config.loader_thread_name);
        Self::with_spawner(config, fetcher, Box::new(spawner))
    }

    /// Browser with a custom spawner for fetch jobs.
    pub fn with_spawner(
        config: BrowserConfig,
        fetcher: Arc<dyn Fetcher>,
        spawner: Box<dyn Spawner>,
    ) -> Self {
        let registry = PageRegistry::new(&config.extensions, &config.console_header);
        Self {
            config,
            registry,
            cache: PageCache::new(),
            loader: AsyncLoader::new(fetcher, spawner),
            history: NavigationHistory::new(),
            page: None,
            focus: None,
            loading: false,
            status: String::new(),
            activity: String::new(),
            listeners: Listeners::default(),
        }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Page-type registry, for installing custom page types.
    pub fn registry_mut(&mut self) -> &mut PageRegistry {
        &mut self.registry
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub fn cache(&self) -> &PageCache {
        &self.cache
    }

    // ---------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------

    /// Show `url`. A cached page is swapped in immediately; otherwise the
    /// page is fetched in the background and shown on arrival.
    pub fn navigate_to(&mut self, url: &Url) {
        log::info!("navigate to {url}");
        if let Some(page) = self.cache.get(url) {
            log::debug!("page cache hit for {url}");
            self.loader.abandon();
            self.set_loading(false);
            self.set_activity(String::new());
            self.set_status(url.to_string());
            page.borrow_mut().set_display_url(url.clone());
            self.set_page(page, true);
            return;
        }
        self.load(url.clone(), false);
    }

    /// Show the URL written as `text`, resolved against the current page's
    /// URL when relative. Returns the resolved URL.
    pub fn navigate_to_string(&mut self, text: &str) -> Result<Url> {
        let url = match self.current_url() {
            Some(base) => base.resolve(text)?,
            None => Url::parse(text)?,
        };
        self.navigate_to(&url);
        Ok(url)
    }

    /// Follow a link. Same as [`navigate_to_string`](Self::navigate_to_string).
    pub fn perform_url_click(&mut self, text: &str) -> Result<Url> {
        self.navigate_to_string(text)
    }

    /// Show the configured home page.
    pub fn go_home(&mut self) -> Result<Url> {
        let home = Url::parse(&self.config.home_url)?;
        self.navigate_to(&home);
        Ok(home)
    }

    /// Fetch the displayed page again; fresh content replaces the cached
    /// page in place.
    pub fn reload_current(&mut self) {
        if let Some(url) = self.current_url() {
            self.reload_url(&url);
        }
    }

    /// Fetch `url` bypassing the cache. If a page of the same type is
    /// cached for it, that page is rebound rather than replaced.
    pub fn reload_url(&mut self, url: &Url) {
        log::info!("reload {url}");
        self.load(url.clone(), true);
    }

    /// Go back one step. Returns false when there is nothing to go back to.
    pub fn track_back(&mut self) -> bool {
        let Some(target) = self.history.track_back() else {
            return false;
        };
        let _guard = self.history.suppress();
        self.navigate_to(&target);
        true
    }

    /// Go forward one step. Returns false when there is nothing ahead.
    pub fn track_forward(&mut self) -> bool {
        let Some(target) = self.history.track_forward() else {
            return false;
        };
        let _guard = self.history.suppress();
        self.navigate_to(&target);
        true
    }

    pub fn last_url(&self) -> Option<&Url> {
        self.history.last_url()
    }

    pub fn next_url(&self) -> Option<&Url> {
        self.history.next_url()
    }

    /// Forget back/forward history and every cached page except the one
    /// displayed.
    pub fn clear_history(&mut self) {
        self.history.clear();
        let current = self.current_url();
        self.cache.clear_except(current.as_ref());
    }

    /// Drop the cached page for `url`. The display is left alone.
    pub fn remove_page(&mut self, url: &Url) -> Option<PageRef> {
        self.cache.remove(url)
    }

    // ---------------------------------------------------------------
    // Direct display
    // ---------------------------------------------------------------

    /// Display an exception page for `error` at `url`. Never cached.
    pub fn show_exception(&mut self, url: &Url, error: SitenavError) {
        log::warn!("exception at {url}: {error}");
        self.show_failure(Request::new(url.clone()), Arc::new(error), true);
    }

    /// Display a response that was obtained elsewhere. Cached when it
    /// carries a resource.
    pub fn show_response(&mut self, response: Response) {
        self.show_loaded(response, true);
    }

    /// Display `resource` under `url`, reusing its cached page if any.
    pub fn show_resource(&mut self, url: &Url, resource: Resource) {
        let showing = self.current_url().as_ref() == Some(url)
            && self.current_file().as_ref() == Some(&resource);
        if showing {
            return;
        }
        if let Some(page) = self.cache.get(url) {
            page.borrow_mut().set_display_url(url.clone());
            self.set_page(page, true);
            return;
        }
        self.show_loaded(Response::with_file(Request::new(url.clone()), resource), true);
    }

    // ---------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------

    /// Pick up a finished load, if any. Returns whether the display
    /// changed.
    pub fn poll(&mut self) -> bool {
        match self.loader.try_recv() {
            Some(outcome) => {
                self.finish_load(outcome);
                true
            },
            None => false,
        }
    }

    /// Block until the load in flight finishes or `timeout` passes.
    /// Returns whether the display changed.
    pub fn wait_for_load(&mut self, timeout: Duration) -> bool {
        match self.loader.recv_timeout(timeout) {
            Some(outcome) => {
                self.finish_load(outcome);
                true
            },
            None => false,
        }
    }

    fn load(&mut self, url: Url, reload: bool) {
        let mut request = Request::new(url);
        request.reload = reload;
        request.record_history = self.history.is_recording();
        self.issue(request);
    }

    fn issue(&mut self, request: Request) {
        let url = request.url.clone();
        self.loader.load(request);
        self.set_loading(true);
        self.set_status(format!("Loading {url}"));
        self.set_activity("Loading".to_string());
    }

    fn finish_load(&mut self, outcome: LoadOutcome) {
        self.set_loading(false);
        self.set_activity(String::new());
        match outcome {
            LoadOutcome::Loaded(response) => {
                log::info!("loaded {} ({})", response.url(), response.status.code());
                self.set_status(response.url().to_string());
                let record = response.request.record_history;
                self.show_loaded(response, record);
            },
            LoadOutcome::Failed { request, error } => {
                log::warn!("failed to load {}: {error}", request.url);
                self.set_status(format!("Failed: {}", request.url));
                let record = request.record_history;
                self.show_failure(request, error, record);
            },
        }
    }

    // ---------------------------------------------------------------
    // Page construction and swapping
    // ---------------------------------------------------------------

    /// The cached page a reload response should be rebound into, if any.
    fn reusable_page(&self, response: &Response) -> Option<PageRef> {
        if !response.request.reload {
            return None;
        }
        let page = self.cache.get(response.url())?;
        let same_kind = page.borrow().kind() == self.registry.resolve_page_type(response);
        same_kind.then_some(page)
    }

    fn show_loaded(&mut self, response: Response, record: bool) {
        if response.request.reload && response.file.is_none() {
            // The resource is gone; its cached page must not come back.
            self.cache.remove(response.url());
        }
        if let Some(page) = self.reusable_page(&response) {
            let request = response.request.clone();
            let rebound = page.borrow_mut().rebind(response);
            match rebound {
                Ok(()) => self.set_page(page, record),
                Err(e) => {
                    self.cache.remove(&request.url);
                    self.show_failure(request, Arc::new(e), record);
                },
            }
            return;
        }

        let request = response.request.clone();
        let cacheable = response.file.is_some();
        match self.registry.create_page(response) {
            Ok(page) => {
                let page = Rc::new(RefCell::new(page));
                if cacheable {
                    self.cache.put(&request.url, Rc::clone(&page));
                }
                self.set_page(page, record);
            },
            Err(e) => {
                log::warn!("could not build page for {}: {e}", request.url);
                self.show_failure(request, Arc::new(e), record);
            },
        }
    }

    fn show_failure(&mut self, request: Request, error: Arc<SitenavError>, record: bool) {
        let page = self
            .registry
            .create_exception_page(Response::failed(request, error));
        self.set_page(Rc::new(RefCell::new(page)), record);
    }

    /// Swap `page` into the display slot.
    ///
    /// Order: outgoing `on_removed`, slot reassigned, incoming `build_ui`,
    /// `on_added`, focus, history, then `PageChanged`. Swapping in the page
    /// already shown only rebuilds it.
    fn set_page(&mut self, page: PageRef, record: bool) {
        let same = self.page.as_ref().is_some_and(|p| Rc::ptr_eq(p, &page));
        if !same {
            if let Some(outgoing) = self.page.take() {
                outgoing.borrow_mut().notify_removed(self.loading);
            }
            self.page = Some(Rc::clone(&page));
        }

        let built = page.borrow_mut().build_ui().map(|_| ());
        if let Err(e) = built {
            let url = page.borrow().url().clone();
            log::warn!("render error for {url}: {e}");
            if same {
                page.borrow_mut().notify_removed(self.loading);
            }
            self.page = None;
            self.cache.remove(&url);
            self.show_failure(Request::new(url), Arc::new(e), record);
            return;
        }

        if !same {
            page.borrow_mut().notify_added(self.loading);
        }
        self.focus = page.borrow().first_focus_target();
        let url = page.borrow().url().clone();
        if record {
            self.history.record_visit(&url);
        }
        self.emit(BrowserEvent::PageChanged { url: Some(url) });
    }

    // ---------------------------------------------------------------
    // Page events
    // ---------------------------------------------------------------

    /// Route `event` to the displayed page and carry out what it asks
    /// for. Page errors become an exception page.
    pub fn dispatch_event(&mut self, event: &PageEvent) {
        let Some(page) = self.page.clone() else {
            return;
        };
        let result = page.borrow_mut().handle_event(event);
        let page_url = page.borrow().url().clone();
        match result {
            Ok(action) => self.perform(action, &page_url),
            Err(e) => self.show_exception(&page_url, e),
        }
    }

    fn perform(&mut self, action: PageAction, page_url: &Url) {
        match action {
            PageAction::None => {},
            PageAction::Navigate(text) => match page_url.resolve(&text) {
                Ok(url) => self.navigate_to(&url),
                Err(e) => self.show_exception(page_url, e),
            },
            PageAction::Reload => self.reload_url(page_url),
            PageAction::Retry => {
                log::info!("retry {page_url}");
                self.load(page_url.clone(), false);
            },
        }
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn current_page(&self) -> Option<PageRef> {
        self.page.as_ref().map(Rc::clone)
    }

    pub fn current_url(&self) -> Option<Url> {
        self.page.as_ref().map(|p| p.borrow().url().clone())
    }

    pub fn current_file(&self) -> Option<Resource> {
        self.page.as_ref().and_then(|p| p.borrow().file().cloned())
    }

    /// Display of the current page as last built.
    pub fn current_ui(&self) -> Option<UiHandle> {
        self.page.as_ref().and_then(|p| p.borrow().ui().cloned())
    }

    /// Element the displayed page wants focused.
    pub fn focus_target(&self) -> Option<&str> {
        self.focus.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// What the browser is showing.
    pub fn status_text(&self) -> &str {
        &self.status
    }

    /// What the browser is doing.
    pub fn activity_text(&self) -> &str {
        &self.activity
    }

    // ---------------------------------------------------------------
    // Property changes
    // ---------------------------------------------------------------

    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        self.listeners.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    fn emit(&mut self, event: BrowserEvent) {
        self.listeners.emit(&event);
    }

    fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.emit(BrowserEvent::LoadingChanged(loading));
        }
    }

    fn set_status(&mut self, status: String) {
        if self.status != status {
            self.status = status.clone();
            self.emit(BrowserEvent::StatusChanged(status));
        }
    }

    fn set_activity(&mut self, activity: String) {
        if self.activity != activity {
            self.activity = activity.clone();
            self.emit(BrowserEvent::ActivityChanged(activity));
        }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
