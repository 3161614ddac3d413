//! Page cache.
//!
//! Pages are keyed by [`Url::query_url`], so URLs differing only in query
//! or fragment share one entry. The cache is unbounded: entries leave only
//! through [`PageCache::remove`] or [`PageCache::clear_except`].

use std::collections::HashMap;
use std::rc::Rc;

use crate::page::PageRef;
use crate::url::Url;

/// Query-insensitive map from URL to page instance.
#[derive(Default)]
pub struct PageCache {
    entries: HashMap<Url, PageRef>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached page for `url`, ignoring its query.
    pub fn get(&self, url: &Url) -> Option<PageRef> {
        self.entries.get(&url.query_url()).map(Rc::clone)
    }

    /// Cache `page` under `url`, replacing any previous entry.
    pub fn put(&mut self, url: &Url, page: PageRef) {
        self.entries.insert(url.query_url(), page);
    }

    /// Drop the entry for `url`. Returns the removed page.
    pub fn remove(&mut self, url: &Url) -> Option<PageRef> {
        self.entries.remove(&url.query_url())
    }

    /// Drop every entry except the one for `keep`.
    pub fn clear_except(&mut self, keep: Option<&Url>) {
        let keep = keep.map(Url::query_url);
        self.entries.retain(|key, _| Some(key) == keep.as_ref());
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.entries.contains_key(&url.query_url())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use sitenav_site::Resource;

    use super::*;
    use crate::page::Page;
    use crate::registry::PageType;
    use crate::request::{Request, Response};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn page(s: &str) -> PageRef {
        let resp = Response::with_file(Request::new(url(s)), Resource::file("/x", vec![]));
        let content = crate::pages::unknown(&resp).unwrap();
        Rc::new(RefCell::new(Page::new(PageType::Unknown, resp, content).unwrap()))
    }

    #[test]
    fn query_variants_share_entry() {
        let mut cache = PageCache::new();
        let p = page("mem://d/a.txt?v=1");
        cache.put(&url("mem://d/a.txt?v=1"), Rc::clone(&p));
        let hit = cache.get(&url("mem://d/a.txt?v=2#top")).unwrap();
        assert!(Rc::ptr_eq(&hit, &p));
        assert!(cache.contains(&url("mem://d/a.txt")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_paths_are_distinct() {
        let mut cache = PageCache::new();
        cache.put(&url("mem://d/a"), page("mem://d/a"));
        cache.put(&url("mem://d/b"), page("mem://d/b"));
        cache.put(&url("mem://e/a"), page("mem://e/a"));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn put_replaces() {
        let mut cache = PageCache::new();
        let first = page("mem://d/a");
        let second = page("mem://d/a");
        cache.put(&url("mem://d/a"), Rc::clone(&first));
        cache.put(&url("mem://d/a?x"), Rc::clone(&second));
        assert!(Rc::ptr_eq(&cache.get(&url("mem://d/a")).unwrap(), &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn remove_returns_page() {
        let mut cache = PageCache::new();
        cache.put(&url("mem://d/a"), page("mem://d/a"));
        assert!(cache.remove(&url("mem://d/a?q")).is_some());
        assert!(cache.remove(&url("mem://d/a")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn clear_except_keeps_one() {
        let mut cache = PageCache::new();
        for s in ["mem://d/a", "mem://d/b", "mem://d/c"] {
            cache.put(&url(s), page(s));
        }
        cache.clear_except(Some(&url("mem://d/b?page=2")));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&url("mem://d/b")));

        cache.clear_except(None);
        assert!(cache.is_empty());
    }
}
