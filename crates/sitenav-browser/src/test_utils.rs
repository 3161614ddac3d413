//! Shared test utilities for the browser crate.
//!
//! [`ManualSpawner`] queues fetch jobs instead of running them, so tests
//! decide when (and in which order) background work completes.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;

use sitenav_site::MemorySite;
use sitenav_types::error::Result;

use crate::loader::{Job, SiteFetcher, Spawner};
use crate::url::Url;

/// Spawner whose jobs run on the test thread when the test says so.
#[derive(Clone, Default)]
pub struct ManualSpawner {
    jobs: Rc<RefCell<VecDeque<Job>>>,
}

impl ManualSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jobs spawned but not yet run.
    pub fn pending(&self) -> usize {
        self.jobs.borrow().len()
    }

    /// Run the oldest queued job. Returns false if none was queued.
    pub fn run_next(&self) -> bool {
        let job = self.jobs.borrow_mut().pop_front();
        job.map(|job| job()).is_some()
    }

    /// Run the newest queued job. Returns false if none was queued.
    pub fn run_last(&self) -> bool {
        let job = self.jobs.borrow_mut().pop_back();
        job.map(|job| job()).is_some()
    }

    /// Run every queued job, oldest first.
    pub fn run_all(&self) {
        while self.run_next() {}
    }
}

impl Spawner for ManualSpawner {
    fn spawn(&self, job: Job) -> Result<()> {
        self.jobs.borrow_mut().push_back(job);
        Ok(())
    }
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

/// A small site served at `mem://demo/`:
///
/// ```text
/// /index.txt        text
/// /docs/            a.txt, b.txt
/// /photo.png        image bytes
/// /song.mp3         sound bytes
/// /bundle.jar       archive bytes
/// /blob.bin         binary
/// /private/key.txt  protected
/// ```
pub fn demo_site() -> Arc<MemorySite> {
    let site = MemorySite::new("demo");
    site.write("/index.txt", b"welcome\nsee docs").unwrap();
    site.write("/docs/a.txt", b"first").unwrap();
    site.write("/docs/b.txt", b"second").unwrap();
    site.write("/photo.png", &[0x89, b'P', b'N', b'G']).unwrap();
    site.write("/song.mp3", &[0xff, 0xfb, 0x00]).unwrap();
    site.write("/bundle.jar", &[b'P', b'K', 0x03, 0x04]).unwrap();
    site.write("/blob.bin", &[0x00, 0x01, 0xfe]).unwrap();
    site.write("/private/key.txt", b"hunter2").unwrap();
    site.protect("/private").unwrap();
    Arc::new(site)
}

/// A fetcher serving [`demo_site`] at `mem://demo/`.
pub fn demo_fetcher(site: &Arc<MemorySite>) -> SiteFetcher {
    let site: Arc<MemorySite> = Arc::clone(site);
    SiteFetcher::new().with_site(&url("mem://demo/"), site)
}
