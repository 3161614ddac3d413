//! Background loading.
//!
//! The [`AsyncLoader`] runs one fetch at a time off the UI thread. Each
//! issued [`Request`] gets a fresh id; results come back over a channel as
//! [`Delivery`] values and are accepted only if their id still matches the
//! current request. A newer `load` therefore cancels an older one softly:
//! the old fetch runs to completion and its result is dropped on arrival.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use sitenav_site::{Lookup, Site};
use sitenav_types::error::{Result, SitenavError};

use crate::request::{Request, RequestId, Response, Status};
use crate::url::Url;

// -----------------------------------------------------------------------
// Collaborator traits
// -----------------------------------------------------------------------

/// Resolves a request into a response. Runs on a background thread.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, request: &Request) -> Result<Response>;
}

/// A unit of background work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs jobs off the UI thread.
pub trait Spawner {
    fn spawn(&self, job: Job) -> Result<()>;
}

/// Spawns one named OS thread per job.
#[derive(Debug, Clone)]
pub struct ThreadSpawner {
    name: String,
}

impl ThreadSpawner {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl Spawner for ThreadSpawner {
    fn spawn(&self, job: Job) -> Result<()> {
        let _handle = std::thread::Builder::new()
            .name(self.name.clone())
            .spawn(job)?;
        Ok(())
    }
}

// -----------------------------------------------------------------------
// SiteFetcher
// -----------------------------------------------------------------------

/// Fetcher that routes each request to the site mounted at its origin.
#[derive(Default)]
pub struct SiteFetcher {
    sites: HashMap<String, Arc<dyn Site>>,
}

impl SiteFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `site` for every URL whose `scheme://host[:port]` matches
    /// `origin`'s.
    pub fn mount(&mut self, origin: &Url, site: Arc<dyn Site>) {
        log::info!("mounted site '{}' at {}", site.name(), origin.origin());
        self.sites.insert(origin.origin(), site);
    }

    pub fn with_site(mut self, origin: &Url, site: Arc<dyn Site>) -> Self {
        self.mount(origin, site);
        self
    }

    pub fn site_for(&self, url: &Url) -> Option<&Arc<dyn Site>> {
        self.sites.get(&url.origin())
    }
}

impl Fetcher for SiteFetcher {
    fn fetch(&self, request: &Request) -> Result<Response> {
        let Some(site) = self.site_for(&request.url) else {
            log::debug!("no site mounted for {}", request.url.origin());
            return Ok(Response::new(request.clone(), Status::NotFound));
        };
        let path = &request.url.path;
        let lookup = match &request.payload {
            Some(payload) => site.post(path, payload)?,
            None => site.lookup(path)?,
        };
        Ok(match lookup {
            Lookup::Found(resource) => Response::with_file(request.clone(), resource),
            Lookup::NotFound => Response::new(request.clone(), Status::NotFound),
            Lookup::Unauthorized => Response::new(request.clone(), Status::Unauthorized),
        })
    }
}

// -----------------------------------------------------------------------
// Deliveries
// -----------------------------------------------------------------------

/// Terminal result of one fetch.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    Loaded(Response),
    Failed {
        request: Request,
        error: Arc<SitenavError>,
    },
}

impl LoadOutcome {
    pub fn request(&self) -> &Request {
        match self {
            LoadOutcome::Loaded(response) => &response.request,
            LoadOutcome::Failed { request, .. } => request,
        }
    }
}

/// A tagged outcome crossing from the fetch thread to the UI thread.
#[derive(Debug)]
pub struct Delivery {
    pub request_id: RequestId,
    pub outcome: LoadOutcome,
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run the fetch, turning errors and panics into a failure outcome.
fn run_fetch(fetcher: &dyn Fetcher, request: Request) -> Delivery {
    let request_id = request.id;
    let result = panic::catch_unwind(AssertUnwindSafe(|| fetcher.fetch(&request)));
    let outcome = match result {
        Ok(Ok(mut response)) => {
            response.request = request;
            LoadOutcome::Loaded(response)
        },
        Ok(Err(error)) => LoadOutcome::Failed {
            request,
            error: Arc::new(error),
        },
        Err(payload) => LoadOutcome::Failed {
            request,
            error: Arc::new(SitenavError::Fetch(format!(
                "fetch panicked: {}",
                panic_message(payload.as_ref())
            ))),
        },
    };
    Delivery {
        request_id,
        outcome,
    }
}

// -----------------------------------------------------------------------
// AsyncLoader
// -----------------------------------------------------------------------

/// Single-flight background loader. Owned and driven by the UI thread.
pub struct AsyncLoader {
    fetcher: Arc<dyn Fetcher>,
    spawner: Box<dyn Spawner>,
    sender: Sender<Delivery>,
    receiver: Receiver<Delivery>,
    next_id: RequestId,
    current: Option<Request>,
}

impl AsyncLoader {
    pub fn new(fetcher: Arc<dyn Fetcher>, spawner: Box<dyn Spawner>) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            fetcher,
            spawner,
            sender,
            receiver,
            next_id: 1,
            current: None,
        }
    }

    /// Issue `request`, superseding any load in flight. Returns the id
    /// assigned to it.
    pub fn load(&mut self, mut request: Request) -> RequestId {
        request.id = self.next_id;
        self.next_id += 1;
        if let Some(previous) = &self.current {
            log::debug!("superseding request {} ({})", previous.id, previous.url);
        }
        log::debug!("loading request {} ({})", request.id, request.url);
        self.current = Some(request.clone());

        let fetcher = Arc::clone(&self.fetcher);
        let sender = self.sender.clone();
        let job_request = request.clone();
        let job: Job = Box::new(move || {
            let delivery = run_fetch(fetcher.as_ref(), job_request);
            // The loader may be gone by the time the fetch finishes.
            let _ = sender.send(delivery);
        });

        if let Err(error) = self.spawner.spawn(job) {
            log::warn!("could not start fetch for {}: {error}", request.url);
            let _ = self.sender.send(Delivery {
                request_id: request.id,
                outcome: LoadOutcome::Failed {
                    request: request.clone(),
                    error: Arc::new(error),
                },
            });
        }
        request.id
    }

    pub fn is_loading(&self) -> bool {
        self.current.is_some()
    }

    /// URL of the request in flight.
    pub fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|r| &r.url)
    }

    pub fn current_request(&self) -> Option<&Request> {
        self.current.as_ref()
    }

    /// Accept a delivery if it belongs to the current request. Stale
    /// deliveries are discarded and yield `None`.
    pub fn accept(&mut self, delivery: Delivery) -> Option<LoadOutcome> {
        match &self.current {
            Some(current) if current.id == delivery.request_id => {
                self.current = None;
                Some(delivery.outcome)
            },
            _ => {
                log::debug!(
                    "discarding stale delivery for request {} ({})",
                    delivery.request_id,
                    delivery.outcome.request().url
                );
                None
            },
        }
    }

    /// Drain arrived deliveries without blocking. Returns the outcome for
    /// the current request if it has arrived.
    pub fn try_recv(&mut self) -> Option<LoadOutcome> {
        while let Ok(delivery) = self.receiver.try_recv() {
            if let Some(outcome) = self.accept(delivery) {
                return Some(outcome);
            }
        }
        None
    }

    /// Block until the current request's outcome arrives or `timeout`
    /// passes. Stale deliveries received meanwhile are discarded.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<LoadOutcome> {
        let deadline = Instant::now() + timeout;
        while self.is_loading() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(delivery) => {
                    if let Some(outcome) = self.accept(delivery) {
                        return Some(outcome);
                    }
                },
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        None
    }

    /// Forget the request in flight; its result will be discarded.
    pub fn abandon(&mut self) {
        if let Some(request) = self.current.take() {
            log::debug!("abandoning request {} ({})", request.id, request.url);
        }
    }
}
