//! Requests and responses exchanged between the browser and its loader.

use std::sync::Arc;

use sitenav_site::Resource;
use sitenav_types::error::SitenavError;

use crate::url::Url;

/// Identifier of a navigation attempt, unique per loader.
pub type RequestId = u64;

/// A single navigation attempt.
///
/// Built by the loader when a load is issued and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub url: Url,
    /// Outbound payload for a post-like request.
    pub payload: Option<Vec<u8>>,
    /// Whether displaying the result should be recorded in history.
    /// Captured when the load is issued so a back/forward jump stays
    /// unrecorded even though its result arrives later.
    pub record_history: bool,
    /// Fresh load of an already-cached page; the result replaces that
    /// page's content in place.
    pub reload: bool,
}

impl Request {
    /// A plain navigation request. The loader assigns the real id.
    pub fn new(url: Url) -> Self {
        Self {
            id: 0,
            url,
            payload: None,
            record_history: true,
            reload: false,
        }
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Outcome class of a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    NotFound,
    Unauthorized,
    Other(u16),
}

impl Status {
    /// Numeric code in HTTP terms.
    pub fn code(&self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::NotFound => 404,
            Status::Unauthorized => 401,
            Status::Other(code) => *code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

/// The result of a fetch, always paired with the request that produced it.
#[derive(Debug, Clone)]
pub struct Response {
    pub request: Request,
    pub status: Status,
    pub file: Option<Resource>,
    pub error: Option<Arc<SitenavError>>,
}

impl Response {
    pub fn new(request: Request, status: Status) -> Self {
        Self {
            request,
            status,
            file: None,
            error: None,
        }
    }

    /// An OK response carrying a resolved resource.
    pub fn with_file(request: Request, file: Resource) -> Self {
        Self {
            file: Some(file),
            ..Self::new(request, Status::Ok)
        }
    }

    /// A response describing a failure while loading or displaying `url`.
    pub fn failed(request: Request, error: Arc<SitenavError>) -> Self {
        Self {
            error: Some(error),
            ..Self::new(request, Status::Other(500))
        }
    }

    pub fn url(&self) -> &Url {
        &self.request.url
    }

    /// Lower-cased extension of the resource, falling back to the URL's.
    pub fn path_type(&self) -> String {
        self.file
            .as_ref()
            .and_then(Resource::extension)
            .or_else(|| self.url().extension().map(str::to_ascii_lowercase))
            .unwrap_or_default()
    }

    /// Same response re-addressed to `url`. Used when a cached page is
    /// shown under a URL with a different query.
    pub fn readdressed(&self, url: Url) -> Self {
        let mut resp = self.clone();
        resp.request.url = url;
        resp
    }
}
