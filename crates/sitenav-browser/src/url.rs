//! URL parsing and resolution (simplified RFC 3986).
//!
//! The browser identifies every resource by a [`Url`]. Two URLs that differ
//! only in query (or fragment) share a page cache slot; see
//! [`Url::query_url`].

use std::fmt;

use sitenav_types::error::{Result, SitenavError};

/// A parsed URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Url {
    /// Scheme component (e.g. `"file"`, `"mem"`, `"http"`), lower-cased.
    pub scheme: String,
    /// Host component. Sites are registered per `scheme://host`.
    pub host: String,
    /// Optional explicit port number.
    pub port: Option<u16>,
    /// Path component starting with `/`.
    pub path: String,
    /// Optional query string (without the leading `?`).
    pub query: Option<String>,
    /// Optional fragment (without the leading `#`).
    pub fragment: Option<String>,
}

impl Url {
    /// Parse an absolute URL string of the form
    /// `scheme://host[:port][/path][?query][#fragment]`.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SitenavError::Url("empty URL".to_string()));
        }
        let Some(idx) = url.find("://") else {
            return Err(SitenavError::Url(format!("missing scheme: {url}")));
        };
        let scheme = &url[..idx];
        if scheme.is_empty()
            || !scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            return Err(SitenavError::Url(format!("bad scheme: {url}")));
        }
        Ok(Self::parse_authority_and_path(scheme, &url[idx + 3..]))
    }

    /// Parse `host[:port]/path?query#fragment` after the scheme has been
    /// stripped.
    fn parse_authority_and_path(scheme: &str, rest: &str) -> Url {
        let (rest, fragment) = match rest.find('#') {
            Some(i) => (&rest[..i], Some(rest[i + 1..].to_string())),
            None => (rest, None),
        };

        let (rest, query) = match rest.find('?') {
            Some(i) => (&rest[..i], Some(rest[i + 1..].to_string())),
            None => (rest, None),
        };

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], &rest[i..]),
            None => (rest, "/"),
        };

        let (host, port) = match authority.rfind(':') {
            Some(i) => match authority[i + 1..].parse::<u16>() {
                Ok(p) => (&authority[..i], Some(p)),
                Err(_) => (authority, None),
            },
            None => (authority, None),
        };

        Url {
            scheme: scheme.to_lowercase(),
            host: host.to_string(),
            port,
            path: if path.is_empty() { "/" } else { path }.to_string(),
            query,
            fragment,
        }
    }

    /// Resolve a reference against this base URL.
    ///
    /// Handles absolute URLs (returned as-is), protocol-relative
    /// (`//host/path`), absolute paths (`/path`), relative paths
    /// (`path`, `../path`), query-only (`?q=x`), and fragment-only
    /// (`#frag`) references.
    pub fn resolve(&self, relative: &str) -> Result<Url> {
        let relative = relative.trim();
        if relative.is_empty() {
            return Ok(self.clone());
        }

        if relative.contains("://") {
            return Url::parse(relative);
        }

        if relative.starts_with("//") {
            return Url::parse(&format!("{}:{}", self.scheme, relative));
        }

        if let Some(frag) = relative.strip_prefix('#') {
            let mut resolved = self.clone();
            resolved.fragment = Some(frag.to_string());
            return Ok(resolved);
        }

        if let Some(query) = relative.strip_prefix('?') {
            let mut resolved = self.clone();
            resolved.query = Some(query.to_string());
            resolved.fragment = None;
            return Ok(resolved);
        }

        let (rel_path, query, fragment) = split_path_query_fragment(relative);
        let path = if rel_path.starts_with('/') {
            resolve_path("/", &rel_path)
        } else {
            resolve_path(self.directory(), &rel_path)
        };
        Ok(Url {
            scheme: self.scheme.clone(),
            host: self.host.clone(),
            port: self.port,
            path,
            query,
            fragment,
        })
    }

    /// This URL without query and fragment. Used as the page cache key.
    pub fn query_url(&self) -> Url {
        if self.query.is_none() && self.fragment.is_none() {
            return self.clone();
        }
        Url {
            query: None,
            fragment: None,
            ..self.clone()
        }
    }

    /// Value for `key` in a `k=v&k2=v2` (or `;`-separated) query.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .as_deref()?
            .split(['&', ';'])
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Last path segment, empty for a directory path.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    /// Get the file extension from the path (without the dot).
    pub fn extension(&self) -> Option<&str> {
        let filename = self.file_name();
        let dot_pos = filename.rfind('.')?;
        let ext = &filename[dot_pos + 1..];
        if ext.is_empty() || dot_pos == 0 {
            None
        } else {
            Some(ext)
        }
    }

    /// Get the directory portion of the path (everything up to and
    /// including the last `/`).
    pub fn directory(&self) -> &str {
        match self.path.rfind('/') {
            Some(i) => &self.path[..=i],
            None => "/",
        }
    }

    /// Get the origin (`scheme://host[:port]`).
    pub fn origin(&self) -> String {
        let mut s = format!("{}://{}", self.scheme, self.host);
        if let Some(port) = self.port {
            s.push_str(&format!(":{port}"));
        }
        s
    }
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.origin(), self.path)?;
        if let Some(ref q) = self.query {
            write!(f, "?{q}")?;
        }
        if let Some(ref frag) = self.fragment {
            write!(f, "#{frag}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Url {
    type Err = SitenavError;

    fn from_str(s: &str) -> Result<Self> {
        Url::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Split a (possibly relative) path string into `(path, query, fragment)`.
fn split_path_query_fragment(s: &str) -> (String, Option<String>, Option<String>) {
    let (s, fragment) = match s.find('#') {
        Some(i) => (&s[..i], Some(s[i + 1..].to_string())),
        None => (s, None),
    };
    let (path, query) = match s.find('?') {
        Some(i) => (s[..i].to_string(), Some(s[i + 1..].to_string())),
        None => (s.to_string(), None),
    };
    (path, query, fragment)
}

/// Resolve a relative path against a base directory, handling `..` and
/// `.` segments. A trailing `/` on the reference is kept.
fn resolve_path(base_dir: &str, relative: &str) -> String {
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();

    for seg in relative.split('/') {
        match seg {
            "" | "." => {},
            ".." => {
                segments.pop();
            },
            s => segments.push(s),
        }
    }

    let mut path = format!("/{}", segments.join("/"));
    if relative.ends_with('/') && path.len() > 1 {
        path.push('/');
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_url() {
        let url = Url::parse("mem://demo/docs/page.txt").unwrap();
        assert_eq!(url.scheme, "mem");
        assert_eq!(url.host, "demo");
        assert_eq!(url.port, None);
        assert_eq!(url.path, "/docs/page.txt");
        assert_eq!(url.query, None);
        assert_eq!(url.fragment, None);
    }

    #[test]
    fn parse_url_with_port_query_fragment() {
        let url = Url::parse("HTTP://localhost:8080/search?q=test#results").unwrap();
        assert_eq!(url.scheme, "http");
        assert_eq!(url.port, Some(8080));
        assert_eq!(url.path, "/search");
        assert_eq!(url.query.as_deref(), Some("q=test"));
        assert_eq!(url.fragment.as_deref(), Some("results"));
    }

    #[test]
    fn parse_host_only_gets_root_path() {
        let url = Url::parse("mem://demo").unwrap();
        assert_eq!(url.path, "/");
        assert_eq!(url.to_string(), "mem://demo/");
    }

    #[test]
    fn parse_rejects_relative_and_empty() {
        assert!(Url::parse("").is_err());
        assert!(Url::parse("docs/page.txt").is_err());
        assert!(Url::parse("://nohost").is_err());
    }

    #[test]
    fn display_round_trips() {
        let s = "file://local/a/b.txt?id=3#top";
        assert_eq!(Url::parse(s).unwrap().to_string(), s);
    }

    #[test]
    fn query_url_strips_query_and_fragment() {
        let a = Url::parse("mem://demo/page.txt?x=1#frag").unwrap();
        let b = Url::parse("mem://demo/page.txt?x=2").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.query_url(), b.query_url());
        assert_eq!(a.query_url().to_string(), "mem://demo/page.txt");
    }

    #[test]
    fn query_value_lookup() {
        let url = Url::parse("mem://demo/p?id=42&mode=edit;x=y").unwrap();
        assert_eq!(url.query_value("id"), Some("42"));
        assert_eq!(url.query_value("mode"), Some("edit"));
        assert_eq!(url.query_value("x"), Some("y"));
        assert_eq!(url.query_value("missing"), None);
    }

    #[test]
    fn resolve_relative_path() {
        let base = Url::parse("mem://demo/docs/intro.txt").unwrap();
        assert_eq!(base.resolve("chapter2.txt").unwrap().path, "/docs/chapter2.txt");
        assert_eq!(base.resolve("../logo.png").unwrap().path, "/logo.png");
        assert_eq!(base.resolve("./sub/").unwrap().path, "/docs/sub/");
    }

    #[test]
    fn resolve_absolute_path_and_url() {
        let base = Url::parse("mem://demo/docs/intro.txt").unwrap();
        let abs = base.resolve("/other/page.txt?v=1").unwrap();
        assert_eq!(abs.host, "demo");
        assert_eq!(abs.path, "/other/page.txt");
        assert_eq!(abs.query.as_deref(), Some("v=1"));

        let full = base.resolve("file://local/x.txt").unwrap();
        assert_eq!(full.scheme, "file");
        assert_eq!(full.host, "local");
    }

    #[test]
    fn resolve_protocol_relative() {
        let base = Url::parse("mem://demo/page.txt").unwrap();
        let resolved = base.resolve("//other/style.css").unwrap();
        assert_eq!(resolved.scheme, "mem");
        assert_eq!(resolved.host, "other");
        assert_eq!(resolved.path, "/style.css");
    }

    #[test]
    fn resolve_query_and_fragment_only() {
        let base = Url::parse("mem://demo/page.txt?old=1#f").unwrap();
        let q = base.resolve("?new=2").unwrap();
        assert_eq!(q.path, "/page.txt");
        assert_eq!(q.query.as_deref(), Some("new=2"));
        assert_eq!(q.fragment, None);

        let f = base.resolve("#sec").unwrap();
        assert_eq!(f.query.as_deref(), Some("old=1"));
        assert_eq!(f.fragment.as_deref(), Some("sec"));
    }

    #[test]
    fn extension_and_file_name() {
        let url = Url::parse("mem://demo/img/photo.JPG?size=2").unwrap();
        assert_eq!(url.file_name(), "photo.JPG");
        assert_eq!(url.extension(), Some("JPG"));
        assert_eq!(Url::parse("mem://demo/dir/").unwrap().extension(), None);
        assert_eq!(Url::parse("mem://demo/.hidden").unwrap().extension(), None);
    }

    #[test]
    fn origin_includes_port() {
        let url = Url::parse("http://example.com:81/x").unwrap();
        assert_eq!(url.origin(), "http://example.com:81");
    }
}
