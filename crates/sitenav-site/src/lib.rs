//! Resource sites for the sitenav browser.
//!
//! A [`Site`] answers "what lives at this path?" with a [`Lookup`]: either
//! a [`Resource`] (file bytes or a directory listing) or a site-level
//! status such as not-found or unauthorized. The browser core never
//! touches storage directly; it only sees sites through this trait, from
//! a background fetch thread, which is why implementations are
//! `Send + Sync`.

pub mod disk;
pub mod memory;

use std::borrow::Cow;

use sitenav_types::error::{Result, SitenavError};

pub use disk::DiskSite;
pub use memory::MemorySite;

// -----------------------------------------------------------------------
// Resource
// -----------------------------------------------------------------------

/// Type of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A resolved file or directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    /// Normalized absolute path within the site.
    pub path: String,
    pub kind: EntryKind,
    /// File contents. Empty for directories.
    pub bytes: Vec<u8>,
    /// Names of direct children, sorted. Empty for files.
    pub entries: Vec<String>,
}

impl Resource {
    /// Build a file resource.
    pub fn file(path: &str, bytes: Vec<u8>) -> Self {
        Self {
            path: normalize(path).into_owned(),
            kind: EntryKind::File,
            bytes,
            entries: Vec::new(),
        }
    }

    /// Build a directory resource with the given child names.
    pub fn directory(path: &str, mut entries: Vec<String>) -> Self {
        entries.sort();
        Self {
            path: normalize(path).into_owned(),
            kind: EntryKind::Directory,
            bytes: Vec::new(),
            entries,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Last path segment (`"/"` for the root).
    pub fn name(&self) -> &str {
        match self.path.rsplit('/').next() {
            Some("") | None => "/",
            Some(name) => name,
        }
    }

    /// Lower-cased file extension without the dot.
    pub fn extension(&self) -> Option<String> {
        let name = self.name();
        let dot = name.rfind('.')?;
        let ext = &name[dot + 1..];
        if ext.is_empty() || dot == 0 {
            None
        } else {
            Some(ext.to_ascii_lowercase())
        }
    }

    /// Whether the file looks like text: a known text extension, or
    /// valid UTF-8 with no NUL bytes.
    pub fn is_text(&self) -> bool {
        if self.is_dir() {
            return false;
        }
        if let Some(ext) = self.extension()
            && TEXT_EXTENSIONS.contains(&ext.as_str())
        {
            return true;
        }
        !self.bytes.contains(&0) && std::str::from_utf8(&self.bytes).is_ok()
    }

    /// Contents decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Extensions that are always treated as text.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "html", "htm", "css", "js", "json", "toml", "xml", "csv", "rs", "java", "py",
];

// -----------------------------------------------------------------------
// Site trait
// -----------------------------------------------------------------------

/// Result of looking up a path on a site.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(Resource),
    NotFound,
    Unauthorized,
}

/// A source of resources addressed by absolute path.
pub trait Site: Send + Sync {
    /// Human-readable site name.
    fn name(&self) -> &str;

    /// Resolve a path to a resource or a site-level status.
    ///
    /// `Err` is reserved for genuine failures (I/O errors, corrupt
    /// storage); a missing path is `Ok(Lookup::NotFound)`.
    fn lookup(&self, path: &str) -> Result<Lookup>;

    /// Submit a payload to a path. Sites are read-only unless they
    /// override this.
    fn post(&self, path: &str, _payload: &[u8]) -> Result<Lookup> {
        Err(SitenavError::Site(format!(
            "{} does not accept posts to {path}",
            self.name()
        )))
    }
}

// -----------------------------------------------------------------------
// Path helpers
// -----------------------------------------------------------------------

/// Check whether a path is already in normal form (starts with `/`, no `//`,
/// no trailing `/` unless root).
fn is_normalized(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    if path.len() > 1 && path.ends_with('/') {
        return false;
    }
    !path.contains("//")
}

/// Normalize a path: ensure leading `/`, collapse `//`, strip trailing `/`
/// (except for root). Returns the input unchanged when already in normal
/// form.
pub fn normalize(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }
    let mut result = String::with_capacity(path.len() + 1);
    result.push('/');
    let mut prev_slash = true;
    for ch in path.chars() {
        if ch == '/' {
            if !prev_slash {
                result.push(ch);
            }
            prev_slash = true;
        } else {
            result.push(ch);
            prev_slash = false;
        }
    }
    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }
    Cow::Owned(result)
}

/// Return the parent of a normalized path.
pub fn parent(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

/// Reject paths that try to climb out of the site with `..`.
pub fn validate_path(path: &str) -> Result<()> {
    if path.split('/').any(|seg| seg == "..") {
        return Err(SitenavError::Site("path traversal not allowed".to_string()));
    }
    Ok(())
}
