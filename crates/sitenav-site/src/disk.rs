//! Site backed by a directory on the host file system.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sitenav_types::error::Result;

use crate::{Lookup, Resource, Site, normalize, validate_path};

/// Serves files below `root`. Paths are resolved relative to the root and
/// may not escape it.
#[derive(Debug, Clone)]
pub struct DiskSite {
    name: String,
    root: PathBuf,
}

impl DiskSite {
    pub fn new(name: &str, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.to_string(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn host_path(&self, path: &str) -> PathBuf {
        let rel = path.trim_start_matches('/');
        if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        }
    }
}

impl Site for DiskSite {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, path: &str) -> Result<Lookup> {
        let path = normalize(path);
        validate_path(&path)?;
        let host = self.host_path(&path);

        let meta = match fs::metadata(&host) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Lookup::NotFound),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Ok(Lookup::Unauthorized);
            },
            Err(e) => return Err(e.into()),
        };

        if meta.is_dir() {
            let mut entries = Vec::new();
            for entry in fs::read_dir(&host)? {
                let entry = entry?;
                entries.push(entry.file_name().to_string_lossy().into_owned());
            }
            return Ok(Lookup::Found(Resource::directory(&path, entries)));
        }

        let bytes = fs::read(&host)?;
        log::debug!("{}: read {} bytes from {}", self.name, bytes.len(), host.display());
        Ok(Lookup::Found(Resource::file(&path, bytes)))
    }

    fn post(&self, path: &str, payload: &[u8]) -> Result<Lookup> {
        let path = normalize(path);
        validate_path(&path)?;
        let host = self.host_path(&path);
        if let Some(dir) = host.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&host, payload)?;
        self.lookup(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntryKind;

    fn site_with_files() -> (tempfile::TempDir, DiskSite) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs/readme.txt"), b"read me").unwrap();
        fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        let site = DiskSite::new("local", dir.path());
        (dir, site)
    }

    #[test]
    fn reads_file() {
        let (_dir, site) = site_with_files();
        match site.lookup("/docs/readme.txt").unwrap() {
            Lookup::Found(r) => {
                assert_eq!(r.bytes, b"read me");
                assert_eq!(r.path, "/docs/readme.txt");
                assert!(r.is_text());
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn lists_root_directory() {
        let (_dir, site) = site_with_files();
        match site.lookup("/").unwrap() {
            Lookup::Found(r) => {
                assert_eq!(r.kind, EntryKind::Directory);
                assert_eq!(r.entries, vec!["docs".to_string(), "logo.png".to_string()]);
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_dir, site) = site_with_files();
        assert_eq!(site.lookup("/nope.txt").unwrap(), Lookup::NotFound);
    }

    #[test]
    fn traversal_is_rejected() {
        let (_dir, site) = site_with_files();
        assert!(site.lookup("/../etc/passwd").is_err());
    }

    #[test]
    fn post_writes_file() {
        let (dir, site) = site_with_files();
        site.post("/inbox/new.txt", b"fresh").unwrap();
        assert_eq!(fs::read(dir.path().join("inbox/new.txt")).unwrap(), b"fresh");
    }
}
