//! In-memory site.
//!
//! Useful for unit tests and demo content. The whole tree lives in a
//! `BTreeMap<String, Node>` keyed by normalized absolute paths, behind an
//! `RwLock` so the UI thread can edit it while fetch threads read it.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use sitenav_types::error::{Result, SitenavError};

use crate::{Lookup, Resource, Site, normalize, parent, validate_path};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug)]
struct Tree {
    nodes: BTreeMap<String, Node>,
    /// Subtrees that answer `Unauthorized`.
    protected: Vec<String>,
}

/// A fully in-memory site.
#[derive(Debug)]
pub struct MemorySite {
    name: String,
    tree: RwLock<Tree>,
}

impl MemorySite {
    /// Create a new site with only the root directory.
    pub fn new(name: &str) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir);
        Self {
            name: name.to_string(),
            tree: RwLock::new(Tree {
                nodes,
                protected: Vec::new(),
            }),
        }
    }

    fn read_tree(&self) -> Result<RwLockReadGuard<'_, Tree>> {
        self.tree
            .read()
            .map_err(|_| SitenavError::Site(format!("{}: tree lock poisoned", self.name)))
    }

    fn write_tree(&self) -> Result<RwLockWriteGuard<'_, Tree>> {
        self.tree
            .write()
            .map_err(|_| SitenavError::Site(format!("{}: tree lock poisoned", self.name)))
    }

    /// Create a directory, creating missing parents.
    pub fn mkdir(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut tree = self.write_tree()?;
        mkdir_in(&mut tree.nodes, &path)
    }

    /// Write a file. Missing parent directories are created.
    pub fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let path = normalize(path);
        validate_path(&path)?;
        let mut tree = self.write_tree()?;
        if let Some(Node::Dir) = tree.nodes.get(path.as_ref()) {
            return Err(SitenavError::Site(format!("is a directory: {path}")));
        }
        mkdir_in(&mut tree.nodes, parent(&path))?;
        tree.nodes.insert(path.into_owned(), Node::File(data.to_vec()));
        Ok(())
    }

    /// Remove a file or an empty directory.
    pub fn remove(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        if path.as_ref() == "/" {
            return Err(SitenavError::Site("cannot remove root".to_string()));
        }
        let mut tree = self.write_tree()?;
        match tree.nodes.get(path.as_ref()) {
            Some(Node::Dir) => {
                let prefix = format!("{path}/");
                let has_children = tree
                    .nodes
                    .range(prefix.clone()..)
                    .next()
                    .is_some_and(|(k, _)| k.starts_with(&prefix));
                if has_children {
                    return Err(SitenavError::Site(format!("directory not empty: {path}")));
                }
            },
            Some(Node::File(_)) => {},
            None => {
                return Err(SitenavError::Site(format!("no such path: {path}")));
            },
        }
        tree.nodes.remove(path.as_ref());
        Ok(())
    }

    /// Require authorization for `path` and everything below it.
    pub fn protect(&self, path: &str) -> Result<()> {
        let path = normalize(path).into_owned();
        let mut tree = self.write_tree()?;
        if !tree.protected.contains(&path) {
            tree.protected.push(path);
        }
        Ok(())
    }

    /// Lift a protection added with [`protect`](Self::protect).
    pub fn unprotect(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut tree = self.write_tree()?;
        tree.protected.retain(|p| p != path.as_ref());
        Ok(())
    }

    pub fn exists(&self, path: &str) -> bool {
        let path = normalize(path);
        self.read_tree()
            .map(|tree| tree.nodes.contains_key(path.as_ref()))
            .unwrap_or(false)
    }
}

fn mkdir_in(nodes: &mut BTreeMap<String, Node>, path: &str) -> Result<()> {
    match nodes.get(path) {
        Some(Node::Dir) => return Ok(()),
        Some(Node::File(_)) => {
            return Err(SitenavError::Site(format!("not a directory: {path}")));
        },
        None => {},
    }
    let par = parent(path);
    if par != path {
        mkdir_in(nodes, par)?;
    }
    nodes.insert(path.to_string(), Node::Dir);
    Ok(())
}

fn is_protected(protected: &[String], path: &str) -> bool {
    protected.iter().any(|p| {
        p == "/" || path == p || (path.starts_with(p.as_str()) && path[p.len()..].starts_with('/'))
    })
}

/// Names of the direct children of a directory. BTreeMap iteration is
/// sorted, so the listing comes out in lexicographic order.
fn children(nodes: &BTreeMap<String, Node>, path: &str) -> Vec<String> {
    let prefix = if path == "/" {
        "/".to_string()
    } else {
        format!("{path}/")
    };
    let mut entries = Vec::new();
    for (key, _) in nodes.range(prefix.clone()..) {
        if !key.starts_with(&prefix) {
            break;
        }
        let rest = &key[prefix.len()..];
        if !rest.is_empty() && !rest.contains('/') {
            entries.push(rest.to_string());
        }
    }
    entries
}

impl Site for MemorySite {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, path: &str) -> Result<Lookup> {
        let path = normalize(path);
        validate_path(&path)?;
        let tree = self.read_tree()?;
        if is_protected(&tree.protected, &path) {
            return Ok(Lookup::Unauthorized);
        }
        Ok(match tree.nodes.get(path.as_ref()) {
            Some(Node::File(data)) => Lookup::Found(Resource::file(&path, data.clone())),
            Some(Node::Dir) => {
                Lookup::Found(Resource::directory(&path, children(&tree.nodes, &path)))
            },
            None => Lookup::NotFound,
        })
    }

    fn post(&self, path: &str, payload: &[u8]) -> Result<Lookup> {
        self.write(path, payload)?;
        log::debug!("{}: stored {} posted bytes at {path}", self.name, payload.len());
        self.lookup(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntryKind;

    fn found(lookup: Lookup) -> Resource {
        match lookup {
            Lookup::Found(r) => r,
            other => panic!("expected resource, got {other:?}"),
        }
    }

    #[test]
    fn root_exists() {
        let site = MemorySite::new("t");
        assert!(site.exists("/"));
        let root = found(site.lookup("/").unwrap());
        assert_eq!(root.kind, EntryKind::Directory);
    }

    #[test]
    fn write_creates_parents_and_reads_back() {
        let site = MemorySite::new("t");
        site.write("/docs/guide/intro.txt", b"hello").unwrap();
        assert!(site.exists("/docs/guide"));
        let file = found(site.lookup("/docs/guide/intro.txt").unwrap());
        assert_eq!(file.bytes, b"hello");
        assert_eq!(file.name(), "intro.txt");
    }

    #[test]
    fn directory_lists_direct_children_only() {
        let site = MemorySite::new("t");
        site.mkdir("/a/b/c").unwrap();
        site.write("/a/file.txt", b"hi").unwrap();
        let dir = found(site.lookup("/a").unwrap());
        assert_eq!(dir.entries, vec!["b".to_string(), "file.txt".to_string()]);
    }

    #[test]
    fn missing_path_is_not_found() {
        let site = MemorySite::new("t");
        assert_eq!(site.lookup("/nope").unwrap(), Lookup::NotFound);
    }

    #[test]
    fn protected_subtree_is_unauthorized() {
        let site = MemorySite::new("t");
        site.write("/private/secret.txt", b"x").unwrap();
        site.write("/privateer.txt", b"y").unwrap();
        site.protect("/private").unwrap();
        assert_eq!(site.lookup("/private").unwrap(), Lookup::Unauthorized);
        assert_eq!(
            site.lookup("/private/secret.txt").unwrap(),
            Lookup::Unauthorized
        );
        // Sibling sharing a name prefix is not covered.
        assert!(matches!(
            site.lookup("/privateer.txt").unwrap(),
            Lookup::Found(_)
        ));

        site.unprotect("/private").unwrap();
        assert!(matches!(
            site.lookup("/private/secret.txt").unwrap(),
            Lookup::Found(_)
        ));
    }

    #[test]
    fn write_over_directory_fails() {
        let site = MemorySite::new("t");
        site.mkdir("/dir").unwrap();
        assert!(site.write("/dir", b"x").is_err());
    }

    #[test]
    fn write_below_file_fails() {
        let site = MemorySite::new("t");
        site.write("/file", b"x").unwrap();
        assert!(site.write("/file/child", b"y").is_err());
    }

    #[test]
    fn remove_file_and_nonempty_dir() {
        let site = MemorySite::new("t");
        site.write("/dir/file", b"x").unwrap();
        assert!(site.remove("/dir").is_err());
        site.remove("/dir/file").unwrap();
        site.remove("/dir").unwrap();
        assert!(!site.exists("/dir"));
        assert!(site.remove("/").is_err());
    }

    #[test]
    fn post_stores_payload() {
        let site = MemorySite::new("t");
        let file = found(site.post("/inbox/msg.txt", b"posted").unwrap());
        assert_eq!(file.bytes, b"posted");
    }

    #[test]
    fn traversal_rejected() {
        let site = MemorySite::new("t");
        assert!(site.lookup("/a/../../etc").is_err());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn written_files_are_found(names in proptest::collection::btree_set("[a-z]{1,8}", 1..10)) {
                let site = MemorySite::new("p");
                for name in &names {
                    site.write(&format!("/d/{name}.txt"), name.as_bytes()).unwrap();
                }
                let dir = found(site.lookup("/d").unwrap());
                prop_assert_eq!(dir.entries.len(), names.len());
                for name in &names {
                    let file = found(site.lookup(&format!("/d/{name}.txt")).unwrap());
                    prop_assert_eq!(file.bytes, name.as_bytes().to_vec());
                }
            }
        }
    }
}
