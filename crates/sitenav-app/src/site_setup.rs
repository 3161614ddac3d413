use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sitenav_browser::{SiteFetcher, Url};
use sitenav_site::{DiskSite, MemorySite};

pub const DEMO_ORIGIN: &str = "mem://demo/";
pub const LOCAL_ORIGIN: &str = "file://local/";

/// Build the fetcher and the start URL: a directory served at
/// `file://local/` when one is given, otherwise the demo site.
pub fn build_fetcher(dir: Option<PathBuf>) -> Result<(SiteFetcher, Url)> {
    let mut fetcher = SiteFetcher::new();
    let start = match dir {
        Some(dir) => {
            let dir = dir
                .canonicalize()
                .with_context(|| format!("cannot open {}", dir.display()))?;
            anyhow::ensure!(dir.is_dir(), "{} is not a directory", dir.display());
            let origin = Url::parse(LOCAL_ORIGIN)?;
            fetcher.mount(&origin, Arc::new(DiskSite::new("local", dir)));
            origin
        },
        None => {
            let origin = Url::parse(DEMO_ORIGIN)?;
            fetcher.mount(&origin, Arc::new(demo_site()?));
            origin
        },
    };
    Ok((fetcher, start))
}

/// In-memory site with one page of every built-in type.
pub fn demo_site() -> Result<MemorySite> {
    let site = MemorySite::new("demo");
    site.write(
        "/index.txt",
        b"Welcome to sitenav.\n\
          Try: click docs, click photo.png, click private, back, forward.",
    )?;
    site.write("/docs/guide.md", b"# Guide\n\nUse `go <url>` to open a page.")?;
    site.write("/docs/notes.txt", b"Pages are cached per URL, ignoring the query.")?;
    site.write("/photo.png", &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a])?;
    site.write("/theme.mp3", &[0xff, 0xfb, 0x90, 0x00])?;
    site.write("/release.zip", &[b'P', b'K', 0x03, 0x04])?;
    site.write("/core.bin", &[0x00, 0x13, 0x37, 0x00])?;
    site.write("/private/credentials.txt", b"login accepted")?;
    site.protect("/private")?;
    Ok(site)
}
