//! Page-type selection and construction.
//!
//! [`PageRegistry::resolve_page_type`] is a pure function of the response.
//! Precedence is fixed: site status first (unauthorized, then any other
//! non-OK), then directory-ness, then the extension table, then the site's
//! text flag, then [`PageType::Unknown`].

use std::collections::HashMap;

use sitenav_types::error::{Result, SitenavError};

use crate::config::ExtensionTable;
use crate::page::{Page, PageContent};
use crate::pages;
use crate::request::{Response, Status};

/// The closed set of page kinds the browser can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    Login,
    NotFound,
    Directory,
    Image,
    Archive,
    Sound,
    Text,
    Unknown,
    Exception,
}

impl PageType {
    pub const ALL: [PageType; 9] = [
        PageType::Login,
        PageType::NotFound,
        PageType::Directory,
        PageType::Image,
        PageType::Archive,
        PageType::Sound,
        PageType::Text,
        PageType::Unknown,
        PageType::Exception,
    ];
}

/// Builds the content for one page type.
pub type PageConstructor = fn(&Response) -> Result<Box<dyn PageContent>>;

/// Maps extensions to page types and page types to constructors.
pub struct PageRegistry {
    extensions: HashMap<String, PageType>,
    constructors: HashMap<PageType, PageConstructor>,
    console_header: String,
}

impl PageRegistry {
    /// Registry with the built-in page types and the given extension table.
    pub fn new(table: &ExtensionTable, console_header: &str) -> Self {
        let mut registry = Self {
            extensions: HashMap::new(),
            constructors: HashMap::new(),
            console_header: console_header.to_string(),
        };
        for (exts, kind) in [
            (&table.image, PageType::Image),
            (&table.archive, PageType::Archive),
            (&table.sound, PageType::Sound),
            (&table.text, PageType::Text),
        ] {
            for ext in exts {
                registry.register_extension(ext, kind);
            }
        }
        registry.register(PageType::Login, pages::login);
        registry.register(PageType::NotFound, pages::not_found);
        registry.register(PageType::Directory, pages::directory);
        registry.register(PageType::Image, pages::image);
        registry.register(PageType::Archive, pages::archive);
        registry.register(PageType::Sound, pages::sound);
        registry.register(PageType::Text, pages::text);
        registry.register(PageType::Unknown, pages::unknown);
        registry
    }

    /// Map a (case-insensitive) extension to a page type.
    pub fn register_extension(&mut self, ext: &str, kind: PageType) {
        self.extensions
            .insert(ext.trim_start_matches('.').to_ascii_lowercase(), kind);
    }

    /// Install the constructor for a page type, replacing the built-in.
    /// Exception pages are always built by the browser itself.
    pub fn register(&mut self, kind: PageType, ctor: PageConstructor) {
        if kind != PageType::Exception {
            self.constructors.insert(kind, ctor);
        }
    }

    /// Choose the page type for a response. Pure.
    pub fn resolve_page_type(&self, response: &Response) -> PageType {
        match response.status {
            Status::Unauthorized => return PageType::Login,
            Status::Ok => {},
            _ => return PageType::NotFound,
        }

        let file = response.file.as_ref();
        if file.is_some_and(|f| f.is_dir()) {
            return PageType::Directory;
        }

        if let Some(kind) = self.extensions.get(&response.path_type()) {
            return *kind;
        }

        if file.is_some_and(|f| f.is_text()) {
            return PageType::Text;
        }

        PageType::Unknown
    }

    /// Resolve and construct the page for a response.
    ///
    /// Errors from the constructor or from binding are returned to the
    /// caller, which shows an exception page instead.
    pub fn create_page(&self, response: Response) -> Result<Page> {
        let kind = self.resolve_page_type(&response);
        let ctor = self
            .constructors
            .get(&kind)
            .ok_or_else(|| SitenavError::Page(format!("no constructor for {kind:?} pages")))?;
        let content = ctor(&response)?;
        Page::new(kind, response, content)
    }

    /// Build the page that reports `response.error` (or the not-found
    /// notice for a not-found response). Never fails.
    pub fn create_exception_page(&self, response: Response) -> Page {
        let content = pages::ExceptionPage::new(&self.console_header, &response);
        Page::prebound(PageType::Exception, response, Box::new(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrowserConfig;
    use crate::request::Request;
    use crate::url::Url;
    use sitenav_site::Resource;

    fn registry() -> PageRegistry {
        let config = BrowserConfig::default();
        PageRegistry::new(&config.extensions, &config.console_header)
    }

    fn ok(path: &str, file: Resource) -> Response {
        let url = Url::parse(&format!("mem://t{path}")).unwrap();
        Response::with_file(Request::new(url), file)
    }

    #[test]
    fn unauthorized_beats_everything() {
        let mut resp = ok("/a.png", Resource::file("/a.png", vec![]));
        resp.status = Status::Unauthorized;
        assert_eq!(registry().resolve_page_type(&resp), PageType::Login);
    }

    #[test]
    fn non_ok_is_not_found() {
        let mut resp = ok("/a.txt", Resource::file("/a.txt", vec![]));
        resp.status = Status::Other(500);
        assert_eq!(registry().resolve_page_type(&resp), PageType::NotFound);
        resp.status = Status::NotFound;
        assert_eq!(registry().resolve_page_type(&resp), PageType::NotFound);
    }

    #[test]
    fn directory_beats_extension() {
        let resp = ok("/photos.png", Resource::directory("/photos.png", vec![]));
        assert_eq!(registry().resolve_page_type(&resp), PageType::Directory);
    }

    #[test]
    fn extension_table() {
        let reg = registry();
        let cases = [
            ("/a.JPG", PageType::Image),
            ("/a.gif", PageType::Image),
            ("/a.zip", PageType::Archive),
            ("/a.jar", PageType::Archive),
            ("/a.mp3", PageType::Sound),
            ("/a.txt", PageType::Text),
            ("/a.java", PageType::Text),
        ];
        for (path, expected) in cases {
            let resp = ok(path, Resource::file(path, vec![0xff, 0x00]));
            assert_eq!(reg.resolve_page_type(&resp), expected, "{path}");
        }
    }

    #[test]
    fn text_flag_then_unknown_fallback() {
        let reg = registry();
        let text = ok("/LICENSE", Resource::file("/LICENSE", b"MIT".to_vec()));
        assert_eq!(reg.resolve_page_type(&text), PageType::Text);
        let blob = ok("/blob.bin", Resource::file("/blob.bin", vec![0x00, 0xff]));
        assert_eq!(reg.resolve_page_type(&blob), PageType::Unknown);
    }

    #[test]
    fn registered_extension_overrides_table() {
        let mut reg = registry();
        reg.register_extension(".SNP", PageType::Text);
        let resp = ok("/doc.snp", Resource::file("/doc.snp", vec![0x00]));
        assert_eq!(reg.resolve_page_type(&resp), PageType::Text);
    }

    #[test]
    fn failing_constructor_surfaces_error() {
        fn broken(_: &Response) -> Result<Box<dyn PageContent>> {
            Err(SitenavError::Page("renderer missing".into()))
        }
        let mut reg = registry();
        reg.register(PageType::Image, broken);
        let resp = ok("/a.png", Resource::file("/a.png", vec![]));
        let err = reg.create_page(resp).unwrap_err();
        assert_eq!(err.to_string(), "page error: renderer missing");
    }

    #[test]
    fn exception_constructor_cannot_be_replaced() {
        let mut reg = registry();
        reg.register(PageType::Exception, pages::unknown);
        assert!(!reg.constructors.contains_key(&PageType::Exception));
    }

    #[test]
    fn every_kind_but_exception_has_constructor() {
        let reg = registry();
        for kind in PageType::ALL {
            assert_eq!(
                reg.constructors.contains_key(&kind),
                kind != PageType::Exception,
                "{kind:?}"
            );
        }
    }
}
