//! Built-in page types.
//!
//! These are plain-text stand-ins for real viewers: each summarizes its
//! resource as a [`UiHandle`]. Hosts with richer renderers replace them
//! through [`PageRegistry::register`](crate::registry::PageRegistry::register).

use sitenav_site::Resource;
use sitenav_types::error::{Result, SitenavError};

use crate::page::{PageAction, PageContent, PageEvent, UiHandle};
use crate::request::{Response, Status};

fn require_file(response: &Response) -> Result<&Resource> {
    response
        .file
        .as_ref()
        .ok_or_else(|| SitenavError::Page(format!("no resource for {}", response.url())))
}

// -----------------------------------------------------------------------
// Constructors (registered in PageRegistry)
// -----------------------------------------------------------------------

pub(crate) fn login(_: &Response) -> Result<Box<dyn PageContent>> {
    Ok(Box::new(LoginPage))
}

pub(crate) fn not_found(_: &Response) -> Result<Box<dyn PageContent>> {
    Ok(Box::new(NotFoundPage))
}

pub(crate) fn directory(_: &Response) -> Result<Box<dyn PageContent>> {
    Ok(Box::new(DirectoryPage::default()))
}

pub(crate) fn image(_: &Response) -> Result<Box<dyn PageContent>> {
    Ok(Box::new(BinaryPage::new("Image")))
}

pub(crate) fn archive(_: &Response) -> Result<Box<dyn PageContent>> {
    Ok(Box::new(BinaryPage::new("Archive")))
}

pub(crate) fn sound(_: &Response) -> Result<Box<dyn PageContent>> {
    Ok(Box::new(BinaryPage::new("Sound")))
}

pub(crate) fn text(_: &Response) -> Result<Box<dyn PageContent>> {
    Ok(Box::new(TextPage::default()))
}

pub(crate) fn unknown(_: &Response) -> Result<Box<dyn PageContent>> {
    Ok(Box::new(BinaryPage::new("Unknown file type")))
}

// -----------------------------------------------------------------------
// Login
// -----------------------------------------------------------------------

/// Shown for unauthorized responses. Confirming retries the navigation.
pub struct LoginPage;

impl PageContent for LoginPage {
    fn bind(&mut self, _response: &Response) -> Result<()> {
        Ok(())
    }

    fn build_ui(&mut self, response: &Response) -> Result<UiHandle> {
        Ok(UiHandle::new("Login")
            .line("Authorization required")
            .line(response.url().to_string())
            .line("[Login]"))
    }

    fn first_focus_target(&self) -> Option<&str> {
        Some("login")
    }

    fn handle_event(&mut self, event: &PageEvent) -> Result<PageAction> {
        Ok(match event {
            PageEvent::Confirm => PageAction::Retry,
            _ => PageAction::None,
        })
    }
}

// -----------------------------------------------------------------------
// Not found
// -----------------------------------------------------------------------

pub struct NotFoundPage;

impl PageContent for NotFoundPage {
    fn bind(&mut self, _response: &Response) -> Result<()> {
        Ok(())
    }

    fn build_ui(&mut self, response: &Response) -> Result<UiHandle> {
        Ok(UiHandle::new("Not Found")
            .line("The requested URL was not found on server.")
            .line(response.url().to_string()))
    }
}

// -----------------------------------------------------------------------
// Directory listing
// -----------------------------------------------------------------------

/// Lists a directory; clicking an entry navigates into it.
#[derive(Default)]
pub struct DirectoryPage {
    path: String,
    entries: Vec<String>,
}

impl PageContent for DirectoryPage {
    fn bind(&mut self, response: &Response) -> Result<()> {
        let file = require_file(response)?;
        self.path = file.path.trim_end_matches('/').to_string();
        self.entries = file.entries.clone();
        Ok(())
    }

    fn build_ui(&mut self, response: &Response) -> Result<UiHandle> {
        let path = &response.url().path;
        let mut ui = UiHandle::new(format!("Index of {path}"));
        ui.lines.extend(self.entries.iter().cloned());
        Ok(ui)
    }

    fn first_focus_target(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    fn handle_event(&mut self, event: &PageEvent) -> Result<PageAction> {
        match event {
            PageEvent::LinkClicked(name) if self.entries.contains(name) => {
                Ok(PageAction::Navigate(format!("{}/{name}", self.path)))
            },
            PageEvent::LinkClicked(name) => Err(SitenavError::Page(format!(
                "no entry named {name} in this directory"
            ))),
            _ => Ok(PageAction::None),
        }
    }
}

// -----------------------------------------------------------------------
// Text
// -----------------------------------------------------------------------

/// Shows text content. Any clicked link is followed relative to the page.
#[derive(Default)]
pub struct TextPage {
    text: String,
}

impl PageContent for TextPage {
    fn bind(&mut self, response: &Response) -> Result<()> {
        self.text = require_file(response)?.text().into_owned();
        Ok(())
    }

    fn build_ui(&mut self, response: &Response) -> Result<UiHandle> {
        let mut ui = UiHandle::new(response.url().file_name());
        ui.lines.extend(self.text.lines().map(str::to_string));
        Ok(ui)
    }

    fn handle_event(&mut self, event: &PageEvent) -> Result<PageAction> {
        Ok(match event {
            PageEvent::LinkClicked(target) => PageAction::Navigate(target.clone()),
            PageEvent::Input(text) => {
                self.text.push_str(text);
                PageAction::None
            },
            PageEvent::Confirm => PageAction::None,
        })
    }
}

// -----------------------------------------------------------------------
// Binary (image / archive / sound / unknown)
// -----------------------------------------------------------------------

/// Summary view for content the core cannot render itself.
pub struct BinaryPage {
    label: &'static str,
    size: usize,
}

impl BinaryPage {
    fn new(label: &'static str) -> Self {
        Self { label, size: 0 }
    }
}

impl PageContent for BinaryPage {
    fn bind(&mut self, response: &Response) -> Result<()> {
        self.size = require_file(response)?.bytes.len();
        Ok(())
    }

    fn build_ui(&mut self, response: &Response) -> Result<UiHandle> {
        Ok(UiHandle::new(response.url().file_name())
            .line(self.label)
            .line(format!("{} bytes", self.size)))
    }
}

// -----------------------------------------------------------------------
// Exception
// -----------------------------------------------------------------------

/// Reports a failure as console-style text. Never cached.
pub struct ExceptionPage {
    lines: Vec<String>,
}

impl ExceptionPage {
    pub fn new(header: &str, response: &Response) -> Self {
        let url = response.url().to_string();
        let lines = if response.status == Status::NotFound {
            vec![
                String::new(),
                "Not Found".to_string(),
                String::new(),
                "The requested URL was not found on server.".to_string(),
                String::new(),
                url,
            ]
        } else {
            let mut lines = vec![header.to_string(), format!("URL: {url}")];
            match &response.error {
                Some(error) => {
                    let mut chain = error.chain().into_iter();
                    if let Some(first) = chain.next() {
                        lines.push(first);
                    }
                    lines.extend(chain.map(|cause| format!("Caused by: {cause}")));
                },
                None => lines.push(format!("status {}", response.status.code())),
            }
            lines
        };
        Self { lines }
    }
}

impl PageContent for ExceptionPage {
    fn bind(&mut self, _response: &Response) -> Result<()> {
        Ok(())
    }

    fn build_ui(&mut self, _response: &Response) -> Result<UiHandle> {
        Ok(UiHandle {
            title: "Exception".to_string(),
            lines: self.lines.clone(),
        })
    }
}
