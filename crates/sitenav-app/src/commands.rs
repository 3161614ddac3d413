//! Commands read from the prompt.

use std::time::Duration;

use anyhow::{Result, bail};
use serde::Serialize;
use sitenav_browser::{Browser, HistoryPosition, PageEvent};

/// How long a command waits for the page it requested.
const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

pub const HELP: &str = "\
Commands:
  go <url>        open a URL (relative to the current page)
  home            open the home page
  back, forward   move through history
  reload          fetch the current page again
  click <link>    activate a link on the current page
  login           confirm the current page (retries a login)
  history         list back/forward history
  clear           forget history and cached pages
  status [--json] show browser state
  show            print the current page
  help            this text
  quit            exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Go(String),
    Home,
    Back,
    Forward,
    Reload,
    Click(String),
    Login,
    History,
    Clear,
    Status { json: bool },
    Show,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        let cmd = match (name, arg) {
            ("", _) => return Ok(None),
            ("go" | "open", "") | ("click", "") => bail!("usage: {name} <url>"),
            ("go" | "open", url) => Command::Go(url.to_string()),
            ("click", link) => Command::Click(link.to_string()),
            ("home", _) => Command::Home,
            ("back", _) => Command::Back,
            ("forward", _) => Command::Forward,
            ("reload", _) => Command::Reload,
            ("login", _) => Command::Login,
            ("history", _) => Command::History,
            ("clear", _) => Command::Clear,
            ("status", "") => Command::Status { json: false },
            ("status", "--json") => Command::Status { json: true },
            ("status", other) => bail!("unknown status option '{other}'"),
            ("show", _) => Command::Show,
            ("help" | "?", _) => Command::Help,
            ("quit" | "exit", _) => Command::Quit,
            (other, _) => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(Some(cmd))
    }
}

/// What the prompt loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Print(String),
    Quit,
}

/// Browser state as printed by `status --json`.
#[derive(Debug, Serialize)]
pub struct StatusSnapshot {
    pub url: Option<String>,
    pub page_type: Option<String>,
    pub loading: bool,
    pub status: String,
    pub activity: String,
    pub back: usize,
    pub forward: usize,
    pub cached_pages: usize,
}

impl StatusSnapshot {
    pub fn capture(browser: &Browser) -> Self {
        Self {
            url: browser.current_url().map(|u| u.to_string()),
            page_type: browser
                .current_page()
                .map(|p| format!("{:?}", p.borrow().kind())),
            loading: browser.is_loading(),
            status: browser.status_text().to_string(),
            activity: browser.activity_text().to_string(),
            back: browser.history().back_len(),
            forward: browser.history().forward_len(),
            cached_pages: browser.cache().len(),
        }
    }
}

/// Run `cmd` against `browser`, waiting for any load it starts.
pub fn execute(browser: &mut Browser, cmd: Command) -> Result<Outcome> {
    match cmd {
        Command::Go(text) => {
            browser.navigate_to_string(&text)?;
            settle(browser);
            Ok(Outcome::Print(render(browser)))
        },
        Command::Home => {
            browser.go_home()?;
            settle(browser);
            Ok(Outcome::Print(render(browser)))
        },
        Command::Back => Ok(step(browser, Browser::track_back)),
        Command::Forward => Ok(step(browser, Browser::track_forward)),
        Command::Reload => {
            browser.reload_current();
            settle(browser);
            Ok(Outcome::Print(render(browser)))
        },
        Command::Click(link) => {
            browser.dispatch_event(&PageEvent::LinkClicked(link));
            settle(browser);
            Ok(Outcome::Print(render(browser)))
        },
        Command::Login => {
            browser.dispatch_event(&PageEvent::Confirm);
            settle(browser);
            Ok(Outcome::Print(render(browser)))
        },
        Command::History => Ok(Outcome::Print(history(browser))),
        Command::Clear => {
            browser.clear_history();
            Ok(Outcome::Print("history cleared".to_string()))
        },
        Command::Status { json } => {
            let snapshot = StatusSnapshot::capture(browser);
            let text = if json {
                serde_json::to_string_pretty(&snapshot)?
            } else {
                format!(
                    "url: {}\ntype: {}\nloading: {}\nback: {}  forward: {}  cached: {}",
                    snapshot.url.as_deref().unwrap_or("-"),
                    snapshot.page_type.as_deref().unwrap_or("-"),
                    snapshot.loading,
                    snapshot.back,
                    snapshot.forward,
                    snapshot.cached_pages,
                )
            };
            Ok(Outcome::Print(text))
        },
        Command::Show => Ok(Outcome::Print(render(browser))),
        Command::Help => Ok(Outcome::Print(HELP.to_string())),
        Command::Quit => Ok(Outcome::Quit),
    }
}

fn step(browser: &mut Browser, track: fn(&mut Browser) -> bool) -> Outcome {
    if !track(browser) {
        return Outcome::Print("(no history in that direction)".to_string());
    }
    settle(browser);
    Outcome::Print(render(browser))
}

fn settle(browser: &mut Browser) {
    if browser.is_loading() && !browser.wait_for_load(LOAD_TIMEOUT) {
        log::warn!("still loading after {}s", LOAD_TIMEOUT.as_secs());
    }
}

fn render(browser: &Browser) -> String {
    let Some(page) = browser.current_page() else {
        return "(no page)".to_string();
    };
    let page = page.borrow();
    let mut out = format!("== {} [{:?}] {}", page.title(), page.kind(), page.url());
    if let Some(ui) = page.ui() {
        for line in &ui.lines {
            out.push('\n');
            out.push_str(line);
        }
    }
    out
}

fn history(browser: &Browser) -> String {
    let entries = browser.history().entries();
    if entries.is_empty() {
        return "(empty)".to_string();
    }
    entries
        .into_iter()
        .map(|(pos, url)| {
            let marker = match pos {
                HistoryPosition::Forward => "  +",
                HistoryPosition::Current => "  *",
                HistoryPosition::Back => "  -",
            };
            format!("{marker} {url}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
