//! Back/forward navigation history.
//!
//! The current URL lives outside both stacks. Recording can be switched
//! off permanently with [`NavigationHistory::set_enabled`] or for a scope
//! with [`NavigationHistory::suppress`]; the browser suppresses recording
//! while it replays a back/forward jump so the replay is not recorded as a
//! new visit.

use std::cell::Cell;
use std::rc::Rc;

use crate::url::Url;

/// Holds history recording off until dropped. Guards nest.
#[must_use = "recording resumes as soon as the guard is dropped"]
pub struct SuppressGuard {
    depth: Rc<Cell<usize>>,
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

/// Back stack, forward stack and the current URL.
#[derive(Debug)]
pub struct NavigationHistory {
    back_stack: Vec<Url>,
    forward_stack: Vec<Url>,
    current: Option<Url>,
    enabled: bool,
    suppressed: Rc<Cell<usize>>,
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self {
            back_stack: Vec::new(),
            forward_stack: Vec::new(),
            current: None,
            enabled: true,
            suppressed: Rc::new(Cell::new(0)),
        }
    }

    /// Whether a visit would be recorded right now.
    pub fn is_recording(&self) -> bool {
        self.enabled && self.suppressed.get() == 0
    }

    /// Record that `url` is now displayed. Returns whether the stacks
    /// changed.
    ///
    /// No-op while disabled or suppressed, and when `url` is already
    /// current. The very first visit only sets the current URL.
    pub fn record_visit(&mut self, url: &Url) -> bool {
        if !self.is_recording() || self.current.as_ref() == Some(url) {
            return false;
        }
        if let Some(previous) = self.current.replace(url.clone()) {
            self.back_stack.push(previous);
            self.forward_stack.clear();
        }
        true
    }

    /// Step back. Returns the URL the browser should now show, or `None`
    /// when there is nothing to go back to.
    pub fn track_back(&mut self) -> Option<Url> {
        let target = self.back_stack.pop()?;
        if let Some(current) = self.current.replace(target.clone()) {
            self.forward_stack.push(current);
        }
        Some(target)
    }

    /// Step forward. Mirror of [`track_back`](Self::track_back).
    pub fn track_forward(&mut self) -> Option<Url> {
        let target = self.forward_stack.pop()?;
        if let Some(current) = self.current.replace(target.clone()) {
            self.back_stack.push(current);
        }
        Some(target)
    }

    /// The URL `track_back` would go to.
    pub fn last_url(&self) -> Option<&Url> {
        self.back_stack.last()
    }

    /// The URL `track_forward` would go to.
    pub fn next_url(&self) -> Option<&Url> {
        self.forward_stack.last()
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.current.as_ref()
    }

    /// Forget both stacks, keeping the current URL.
    pub fn clear(&mut self) {
        self.back_stack.clear();
        self.forward_stack.clear();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stop recording until the returned guard is dropped.
    pub fn suppress(&self) -> SuppressGuard {
        self.suppressed.set(self.suppressed.get() + 1);
        SuppressGuard {
            depth: Rc::clone(&self.suppressed),
        }
    }

    pub fn back_len(&self) -> usize {
        self.back_stack.len()
    }

    pub fn forward_len(&self) -> usize {
        self.forward_stack.len()
    }

    /// Entries most recent first: forward stack (furthest first), current,
    /// then back stack.
    pub fn entries(&self) -> Vec<(HistoryPosition, &Url)> {
        let forward = self
            .forward_stack
            .iter()
            .map(|u| (HistoryPosition::Forward, u));
        let current = self.current.iter().map(|u| (HistoryPosition::Current, u));
        let back = self
            .back_stack
            .iter()
            .rev()
            .map(|u| (HistoryPosition::Back, u));
        forward.chain(current).chain(back).collect()
    }
}

/// Where an entry returned by [`NavigationHistory::entries`] sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPosition {
    Back,
    Current,
    Forward,
}
