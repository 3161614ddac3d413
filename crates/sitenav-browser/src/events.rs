//! Property-change notifications for browser chrome.

use std::fmt;

use crate::url::Url;

/// A browser property changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserEvent {
    /// A different page is now displayed (`None` when the slot was
    /// cleared).
    PageChanged { url: Option<Url> },
    LoadingChanged(bool),
    StatusChanged(String),
    ActivityChanged(String),
}

impl fmt::Display for BrowserEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowserEvent::PageChanged { url: Some(url) } => write!(f, "page: {url}"),
            BrowserEvent::PageChanged { url: None } => write!(f, "page: (none)"),
            BrowserEvent::LoadingChanged(loading) => write!(f, "loading: {loading}"),
            BrowserEvent::StatusChanged(text) => write!(f, "status: {text}"),
            BrowserEvent::ActivityChanged(text) => write!(f, "activity: {text}"),
        }
    }
}

/// Handle returned by `Browser::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type Listener = Box<dyn FnMut(&BrowserEvent)>;

/// Registered listeners, called in subscription order.
#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    pub fn subscribe(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn emit(&mut self, event: &BrowserEvent) {
        log::trace!("{event}");
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn listeners_receive_in_order_until_unsubscribed() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::default();

        let a = {
            let seen = Rc::clone(&seen);
            listeners.subscribe(Box::new(move |e: &BrowserEvent| {
                seen.borrow_mut().push(format!("a {e}"))
            }))
        };
        {
            let seen = Rc::clone(&seen);
            listeners.subscribe(Box::new(move |e: &BrowserEvent| {
                seen.borrow_mut().push(format!("b {e}"))
            }));
        }

        listeners.emit(&BrowserEvent::LoadingChanged(true));
        assert!(listeners.unsubscribe(a));
        assert!(!listeners.unsubscribe(a));
        listeners.emit(&BrowserEvent::StatusChanged("done".into()));

        assert_eq!(
            *seen.borrow(),
            vec![
                "a loading: true".to_string(),
                "b loading: true".to_string(),
                "b status: done".to_string(),
            ]
        );
    }
}
