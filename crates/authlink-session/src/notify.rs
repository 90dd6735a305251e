//! The global notification channel.
//!
//! Actions announce their progress with three signals: fetch start, fetch
//! success and fetch error. Errors carry an [`ErrorReport`] whose
//! [`Presentation`] tells the UI layer whether to show it in the global
//! error area or next to the form that caused it. The coordinator has
//! exactly one way to report an error; rendering is the consumer's call.

use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;

/// Which kind of operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// OAuth popup sign-in.
    Popup,
    /// The remote login backend (request failed or no token returned).
    Backend,
    /// Account creation, verification email, or profile update.
    AccountCreation,
    /// The provider's state observer.
    Subscription,
    /// Durable storage.
    Storage,
}

/// Where an error should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Presentation {
    /// Application-wide error surface (snackbar, banner).
    Global,
    /// Next to the form that triggered it.
    Inline,
}

/// A failure relayed to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
    pub presentation: Presentation,
}

impl ErrorReport {
    pub fn global(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            presentation: Presentation::Global,
        }
    }

    pub fn inline(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            presentation: Presentation::Inline,
        }
    }
}

/// One signal on the notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    FetchStart,
    FetchSuccess,
    FetchError(ErrorReport),
}

impl Notice {
    /// Returns the error report, if this is an error notice.
    pub fn error(&self) -> Option<&ErrorReport> {
        match self {
            Self::FetchError(report) => Some(report),
            _ => None,
        }
    }
}

/// Receives notices from the coordinator.
///
/// `notify` is synchronous and must not block: it's called from inside
/// actions, between awaits.
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

// ---------------------------------------------------------------------------
// BroadcastNotifier
// ---------------------------------------------------------------------------

/// Fans notices out to any number of subscribers over a Tokio broadcast
/// channel.
///
/// Cloning shares the channel. A notice sent while nobody is subscribed is
/// dropped.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notice>,
}

impl BroadcastNotifier {
    /// Default number of notices a slow subscriber may lag behind.
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns a receiver for every notice sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl Notifier for BroadcastNotifier {
    fn notify(&self, notice: Notice) {
        // Err only means there are no subscribers right now.
        if self.sender.send(notice).is_err() {
            tracing::trace!("notice dropped, no subscribers");
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Keeps every notice in memory, in order. Handy in tests and scripts.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of everything recorded so far.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Only the error reports, in order.
    pub fn errors(&self) -> Vec<ErrorReport> {
        self.notices().iter().filter_map(Notice::error).cloned().collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
