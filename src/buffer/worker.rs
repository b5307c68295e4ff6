//! Background delivery of change notifications.
//!
//! Listeners registered with [`Document::on_change`] run synchronously on the
//! editing thread. Slow consumers (a language server client, for instance)
//! attach through a [`NotificationWorker`] instead: the listener only copies
//! the change into a bounded queue and a dedicated thread drains it in order.

use std::io;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, SyncSender};
use std::thread::{self, JoinHandle};

use super::{ChangeRegistration, Document};
use crate::rope::Rope;

/// An owned description of one applied edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub filename: Option<PathBuf>,
    /// Document version after the edit.
    pub version: u64,
    pub range: Range<usize>,
    /// Full content after the edit. Cheap to clone; shares the document's rope.
    pub contents: Rope,
}

impl ChangeNotice {
    fn capture(document: &Document, range: Range<usize>) -> Self {
        Self {
            filename: document.filename().map(Path::to_path_buf),
            version: document.version(),
            range,
            contents: document.contents().clone(),
        }
    }
}

enum Envelope {
    Notice(ChangeNotice),
    Stop,
}

/// A single background thread consuming change notices in FIFO order.
///
/// The queue is bounded: when it is full, the editing thread blocks until the
/// worker catches up. Notices are never dropped or reordered.
pub struct NotificationWorker {
    sender: SyncSender<Envelope>,
    handle: Option<JoinHandle<()>>,
}

impl NotificationWorker {
    /// Start the worker thread.
    ///
    /// # Errors
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn spawn<F>(queue_depth: usize, mut handler: F) -> io::Result<Self>
    where
        F: FnMut(ChangeNotice) + Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(queue_depth.max(1));
        let handle = thread::Builder::new()
            .name("tked-notify".to_string())
            .spawn(move || {
                for envelope in receiver {
                    match envelope {
                        Envelope::Notice(notice) => handler(notice),
                        Envelope::Stop => break,
                    }
                }
                tracing::debug!("notification worker stopped");
            })?;
        Ok(Self {
            sender,
            handle: Some(handle),
        })
    }

    /// Forward every change of `document` to this worker.
    pub fn attach(&self, document: &Document) -> ChangeRegistration {
        let sender = self.sender.clone();
        document.on_change(move |doc, range| {
            let notice = ChangeNotice::capture(doc, range);
            tracing::trace!(version = notice.version, range = ?notice.range, "queue change notice");
            if sender.send(Envelope::Notice(notice)).is_err() {
                tracing::warn!("notification worker is gone; change dropped");
            }
        })
    }

    /// Deliver everything already queued, then stop the thread.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let _ = self.sender.send(Envelope::Stop);
        if handle.join().is_err() {
            tracing::error!("notification handler panicked");
        }
    }
}

impl Drop for NotificationWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for NotificationWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationWorker")
            .field("running", &self.handle.is_some())
            .finish()
    }
}
