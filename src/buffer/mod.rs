//! Versioned text documents.
//!
//! A [`Document`] owns a linear history of immutable snapshots. Each snapshot
//! pairs a [`Rope`] with a dirty flag and a property bag, so undo and redo
//! restore collaborator state (cursor, selections, caches) together with the
//! text. Starting a new edit after an undo discards the redo future.

mod listener;
mod property;
mod worker;

pub use listener::ChangeRegistration;
pub use property::PropKey;
pub use worker::{ChangeNotice, NotificationWorker};

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::invariant;
use crate::rope::Rope;
use listener::Listeners;
use property::Properties;

static UNTITLED_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// One immutable state in a document's history.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    rope: Rope,
    dirty: bool,
    properties: Properties,
}

/// A text buffer with undo/redo history and change notification.
pub struct Document {
    version: u64,
    filename: Option<PathBuf>,
    title: String,
    history: Vec<Snapshot>,
    current: usize,
    listeners: Listeners,
}

impl Document {
    /// Create a clean document holding `rope`.
    pub fn new(filename: Option<PathBuf>, rope: Rope) -> Self {
        let mut document = Self {
            version: 0,
            filename: None,
            title: String::new(),
            history: vec![Snapshot {
                rope,
                ..Snapshot::default()
            }],
            current: 0,
            listeners: Listeners::default(),
        };
        document.set_filename(filename);
        document
    }

    /// An untitled, empty document.
    pub fn empty() -> Self {
        Self::new(None, Rope::empty())
    }

    /// Build a document from a byte stream.
    ///
    /// # Errors
    /// Returns the source's read error.
    pub fn from_reader(filename: Option<PathBuf>, reader: impl Read) -> Result<Self> {
        let rope = Rope::read_all(reader)?;
        Ok(Self::new(filename, rope))
    }

    /// Load `path`. A file that does not exist yet yields an empty document
    /// that will be created on first save.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match File::open(path) {
            Ok(file) => {
                let document = Self::from_reader(Some(path.to_path_buf()), io::BufReader::new(file))?;
                tracing::info!(path = %path.display(), bytes = document.len(), "opened document");
                Ok(document)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "new file");
                Ok(Self::new(Some(path.to_path_buf()), Rope::empty()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub const fn version(&self) -> u64 {
        self.version
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// Set the file name and derive the title from it.
    ///
    /// A missing or empty name gives the document a fresh `Untitled N` title.
    pub fn set_filename(&mut self, filename: Option<PathBuf>) {
        self.filename = filename.filter(|name| !name.as_os_str().is_empty());
        self.title = match &self.filename {
            Some(name) => name.file_name().map_or_else(
                || name.display().to_string(),
                |base| base.to_string_lossy().into_owned(),
            ),
            None => format!("Untitled {}", UNTITLED_COUNTER.fetch_add(1, Ordering::Relaxed)),
        };
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// The current text.
    pub fn contents(&self) -> &Rope {
        &self.current().rope
    }

    pub fn len(&self) -> usize {
        self.contents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents().is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.current().dirty
    }

    /// Number of rows; a trailing newline starts one more (empty) row.
    pub fn row_count(&self) -> usize {
        1 + self.contents().newlines()
    }

    /// Byte offset of the first character of `row`.
    ///
    /// Rows past the end resolve to the start of the last row; the second
    /// element reports the row actually reached.
    pub fn index_for_row(&self, row: usize) -> (usize, usize) {
        let rope = self.contents();
        let reached = row.min(rope.newlines());
        let start = rope
            .line_start(reached)
            .unwrap_or_else(|| invariant::violated("row start past the last newline"));
        (start, reached)
    }

    /// Insert `text` at `idx`, clamped to the document length.
    ///
    /// Inserting nothing changes nothing.
    pub fn insert(&mut self, idx: usize, text: impl AsRef<[u8]>) {
        let text = text.as_ref();
        if text.is_empty() {
            return;
        }
        let idx = idx.min(self.len());
        let rope = self.contents().insert(idx, text);
        self.push_snapshot(rope);
        self.notify(idx..idx + text.len());
    }

    /// Delete the bytes between `start` and `end` (in either order), clamped.
    pub fn delete(&mut self, start: usize, end: usize) {
        let len = self.len();
        let (start, end) = (start.min(len), end.min(len));
        let (start, end) = if start > end { (end, start) } else { (start, end) };
        if start == end {
            return;
        }
        let rope = self.contents().delete(start, end);
        self.push_snapshot(rope);
        self.notify(start..end);
    }

    /// Replace the whole text as one undoable edit that leaves the document clean.
    pub fn reload(&mut self, rope: Rope) {
        self.push_snapshot(rope);
        self.current_mut().dirty = false;
        self.notify(0..self.len());
    }

    /// Step back one snapshot. Returns `false` at the oldest one.
    pub fn undo(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        self.version += 1;
        tracing::debug!(version = self.version, "undo");
        self.notify(0..self.len());
        true
    }

    /// Step forward one snapshot. Returns `false` at the newest one.
    pub fn redo(&mut self) -> bool {
        if self.current + 1 >= self.history.len() {
            return false;
        }
        self.current += 1;
        self.version += 1;
        tracing::debug!(version = self.version, "redo");
        self.notify(0..self.len());
        true
    }

    pub fn can_undo(&self) -> bool {
        self.current > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current + 1 < self.history.len()
    }

    /// Read a property from the current snapshot.
    pub fn property<T: 'static>(&self, key: PropKey<T>) -> Option<&T> {
        self.current().properties.get(key)
    }

    /// Set a property on the current snapshot.
    ///
    /// The value is not a history entry of its own; it is carried into the
    /// next edit's snapshot.
    pub fn set_property<T: 'static>(&mut self, key: PropKey<T>, value: T) {
        self.current_mut().properties.set(key, value);
    }

    /// Stream the text to `sink`, clearing the dirty flag on success.
    ///
    /// # Errors
    /// Returns the sink's write error; the document stays dirty.
    pub fn write_to(&mut self, sink: &mut impl Write) -> Result<u64> {
        let written = self.contents().write_to(sink)?;
        self.current_mut().dirty = false;
        Ok(written)
    }

    /// Save atomically to `path`, or to the stored filename when `None`.
    ///
    /// The text goes to a temporary file next to the target which is then
    /// renamed over it. On success the document is clean and adopts `path`
    /// as its filename. On failure the target is untouched and the temp file
    /// is removed.
    ///
    /// # Errors
    /// [`Error::NoFilename`] without a target, [`Error::Persist`] otherwise.
    pub fn save(&mut self, path: Option<&Path>) -> Result<u64> {
        let target = path
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| self.filename.clone())
            .ok_or(Error::NoFilename)?;

        let written = self.write_atomically(&target).map_err(|source| {
            tracing::warn!(path = %target.display(), error = %source, "save failed");
            Error::Persist {
                path: target.clone(),
                source,
            }
        })?;

        self.current_mut().dirty = false;
        if self.filename.as_deref() != Some(target.as_path()) {
            self.set_filename(Some(target.clone()));
        }
        tracing::info!(path = %target.display(), bytes = written, "saved document");
        Ok(written)
    }

    fn write_atomically(&self, target: &Path) -> io::Result<u64> {
        let dir = target
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        if let Ok(metadata) = fs::metadata(target) {
            temp.as_file().set_permissions(metadata.permissions())?;
        }

        let written = {
            let mut writer = BufWriter::new(temp.as_file_mut());
            let written = self.contents().write_to(&mut writer)?;
            writer.flush()?;
            written
        };
        temp.as_file().sync_all()?;
        temp.persist(target).map_err(|err| err.error)?;
        Ok(written)
    }

    /// Register `callback` to run after every successful edit, undo, redo,
    /// and reload, in registration order.
    ///
    /// The callback receives the document and the affected byte range. It must
    /// not register further listeners on the same document.
    pub fn on_change<F>(&self, callback: F) -> ChangeRegistration
    where
        F: FnMut(&Self, Range<usize>) + 'static,
    {
        self.listeners.add(Box::new(callback))
    }

    #[cfg(test)]
    pub(crate) fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn current(&self) -> &Snapshot {
        self.history
            .get(self.current)
            .unwrap_or_else(|| invariant::violated("document has no current snapshot"))
    }

    fn current_mut(&mut self) -> &mut Snapshot {
        let current = self.current;
        self.history
            .get_mut(current)
            .unwrap_or_else(|| invariant::violated("document has no current snapshot"))
    }

    /// Append a dirty snapshot derived from the current one, dropping any redo future.
    fn push_snapshot(&mut self, rope: Rope) {
        let next = Snapshot {
            rope,
            dirty: true,
            properties: self.current().properties.clone(),
        };
        self.history.truncate(self.current + 1);
        self.history.push(next);
        self.current = self.history.len() - 1;
        self.version += 1;
    }

    fn notify(&self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }
        self.listeners.notify(self, range);
    }
}

/// An empty document titled plain `Untitled`. Unlike [`Document::empty`] it
/// does not take a number from the untitled counter.
impl Default for Document {
    fn default() -> Self {
        Self {
            version: 0,
            filename: None,
            title: "Untitled".to_string(),
            history: vec![Snapshot::default()],
            current: 0,
            listeners: Listeners::default(),
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("title", &self.title)
            .field("filename", &self.filename)
            .field("version", &self.version)
            .field("len", &self.len())
            .field("dirty", &self.is_dirty())
            .field("history", &self.history.len())
            .finish_non_exhaustive()
    }
}
