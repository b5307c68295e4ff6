use std::path::Path;
use std::time::Duration;

use crate::app::{App, Message, Model, ToastLevel};
use crate::buffer::ChangeNotice;
use crate::error::Error;
use crate::watcher::FileWatcher;

impl App {
    pub(super) fn make_file_watcher(path: &Path) -> notify::Result<FileWatcher> {
        FileWatcher::new(path, Duration::from_millis(200))
    }

    pub(super) fn handle_message_side_effects(model: &mut Model, msg: &Message) {
        match msg {
            Message::Save => save(model),
            Message::FileChanged => match model.reload_from_disk() {
                Ok(true) => model.show_toast(ToastLevel::Info, "Reloaded from disk"),
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "reload failed");
                    model.show_toast(ToastLevel::Error, format!("Reload failed: {err:#}"));
                }
            },
            _ => {}
        }
    }
}

fn save(model: &mut Model) {
    match model.view.save(None) {
        Ok(bytes) => {
            let title = model.view.document().title().to_owned();
            model.show_toast(ToastLevel::Info, format!("Saved {title} ({bytes} bytes)"));
            if model.quit_confirmed {
                model.should_quit = true;
            }
        }
        Err(Error::NoFilename) => model.show_toast(
            ToastLevel::Warning,
            "No file name: start tked with a FILE argument to save",
        ),
        Err(err) => model.show_toast(ToastLevel::Error, err.to_string()),
    }
}

/// Worker-thread handler for document change notices.
///
/// This is where a language-server client would forward edits.
pub(super) fn log_change(notice: ChangeNotice) {
    tracing::trace!(
        file = ?notice.filename,
        version = notice.version,
        start = notice.range.start,
        end = notice.range.end,
        len = notice.contents.len(),
        "document changed"
    );
}
