use std::io::stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, ToastLevel, update};
use crate::buffer::{Document, NotificationWorker};
use crate::view::View;
use crate::watcher::FileWatcher;

/// Pending change notices allowed before editing waits on the worker.
const NOTIFY_QUEUE_DEPTH: usize = 64;

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the terminal cannot be
    /// initialized, or the event loop hits an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let document = match &self.file_path {
            Some(path) => Document::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?,
            None => Document::empty(),
        };
        let view = View::new(document).with_tab_width(self.settings.tab_width());

        let worker = NotificationWorker::spawn(NOTIFY_QUEUE_DEPTH, super::effects::log_change)
            .context("Failed to start change notification worker")?;
        let registration = worker.attach(view.document());

        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal; tked requires an interactive terminal")?;
        let size = terminal.size()?;
        let mut model = Model::new(view, (size.width, size.height));
        model.watch_enabled = self.watch_enabled;

        let result = execute!(stdout(), EnableMouseCapture, EnableBracketedPaste)
            .map_err(anyhow::Error::from)
            .and_then(|()| Self::event_loop(&mut terminal, &mut model));

        // Restore terminal
        let _ = execute!(stdout(), DisableBracketedPaste, DisableMouseCapture);
        ratatui::restore();

        registration.remove();
        worker.shutdown();
        result
    }

    fn dispatch(model: &mut Model, msg: Message) {
        tracing::trace!(?msg, "message");
        let side_msg = msg.clone();
        *model = update(std::mem::take(model), msg);
        Self::handle_message_side_effects(model, &side_msg);
    }

    fn event_loop(terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(50);
        let mut file_watcher = Self::start_watcher(model);
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                Self::dispatch(model, Message::Resize(width, height));
                needs_render = true;
            }

            if file_watcher
                .as_mut()
                .is_some_and(FileWatcher::take_change_ready)
            {
                Self::dispatch(model, Message::FileChanged);
                needs_render = true;
            }

            if needs_render {
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }

            let poll_ms = if resize_debouncer.is_pending() { 10 } else { 250 };
            if event::poll(Duration::from_millis(poll_ms))? {
                // Coalesce key repeat bursts and pastes into a single render.
                loop {
                    let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    let msg =
                        Self::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer);
                    if let Some(msg) = msg {
                        Self::dispatch(model, msg);
                        needs_render = true;
                    }
                    if model.should_quit || !event::poll(Duration::from_millis(0))? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn start_watcher(model: &mut Model) -> Option<FileWatcher> {
        if !model.watch_enabled {
            return None;
        }
        let Some(path) = model.view.document().filename().map(ToOwned::to_owned) else {
            model.watch_enabled = false;
            model.show_toast(ToastLevel::Warning, "Watch needs a file name");
            return None;
        };
        match Self::make_file_watcher(&path) {
            Ok(watcher) => Some(watcher),
            Err(err) => {
                model.watch_enabled = false;
                model.show_toast(ToastLevel::Warning, format!("Watch unavailable: {err}"));
                tracing::warn!(path = %path.display(), error = %err, "watcher failed");
                None
            }
        }
    }
}
