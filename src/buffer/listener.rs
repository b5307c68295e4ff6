//! Change listener registry.

use std::cell::{Cell, RefCell};
use std::ops::Range;
use std::rc::{Rc, Weak};

use super::Document;
use crate::invariant;

type Callback = Box<dyn FnMut(&Document, Range<usize>)>;

struct Listener {
    active: Rc<Cell<bool>>,
    callback: Callback,
}

/// Listeners in registration order.
#[derive(Default)]
pub(crate) struct Listeners {
    inner: Rc<RefCell<Vec<Listener>>>,
}

impl Listeners {
    pub(crate) fn add(&self, callback: Callback) -> ChangeRegistration {
        let active = Rc::new(Cell::new(true));
        let Ok(mut list) = self.inner.try_borrow_mut() else {
            invariant::violated("change listener registered from inside a change notification");
        };
        list.push(Listener {
            active: Rc::clone(&active),
            callback,
        });
        ChangeRegistration {
            active,
            listeners: Rc::downgrade(&self.inner),
        }
    }

    pub(crate) fn notify(&self, document: &Document, range: Range<usize>) {
        let Ok(mut list) = self.inner.try_borrow_mut() else {
            invariant::violated("change notification re-entered");
        };
        for listener in list.iter_mut() {
            if listener.active.get() {
                (listener.callback)(document, range.clone());
            }
        }
        list.retain(|listener| listener.active.get());
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.borrow().len()
    }
}

/// Handle returned by [`Document::on_change`].
///
/// Dropping the handle keeps the listener registered; call
/// [`ChangeRegistration::remove`] to stop notifications.
pub struct ChangeRegistration {
    active: Rc<Cell<bool>>,
    listeners: Weak<RefCell<Vec<Listener>>>,
}

impl ChangeRegistration {
    /// Deregister the listener. Safe to call from inside a notification.
    pub fn remove(self) {
        self.active.set(false);
        if let Some(list) = self.listeners.upgrade()
            && let Ok(mut list) = list.try_borrow_mut()
        {
            list.retain(|listener| listener.active.get());
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl std::fmt::Debug for ChangeRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeRegistration")
            .field("active", &self.active.get())
            .finish()
    }
}
