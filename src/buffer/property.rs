//! Opaque, versioned document properties.
//!
//! Collaborators mint a [`PropKey`] once and use it to attach their own state
//! to a document. Values live in the current snapshot and are copied forward
//! (shallowly) on every edit, so undo and redo restore them with the text.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// A process-wide unique key for values of type `T`.
///
/// Keys compare by identity: two calls to [`PropKey::register`] never collide,
/// even for the same `T`.
pub struct PropKey<T> {
    id: u64,
    _value: PhantomData<fn() -> T>,
}

impl<T: 'static> PropKey<T> {
    /// Mint a new key.
    pub fn register() -> Self {
        Self {
            id: NEXT_KEY.fetch_add(1, Ordering::Relaxed),
            _value: PhantomData,
        }
    }
}

impl<T> PropKey<T> {
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl<T> Clone for PropKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PropKey<T> {}

impl<T> PartialEq for PropKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for PropKey<T> {}

impl<T> fmt::Debug for PropKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PropKey({})", self.id)
    }
}

/// Association list of property values for one snapshot.
///
/// Cloning shares the values; replacing one in a clone leaves the original
/// snapshot's value alone.
#[derive(Clone, Default)]
pub(crate) struct Properties {
    entries: Vec<(u64, Rc<dyn Any>)>,
}

impl Properties {
    pub(crate) fn get<T: 'static>(&self, key: PropKey<T>) -> Option<&T> {
        self.entries
            .iter()
            .find(|(id, _)| *id == key.id)
            .and_then(|(_, value)| (**value).downcast_ref::<T>())
    }

    pub(crate) fn set<T: 'static>(&mut self, key: PropKey<T>, value: T) {
        let value: Rc<dyn Any> = Rc::new(value);
        match self.entries.iter_mut().find(|(id, _)| *id == key.id) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.id, value)),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(id, _)| id))
            .finish()
    }
}
