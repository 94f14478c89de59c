//! A fixed set of connections shared between threads
//!
//! Each connection sits behind its own `parking_lot::Mutex`. A caller takes
//! the first idle one; when all are busy it queues on one chosen round-robin.

use crate::exec::Executor;
use libris_core::errors::{LbError, LbErrorKind};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct Pool<C> {
    slots: Vec<Mutex<C>>,
    next: AtomicUsize,
}

/// The pool type the service runs on
pub type CatalogPool = Pool<Box<dyn Executor + Send>>;

impl<C> Pool<C> {
    /// # Errors
    /// `Configuration` when `connections` is empty.
    pub fn new(connections: Vec<C>) -> Result<Self, LbError> {
        if connections.is_empty() {
            return Err(LbError::new(LbErrorKind::Configuration)
                .with_op("pool_new")
                .with_message("a pool needs at least one connection"));
        }
        Ok(Self {
            slots: connections.into_iter().map(Mutex::new).collect(),
            next: AtomicUsize::new(0),
        })
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Run `f` with exclusive use of one connection
    pub fn with<T>(&self, f: impl FnOnce(&mut C) -> T) -> T {
        for slot in &self.slots {
            if let Some(mut conn) = slot.try_lock() {
                return f(&mut conn);
            }
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.slots.len();
        let mut conn = self.slots[index].lock();
        f(&mut conn)
    }
}
