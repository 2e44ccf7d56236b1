use parking_lot::Mutex;
use std::collections::VecDeque;

/// Unbounded FIFO where every push and pop holds one exclusive lock.
#[derive(Debug)]
pub struct LockedQueue<T> {
    inner: Mutex<VecDeque<T>>,
}

impl<T> Default for LockedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LockedQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    #[inline]
    pub fn push(&self, value: T) {
        self.inner.lock().push_back(value);
    }

    /// Emptiness check and pop in one critical section.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        self.inner.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn into_inner(self) -> VecDeque<T> {
        self.inner.into_inner()
    }
}
