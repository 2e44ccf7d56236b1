use core::cell::UnsafeCell;
use std::collections::VecDeque;

/// FIFO queue shared across threads with no synchronization at all.
///
/// There is no lock and no atomic inside: two threads touching the queue at
/// the same time is a data race, with lost updates, corrupted internal state
/// or a crash as possible outcomes. The contention harness uses it on purpose
/// to show that hazard; every accessor is `unsafe` so each call site has to
/// say so.
pub struct RacyQueue<T> {
    inner: UnsafeCell<VecDeque<T>>,
}

// Safety: none. Sharing is only sound while callers uphold the contracts on the
// unsafe accessors below; the unsynchronized and flag-gated regimes do not.
unsafe impl<T: Send> Sync for RacyQueue<T> {}

impl<T> Default for RacyQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RacyQueue<T> {
    pub fn new() -> Self {
        Self {
            inner: UnsafeCell::new(VecDeque::new()),
        }
    }

    /// # Safety
    /// No other thread may access the queue for the duration of the call.
    #[inline]
    pub unsafe fn push(&self, value: T) {
        (*self.inner.get()).push_back(value);
    }

    /// # Safety
    /// No other thread may access the queue for the duration of the call.
    #[inline]
    pub unsafe fn pop(&self) -> Option<T> {
        (*self.inner.get()).pop_front()
    }

    /// # Safety
    /// No other thread may mutate the queue for the duration of the call.
    #[inline]
    pub unsafe fn is_empty(&self) -> bool {
        (*self.inner.get()).is_empty()
    }

    /// # Safety
    /// No other thread may mutate the queue for the duration of the call.
    #[inline]
    pub unsafe fn len(&self) -> usize {
        (*self.inner.get()).len()
    }

    /// Exclusive access makes this safe.
    pub fn get_mut(&mut self) -> &mut VecDeque<T> {
        self.inner.get_mut()
    }

    pub fn into_inner(self) -> VecDeque<T> {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_when_used_by_one_thread() {
        let q = RacyQueue::new();
        unsafe {
            q.push(10);
            q.push(20);
            assert_eq!(q.len(), 2);
            assert_eq!(q.pop(), Some(10));
            assert!(!q.is_empty());
            assert_eq!(q.pop(), Some(20));
            assert!(q.is_empty());
        }
    }

    #[test]
    fn handoff_after_join_is_sound() {
        let q = Arc::new(RacyQueue::new());
        let producer = {
            let q = q.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    // Only thread touching the queue until the join below.
                    unsafe { q.push(i) };
                }
            })
        };
        producer.join().unwrap();

        let mut q = Arc::try_unwrap(q).ok().unwrap();
        assert_eq!(q.get_mut().len(), 100);
        assert_eq!(q.into_inner().into_iter().collect::<Vec<_>>(), (0..100).collect::<Vec<_>>());
    }
}
