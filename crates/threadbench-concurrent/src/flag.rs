use crossbeam_utils::CachePadded;
use std::fmt;

#[cfg(not(all(test, feature = "loom")))]
use core::sync::atomic::{AtomicBool, Ordering};
#[cfg(all(test, feature = "loom"))]
use loom::sync::atomic::{AtomicBool, Ordering};

/// "All producers finished" signal.
///
/// Every load and store is `SeqCst`, so all threads observe flag writes in one
/// global order. Padded to its own cache line since consumers spin on it.
pub struct CompletionFlag {
    done: CachePadded<AtomicBool>,
}

impl CompletionFlag {
    pub fn new() -> Self {
        Self {
            done: CachePadded::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Set the flag. Returns `true` only for the call that performed the false→true transition.
    #[inline]
    pub fn mark_done(&self) -> bool {
        !self.done.swap(true, Ordering::SeqCst)
    }

    /// Back to false, ready for another run.
    pub fn reset(&self) {
        self.done.store(false, Ordering::SeqCst);
    }
}

impl Default for CompletionFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CompletionFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionFlag")
            .field("done", &self.is_done())
            .finish()
    }
}

#[cfg(all(test, not(feature = "loom")))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn transitions_once_until_reset() {
        let flag = CompletionFlag::new();
        assert!(!flag.is_done());
        assert!(flag.mark_done());
        assert!(flag.is_done());
        assert!(!flag.mark_done());
        assert!(flag.is_done());

        flag.reset();
        assert!(!flag.is_done());
        assert!(flag.mark_done());
    }

    #[test]
    fn exactly_one_racing_setter_wins() {
        let flag = Arc::new(CompletionFlag::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let flag = flag.clone();
                thread::spawn(move || flag.mark_done())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert!(flag.is_done());
    }

    #[test]
    fn debug_shows_state() {
        let flag = CompletionFlag::default();
        assert_eq!(format!("{:?}", flag), "CompletionFlag { done: false }");
    }
}

#[cfg(all(test, feature = "loom"))]
mod loom_tests {
    use super::*;
    use loom::sync::Arc;
    use loom::thread;

    // Two racing setters against a waiting consumer, as in the flag-gated shutdown.
    #[test]
    fn loom_single_transition_is_observed() {
        loom::model(|| {
            let flag = Arc::new(CompletionFlag::new());

            let setters: Vec<_> = (0..2)
                .map(|_| {
                    let flag = flag.clone();
                    thread::spawn(move || flag.mark_done())
                })
                .collect();

            let waiter = {
                let flag = flag.clone();
                thread::spawn(move || {
                    while !flag.is_done() {
                        thread::yield_now();
                    }
                })
            };

            let winners = setters
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|won| *won)
                .count();
            waiter.join().unwrap();
            assert_eq!(winners, 1);
            assert!(flag.is_done());
        });
    }
}
