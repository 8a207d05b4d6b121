use std::thread::{self, ThreadId};

/// Records the thread that created a runtime object.
///
/// Every public operation on definitions, instances and model adapters checks
/// it. A mismatch is not recoverable: the process logs and aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    owner: ThreadId,
}

impl ThreadAffinity {
    pub fn current() -> Self {
        Self {
            owner: thread::current().id(),
        }
    }

    pub fn is_current(&self) -> bool {
        thread::current().id() == self.owner
    }

    pub fn assert_current(&self, operation: &str) {
        if !self.is_current() {
            let current = thread::current();
            log::error!(
                "`{}` called from thread {:?} ({}), but the object belongs to thread {:?}",
                operation,
                current.id(),
                current.name().unwrap_or("unnamed"),
                self.owner
            );
            eprintln!("vellum: `{}` called off the UI thread; aborting", operation);
            std::process::abort();
        }
    }
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creating_thread_is_current() {
        let affinity = ThreadAffinity::current();
        assert!(affinity.is_current());
        affinity.assert_current("test");
    }

    #[test]
    fn other_threads_are_not_current() {
        let affinity = ThreadAffinity::current();
        let seen = std::thread::spawn(move || affinity.is_current())
            .join()
            .unwrap();
        assert!(!seen);
    }
}
