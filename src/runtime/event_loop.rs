//! Per-thread event loop.
//!
//! [`run_event_loop`] blocks the calling thread and runs work posted through
//! an [`EventLoopProxy`], in posting order, until [`quit_event_loop`] is
//! called on that thread, a proxy asks it to quit, or the last visible window
//! is hidden. The proxy is the only `Send` handle of the runtime: background
//! threads use it to hand results back to the UI thread before touching
//! models or instances.

use std::{
    cell::Cell,
    collections::VecDeque,
    fmt,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, Ordering},
    },
};

#[cfg(not(feature = "async-mio"))]
use std::sync::Condvar;

type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum EventLoopError {
    #[error("the event loop is already running on this thread")]
    AlreadyRunning,
    #[error("event loop I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(feature = "async-mio")]
const WAKE_TOKEN: mio::Token = mio::Token(0);

struct Shared {
    queue: Mutex<VecDeque<Task>>,
    quit: AtomicBool,
    #[cfg(feature = "async-mio")]
    waker: Mutex<Option<Arc<mio::Waker>>>,
    #[cfg(not(feature = "async-mio"))]
    ready: Condvar,
}

impl Shared {
    fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            quit: AtomicBool::new(false),
            #[cfg(feature = "async-mio")]
            waker: Mutex::new(None),
            #[cfg(not(feature = "async-mio"))]
            ready: Condvar::new(),
        }
    }

    fn queue(&self) -> MutexGuard<'_, VecDeque<Task>> {
        // A task that panicked while posting leaves a usable queue behind.
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn post(&self, task: Task) {
        self.queue().push_back(task);
        self.wake();
    }

    fn request_quit(&self) {
        {
            let _queue = self.queue();
            self.quit.store(true, Ordering::SeqCst);
        }
        self.wake();
    }

    #[cfg(feature = "async-mio")]
    fn wake(&self) {
        let waker = self
            .waker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        if let Some(waker) = waker {
            if let Err(err) = waker.wake() {
                log::warn!("failed to wake the event loop: {}", err);
            }
        }
    }

    #[cfg(not(feature = "async-mio"))]
    fn wake(&self) {
        self.ready.notify_all();
    }

    fn pop(&self) -> Option<Task> {
        self.queue().pop_front()
    }
}

thread_local! {
    static SHARED: Arc<Shared> = Arc::new(Shared::new());
    static RUNNING: Cell<bool> = const { Cell::new(false) };
}

fn shared() -> Arc<Shared> {
    SHARED.with(Arc::clone)
}

/// Handle for posting work to one thread's event loop from any thread.
#[derive(Clone)]
pub struct EventLoopProxy {
    shared: Arc<Shared>,
}

impl EventLoopProxy {
    /// Run `task` on the loop's thread. Tasks run in posting order.
    pub fn invoke(&self, task: impl FnOnce() + Send + 'static) {
        self.shared.post(Box::new(task));
    }

    pub fn quit(&self) {
        self.shared.request_quit();
    }
}

impl fmt::Debug for EventLoopProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoopProxy").finish_non_exhaustive()
    }
}

/// Proxy for the calling thread's event loop.
pub fn proxy() -> EventLoopProxy {
    EventLoopProxy { shared: shared() }
}

pub fn is_running() -> bool {
    RUNNING.with(Cell::get)
}

/// Ask the calling thread's loop to return. Work still queued stays queued
/// for the next run. A request made while no loop runs stops the next run.
pub fn quit_event_loop() {
    shared().request_quit();
}

/// Run posted work until asked to quit.
pub fn run_event_loop() -> Result<(), EventLoopError> {
    if is_running() {
        return Err(EventLoopError::AlreadyRunning);
    }
    let shared = shared();
    RUNNING.with(|running| running.set(true));
    log::debug!("event loop started");
    let result = run(&shared);
    // A quit request is consumed by the run it stops.
    shared.quit.store(false, Ordering::SeqCst);
    RUNNING.with(|running| running.set(false));
    log::debug!("event loop finished");
    result
}

fn drain(shared: &Shared) -> bool {
    while !shared.quit.load(Ordering::SeqCst) {
        match shared.pop() {
            Some(task) => task(),
            None => return false,
        }
    }
    true
}

#[cfg(feature = "async-mio")]
fn run(shared: &Shared) -> Result<(), EventLoopError> {
    let mut poll = mio::Poll::new()?;
    let waker = Arc::new(mio::Waker::new(poll.registry(), WAKE_TOKEN)?);
    *shared
        .waker
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(waker);

    let mut events = mio::Events::with_capacity(8);
    let result = loop {
        if drain(shared) {
            break Ok(());
        }
        if let Err(err) = poll.poll(&mut events, None) {
            if err.kind() == std::io::ErrorKind::Interrupted {
                continue;
            }
            break Err(EventLoopError::Io(err));
        }
    };

    *shared
        .waker
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    result
}

#[cfg(not(feature = "async-mio"))]
fn run(shared: &Shared) -> Result<(), EventLoopError> {
    loop {
        if drain(shared) {
            return Ok(());
        }
        let queue = shared.queue();
        if queue.is_empty() && !shared.quit.load(Ordering::SeqCst) {
            drop(
                shared
                    .ready
                    .wait_while(queue, |queue| {
                        queue.is_empty() && !shared.quit.load(Ordering::SeqCst)
                    })
                    .unwrap_or_else(|poisoned| poisoned.into_inner()),
            );
        }
    }
}
