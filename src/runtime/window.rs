use std::cell::Cell;

use crate::runtime::{event_loop, thread::ThreadAffinity};

thread_local! {
    static VISIBLE_WINDOWS: Cell<usize> = const { Cell::new(0) };
}

/// Number of shown windows on the calling thread.
pub fn visible_window_count() -> usize {
    VISIBLE_WINDOWS.with(Cell::get)
}

/// Headless window owned by a component instance. It only tracks
/// visibility; hiding the last visible window stops a running event loop.
#[derive(Debug)]
pub struct Window {
    visible: Cell<bool>,
    affinity: ThreadAffinity,
}

impl Window {
    pub(crate) fn new() -> Self {
        Self {
            visible: Cell::new(false),
            affinity: ThreadAffinity::current(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }

    pub fn show(&self) {
        self.affinity.assert_current("Window::show");
        if self.visible.replace(true) {
            return;
        }
        VISIBLE_WINDOWS.with(|count| count.set(count.get() + 1));
        log::debug!("window shown ({} visible)", visible_window_count());
    }

    pub fn hide(&self) {
        self.affinity.assert_current("Window::hide");
        if !self.visible.replace(false) {
            return;
        }
        let remaining = VISIBLE_WINDOWS.with(|count| {
            let remaining = count.get().saturating_sub(1);
            count.set(remaining);
            remaining
        });
        log::debug!("window hidden ({} visible)", remaining);
        if remaining == 0 && event_loop::is_running() {
            event_loop::quit_event_loop();
        }
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.visible.get() && self.affinity.is_current() {
            self.hide();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_and_hide_are_idempotent() {
        let window = Window::new();
        let before = visible_window_count();
        window.show();
        window.show();
        assert_eq!(visible_window_count(), before + 1);
        window.hide();
        window.hide();
        assert_eq!(visible_window_count(), before);
        assert!(!window.is_visible());
    }

    #[test]
    fn dropping_a_shown_window_releases_it() {
        let before = visible_window_count();
        {
            let window = Window::new();
            window.show();
        }
        assert_eq!(visible_window_count(), before);
    }
}
