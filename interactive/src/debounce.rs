use gloo_timers::callback::Timeout;
use leptos::prelude::*;

/// Holds at most one pending delayed call. Scheduling again replaces it.
#[derive(Debug, Default)]
pub struct Debouncer {
    pending: Option<Timeout>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` after `delay_ms` unless rescheduled or cancelled first.
    /// Always goes through the timer queue, even for a zero delay.
    pub fn schedule(&mut self, delay_ms: u32, f: impl FnOnce() + 'static) {
        // Dropping a Timeout clears it.
        self.pending = Some(Timeout::new(delay_ms, f));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Calls `callback` with the latest value of `watched` once it has stopped
/// changing for `delay_ms`. A pending call is dropped on unmount.
pub fn use_debounce<T, W, F>(delay_ms: u32, watched: W, callback: F)
where
    T: 'static,
    W: Fn() -> T + 'static,
    F: Fn(T) + Clone + 'static,
{
    let debouncer = StoredValue::new_local(Debouncer::new());

    Effect::new(move |_| {
        let value = watched();
        let callback = callback.clone();
        debouncer.update_value(|d| d.schedule(delay_ms, move || callback(value)));
    });

    on_cleanup(move || {
        let _ = debouncer.try_update_value(Debouncer::cancel);
    });
}
