use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Duration;

use futures::StreamExt;
use futures::future::{AbortHandle, abortable};
use futures::stream::Stream;
use futures_timer::Delay;
use gpui::SharedString;

mod scheduler;

pub use scheduler::{ScheduledTask, ToastScheduler};

pub const DEFAULT_TOAST_DURATION_MS: i64 = 6_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ToastId(pub u64);

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    Announcement,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToastEntry {
    /// Assigned by the dispatcher.
    pub id: Option<ToastId>,
    pub kind: ToastKind,
    pub title: SharedString,
    pub body: SharedString,
    /// Auto-dismiss delay. Zero or negative never expires; `None` takes the
    /// dispatcher default.
    pub duration_ms: Option<i64>,
}

impl ToastEntry {
    pub fn new(title: impl Into<SharedString>, body: impl Into<SharedString>) -> Self {
        Self {
            id: None,
            kind: ToastKind::Info,
            title: title.into(),
            body: body.into(),
            duration_ms: None,
        }
    }

    pub fn kind(mut self, value: ToastKind) -> Self {
        self.kind = value;
        self
    }

    pub fn duration_ms(mut self, value: i64) -> Self {
        self.duration_ms = Some(value);
        self
    }

    pub fn persistent(self) -> Self {
        self.duration_ms(0)
    }

    pub fn expires_after(&self) -> Option<Duration> {
        expiry_delay(self.duration_ms?)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ToastConfig {
    pub default_duration_ms: i64,
    /// Oldest toasts are evicted beyond this many.
    pub max_visible: Option<usize>,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: DEFAULT_TOAST_DURATION_MS,
            max_visible: None,
        }
    }
}

impl ToastConfig {
    pub fn default_duration_ms(mut self, value: i64) -> Self {
        self.default_duration_ms = value;
        self
    }

    pub fn max_visible(mut self, value: usize) -> Self {
        self.max_visible = Some(value.max(1));
        self
    }
}

type Listener = Arc<dyn Fn(&[ToastEntry]) + Send + Sync>;

#[derive(Default)]
struct ToastState {
    config: ToastConfig,
    entries: VecDeque<ToastEntry>,
    timers: BTreeMap<ToastId, AbortHandle>,
    listeners: BTreeMap<u64, Listener>,
    next_listener: u64,
}

/// The active toast list for one application root.
///
/// Clones share the same list and config. Each entry with a positive duration gets
/// its own expiry timer on the scheduler; removing or clearing entries cancels their timers.
#[derive(Clone)]
pub struct ToastDispatcher {
    next_id: Arc<AtomicU64>,
    state: Arc<RwLock<ToastState>>,
    scheduler: Arc<dyn ToastScheduler>,
}

impl ToastDispatcher {
    pub fn new(scheduler: impl ToastScheduler) -> Self {
        Self {
            next_id: Arc::new(AtomicU64::new(0)),
            state: Arc::new(RwLock::new(ToastState::default())),
            scheduler: Arc::new(scheduler),
        }
    }

    pub fn with_config(self, config: ToastConfig) -> Self {
        self.set_config(config);
        self
    }

    /// Replaces the config for every handle to this list. Toasts already shown keep
    /// their duration.
    pub fn set_config(&self, config: ToastConfig) {
        write_state(&self.state).config = config;
        log::debug!("toast config replaced: {config:?}");
    }

    pub fn config(&self) -> ToastConfig {
        read_state(&self.state).config
    }

    pub fn add_toast(&self, mut entry: ToastEntry) -> ToastId {
        let id = ToastId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        entry.id = Some(id);

        let (task, duration_ms) = {
            let mut state = write_state(&self.state);
            let config = state.config;
            let duration_ms = *entry
                .duration_ms
                .get_or_insert(config.default_duration_ms);
            state.entries.push_back(entry);
            let task = expiry_delay(duration_ms).map(|after| {
                let (task, handle) = self.expiry_task(id, after);
                state.timers.insert(id, handle);
                task
            });
            if let Some(limit) = config.max_visible {
                while state.entries.len() > limit {
                    let Some(evicted) = state.entries.pop_front() else {
                        break;
                    };
                    if let Some(evicted_id) = evicted.id {
                        cancel_timer(&mut state, evicted_id);
                        log::debug!("toast {evicted_id:?} evicted by visible limit {limit}");
                    }
                }
            }
            (task, duration_ms)
        };

        // Scheduled only once the entry is in the list, so even a tiny delay finds it.
        if let Some(task) = task {
            self.scheduler.schedule(task);
        }
        log::debug!("toast {id:?} added, duration {duration_ms}ms");
        notify_listeners(&self.state);
        id
    }

    pub fn info(&self, title: impl Into<SharedString>, body: impl Into<SharedString>) -> ToastId {
        self.add_toast(ToastEntry::new(title, body).kind(ToastKind::Info))
    }

    pub fn success(
        &self,
        title: impl Into<SharedString>,
        body: impl Into<SharedString>,
    ) -> ToastId {
        self.add_toast(ToastEntry::new(title, body).kind(ToastKind::Success))
    }

    pub fn warning(
        &self,
        title: impl Into<SharedString>,
        body: impl Into<SharedString>,
    ) -> ToastId {
        self.add_toast(ToastEntry::new(title, body).kind(ToastKind::Warning))
    }

    pub fn error(&self, title: impl Into<SharedString>, body: impl Into<SharedString>) -> ToastId {
        self.add_toast(ToastEntry::new(title, body).kind(ToastKind::Error))
    }

    pub fn announcement(
        &self,
        title: impl Into<SharedString>,
        body: impl Into<SharedString>,
    ) -> ToastId {
        self.add_toast(ToastEntry::new(title, body).kind(ToastKind::Announcement))
    }

    /// Replaces a live toast's content in place and restarts its expiry.
    pub fn update_toast(&self, id: ToastId, mut entry: ToastEntry) -> bool {
        entry.id = Some(id);

        let task = {
            let mut state = write_state(&self.state);
            let duration_ms = *entry
                .duration_ms
                .get_or_insert(state.config.default_duration_ms);
            let Some(current) = state
                .entries
                .iter_mut()
                .find(|candidate| candidate.id == Some(id))
            else {
                return false;
            };
            *current = entry;
            cancel_timer(&mut state, id);
            expiry_delay(duration_ms).map(|after| {
                let (task, handle) = self.expiry_task(id, after);
                state.timers.insert(id, handle);
                task
            })
        };

        if let Some(task) = task {
            self.scheduler.schedule(task);
        }
        notify_listeners(&self.state);
        true
    }

    /// Removes the toast if it is still present. Returns whether anything was removed.
    pub fn remove_toast(&self, id: ToastId) -> bool {
        let removed = remove_entry(&self.state, id);
        if removed {
            log::debug!("toast {id:?} dismissed");
            notify_listeners(&self.state);
        }
        removed
    }

    pub fn clear_all_toasts(&self) {
        let cleared = {
            let mut state = write_state(&self.state);
            for (_, timer) in std::mem::take(&mut state.timers) {
                timer.abort();
            }
            let cleared = state.entries.len();
            state.entries.clear();
            cleared
        };
        if cleared > 0 {
            log::debug!("cleared {cleared} toast(s)");
            notify_listeners(&self.state);
        }
    }

    /// Snapshot of the active toasts in insertion order.
    pub fn toasts(&self) -> Vec<ToastEntry> {
        read_state(&self.state).entries.iter().cloned().collect()
    }

    pub fn get(&self, id: ToastId) -> Option<ToastEntry> {
        read_state(&self.state)
            .entries
            .iter()
            .find(|entry| entry.id == Some(id))
            .cloned()
    }

    pub fn len(&self) -> usize {
        read_state(&self.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        read_state(&self.state).entries.is_empty()
    }

    /// Calls `listener` with the new snapshot after every change, until the returned
    /// subscription is dropped.
    pub fn subscribe(
        &self,
        listener: impl Fn(&[ToastEntry]) + Send + Sync + 'static,
    ) -> ToastSubscription {
        let mut state = write_state(&self.state);
        let key = state.next_listener;
        state.next_listener += 1;
        state.listeners.insert(key, Arc::new(listener));
        ToastSubscription {
            state: Arc::downgrade(&self.state),
            key,
        }
    }

    /// Feeds every entry of `feed` (e.g. a live announcement channel) into this
    /// dispatcher. Stops when the feed ends or every dispatcher handle is dropped.
    pub fn forward<S>(&self, feed: S)
    where
        S: Stream<Item = ToastEntry> + Send + 'static,
    {
        let dispatcher = self.downgrade();
        self.scheduler.schedule(Box::pin(async move {
            let mut feed = Box::pin(feed);
            while let Some(entry) = feed.next().await {
                let Some(dispatcher) = dispatcher.upgrade() else {
                    log::trace!("toast feed dropped, dispatcher is gone");
                    break;
                };
                dispatcher.add_toast(entry);
            }
        }));
    }

    fn downgrade(&self) -> WeakToastDispatcher {
        WeakToastDispatcher {
            next_id: self.next_id.clone(),
            state: Arc::downgrade(&self.state),
            scheduler: self.scheduler.clone(),
        }
    }

    fn expiry_task(&self, id: ToastId, after: Duration) -> (ScheduledTask, AbortHandle) {
        let (delay, handle) = abortable(Delay::new(after));
        let state = Arc::downgrade(&self.state);
        let task: ScheduledTask = Box::pin(async move {
            if delay.await.is_err() {
                return;
            }
            let Some(state) = state.upgrade() else {
                return;
            };
            if remove_entry(&state, id) {
                log::trace!("toast {id:?} expired");
                notify_listeners(&state);
            }
        });
        (task, handle)
    }
}

struct WeakToastDispatcher {
    next_id: Arc<AtomicU64>,
    state: Weak<RwLock<ToastState>>,
    scheduler: Arc<dyn ToastScheduler>,
}

impl WeakToastDispatcher {
    fn upgrade(&self) -> Option<ToastDispatcher> {
        Some(ToastDispatcher {
            next_id: self.next_id.clone(),
            state: self.state.upgrade()?,
            scheduler: self.scheduler.clone(),
        })
    }
}

/// Keeps a [`ToastDispatcher::subscribe`] listener registered while alive.
#[must_use = "dropping the subscription unregisters the listener"]
pub struct ToastSubscription {
    state: Weak<RwLock<ToastState>>,
    key: u64,
}

impl Drop for ToastSubscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            write_state(&state).listeners.remove(&self.key);
        }
    }
}

fn expiry_delay(duration_ms: i64) -> Option<Duration> {
    u64::try_from(duration_ms)
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}

fn cancel_timer(state: &mut ToastState, id: ToastId) {
    if let Some(timer) = state.timers.remove(&id) {
        timer.abort();
    }
}

fn remove_entry(state: &RwLock<ToastState>, id: ToastId) -> bool {
    let mut state = write_state(state);
    cancel_timer(&mut state, id);
    match state.entries.iter().position(|entry| entry.id == Some(id)) {
        Some(index) => {
            state.entries.remove(index);
            true
        }
        None => false,
    }
}

fn notify_listeners(state: &RwLock<ToastState>) {
    let (snapshot, listeners) = {
        let state = read_state(state);
        if state.listeners.is_empty() {
            return;
        }
        (
            state.entries.iter().cloned().collect::<Vec<_>>(),
            state.listeners.values().cloned().collect::<Vec<_>>(),
        )
    };
    for listener in listeners {
        listener(&snapshot);
    }
}

fn read_state(state: &RwLock<ToastState>) -> RwLockReadGuard<'_, ToastState> {
    state.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_state(state: &RwLock<ToastState>) -> RwLockWriteGuard<'_, ToastState> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}
