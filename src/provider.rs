use crate::feedback::{ToastConfig, ToastDispatcher, ToastScheduler};

/// Installs the shared services (currently the toast dispatcher) for one
/// application root.
#[derive(Default)]
pub struct ArenaProvider {
    toast_config: Option<ToastConfig>,
    toast_dispatcher: Option<ToastDispatcher>,
}

#[derive(Clone)]
struct ProviderGlobal {
    toasts: ToastDispatcher,
}

impl gpui::Global for ProviderGlobal {}

impl ArenaProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_toast_config(mut self, config: ToastConfig) -> Self {
        self.toast_config = Some(config);
        self
    }

    pub fn set_toast_dispatcher(mut self, dispatcher: ToastDispatcher) -> Self {
        self.toast_dispatcher = Some(dispatcher);
        self
    }

    /// Installs the provider on `cx`. Calling it again replaces only the parts that
    /// were set on this builder.
    pub fn init(self, cx: &mut gpui::App) {
        if cx.has_global::<ProviderGlobal>() {
            let global = cx.global_mut::<ProviderGlobal>();
            if let Some(dispatcher) = self.toast_dispatcher {
                global.toasts = dispatcher;
            }
            if let Some(config) = self.toast_config {
                global.toasts.set_config(config);
            }
            return;
        }

        let toasts = self
            .toast_dispatcher
            .unwrap_or_else(|| ToastDispatcher::new(cx.background_executor().clone()));
        let toasts = match self.toast_config {
            Some(config) => toasts.with_config(config),
            None => toasts,
        };
        log::debug!("arena provider installed");
        cx.set_global(ProviderGlobal { toasts });
    }

    /// Builds a provider scope for hosts that do not run a gpui `App`.
    pub fn into_scope(self, scheduler: impl ToastScheduler) -> ProviderScope {
        let toasts = self
            .toast_dispatcher
            .unwrap_or_else(|| ToastDispatcher::new(scheduler));
        let toasts = match self.toast_config {
            Some(config) => toasts.with_config(config),
            None => toasts,
        };
        ProviderScope::new(toasts)
    }

    #[track_caller]
    pub fn toast(cx: &gpui::App) -> ToastDispatcher {
        use_toasts(cx)
    }
}

/// Anything a provider can be installed on.
pub trait ToastHost {
    fn toast_dispatcher(&self) -> Option<ToastDispatcher>;
}

impl ToastHost for gpui::App {
    fn toast_dispatcher(&self) -> Option<ToastDispatcher> {
        self.try_global::<ProviderGlobal>()
            .map(|global| global.toasts.clone())
    }
}

/// Provider slot for headless hosts.
#[derive(Clone, Default)]
pub struct ProviderScope {
    toasts: Option<ToastDispatcher>,
}

impl ProviderScope {
    pub fn new(toasts: ToastDispatcher) -> Self {
        Self {
            toasts: Some(toasts),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn uninstall(&mut self) -> Option<ToastDispatcher> {
        self.toasts.take()
    }
}

impl ToastHost for ProviderScope {
    fn toast_dispatcher(&self) -> Option<ToastDispatcher> {
        self.toasts.clone()
    }
}

pub fn try_use_toasts(host: &(impl ToastHost + ?Sized)) -> Option<ToastDispatcher> {
    host.toast_dispatcher()
}

/// Returns the dispatcher installed on `host`.
///
/// # Panics
///
/// When no [`ArenaProvider`] has been installed on `host`.
#[track_caller]
pub fn use_toasts(host: &(impl ToastHost + ?Sized)) -> ToastDispatcher {
    match host.toast_dispatcher() {
        Some(toasts) => toasts,
        None => panic!(
            "use_toasts must be called inside an ArenaProvider; \
             install one with ArenaProvider::init before showing toasts"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::ToastEntry;
    use futures::executor::ThreadPool;

    fn pool() -> ThreadPool {
        ThreadPool::new().expect("thread pool")
    }

    #[test]
    #[should_panic(expected = "use_toasts must be called inside an ArenaProvider")]
    fn use_toasts_outside_provider_panics() {
        let _ = use_toasts(&ProviderScope::empty());
    }

    #[test]
    fn try_use_toasts_reports_missing_provider() {
        let mut scope = ArenaProvider::new().into_scope(pool());
        assert!(try_use_toasts(&scope).is_some());
        assert!(scope.uninstall().is_some());
        assert!(try_use_toasts(&scope).is_none());
    }

    #[test]
    fn scope_hands_out_the_same_dispatcher() {
        let scope = ArenaProvider::new()
            .set_toast_config(ToastConfig::default().max_visible(3))
            .into_scope(pool());
        let first = use_toasts(&scope);
        let second = use_toasts(&scope);

        let id = first.success("Results posted", "Heat 4");
        assert!(second.get(id).is_some());
        assert_eq!(second.config().max_visible, Some(3));
    }

    #[test]
    fn explicit_dispatcher_is_used_as_is() {
        let dispatcher = ToastDispatcher::new(pool());
        let id = dispatcher.info("Preloaded", "");
        let scope = ArenaProvider::new()
            .set_toast_dispatcher(dispatcher)
            .into_scope(pool());
        assert!(use_toasts(&scope).get(id).is_some());
    }

    #[gpui::test]
    fn reinit_on_app_updates_handles_already_handed_out(cx: &mut gpui::TestAppContext) {
        let earlier = cx.update(|cx| {
            ArenaProvider::new().init(cx);
            use_toasts(&*cx)
        });
        let timed = earlier.add_toast(ToastEntry::new("Kick-off", "").duration_ms(60_000));
        assert!(earlier.remove_toast(timed));

        cx.update(|cx| {
            ArenaProvider::new()
                .set_toast_config(ToastConfig::default().max_visible(1))
                .init(cx)
        });
        earlier.info("Half-time", "1 - 0");
        let latest = earlier.info("Full-time", "2 - 1");

        assert_eq!(earlier.len(), 1);
        cx.update(|cx| {
            let current = ArenaProvider::toast(cx);
            assert_eq!(current.config().max_visible, Some(1));
            assert!(current.get(latest).is_some());
        });
    }
}
