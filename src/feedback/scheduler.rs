use futures::executor::ThreadPool;
use futures::future::BoxFuture;

pub type ScheduledTask = BoxFuture<'static, ()>;

/// Runs toast expiry timers and notification feeds in the background.
pub trait ToastScheduler: Send + Sync + 'static {
    fn schedule(&self, task: ScheduledTask);
}

impl ToastScheduler for gpui::BackgroundExecutor {
    fn schedule(&self, task: ScheduledTask) {
        gpui::BackgroundExecutor::spawn(self, task).detach();
    }
}

impl ToastScheduler for ThreadPool {
    fn schedule(&self, task: ScheduledTask) {
        self.spawn_ok(task);
    }
}
