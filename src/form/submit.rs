use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::RwLock;

use futures::FutureExt;
use futures::future::BoxFuture;

use super::controller::{
    FormController, FormError, FormResult, FormState, SubmitState, transition_submit_state,
    write_lock,
};
use super::model::FormModel;

pub type BoxedSubmitFuture = BoxFuture<'static, anyhow::Result<()>>;

/// The caller's submit callback, usually a network request.
pub trait SubmitHandler<T>: Send + Sync + 'static {
    fn submit(&self, values: T) -> BoxedSubmitFuture;
}

impl<T, F, Fut> SubmitHandler<T> for F
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn submit(&self, values: T) -> BoxedSubmitFuture {
        Box::pin((self)(values))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    /// Validation failed; the callback was not called.
    Invalid,
    Submitted,
    /// The callback returned an error or panicked. The failure has been logged.
    Failed,
    /// The form was reset before validation finished; the callback was not called.
    Superseded,
}

impl<T> FormController<T>
where
    T: FormModel,
{
    /// Validates, then awaits the submit callback with a copy of the values.
    ///
    /// Callback failures are logged and reported as [`SubmitOutcome::Failed`]; they
    /// never leave the form in the submitting state. If the form is reset while the
    /// callback runs, the outcome is still reported but the submit state belongs to
    /// whatever happened after the reset.
    pub async fn handle_submit(&self) -> FormResult<SubmitOutcome> {
        let (id, generation) = {
            let mut state = write_lock(&self.state, "preparing submit")?;
            if matches!(
                state.submit_state,
                SubmitState::Validating | SubmitState::Submitting
            ) {
                return Err(FormError::AlreadySubmitting);
            }
            transition_submit_state(&mut state, SubmitState::Validating)?;
            state.submit_count = state.submit_count.saturating_add(1);
            state.submit_generation = state.submit_generation.wrapping_add(1);
            (state.id, state.submit_generation)
        };

        let values = loop {
            let (valid, revision) = self.run_validation()?;
            let mut state = write_lock(&self.state, "moving submit state to submitting")?;
            if state.submit_generation != generation
                || state.submit_state != SubmitState::Validating
            {
                log::debug!("form {id:?} reset while validating submit");
                return Ok(SubmitOutcome::Superseded);
            }
            if state.revision != revision {
                // Edited after validation; check the new values.
                continue;
            }
            if !valid {
                transition_submit_state(&mut state, SubmitState::Failed)?;
                log::debug!(
                    "form {id:?} submit blocked by {} field error(s)",
                    state.errors.len()
                );
                return Ok(SubmitOutcome::Invalid);
            }
            transition_submit_state(&mut state, SubmitState::Submitting)?;
            break state.values.clone();
        };

        let guard = SubmittingGuard {
            state: &self.state,
            generation,
            armed: true,
        };
        let on_submit = self.on_submit.clone();
        let result = AssertUnwindSafe(async move { on_submit.submit(values).await })
            .catch_unwind()
            .await;

        let (outcome, next) = match result {
            Ok(Ok(())) => (SubmitOutcome::Submitted, SubmitState::Succeeded),
            Ok(Err(error)) => {
                log::error!("form {id:?} submit failed: {error:#}");
                (SubmitOutcome::Failed, SubmitState::Failed)
            }
            Err(payload) => {
                log::error!(
                    "form {id:?} submit handler panicked: {}",
                    panic_message(payload.as_ref())
                );
                (SubmitOutcome::Failed, SubmitState::Failed)
            }
        };
        guard.finish(next)?;
        Ok(outcome)
    }
}

/// Leaves the submitting state if the submit future is dropped mid-flight.
///
/// Only acts while `generation` still owns the submit state.
struct SubmittingGuard<'a, T> {
    state: &'a RwLock<FormState<T>>,
    generation: u64,
    armed: bool,
}

impl<T> SubmittingGuard<'_, T> {
    fn finish(mut self, next: SubmitState) -> FormResult<()> {
        self.armed = false;
        let mut state = write_lock(self.state, "completing submit")?;
        if !owns_submit(&state, self.generation) {
            log::debug!("form {:?} submit finished after a reset", state.id);
            return Ok(());
        }
        transition_submit_state(&mut state, next)
    }
}

impl<T> Drop for SubmittingGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if owns_submit(&state, self.generation) {
            state.submit_state = SubmitState::Idle;
            log::debug!("form {:?} submit abandoned before completion", state.id);
        }
    }
}

fn owns_submit<T>(state: &FormState<T>, generation: u64) -> bool {
    state.submit_generation == generation && state.submit_state == SubmitState::Submitting
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
