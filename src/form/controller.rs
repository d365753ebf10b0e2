use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use gpui::SharedString;

use super::model::{FieldKey, FieldLens, FormModel};
use super::schema::ValidationSchema;
use super::submit::SubmitHandler;

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubmitState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// When a single field is re-validated outside of submit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationMode {
    OnChange,
    OnBlur,
    OnSubmit,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormOptions {
    pub validate_mode: ValidationMode,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_mode: ValidationMode::OnBlur,
        }
    }
}

impl FormOptions {
    pub fn validate_mode(mut self, value: ValidationMode) -> Self {
        self.validate_mode = value;
        self
    }
}

#[derive(Clone, Debug)]
pub struct FormSnapshot<T> {
    pub values: T,
    pub errors: BTreeMap<FieldKey, SharedString>,
    pub submit_state: SubmitState,
    pub submit_count: u32,
    pub is_submitting: bool,
    pub is_dirty: bool,
    pub is_valid: bool,
    pub dirty_fields: BTreeSet<FieldKey>,
    pub touched_fields: BTreeSet<FieldKey>,
}

impl<T> FormSnapshot<T> {
    pub fn error(&self, key: FieldKey) -> Option<&SharedString> {
        self.errors.get(&key)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
    InvalidStateTransition { from: SubmitState, to: SubmitState },
    AlreadySubmitting,
    UnknownField(String),
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::InvalidStateTransition { from, to } => {
                write!(f, "invalid submit state transition: {from:?} -> {to:?}")
            }
            FormError::AlreadySubmitting => f.write_str("form submit is already in progress"),
            FormError::UnknownField(name) => write!(f, "form has no field named `{name}`"),
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

pub(super) struct FormState<T> {
    pub(super) id: FormId,
    pub(super) initial_values: T,
    pub(super) values: T,
    pub(super) submit_state: SubmitState,
    pub(super) submit_count: u32,
    pub(super) dirty_fields: BTreeSet<FieldKey>,
    pub(super) touched_fields: BTreeSet<FieldKey>,
    pub(super) errors: BTreeMap<FieldKey, SharedString>,
    /// Bumped on every write to `values`.
    pub(super) revision: u64,
    /// Schema verdict for `values` at the stored revision.
    pub(super) accepted: Option<(u64, bool)>,
    /// Identifies the submit that owns `submit_state`; bumped by each submit and by reset.
    pub(super) submit_generation: u64,
}

impl<T> FormState<T>
where
    T: FormModel,
{
    fn field_written(&mut self, key: FieldKey) {
        if self.values.field_differs(&self.initial_values, key) {
            self.dirty_fields.insert(key);
        } else {
            self.dirty_fields.remove(&key);
        }
        self.errors.remove(&key);
    }

    fn bump_revision(&mut self) {
        self.revision = self.revision.wrapping_add(1);
        self.accepted = None;
    }
}

/// Owns one form's values, field errors and submission lifecycle.
///
/// Clones share the same state.
pub struct FormController<T>
where
    T: FormModel,
{
    pub(super) options: FormOptions,
    pub(super) state: Arc<RwLock<FormState<T>>>,
    pub(super) schema: Arc<dyn ValidationSchema<T>>,
    pub(super) on_submit: Arc<dyn SubmitHandler<T>>,
}

impl<T> Clone for FormController<T>
where
    T: FormModel,
{
    fn clone(&self) -> Self {
        Self {
            options: self.options,
            state: self.state.clone(),
            schema: self.schema.clone(),
            on_submit: self.on_submit.clone(),
        }
    }
}

impl<T> FormController<T>
where
    T: FormModel,
{
    pub fn new(
        initial_values: T,
        schema: impl ValidationSchema<T>,
        on_submit: impl SubmitHandler<T>,
    ) -> Self {
        Self {
            options: FormOptions::default(),
            state: Arc::new(RwLock::new(FormState {
                id: FormId::next(),
                initial_values: initial_values.clone(),
                values: initial_values,
                submit_state: SubmitState::Idle,
                submit_count: 0,
                dirty_fields: BTreeSet::new(),
                touched_fields: BTreeSet::new(),
                errors: BTreeMap::new(),
                revision: 0,
                accepted: None,
                submit_generation: 0,
            })),
            schema: Arc::new(schema),
            on_submit: Arc::new(on_submit),
        }
    }

    pub fn with_options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn form_id(&self) -> FormResult<FormId> {
        Ok(read_lock(&self.state, "reading form id")?.id)
    }

    pub fn values(&self) -> FormResult<T> {
        Ok(read_lock(&self.state, "reading form values")?.values.clone())
    }

    pub fn value<L>(&self, lens: L) -> FormResult<L::Value>
    where
        L: FieldLens<T>,
    {
        Ok(lens
            .get(&read_lock(&self.state, "reading field value")?.values)
            .clone())
    }

    pub fn errors(&self) -> FormResult<BTreeMap<FieldKey, SharedString>> {
        Ok(read_lock(&self.state, "reading form errors")?.errors.clone())
    }

    pub fn field_error<L>(&self, lens: L) -> FormResult<Option<SharedString>>
    where
        L: FieldLens<T>,
    {
        Ok(read_lock(&self.state, "reading field error")?
            .errors
            .get(&lens.key())
            .cloned())
    }

    pub fn submit_state(&self) -> FormResult<SubmitState> {
        Ok(read_lock(&self.state, "reading submit state")?.submit_state)
    }

    pub fn is_submitting(&self) -> FormResult<bool> {
        Ok(self.submit_state()? == SubmitState::Submitting)
    }

    pub fn is_dirty(&self) -> FormResult<bool> {
        Ok(!read_lock(&self.state, "reading dirty fields")?
            .dirty_fields
            .is_empty())
    }

    pub fn set_value<L>(&self, lens: L, value: L::Value) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        {
            let mut state = write_lock(&self.state, "writing field value")?;
            lens.set(&mut state.values, value);
            state.field_written(key);
            state.bump_revision();
        }

        if self.options.validate_mode == ValidationMode::OnChange {
            let _ = self.validate_field_by_key(key)?;
        }
        Ok(())
    }

    /// Merges every field present in `patch`, e.g. a record fetched for editing.
    pub fn set_values(&self, patch: T::Patch) -> FormResult<()> {
        let written = {
            let mut state = write_lock(&self.state, "merging field values")?;
            let written = state.values.apply_patch(patch);
            if written.is_empty() {
                return Ok(());
            }
            for key in &written {
                state.field_written(*key);
            }
            state.bump_revision();
            written
        };

        if self.options.validate_mode == ValidationMode::OnChange {
            for key in written {
                let _ = self.validate_field_by_key(key)?;
            }
        }
        Ok(())
    }

    /// Records that the field lost focus.
    pub fn touch<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        write_lock(&self.state, "touching field")?
            .touched_fields
            .insert(key);

        if self.options.validate_mode == ValidationMode::OnBlur {
            let _ = self.validate_field_by_key(key)?;
        }
        Ok(())
    }

    pub fn set_error<L>(&self, lens: L, message: impl Into<SharedString>) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        self.set_error_by_key(lens.key(), message)
    }

    pub fn set_error_by_key(
        &self,
        key: FieldKey,
        message: impl Into<SharedString>,
    ) -> FormResult<()> {
        if !T::has_field(key) {
            return Err(FormError::UnknownField(key.as_str().to_string()));
        }
        write_lock(&self.state, "setting field error")?
            .errors
            .insert(key, message.into());
        Ok(())
    }

    pub fn clear_error<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        write_lock(&self.state, "clearing field error")?
            .errors
            .remove(&lens.key());
        Ok(())
    }

    pub fn clear_errors(&self) -> FormResult<()> {
        write_lock(&self.state, "clearing all field errors")?
            .errors
            .clear();
        Ok(())
    }

    /// Restores the initial values. A submit still in flight is detached: its
    /// callback keeps running but no longer moves the submit state.
    pub fn reset(&self) -> FormResult<()> {
        let mut state = write_lock(&self.state, "resetting form")?;
        state.values = state.initial_values.clone();
        state.submit_state = SubmitState::Idle;
        state.submit_generation = state.submit_generation.wrapping_add(1);
        state.dirty_fields.clear();
        state.touched_fields.clear();
        state.errors.clear();
        state.bump_revision();
        Ok(())
    }

    pub fn reset_field<L>(&self, lens: L) -> FormResult<()>
    where
        L: FieldLens<T>,
    {
        let key = lens.key();
        let mut state = write_lock(&self.state, "resetting field")?;
        let initial_value = lens.get(&state.initial_values).clone();
        lens.set(&mut state.values, initial_value);
        state.dirty_fields.remove(&key);
        state.touched_fields.remove(&key);
        state.errors.remove(&key);
        state.bump_revision();
        Ok(())
    }

    pub fn snapshot(&self) -> FormResult<FormSnapshot<T>> {
        let is_valid = self.is_valid()?;
        let state = read_lock(&self.state, "creating form snapshot")?;
        Ok(FormSnapshot {
            values: state.values.clone(),
            errors: state.errors.clone(),
            submit_state: state.submit_state,
            submit_count: state.submit_count,
            is_submitting: state.submit_state == SubmitState::Submitting,
            is_dirty: !state.dirty_fields.is_empty(),
            is_valid,
            dirty_fields: state.dirty_fields.clone(),
            touched_fields: state.touched_fields.clone(),
        })
    }
}

pub(super) fn transition_submit_state<T>(
    state: &mut FormState<T>,
    next: SubmitState,
) -> FormResult<()> {
    let current = state.submit_state;
    if current == next {
        return Ok(());
    }

    let allowed = matches!(
        (current, next),
        (SubmitState::Idle, SubmitState::Validating)
            | (SubmitState::Validating, SubmitState::Submitting)
            | (SubmitState::Validating, SubmitState::Failed)
            | (SubmitState::Submitting, SubmitState::Succeeded)
            | (SubmitState::Submitting, SubmitState::Failed)
            | (SubmitState::Succeeded, SubmitState::Validating)
            | (SubmitState::Failed, SubmitState::Validating)
            | (_, SubmitState::Idle)
    );
    if !allowed {
        return Err(FormError::InvalidStateTransition {
            from: current,
            to: next,
        });
    }
    state.submit_state = next;
    Ok(())
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
