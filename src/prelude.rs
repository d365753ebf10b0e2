pub use crate::feedback::{
    DEFAULT_TOAST_DURATION_MS, ToastConfig, ToastDispatcher, ToastEntry, ToastId, ToastKind,
    ToastScheduler, ToastSubscription,
};
pub use crate::form::rules::{Email, InRange, MaxLength, MinLength, Required};
pub use crate::form::{
    FieldKey, FieldLens, FormController, FormError, FormModel, FormOptions, FormResult,
    FormSnapshot, Schema, SchemaError, SchemaIssue, SubmitOutcome, SubmitState, ValidationMode,
    ValidationSchema,
};
pub use crate::provider::{ArenaProvider, ProviderScope, ToastHost, try_use_toasts, use_toasts};
