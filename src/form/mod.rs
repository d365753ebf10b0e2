mod controller;
mod model;
pub mod rules;
mod schema;
mod submit;
mod validation;


pub use arenakit_form_derive::FormModel;
pub use controller::{
    FormController, FormError, FormId, FormOptions, FormResult, FormSnapshot, SubmitState,
    ValidationMode,
};
pub use model::{FieldKey, FieldLens, FormModel};
pub use schema::{
    AcceptAll, FieldValidator, FormValidator, Schema, SchemaError, SchemaIssue, ValidationSchema,
};
pub use submit::{BoxedSubmitFuture, SubmitHandler, SubmitOutcome};
