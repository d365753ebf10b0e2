use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use gpui::SharedString;

use super::model::{FieldKey, FieldLens};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SchemaIssue {
    pub path: FieldKey,
    pub message: SharedString,
}

impl SchemaIssue {
    pub fn new(path: FieldKey, message: impl Into<SharedString>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Rejection returned by [`ValidationSchema::parse`], listing every issue found.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SchemaError {
    issues: Vec<SchemaIssue>,
}

impl SchemaError {
    pub fn new(issues: Vec<SchemaIssue>) -> Self {
        Self { issues }
    }

    pub fn single(path: FieldKey, message: impl Into<SharedString>) -> Self {
        Self::new(vec![SchemaIssue::new(path, message)])
    }

    pub fn issues(&self) -> &[SchemaIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn first_for(&self, path: FieldKey) -> Option<&SchemaIssue> {
        self.issues.iter().find(|issue| issue.path == path)
    }

    /// Collapses the issue list to the first message per path.
    pub fn field_errors(&self) -> BTreeMap<FieldKey, SharedString> {
        let mut errors = BTreeMap::new();
        for issue in &self.issues {
            errors
                .entry(issue.path)
                .or_insert_with(|| issue.message.clone());
        }
        errors
    }
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.issues.as_slice() {
            [] => f.write_str("schema rejected the values"),
            [issue] => write!(f, "{}: {}", issue.path, issue.message),
            [issue, rest @ ..] => write!(
                f,
                "{}: {} (and {} more issue(s))",
                issue.path,
                issue.message,
                rest.len()
            ),
        }
    }
}

impl std::error::Error for SchemaError {}

/// A declarative description of what makes a form model acceptable.
pub trait ValidationSchema<T>: Send + Sync + 'static {
    fn parse(&self, model: &T) -> Result<(), SchemaError>;
}

impl<T, F> ValidationSchema<T> for F
where
    F: Fn(&T) -> Result<(), SchemaError> + Send + Sync + 'static,
{
    fn parse(&self, model: &T) -> Result<(), SchemaError> {
        (self)(model)
    }
}

pub trait FieldValidator<T, L>: Send + Sync
where
    L: FieldLens<T>,
{
    fn validate(&self, model: &T, value: &L::Value) -> Result<(), SharedString>;
}

impl<T, L, F> FieldValidator<T, L> for F
where
    L: FieldLens<T>,
    F: for<'a> Fn(&'a T, &'a L::Value) -> Result<(), SharedString> + Send + Sync,
{
    fn validate(&self, model: &T, value: &L::Value) -> Result<(), SharedString> {
        (self)(model, value)
    }
}

/// Cross-field check; returns one `(field, message)` pair per problem.
pub trait FormValidator<T>: Send + Sync {
    fn validate(&self, model: &T) -> Vec<(FieldKey, SharedString)>;
}

impl<T, F> FormValidator<T> for F
where
    F: Fn(&T) -> Vec<(FieldKey, SharedString)> + Send + Sync,
{
    fn validate(&self, model: &T) -> Vec<(FieldKey, SharedString)> {
        (self)(model)
    }
}

type Check<T> = Arc<dyn Fn(&T, &mut Vec<SchemaIssue>) + Send + Sync>;

/// Builder for a [`ValidationSchema`] out of per-field validators and form-level
/// refinements. Checks run in registration order.
pub struct Schema<T> {
    checks: Vec<Check<T>>,
}

impl<T> Clone for Schema<T> {
    fn clone(&self) -> Self {
        Self {
            checks: self.checks.clone(),
        }
    }
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self { checks: Vec::new() }
    }
}

impl<T> Schema<T>
where
    T: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field<L, V>(mut self, lens: L, validator: V) -> Self
    where
        L: FieldLens<T>,
        V: FieldValidator<T, L> + 'static,
    {
        let key = lens.key();
        self.checks.push(Arc::new(move |model: &T, issues: &mut Vec<SchemaIssue>| {
            if let Err(message) = validator.validate(model, lens.get(model)) {
                issues.push(SchemaIssue { path: key, message });
            }
        }));
        self
    }

    pub fn refine<V>(mut self, validator: V) -> Self
    where
        V: FormValidator<T> + 'static,
    {
        self.checks.push(Arc::new(move |model: &T, issues: &mut Vec<SchemaIssue>| {
            issues.extend(
                validator
                    .validate(model)
                    .into_iter()
                    .map(|(path, message)| SchemaIssue { path, message }),
            );
        }));
        self
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl<T> ValidationSchema<T> for Schema<T>
where
    T: Send + Sync + 'static,
{
    fn parse(&self, model: &T) -> Result<(), SchemaError> {
        let mut issues = Vec::new();
        for check in &self.checks {
            check(model, &mut issues);
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::new(issues))
        }
    }
}

/// A schema that accepts every value.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl<T> ValidationSchema<T> for AcceptAll {
    fn parse(&self, _model: &T) -> Result<(), SchemaError> {
        Ok(())
    }
}
