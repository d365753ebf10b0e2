use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Typed access to one field of a form model.
pub trait FieldLens<T>: Copy + Send + Sync + 'static {
    type Value: Clone + PartialEq + Send + Sync + 'static;

    fn key(self) -> FieldKey;
    fn get<'a>(self, model: &'a T) -> &'a Self::Value;
    fn set(self, model: &mut T, value: Self::Value);
}

/// A record edited by a [`FormController`](super::FormController).
///
/// Usually derived with `#[derive(FormModel)]`, which also generates the field lenses
/// and the `Patch` type.
pub trait FormModel: Clone + Send + Sync + 'static {
    type Fields;
    /// Partial update; every field is optional.
    type Patch: Default + Send + 'static;

    /// Every field of the model, in declaration order.
    const FIELD_KEYS: &'static [FieldKey];

    fn fields() -> Self::Fields;

    /// Writes the fields present in `patch`, returning the keys that were written.
    fn apply_patch(&mut self, patch: Self::Patch) -> Vec<FieldKey>;

    fn field_differs(&self, other: &Self, key: FieldKey) -> bool;

    fn has_field(key: FieldKey) -> bool {
        Self::FIELD_KEYS.contains(&key)
    }

    /// Resolves a runtime field name, e.g. from a server error payload.
    fn field_key(name: &str) -> Option<FieldKey> {
        Self::FIELD_KEYS
            .iter()
            .copied()
            .find(|key| key.as_str() == name)
    }
}
