use std::collections::BTreeMap;

use gpui::SharedString;

use super::controller::{FormController, FormResult, read_lock, write_lock};
use super::model::{FieldKey, FieldLens, FormModel};
use super::schema::SchemaError;

impl<T> FormController<T>
where
    T: FormModel,
{
    /// Runs the whole schema and replaces every field error with its outcome.
    pub fn validate(&self) -> FormResult<bool> {
        Ok(self.run_validation()?.0)
    }

    /// Like [`Self::validate`], also returning the values revision the verdict
    /// belongs to.
    ///
    /// A verdict for values that changed while the schema ran is discarded and the
    /// schema runs again on the new values.
    pub(super) fn run_validation(&self) -> FormResult<(bool, u64)> {
        loop {
            let (values, revision) = self.values_at_revision("reading values for validation")?;
            let verdict = self.schema.parse(&values);

            let mut state = write_lock(&self.state, "applying validation result")?;
            if state.revision != revision {
                log::trace!("form {:?} changed during validation, retrying", state.id);
                continue;
            }
            state.errors = match &verdict {
                Ok(()) => BTreeMap::new(),
                Err(error) => known_field_errors::<T>(error),
            };
            state.accepted = Some((revision, verdict.is_ok()));
            log::trace!(
                "form {:?} validated: {} field error(s)",
                state.id,
                state.errors.len()
            );
            return Ok((verdict.is_ok(), revision));
        }
    }

    /// Runs the whole schema but only updates the error of `lens`.
    pub fn validate_field<L>(&self, lens: L) -> FormResult<bool>
    where
        L: FieldLens<T>,
    {
        self.validate_field_by_key(lens.key())
    }

    pub(super) fn validate_field_by_key(&self, key: FieldKey) -> FormResult<bool> {
        loop {
            let (values, revision) =
                self.values_at_revision("reading values for field validation")?;
            let verdict = self.schema.parse(&values);
            let message = match &verdict {
                Ok(()) => None,
                Err(error) => error.first_for(key).map(|issue| issue.message.clone()),
            };

            let mut state = write_lock(&self.state, "applying field validation result")?;
            if state.revision != revision {
                continue;
            }
            state.accepted = Some((revision, verdict.is_ok()));
            return match message {
                Some(message) => {
                    state.errors.insert(key, message);
                    Ok(false)
                }
                None => {
                    state.errors.remove(&key);
                    Ok(true)
                }
            };
        }
    }

    /// True when no field shows an error and the schema accepts the current values.
    ///
    /// Never touches `errors`; the schema verdict is cached until the values change.
    pub fn is_valid(&self) -> FormResult<bool> {
        let (values, revision) = {
            let state = read_lock(&self.state, "reading validity")?;
            if !state.errors.is_empty() {
                return Ok(false);
            }
            match state.accepted {
                Some((checked, accepted)) if checked == state.revision => return Ok(accepted),
                _ => {}
            }
            (state.values.clone(), state.revision)
        };

        let accepted = self.schema.parse(&values).is_ok();
        let mut state = write_lock(&self.state, "caching validity")?;
        if state.revision == revision {
            state.accepted = Some((revision, accepted));
        }
        Ok(accepted && state.errors.is_empty())
    }

    fn values_at_revision(&self, context: &'static str) -> FormResult<(T, u64)> {
        let state = read_lock(&self.state, context)?;
        Ok((state.values.clone(), state.revision))
    }
}

fn known_field_errors<T>(error: &SchemaError) -> BTreeMap<FieldKey, SharedString>
where
    T: FormModel,
{
    let mut errors = error.field_errors();
    errors.retain(|key, message| {
        let known = T::has_field(*key);
        if !known {
            log::warn!("dropping schema issue for unknown field `{key}`: {message}");
        }
        known
    });
    errors
}
