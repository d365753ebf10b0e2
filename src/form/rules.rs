//! Ready-made field validators for [`Schema::field`](super::Schema::field).

use std::fmt::Display;
use std::sync::LazyLock;

use gpui::SharedString;
use regex::Regex;

use super::model::FieldLens;
use super::schema::FieldValidator;

/// Values that can be "left empty" by the user.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for SharedString {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl<V> Blank for Option<V>
where
    V: Blank,
{
    fn is_blank(&self) -> bool {
        self.as_ref().is_none_or(Blank::is_blank)
    }
}

impl<V> Blank for Vec<V> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

/// Values whose length is measured in characters.
pub trait TextLength {
    fn char_len(&self) -> usize;
}

impl TextLength for SharedString {
    fn char_len(&self) -> usize {
        self.chars().count()
    }
}

impl TextLength for String {
    fn char_len(&self) -> usize {
        self.chars().count()
    }
}

#[derive(Clone, Debug)]
pub struct Required {
    message: SharedString,
}

impl Required {
    pub fn new(message: impl Into<SharedString>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<T, L> FieldValidator<T, L> for Required
where
    L: FieldLens<T>,
    L::Value: Blank,
{
    fn validate(&self, _model: &T, value: &L::Value) -> Result<(), SharedString> {
        if value.is_blank() {
            Err(self.message.clone())
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Debug)]
pub struct MinLength {
    min: usize,
    message: SharedString,
}

impl MinLength {
    pub fn new(min: usize) -> Self {
        Self {
            min,
            message: format!("Must be at least {min} characters").into(),
        }
    }

    pub fn message(mut self, value: impl Into<SharedString>) -> Self {
        self.message = value.into();
        self
    }
}

impl<T, L> FieldValidator<T, L> for MinLength
where
    L: FieldLens<T>,
    L::Value: TextLength,
{
    fn validate(&self, _model: &T, value: &L::Value) -> Result<(), SharedString> {
        if value.char_len() < self.min {
            Err(self.message.clone())
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Debug)]
pub struct MaxLength {
    max: usize,
    message: SharedString,
}

impl MaxLength {
    pub fn new(max: usize) -> Self {
        Self {
            max,
            message: format!("Must be at most {max} characters").into(),
        }
    }

    pub fn message(mut self, value: impl Into<SharedString>) -> Self {
        self.message = value.into();
        self
    }
}

impl<T, L> FieldValidator<T, L> for MaxLength
where
    L: FieldLens<T>,
    L::Value: TextLength,
{
    fn validate(&self, _model: &T, value: &L::Value) -> Result<(), SharedString> {
        if value.char_len() > self.max {
            Err(self.message.clone())
        } else {
            Ok(())
        }
    }
}

/// Inclusive numeric bounds.
#[derive(Clone, Debug)]
pub struct InRange<N> {
    min: N,
    max: N,
    message: SharedString,
}

impl<N> InRange<N>
where
    N: Display,
{
    pub fn new(min: N, max: N) -> Self {
        let message = format!("Must be between {min} and {max}").into();
        Self { min, max, message }
    }

    pub fn message(mut self, value: impl Into<SharedString>) -> Self {
        self.message = value.into();
        self
    }
}

impl<T, L, N> FieldValidator<T, L> for InRange<N>
where
    L: FieldLens<T, Value = N>,
    N: PartialOrd + Send + Sync,
{
    fn validate(&self, _model: &T, value: &N) -> Result<(), SharedString> {
        if *value < self.min || *value > self.max {
            Err(self.message.clone())
        } else {
            Ok(())
        }
    }
}

/// Loose address shape check: one `@`, non-empty local part, dotted domain.
#[derive(Clone, Debug)]
pub struct Email {
    message: SharedString,
}

impl Email {
    pub fn new(message: impl Into<SharedString>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Default for Email {
    fn default() -> Self {
        Self::new("Enter a valid email address")
    }
}

impl<T, L> FieldValidator<T, L> for Email
where
    L: FieldLens<T>,
    L::Value: AsRef<str>,
{
    fn validate(&self, _model: &T, value: &L::Value) -> Result<(), SharedString> {
        if looks_like_email(value.as_ref()) {
            Ok(())
        } else {
            Err(self.message.clone())
        }
    }
}

/// One `@`, a non-empty local part and a dotted domain, no whitespace. Deliverability
/// is the server's call.
static EMAIL_SHAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(?:\.[^\s@.]+)+$").ok());

fn looks_like_email(value: &str) -> bool {
    EMAIL_SHAPE
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value.trim()))
}
