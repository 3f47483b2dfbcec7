use std::fmt::{self, Display};
use std::slice;
use std::vec;

/// An ordered collection of errors that accumulates instead of
/// replacing. The compiler threads one of these through every pass so a
/// single run reports as many problems as it can find.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Errors<T>(Vec<T>);

impl<T> Errors<T> {
    pub fn new() -> Errors<T> {
        Errors(Vec::new())
    }

    /// Returns true if `self` contains any errors.
    pub fn has_errors(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds an error to the end of the list.
    pub fn push(&mut self, error: T) {
        self.0.push(error);
    }

    /// Moves every error of `other` to the end of `self`.
    pub fn merge(&mut self, mut other: Self) {
        self.0.append(&mut other.0);
    }

    /// Borrowing counterpart of [`Errors::merge`].
    pub fn append(&mut self, other: &mut Self) {
        self.0.append(&mut other.0);
    }

    pub fn iter(&self) -> slice::Iter<'_, T> {
        self.0.iter()
    }
}

impl<T> Default for Errors<T> {
    fn default() -> Self {
        Errors::new()
    }
}

impl<T: Display> fmt::Display for Errors<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.0 {
            writeln!(f, "{error}")?;
        }
        Ok(())
    }
}

impl<T> Extend<T> for Errors<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<T> From<T> for Errors<T> {
    fn from(error: T) -> Errors<T> {
        Errors(vec![error])
    }
}

impl<T> From<Vec<T>> for Errors<T> {
    fn from(errors: Vec<T>) -> Errors<T> {
        Errors(errors)
    }
}

impl<T> FromIterator<T> for Errors<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Errors<T> {
        Errors(iter.into_iter().collect())
    }
}

impl<T> From<Errors<T>> for Vec<T> {
    fn from(errors: Errors<T>) -> Vec<T> {
        errors.0
    }
}

impl<T> IntoIterator for Errors<T> {
    type Item = T;
    type IntoIter = vec::IntoIter<T>;

    fn into_iter(self) -> vec::IntoIter<T> {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Errors<T> {
    type Item = &'a T;
    type IntoIter = slice::Iter<'a, T>;

    fn into_iter(self) -> slice::Iter<'a, T> {
        self.0.iter()
    }
}
