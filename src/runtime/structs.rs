use std::{
    borrow::Cow,
    collections::{HashMap, hash_map},
    fmt,
    iter::FusedIterator,
};

use crate::runtime::value::Value;

/// Unordered mapping from field name to [`Value`].
///
/// Field names are normalized: `_` and `-` are interchangeable and stored as
/// `-`, so `get_field("foo_bar")` finds a field set as `"foo-bar"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct {
    fields: HashMap<String, Value>,
}

fn normalize(name: &str) -> Cow<'_, str> {
    if name.contains('_') {
        Cow::Owned(name.replace('_', "-"))
    } else {
        Cow::Borrowed(name)
    }
}

impl Struct {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` when the field is missing; a missing field never reads as a default.
    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.fields.get(normalize(name).as_ref())
    }

    /// Insert or replace a field.
    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(normalize(name).into_owned(), value);
    }

    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(normalize(name).as_ref())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Single-pass iterator over `(name, value)` pairs in unspecified order.
    ///
    /// The iterator is fused: once exhausted it keeps returning `None`.
    pub fn iter(&self) -> StructFieldIter<'_> {
        StructFieldIter {
            inner: self.fields.iter(),
        }
    }

    /// Field names in sorted order.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

pub struct StructFieldIter<'a> {
    inner: hash_map::Iter<'a, String, Value>,
}

impl<'a> Iterator for StructFieldIter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(name, value)| (name.as_str(), value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for StructFieldIter<'_> {}

impl FusedIterator for StructFieldIter<'_> {}

impl<'a> IntoIterator for &'a Struct {
    type Item = (&'a str, &'a Value);
    type IntoIter = StructFieldIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for Struct {
    type Item = (String, Value);
    type IntoIter = hash_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Later duplicates overwrite earlier ones.
impl<K: AsRef<str>> FromIterator<(K, Value)> for Struct {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut s = Struct::new();
        s.extend(iter);
        s
    }
}

impl<K: AsRef<str>> Extend<(K, Value)> for Struct {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.set_field(name.as_ref(), value);
        }
    }
}

/// `{ a: 1, b: "x" }` with fields sorted by name.
impl fmt::Display for Struct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return write!(f, "{{ }}");
        }
        let items: Vec<String> = self
            .field_names()
            .into_iter()
            .map(|name| format!("{}: {}", name, self.fields[name]))
            .collect();
        write!(f, "{{ {} }}", items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn missing_field_is_absent() {
        let s = Struct::new();
        assert_eq!(s.get_field("missing"), None);
    }

    #[test]
    fn set_twice_keeps_latest() {
        let mut s = Struct::new();
        s.set_field("a", Value::from(1));
        s.set_field("a", Value::from(2));
        assert_eq!(s.get_field("a"), Some(&Value::from(2)));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn underscores_and_dashes_name_the_same_field() {
        let mut s = Struct::new();
        s.set_field("first_name", Value::from("Ada"));
        assert_eq!(s.get_field("first-name"), Some(&Value::from("Ada")));
        assert_eq!(s.field_names(), vec!["first-name"]);
    }

    #[test]
    fn from_iter_later_duplicates_win() {
        let s = Struct::from_iter([
            ("x", Value::from(1)),
            ("y", Value::from(2)),
            ("x", Value::from(3)),
        ]);
        assert_eq!(s.get_field("x"), Some(&Value::from(3)));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn empty_struct_iterates_nothing() {
        let s = Struct::new();
        let mut iter = s.iter();
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn iteration_yields_each_name_once_and_stays_exhausted() {
        let s = Struct::from_iter([("a", Value::from(1)), ("b", Value::from(2)), ("c", Value::from(3))]);
        let mut iter = s.iter();
        assert_eq!(iter.len(), 3);
        let names: HashSet<&str> = iter.by_ref().map(|(name, _)| name).collect();
        assert_eq!(names, HashSet::from(["a", "b", "c"]));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn dropping_an_iterator_early_releases_the_borrow() {
        let mut s = Struct::from_iter([("a", Value::from(1)), ("b", Value::from(2))]);
        {
            let mut iter = s.iter();
            let _ = iter.next();
        }
        s.set_field("c", Value::from(3));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn display_sorts_fields() {
        let s = Struct::from_iter([("b", Value::from("x")), ("a", Value::from(1))]);
        assert_eq!(s.to_string(), "{ a: 1, b: \"x\" }");
        assert_eq!(Struct::new().to_string(), "{ }");
    }
}
