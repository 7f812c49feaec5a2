use super::Object;
use std::fmt::{self, Display, Formatter};
use std::iter::FromIterator;

/// Insertion-ordered map whose keys are compared by structural equality.
///
/// Keys may be any value, including mutable lists, so lookup is a linear
/// scan rather than a hash.
#[derive(Debug, Clone, Default)]
pub struct Dict {
    entries: Vec<(Object, Object)>,
}

impl Dict {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry for `key` in insertion order.
    pub fn position(&self, key: &Object) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn get(&self, key: &Object) -> Option<&Object> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &Object) -> bool {
        self.position(key).is_some()
    }

    /// Replaces the value in place when the key is already present.
    pub fn insert(&mut self, key: Object, value: Object) {
        let position = self.position(&key);
        self.insert_at(position, key, value);
    }

    /// Stores `value` at an index found earlier with `position`, or appends
    /// a new entry when there was none.
    pub fn insert_at(&mut self, position: Option<usize>, key: Object, value: Object) {
        match position {
            Some(i) => self.entries[i].1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &Object) -> Option<Object> {
        let i = self.position(key)?;
        Some(self.remove_at(i))
    }

    pub fn remove_at(&mut self, i: usize) -> Object {
        self.entries.remove(i).1
    }

    pub fn keys(&self) -> impl Iterator<Item = &Object> {
        self.entries.iter().map(|(k, _)| k)
    }
}

impl PartialEq for Dict {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl FromIterator<(Object, Object)> for Dict {
    fn from_iter<I: IntoIterator<Item = (Object, Object)>>(iter: I) -> Self {
        let mut dict = Self::new();
        for (key, value) in iter {
            dict.insert(key, value);
        }
        dict
    }
}

impl Display for Dict {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let pairs: Vec<String> = self
            .entries
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect();

        write!(f, "{{{}}}", pairs.join(", "))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_insertion_order_and_replacement() {
        let mut dict: Dict = vec![
            (Object::from("b"), Object::from(1)),
            (Object::from("a"), Object::from(2)),
        ]
        .into_iter()
        .collect();

        dict.insert(Object::from("b"), Object::from(3));
        dict.insert(Object::from(1), Object::Nil);

        assert_eq!(dict.len(), 3);
        assert_eq!(dict.to_string(), "{b: 3, a: 2, 1: nil}");
        assert_eq!(dict.get(&Object::from("b")), Some(&Object::from(3)));
        assert_eq!(dict.get(&Object::from(1.0)), None);
    }

    #[test]
    fn test_structural_keys() {
        let mut dict = Dict::new();
        let pair = || Object::list(vec![Object::from(1), Object::from(2)]);
        dict.insert(pair(), Object::from("pair"));

        assert!(dict.contains_key(&pair()));
        assert_eq!(dict.remove(&pair()), Some(Object::from("pair")));
        assert!(dict.is_empty());
    }

    #[test]
    fn test_equality_ignores_order() {
        let entry = |k: i64, v: &str| (Object::from(k), Object::from(v));
        let left: Dict = vec![entry(1, "x"), entry(2, "y")].into_iter().collect();
        let right: Dict = vec![entry(2, "y"), entry(1, "x")].into_iter().collect();

        assert_eq!(left, right);
    }
}
