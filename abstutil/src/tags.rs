use std::fmt;

use serde::{Deserialize, Serialize};

/// OSM-style key/value pairs. Keys are unique and iteration follows insertion order, so two
/// conversions of the same input always see tags in the same order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags(Vec<(String, String)>);

impl Tags {
    /// Later duplicates of a key overwrite the value, but keep the key's first position.
    pub fn new<I, K, V>(pairs: I) -> Tags
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut tags = Tags::empty();
        for (k, v) in pairs {
            tags.insert(k, v);
        }
        tags
    }

    pub fn empty() -> Tags {
        Tags(Vec::new())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn has_any(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.contains_key(key))
    }

    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get(key).map(|v| v == value).unwrap_or(false)
    }

    pub fn is_any(&self, key: &str, values: &[&str]) -> bool {
        if let Some(v) = self.get(key) {
            values.contains(&v.as_str())
        } else {
            false
        }
    }

    /// True if any of the (key, value) pairs is present.
    pub fn contains_any(&self, pairs: &[(&str, &str)]) -> bool {
        pairs.iter().any(|(k, v)| self.is(k, v))
    }

    fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        if let Some(pair) = self.0.iter_mut().find(|(k, _)| *k == key) {
            pair.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pairs: Vec<String> = self.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "[{}]", pairs.join(", "))
    }
}
