//! Ordered, hierarchical key-value store consulted by `#{...}` substitutions
//! and iterated by `#for` loops.
//!
//! Keys keep their insertion order, which is the order `#for` visits them in.
//! A dotted key such as `lights.sun.color` walks nested dictionaries one
//! segment at a time.

use crate::PrepperError;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Double(f64),
    String(String),
    IVec2([i32; 2]),
    IVec3([i32; 3]),
    DVec2([f64; 2]),
    DVec3([f64; 3]),
    Dictionary(Dictionary),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dictionary {
    entries: Vec<(String, Value)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value under a single (non-dotted) key.
    /// Replacing keeps the key's original position.
    pub fn set_value(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();

        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    fn local(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Look up a dotted path.
    pub fn value(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            Some((head, rest)) => match self.local(head)? {
                Value::Dictionary(inner) => inner.value(rest),
                _ => None,
            },
            None => self.local(path),
        }
    }

    pub fn has_key(&self, path: &str) -> bool {
        self.value(path).is_some()
    }

    /// Typed lookup; `None` if the path is missing or holds another type.
    pub fn get<T: FromValue>(&self, path: &str) -> Option<T> {
        self.value(path).and_then(T::from_value)
    }

    pub fn has_value<T: FromValue>(&self, path: &str) -> bool {
        self.get::<T>(path).is_some()
    }

    pub fn dictionary(&self, path: &str) -> Option<&Dictionary> {
        match self.value(path)? {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a TOML document into a dictionary. Tables nest, arrays of two or
    /// three numbers become vectors.
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        let table: toml::Table = toml::from_str(s)?;
        Dictionary::try_from(table)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Dictionary {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut dictionary = Dictionary::new();
        for (k, v) in iter {
            dictionary.set_value(k, v);
        }
        dictionary
    }
}

impl TryFrom<toml::Table> for Dictionary {
    type Error = PrepperError;

    fn try_from(table: toml::Table) -> Result<Self, Self::Error> {
        let mut dictionary = Dictionary::new();
        for (key, value) in table {
            let value = value_from_toml(&key, value)?;
            dictionary.set_value(key, value);
        }
        Ok(dictionary)
    }
}

fn value_from_toml(key: &str, value: toml::Value) -> crate::Result<Value> {
    let unsupported = |message: &str| PrepperError::DictionaryValue {
        key: key.to_string(),
        message: message.to_string(),
    };

    Ok(match value {
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Integer(i) => Value::Int(
            i32::try_from(i).map_err(|_| unsupported("integer does not fit in 32 bits"))?,
        ),
        toml::Value::Float(f) => Value::Double(f),
        toml::Value::String(s) => Value::String(s),
        toml::Value::Table(t) => Value::Dictionary(Dictionary::try_from(t)?),
        toml::Value::Array(items) => {
            if let Some(ints) = items
                .iter()
                .map(|v| v.as_integer().and_then(|i| i32::try_from(i).ok()))
                .collect::<Option<Vec<i32>>>()
            {
                match ints.as_slice() {
                    &[x, y] => Value::IVec2([x, y]),
                    &[x, y, z] => Value::IVec3([x, y, z]),
                    _ => return Err(unsupported("only arrays of two or three numbers are vectors")),
                }
            } else if let Some(floats) = items
                .iter()
                .map(|v| v.as_float().or_else(|| v.as_integer().map(|i| i as f64)))
                .collect::<Option<Vec<f64>>>()
            {
                match floats.as_slice() {
                    &[x, y] => Value::DVec2([x, y]),
                    &[x, y, z] => Value::DVec3([x, y, z]),
                    _ => return Err(unsupported("only arrays of two or three numbers are vectors")),
                }
            } else {
                return Err(unsupported("arrays must hold numbers"));
            }
        }
        toml::Value::Datetime(_) => return Err(unsupported("datetimes are not supported")),
    })
}

/// Extraction of one concrete type from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! value_conversions {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

value_conversions! {
    Bool => bool,
    Int => i32,
    Double => f64,
    String => String,
    IVec2 => [i32; 2],
    IVec3 => [i32; 3],
    DVec2 => [f64; 2],
    DVec3 => [f64; 3],
    Dictionary => Dictionary,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_paths_walk_nested_dictionaries() {
        let mut inner = Dictionary::new();
        inner.set_value("count", 3i32);
        let mut outer = Dictionary::new();
        outer.set_value("inner", inner);

        assert_eq!(outer.get::<i32>("inner.count"), Some(3));
        assert!(outer.has_key("inner"));
        assert!(!outer.has_key("inner.missing"));
        assert!(!outer.has_key("inner.count.deeper"));
        assert!(!outer.has_value::<bool>("inner.count"));
    }

    #[test]
    fn keys_keep_insertion_order() {
        let d: Dictionary = vec![("zeta", 1i32), ("alpha", 2), ("mid", 3)]
            .into_iter()
            .collect();
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

        let mut d = d;
        d.set_value("alpha", 5i32);
        assert_eq!(d.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(d.get::<i32>("alpha"), Some(5));
    }

    #[test]
    fn toml_arrays_become_vectors() {
        let d = Dictionary::from_toml_str(
            r#"
            flag = true
            pos = [1, 2]
            dir = [0.5, 1.0, 2]

            [light]
            name = "sun"
            "#,
        )
        .unwrap();

        assert_eq!(d.get::<bool>("flag"), Some(true));
        assert_eq!(d.get::<[i32; 2]>("pos"), Some([1, 2]));
        assert_eq!(d.get::<[f64; 3]>("dir"), Some([0.5, 1.0, 2.0]));
        assert_eq!(d.get::<String>("light.name").as_deref(), Some("sun"));
    }

    #[test]
    fn toml_rejects_long_arrays() {
        match Dictionary::from_toml_str("v = [1, 2, 3, 4]") {
            Err(PrepperError::DictionaryValue { key, .. }) => assert_eq!(key, "v"),
            val => panic!("{:?}", val),
        }
    }
}
