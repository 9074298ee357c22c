//! Ordered map type for JSON objects.
//!
//! This module provides [`Map`], a wrapper around [`IndexMap`] that maintains
//! insertion order for object fields. Without `SORT_MAP_KEYS` the encoder
//! emits entries in that order; with it, entries are ordered by their
//! rendered key.
//!
//! ## Examples
//!
//! ```rust
//! use jsonplan::{Map, Value};
//!
//! let mut map = Map::new();
//! map.insert("name".to_string(), Value::from("Alice"));
//! map.insert("age".to_string(), Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get("name").and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::ptr::Ptr;
use crate::reflect::{Kind, MapInfo, TypeInfo, TypeInfoCell, Typed};
use crate::{Result, Value};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// An ordered map of string keys to values.
///
/// # Examples
///
/// ```rust
/// use jsonplan::{Map, Value};
///
/// let mut map = Map::new();
/// map.insert("first".to_string(), Value::from(1));
/// map.insert("second".to_string(), Value::from(2));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map(IndexMap<String, Value>);

impl Map {
    #[must_use]
    pub fn new() -> Self {
        Map(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Map(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned and
    /// the key keeps its original position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonplan::{Map, Value};
    ///
    /// let mut map = Map::new();
    /// assert!(map.insert("key".to_string(), Value::from(42)).is_none());
    /// assert!(map.insert("key".to_string(), Value::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    /// Removes a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.0.iter()
    }
}

unsafe fn map_len(ptr: Ptr<'_>) -> usize {
    // SAFETY: only installed on `Map`'s descriptor.
    unsafe { ptr.deref::<Map>() }.len()
}

unsafe fn map_visit<'a>(
    ptr: Ptr<'a>,
    f: &mut dyn FnMut(Ptr<'a>, Ptr<'a>) -> Result<()>,
) -> Result<()> {
    // SAFETY: only installed on `Map`'s descriptor.
    for (key, value) in unsafe { ptr.deref::<Map>() }.iter() {
        f(Ptr::from_ref(key), Ptr::from_ref(value))?;
    }
    Ok(())
}

unsafe impl Typed for Map {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::new::<Map>(Kind::Map(MapInfo::new(
                String::type_info,
                Value::type_info,
                map_len,
                map_visit,
            )))
        })
    }
}

impl Serialize for Map {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl From<HashMap<String, Value>> for Map {
    fn from(map: HashMap<String, Value>) -> Self {
        Map(map.into_iter().collect())
    }
}

impl From<Map> for HashMap<String, Value> {
    fn from(map: Map) -> Self {
        map.0.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<(String, Value)> for Map {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Map(IndexMap::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_value;
    use crate::options::Flags;

    #[test]
    fn test_remove_keeps_order() {
        let mut map: Map = [("a", 1), ("b", 2), ("c", 3)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::from(v)))
            .collect();
        assert_eq!(map.remove("b"), Some(Value::from(2)));
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a", "c"]);
        assert!(!map.contains_key("b"));
    }

    #[test]
    fn test_encodes_as_object() {
        let mut map = Map::new();
        map.insert("z".to_string(), Value::from(1));
        map.insert("a".to_string(), Value::Null);
        let mut buf = Vec::new();
        encode_value(&mut buf, &map, Flags::FASTEST).unwrap();
        assert_eq!(buf, br#"{"z":1,"a":null}"#);

        buf.clear();
        encode_value(&mut buf, &Map::new(), Flags::OMIT_EMPTY).unwrap();
        assert!(buf.is_empty());
    }
}
