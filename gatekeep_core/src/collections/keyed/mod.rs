#[cfg(test)]
mod tests;

use std::borrow::Borrow;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{self, Serialize, SerializeSeq, Serializer};
use serde_json::Value;
use tracing::trace;

use crate::error::Result;
use crate::permissions::{Access, PartialPerm, Permissions};
use crate::traits::{Guarded, JsonFormat};

/// Insertion-ordered map whose every operation is gated by [`Permissions`].
///
/// Reads check [`Access::Read`] and writes check [`Access::Write`] before the
/// store is touched. Setting an existing key replaces its value in place.
/// Containers derived from this one (`map`, `filter`, set algebra, ...) get a
/// clone of its permissions and insert through [`GuardedMap::set`], so a
/// read-only source cannot produce a non-empty result.
#[derive(Debug)]
pub struct GuardedMap<K, V> {
    // Map for direct key-based access
    items: HashMap<K, V>,
    // Keys in insertion order
    order: VecDeque<K>,
    permissions: Permissions,
}

impl<K, V> GuardedMap<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_permissions(Permissions::default())
    }

    pub fn with_permissions(permissions: impl Into<Permissions>) -> Self {
        Self {
            items: HashMap::new(),
            order: VecDeque::new(),
            permissions: permissions.into(),
        }
    }

    /// Seed a map with `entries` without checking permissions, so even a
    /// read-only map can start out populated.
    pub fn from_entries<I>(entries: I, overrides: PartialPerm) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::with_permissions(overrides);
        for (key, value) in entries {
            map.insert(key, value);
        }
        map
    }

    fn insert(&mut self, key: K, value: V) {
        if self.items.insert(key.clone(), value).is_none() {
            self.order.push_back(key);
        }
    }

    fn read(&self) -> Result<()> {
        self.permissions.check(Access::Read).map(|_| ())
    }

    fn write(&self) -> Result<()> {
        self.permissions.check(Access::Write).map(|_| ())
    }

    /// An empty map carrying a copy of this map's permissions
    fn derive<U>(&self) -> GuardedMap<K, U> {
        GuardedMap::with_permissions(self.permissions.clone())
    }

    fn pairs(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.order.iter().filter_map(|key| self.items.get_key_value(key))
    }

    pub fn size(&self) -> Result<usize> {
        self.read()?;
        Ok(self.items.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    pub fn has<Q>(&self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.read()?;
        Ok(self.items.contains_key(key))
    }

    pub fn has_some<I>(&self, keys: I) -> Result<bool>
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
    {
        self.read()?;
        Ok(keys
            .into_iter()
            .any(|key| self.items.contains_key::<K>(key.borrow())))
    }

    pub fn has_every<I>(&self, keys: I) -> Result<bool>
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
    {
        self.read()?;
        Ok(keys
            .into_iter()
            .all(|key| self.items.contains_key::<K>(key.borrow())))
    }

    pub fn get<Q>(&self, key: &Q) -> Result<Option<&V>>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.read()?;
        Ok(self.items.get(key))
    }

    /// A new map holding the requested keys that are present, in request order
    pub fn get_many<I>(&self, keys: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
        V: Clone,
    {
        self.read()?;
        let mut output = self.derive();
        for key in keys {
            if let Some((key, value)) = self.items.get_key_value::<K>(key.borrow()) {
                output.set(key.clone(), value.clone())?;
            }
        }
        Ok(output)
    }

    pub fn first(&self) -> Result<Option<(&K, &V)>> {
        self.read()?;
        Ok(self.pairs().next())
    }

    pub fn last(&self) -> Result<Option<(&K, &V)>> {
        self.read()?;
        Ok(self
            .order
            .back()
            .and_then(|key| self.items.get_key_value(key)))
    }

    pub fn set(&mut self, key: K, value: V) -> Result<&mut Self> {
        self.write()?;
        self.insert(key, value);
        trace!(size = self.items.len(), "guarded map entry set");
        Ok(self)
    }

    pub fn set_many_to<I>(&mut self, keys: I, value: V) -> Result<&mut Self>
    where
        I: IntoIterator<Item = K>,
        V: Clone,
    {
        self.write()?;
        for key in keys {
            self.set(key, value.clone())?;
        }
        Ok(self)
    }

    pub fn set_many<I>(&mut self, entries: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.write()?;
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(self)
    }

    /// Remove `key`, returning whether it was present
    pub fn delete<Q>(&mut self, key: &Q) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.write()?;
        match self.items.remove_entry(key) {
            Some((removed, _)) => {
                self.order.retain(|k| k != &removed);
                trace!(size = self.items.len(), "guarded map entry deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn delete_many<I>(&mut self, keys: I) -> Result<&mut Self>
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
    {
        self.write()?;
        for key in keys {
            self.delete::<K>(key.borrow())?;
        }
        Ok(self)
    }

    pub fn clear(&mut self) -> Result<&mut Self> {
        self.write()?;
        self.items.clear();
        self.order.clear();
        trace!("guarded map cleared");
        Ok(self)
    }

    pub fn for_each<F>(&self, mut f: F) -> Result<&Self>
    where
        F: FnMut(&V, &K, &Self),
    {
        self.read()?;
        for (key, value) in self.pairs() {
            f(value, key, self);
        }
        Ok(self)
    }

    pub fn map<U, F>(&self, mut f: F) -> Result<GuardedMap<K, U>>
    where
        F: FnMut(&V, &K, &Self) -> U,
    {
        self.read()?;
        let mut output = self.derive();
        for (key, value) in self.pairs() {
            output.set(key.clone(), f(value, key, self))?;
        }
        Ok(output)
    }

    pub fn filter<F>(&self, mut f: F) -> Result<Self>
    where
        V: Clone,
        F: FnMut(&V, &K, &Self) -> bool,
    {
        self.read()?;
        let mut output = self.derive();
        for (key, value) in self.pairs() {
            if f(value, key, self) {
                output.set(key.clone(), value.clone())?;
            }
        }
        Ok(output)
    }

    /// `filter(f)` followed by `map(m)` on the filtered map
    pub fn filter_map<U, F, M>(&self, f: F, m: M) -> Result<GuardedMap<K, U>>
    where
        V: Clone,
        F: FnMut(&V, &K, &Self) -> bool,
        M: FnMut(&V, &K, &Self) -> U,
    {
        self.filter(f)?.map(m)
    }

    pub fn find<F>(&self, mut f: F) -> Result<Option<&V>>
    where
        F: FnMut(&V, &K, &Self) -> bool,
    {
        self.read()?;
        Ok(self
            .pairs()
            .find(|&(key, value)| f(value, key, self))
            .map(|(_, value)| value))
    }

    pub fn find_key<F>(&self, mut f: F) -> Result<Option<&K>>
    where
        F: FnMut(&V, &K, &Self) -> bool,
    {
        self.read()?;
        Ok(self
            .pairs()
            .find(|&(key, value)| f(value, key, self))
            .map(|(key, _)| key))
    }

    /// Entries of `self` whose key is also in `other`
    pub fn intersection(&self, other: &Self) -> Result<Self>
    where
        V: Clone,
    {
        self.read()?;
        other.read()?;
        let mut output = self.derive();
        for (key, value) in self.pairs() {
            if other.items.contains_key(key) {
                output.set(key.clone(), value.clone())?;
            }
        }
        Ok(output)
    }

    /// Entries of `self`, then entries of `other` whose key `self` lacks
    pub fn union(&self, other: &Self) -> Result<Self>
    where
        V: Clone,
    {
        self.read()?;
        other.read()?;
        let mut output = self.derive();
        for (key, value) in self.pairs() {
            output.set(key.clone(), value.clone())?;
        }
        for (key, value) in other.pairs() {
            if !self.items.contains_key(key) {
                output.set(key.clone(), value.clone())?;
            }
        }
        Ok(output)
    }

    /// Entries of `self` whose key is not in `other`
    pub fn difference(&self, other: &Self) -> Result<Self>
    where
        V: Clone,
    {
        self.read()?;
        other.read()?;
        let mut output = self.derive();
        for (key, value) in self.pairs() {
            if !other.items.contains_key(key) {
                output.set(key.clone(), value.clone())?;
            }
        }
        Ok(output)
    }

    /// A copy of `self` with every pair of `other` set on it; `other` wins on
    /// shared keys, which keep their position.
    pub fn chain(&self, other: &Self) -> Result<Self>
    where
        V: Clone,
    {
        let mut output = self.try_clone()?;
        other.read()?;
        for (key, value) in other.pairs() {
            output.set(key.clone(), value.clone())?;
        }
        Ok(output)
    }

    pub fn some<F>(&self, mut f: F) -> Result<bool>
    where
        F: FnMut(&V, &K, &Self) -> bool,
    {
        self.read()?;
        Ok(self.pairs().any(|(key, value)| f(value, key, self)))
    }

    pub fn every<F>(&self, mut f: F) -> Result<bool>
    where
        F: FnMut(&V, &K, &Self) -> bool,
    {
        self.read()?;
        Ok(self.pairs().all(|(key, value)| f(value, key, self)))
    }

    pub fn entries(&self) -> Result<impl Iterator<Item = (&K, &V)> + '_> {
        self.read()?;
        Ok(self.pairs())
    }

    pub fn keys(&self) -> Result<impl Iterator<Item = &K> + '_> {
        self.read()?;
        Ok(self.order.iter())
    }

    pub fn values(&self) -> Result<impl Iterator<Item = &V> + '_> {
        self.read()?;
        Ok(self.pairs().map(|(_, value)| value))
    }

    /// Copy the entries and permissions into a new map. Needs only read
    /// access; the copy is seeded directly.
    pub fn try_clone(&self) -> Result<Self>
    where
        V: Clone,
    {
        self.read()?;
        Ok(Self {
            items: self.items.clone(),
            order: self.order.clone(),
            permissions: self.permissions.clone(),
        })
    }
}

impl<K, V> Guarded for GuardedMap<K, V> {
    fn permissions(&self) -> &Permissions {
        &self.permissions
    }
}

impl<K: Eq + Hash + Clone, V> Default for GuardedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for GuardedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter, PartialPerm::default())
    }
}

impl<K, V> Serialize for GuardedMap<K, V>
where
    K: Eq + Hash + Clone + Serialize,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let entries = self
            .entries()
            .map_err(<S::Error as ser::Error>::custom)?;
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for pair in entries {
            seq.serialize_element(&pair)?;
        }
        seq.end()
    }
}

impl<'de, K, V> Deserialize<'de> for GuardedMap<K, V>
where
    K: Eq + Hash + Clone + Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<(K, V)>::deserialize(deserializer).map(|pairs| pairs.into_iter().collect())
    }
}

impl<K, V> JsonFormat for GuardedMap<K, V>
where
    K: Eq + Hash + Clone + Serialize,
    V: Serialize,
{
    fn to_json(&self) -> Result<Value> {
        self.read()?;
        Ok(serde_json::to_value(self)?)
    }
}

impl<K, V> fmt::Display for GuardedMap<K, V>
where
    K: Eq + Hash + Clone + Serialize,
    V: Serialize,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.can_read() {
            return f.write_str("GuardedMap (read denied)");
        }
        let text = self.to_json_string().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
