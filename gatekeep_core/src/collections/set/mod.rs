
use std::fmt;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{self, Serialize, Serializer};
use serde_json::Value;
use tracing::trace;

use crate::error::{GateError, Result};
use crate::permissions::{Access, PartialPerm, Permissions};
use crate::traits::{Guarded, JsonFormat};

/// Array-backed collection of elements gated by [`Permissions`].
///
/// Elements keep the order they were added in. `add` appends without looking
/// for an equal element; `remove` drops the first equal one.
#[derive(Debug)]
pub struct GuardedSet<T> {
    raw: Vec<T>,
    permissions: Permissions,
}

impl<T: PartialEq> GuardedSet<T> {
    pub fn new() -> Self {
        Self::with_permissions(Permissions::default())
    }

    pub fn with_permissions(permissions: impl Into<Permissions>) -> Self {
        Self {
            raw: Vec::new(),
            permissions: permissions.into(),
        }
    }

    /// Seed a set without checking permissions
    pub fn from_elements<I>(elements: I, overrides: PartialPerm) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            raw: elements.into_iter().collect(),
            permissions: overrides.into(),
        }
    }

    fn read(&self) -> Result<()> {
        self.permissions.check(Access::Read).map(|_| ())
    }

    fn write(&self) -> Result<()> {
        self.permissions.check(Access::Write).map(|_| ())
    }

    fn derive<U: PartialEq>(&self) -> GuardedSet<U> {
        GuardedSet::with_permissions(self.permissions.clone())
    }

    fn position(&self, element: &T) -> Result<Option<usize>> {
        self.read()?;
        Ok(self.raw.iter().position(|candidate| candidate == element))
    }

    pub fn size(&self) -> Result<usize> {
        self.read()?;
        Ok(self.raw.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    pub fn has(&self, element: &T) -> Result<bool> {
        self.read()?;
        Ok(self.raw.contains(element))
    }

    pub fn has_some<'a, I>(&self, elements: I) -> Result<bool>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.read()?;
        Ok(elements.into_iter().any(|element| self.raw.contains(element)))
    }

    pub fn has_every<'a, I>(&self, elements: I) -> Result<bool>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.read()?;
        Ok(elements.into_iter().all(|element| self.raw.contains(element)))
    }

    pub fn first(&self) -> Result<Option<&T>> {
        self.read()?;
        Ok(self.raw.first())
    }

    pub fn last(&self) -> Result<Option<&T>> {
        self.read()?;
        Ok(self.raw.last())
    }

    pub fn add(&mut self, element: T) -> Result<&mut Self> {
        self.write()?;
        self.raw.push(element);
        trace!(size = self.raw.len(), "guarded set element added");
        Ok(self)
    }

    pub fn add_many<I>(&mut self, elements: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = T>,
    {
        self.write()?;
        for element in elements {
            self.add(element)?;
        }
        Ok(self)
    }

    /// Remove the first element equal to `element`. Needs write access, and
    /// read access for the lookup.
    pub fn remove(&mut self, element: &T) -> Result<&mut Self> {
        self.write()?;
        if let Some(index) = self.position(element)? {
            self.raw.remove(index);
            trace!(index, "guarded set element removed");
        }
        Ok(self)
    }

    pub fn remove_many<'a, I>(&mut self, elements: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.write()?;
        for element in elements {
            self.remove(element)?;
        }
        Ok(self)
    }

    pub fn clear(&mut self) -> Result<&mut Self> {
        self.write()?;
        self.raw.clear();
        trace!("guarded set cleared");
        Ok(self)
    }

    pub fn for_each<F>(&self, mut f: F) -> Result<&Self>
    where
        F: FnMut(&T, &Self),
    {
        self.read()?;
        for element in &self.raw {
            f(element, self);
        }
        Ok(self)
    }

    pub fn map<U, F>(&self, mut f: F) -> Result<GuardedSet<U>>
    where
        U: PartialEq,
        F: FnMut(&T, &Self) -> U,
    {
        self.read()?;
        let mut output = self.derive();
        for element in &self.raw {
            output.add(f(element, self))?;
        }
        Ok(output)
    }

    pub fn filter<F>(&self, mut f: F) -> Result<Self>
    where
        T: Clone,
        F: FnMut(&T, &Self) -> bool,
    {
        self.read()?;
        let mut output = self.derive();
        for element in &self.raw {
            if f(element, self) {
                output.add(element.clone())?;
            }
        }
        Ok(output)
    }

    pub fn filter_map<U, F, M>(&self, f: F, m: M) -> Result<GuardedSet<U>>
    where
        T: Clone,
        U: PartialEq,
        F: FnMut(&T, &Self) -> bool,
        M: FnMut(&T, &Self) -> U,
    {
        self.filter(f)?.map(m)
    }

    pub fn find<F>(&self, mut f: F) -> Result<Option<&T>>
    where
        F: FnMut(&T, &Self) -> bool,
    {
        self.read()?;
        Ok(self.raw.iter().find(|&element| f(element, self)))
    }

    pub fn some<F>(&self, mut f: F) -> Result<bool>
    where
        F: FnMut(&T, &Self) -> bool,
    {
        self.read()?;
        Ok(self.raw.iter().any(|element| f(element, self)))
    }

    pub fn every<F>(&self, mut f: F) -> Result<bool>
    where
        F: FnMut(&T, &Self) -> bool,
    {
        self.read()?;
        Ok(self.raw.iter().all(|element| f(element, self)))
    }

    pub fn intersection(&self, other: &Self) -> Result<Self>
    where
        T: Clone,
    {
        self.read()?;
        other.read()?;
        let mut output = self.derive();
        for element in self.raw.iter().filter(|element| other.raw.contains(element)) {
            output.add(element.clone())?;
        }
        Ok(output)
    }

    /// Elements of `self`, then elements of `other` that `self` lacks
    pub fn union(&self, other: &Self) -> Result<Self>
    where
        T: Clone,
    {
        self.read()?;
        other.read()?;
        let mut output = self.derive();
        for element in &self.raw {
            output.add(element.clone())?;
        }
        for element in other.raw.iter().filter(|element| !self.raw.contains(element)) {
            output.add(element.clone())?;
        }
        Ok(output)
    }

    pub fn difference(&self, other: &Self) -> Result<Self>
    where
        T: Clone,
    {
        self.read()?;
        other.read()?;
        let mut output = self.derive();
        for element in self.raw.iter().filter(|element| !other.raw.contains(element)) {
            output.add(element.clone())?;
        }
        Ok(output)
    }

    /// Each element paired with itself, matching the map entry shape
    pub fn entries(&self) -> Result<impl Iterator<Item = (&T, &T)> + '_> {
        self.read()?;
        Ok(self.raw.iter().map(|element| (element, element)))
    }

    pub fn keys(&self) -> Result<std::slice::Iter<'_, T>> {
        self.values()
    }

    pub fn values(&self) -> Result<std::slice::Iter<'_, T>> {
        self.read()?;
        Ok(self.raw.iter())
    }

    pub fn try_clone(&self) -> Result<Self>
    where
        T: Clone,
    {
        self.read()?;
        Ok(Self {
            raw: self.raw.clone(),
            permissions: self.permissions.clone(),
        })
    }
}

impl<T> Guarded for GuardedSet<T> {
    fn permissions(&self) -> &Permissions {
        &self.permissions
    }
}

impl<T: PartialEq> Default for GuardedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialEq> FromIterator<T> for GuardedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_elements(iter, PartialPerm::default())
    }
}

impl<T: Serialize> Serialize for GuardedSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if !self.can_read() {
            return Err(<S::Error as ser::Error>::custom(
                GateError::PermissionDenied(Access::Read),
            ));
        }
        self.raw.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for GuardedSet<T>
where
    T: PartialEq + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(|raw| raw.into_iter().collect())
    }
}

impl<T: PartialEq + Serialize> JsonFormat for GuardedSet<T> {
    fn to_json(&self) -> Result<Value> {
        self.read()?;
        Ok(serde_json::to_value(&self.raw)?)
    }
}

impl<T: PartialEq + Serialize> fmt::Display for GuardedSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.can_read() {
            return f.write_str("GuardedSet (read denied)");
        }
        let text = self.to_json_string().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
