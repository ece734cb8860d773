#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::iter::{Enumerate, FusedIterator};
use std::slice;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::trace;

use crate::error::{GateError, Result};
use crate::traits::JsonFormat;

/// Widest flag domain a single `Bits` word can hold
pub const MAX_FLAGS: usize = u32::BITS as usize;

/// A fixed domain of named boolean flags packed into one `u32`.
///
/// The domain is taken from the record passed to [`Bits::new`] and sorted by
/// the key's `Ord`, so bit `i` always belongs to the `i`-th key in sorted
/// order. The domain never changes afterwards; any operation on a key outside
/// it fails with [`GateError::UnknownKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bits<K> {
    raw: u32,
    keys: Vec<K>,
}

impl<K> Bits<K> {
    /// Caller guarantees `keys` is sorted, duplicate-free and at most `MAX_FLAGS` long.
    pub(crate) fn from_sorted_parts(keys: Vec<K>, raw: u32) -> Self {
        Self { raw, keys }
    }

    /// The packed word
    pub fn raw(&self) -> u32 {
        self.raw
    }

    /// Keys in bit order
    pub fn domain(&self) -> &[K] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Walk `(key, flag)` pairs in bit order. Every call starts a fresh walk.
    pub fn entries(&self) -> Iter<'_, K> {
        Iter {
            raw: self.raw,
            keys: self.keys.iter().enumerate(),
        }
    }

    pub fn keys(&self) -> slice::Iter<'_, K> {
        self.keys.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = bool> + '_ {
        self.entries().map(|(_, flag)| flag)
    }

    /// Set every flag to `value`, in key order.
    pub fn fill(&mut self, value: bool) -> &mut Self {
        for index in 0..self.keys.len() {
            let bit = 1u32 << index;
            if value {
                self.raw |= bit;
            } else {
                self.raw &= !bit;
            }
        }
        self
    }

    /// Clear every flag
    pub fn reset(&mut self) -> &mut Self {
        self.raw = 0;
        self
    }

    /// Raise every flag
    pub fn flood(&mut self) -> &mut Self {
        self.fill(true)
    }
}

impl<K: Ord + Clone + fmt::Debug> Bits<K> {
    /// Build a flag set from a record of `(key, flag)` pairs.
    ///
    /// Keys are sorted and fixed as the domain. A key repeated in `data` keeps
    /// its last flag. Fails with [`GateError::DomainTooLarge`] when the record
    /// holds more than [`MAX_FLAGS`] keys.
    pub fn new<I>(data: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, bool)>,
    {
        let record: BTreeMap<K, bool> = data.into_iter().collect();
        let raw = pack(&record)?;
        Ok(Self {
            raw,
            keys: record.into_keys().collect(),
        })
    }

    /// Bit position of `key`
    pub fn at(&self, key: &K) -> Result<usize> {
        self.keys
            .binary_search(key)
            .map_err(|_| GateError::UnknownKey(format!("{key:?}")))
    }

    fn mask(&self, key: &K) -> Result<u32> {
        Ok(1u32 << self.at(key)?)
    }

    pub fn enable(&mut self, key: &K) -> Result<&mut Self> {
        let mask = self.mask(key)?;
        trace!(?key, "enable flag");
        self.raw |= mask;
        Ok(self)
    }

    pub fn disable(&mut self, key: &K) -> Result<&mut Self> {
        let mask = self.mask(key)?;
        trace!(?key, "disable flag");
        self.raw &= !mask;
        Ok(self)
    }

    pub fn toggle(&mut self, key: &K) -> Result<&mut Self> {
        let mask = self.mask(key)?;
        trace!(?key, "toggle flag");
        self.raw ^= mask;
        Ok(self)
    }

    pub fn set(&mut self, key: &K, value: bool) -> Result<&mut Self> {
        if value {
            self.enable(key)
        } else {
            self.disable(key)
        }
    }

    /// Set a flag from a dynamically typed value, which must be a JSON boolean.
    pub fn set_value(&mut self, key: &K, value: &Value) -> Result<&mut Self> {
        match value {
            Value::Bool(flag) => self.set(key, *flag),
            other => Err(GateError::InvalidValue(format!(
                "expected a boolean for {key:?}, got {other}"
            ))),
        }
    }

    pub fn get(&self, key: &K) -> Result<bool> {
        Ok(self.raw & self.mask(key)? != 0)
    }

    /// The full record described by the current word
    pub fn data(&self) -> BTreeMap<K, bool> {
        unpack(self.raw, &self.keys)
    }

    /// Pack a record into a word, sorting its keys the same way [`Bits::new`] does.
    pub fn load<I>(data: I) -> Result<u32>
    where
        I: IntoIterator<Item = (K, bool)>,
    {
        let record: BTreeMap<K, bool> = data.into_iter().collect();
        pack(&record)
    }

    /// Unpack `value` against `keys`, taken as given.
    ///
    /// The keys are not sorted here: bit `i` maps to `keys[i]`. Pass the sorted
    /// domain (for instance [`Bits::domain`]) to invert [`Bits::load`].
    pub fn unload(value: u32, keys: &[K]) -> Result<BTreeMap<K, bool>> {
        if keys.len() > MAX_FLAGS {
            return Err(GateError::DomainTooLarge {
                len: keys.len(),
                max: MAX_FLAGS,
            });
        }
        Ok(unpack(value, keys))
    }
}

impl Bits<String> {
    /// Build a flag set from a JSON object whose members are all booleans.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            GateError::InvalidValue(format!("expected an object of flags, got {value}"))
        })?;
        let record = object
            .iter()
            .map(|(key, flag)| match flag {
                Value::Bool(flag) => Ok((key.clone(), *flag)),
                other => Err(GateError::InvalidValue(format!(
                    "flag {key:?} is not a boolean: {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(record)
    }
}

fn pack<K>(record: &BTreeMap<K, bool>) -> Result<u32> {
    if record.len() > MAX_FLAGS {
        return Err(GateError::DomainTooLarge {
            len: record.len(),
            max: MAX_FLAGS,
        });
    }
    Ok(record
        .values()
        .enumerate()
        .filter(|(_, flag)| **flag)
        .fold(0, |raw, (index, _)| raw | 1u32 << index))
}

fn unpack<K: Ord + Clone>(value: u32, keys: &[K]) -> BTreeMap<K, bool> {
    keys.iter()
        .enumerate()
        .map(|(index, key)| (key.clone(), value & (1u32 << index) != 0))
        .collect()
}

/// Iterator over `(key, flag)` pairs of a [`Bits`]
#[derive(Debug, Clone)]
pub struct Iter<'a, K> {
    raw: u32,
    keys: Enumerate<slice::Iter<'a, K>>,
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = (&'a K, bool);

    fn next(&mut self) -> Option<Self::Item> {
        self.keys
            .next()
            .map(|(index, key)| (key, self.raw & (1u32 << index) != 0))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}

impl<K> FusedIterator for Iter<'_, K> {}

impl<'a, K> IntoIterator for &'a Bits<K> {
    type Item = (&'a K, bool);
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries()
    }
}

impl<K: Serialize> Serialize for Bits<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for (key, flag) in self {
            map.serialize_entry(key, &flag)?;
        }
        map.end()
    }
}

impl<'de, K> Deserialize<'de> for Bits<K>
where
    K: Deserialize<'de> + Ord + Clone + fmt::Debug,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = BTreeMap::<K, bool>::deserialize(deserializer)?;
        Bits::new(record).map_err(de::Error::custom)
    }
}

impl<K: Serialize> JsonFormat for Bits<K> {
    fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl<K: Serialize> fmt::Display for Bits<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_json_string().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
