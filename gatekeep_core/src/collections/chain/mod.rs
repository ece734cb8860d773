
mod node;

pub use node::{Node, NodeId};

use std::fmt;
use std::iter::{self, FusedIterator};

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;
use tracing::trace;

use crate::error::Result;
use crate::traits::JsonFormat;

/// An ordered key-value map stored as a linked chain of nodes.
///
/// Nodes live in an arena owned by the chain and are linked head to tail by
/// `child` indices, with `parent` indices pointing back so a node can be
/// spliced out in O(1) once found. Lookups, `size` and finding the tail all
/// walk the chain from the head.
///
/// Order is insertion order, except that setting a key that is already
/// present unlinks it and appends it again at the tail.
pub struct Chain<K, V> {
    slots: Vec<Option<Node<(K, V)>>>,
    // Freed slots, reused before the arena grows
    vacant: Vec<usize>,
    head: Option<NodeId>,
}

impl<K, V> Chain<K, V> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
            head: None,
        }
    }

    /// The first node, if any
    pub fn head(&self) -> Option<&Node<(K, V)>> {
        self.head.and_then(|id| self.node(id))
    }

    /// The node stored at `id`, if it is still linked
    pub fn node(&self, id: NodeId) -> Option<&Node<(K, V)>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<(K, V)>> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Walk `(id, node)` pairs from the head
    fn links(&self) -> impl Iterator<Item = (NodeId, &Node<(K, V)>)> + '_ {
        let step = move |id: NodeId| self.node(id).map(|node| (id, node));
        iter::successors(self.head.and_then(step), move |(_, node)| {
            node.child.and_then(step)
        })
    }

    fn tail(&self) -> Option<NodeId> {
        self.links().last().map(|(id, _)| id)
    }

    fn allocate(&mut self, node: Node<(K, V)>) -> NodeId {
        match self.vacant.pop() {
            Some(index) => {
                self.slots[index] = Some(node);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    /// Splice a node out of the chain and free its slot.
    fn unlink(&mut self, id: NodeId) -> Option<(K, V)> {
        let node = self.slots.get_mut(id.0)?.take()?;
        match node.parent {
            Some(parent) => {
                if let Some(parent) = self.node_mut(parent) {
                    parent.child = node.child;
                }
            }
            None => self.head = node.child,
        }
        if let Some(child) = node.child.and_then(|child| self.node_mut(child)) {
            child.parent = node.parent;
        }
        self.vacant.push(id.0);
        node.value
    }

    /// Entries in chain order. Every call starts a fresh walk from the head.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            chain: self,
            next: self.head,
        }
    }

    pub fn entries(&self) -> Iter<'_, K, V> {
        self.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, value)| value)
    }

    /// Number of entries, counted by walking the chain
    pub fn size(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        self.head()
            .and_then(Node::value)
            .map(|(key, value)| (key, value))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        self.tail()
            .and_then(|id| self.node(id))
            .and_then(Node::value)
            .map(|(key, value)| (key, value))
    }

    pub fn for_each<F>(&self, mut f: F) -> &Self
    where
        F: FnMut(&V, &K, &Self),
    {
        for (key, value) in self {
            f(value, key, self);
        }
        self
    }

    pub fn some<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&V, &K, &Self) -> bool,
    {
        self.iter().any(|(key, value)| f(value, key, self))
    }

    pub fn every<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&V, &K, &Self) -> bool,
    {
        self.iter().all(|(key, value)| f(value, key, self))
    }
}

impl<K: PartialEq, V> Chain<K, V> {
    fn position(&self, key: &K) -> Option<NodeId> {
        self.links()
            .find(|(_, node)| node.value().is_some_and(|(candidate, _)| candidate == key))
            .map(|(id, _)| id)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.position(key)
            .and_then(|id| self.node(id))
            .and_then(Node::value)
            .map(|(_, value)| value)
    }

    pub fn has(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace `key`. An existing key is unlinked first, so the
    /// entry always ends up at the tail.
    pub fn set(&mut self, key: K, value: V) -> &mut Self {
        if let Some(id) = self.position(&key) {
            self.unlink(id);
        }
        let tail = self.tail();
        let id = self.allocate(Node::new(Some((key, value)), None, tail));
        match tail {
            Some(tail) => {
                if let Some(last) = self.node_mut(tail) {
                    last.child = Some(id);
                }
            }
            None => self.head = Some(id),
        }
        trace!(slot = id.0, "chain node appended");
        self
    }

    pub fn delete(&mut self, key: &K) -> bool {
        match self.position(key) {
            Some(id) => {
                self.unlink(id);
                trace!(slot = id.0, "chain node unlinked");
                true
            }
            None => false,
        }
    }

    pub fn map<U, F>(&self, mut f: F) -> Chain<K, U>
    where
        K: Clone,
        F: FnMut(&V, &K, &Self) -> U,
    {
        let mut output = Chain::new();
        for (key, value) in self {
            output.set(key.clone(), f(value, key, self));
        }
        output
    }

    pub fn filter<F>(&self, mut f: F) -> Self
    where
        K: Clone,
        V: Clone,
        F: FnMut(&V, &K, &Self) -> bool,
    {
        let mut output = Chain::new();
        for (key, value) in self {
            if f(value, key, self) {
                output.set(key.clone(), value.clone());
            }
        }
        output
    }

    /// `filter(f)` followed by `map(m)`; `m` sees the filtered chain.
    pub fn filter_map<U, F, M>(&self, f: F, m: M) -> Chain<K, U>
    where
        K: Clone,
        V: Clone,
        F: FnMut(&V, &K, &Self) -> bool,
        M: FnMut(&V, &K, &Self) -> U,
    {
        self.filter(f).map(m)
    }

    /// A copy of `self` with every pair of `other` set on it in order.
    ///
    /// Keys present in both take `other`'s value and move to the tail.
    pub fn chain(&self, other: &Self) -> Self
    where
        K: Clone,
        V: Clone,
    {
        let mut output = self.clone();
        for (key, value) in other {
            output.set(key.clone(), value.clone());
        }
        output
    }
}

impl<K, V> Default for Chain<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq + Clone, V: Clone> Clone for Chain<K, V> {
    fn clone(&self) -> Self {
        self.iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for Chain<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Chain<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: PartialEq, V> FromIterator<(K, V)> for Chain<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut chain = Chain::new();
        chain.extend(iter);
        chain
    }
}

impl<K: PartialEq, V> Extend<(K, V)> for Chain<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.set(key, value);
        }
    }
}

/// Iterator over the entries of a [`Chain`], head to tail
pub struct Iter<'a, K, V> {
    chain: &'a Chain<K, V>,
    next: Option<NodeId>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.next.take() {
            let node = self.chain.node(id)?;
            self.next = node.child;
            if let Some((key, value)) = node.value() {
                return Some((key, value));
            }
        }
        None
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<'a, K, V> IntoIterator for &'a Chain<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Serialize, V: Serialize> Serialize for Chain<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        for pair in self {
            seq.serialize_element(&pair)?;
        }
        seq.end()
    }
}

impl<'de, K, V> Deserialize<'de> for Chain<K, V>
where
    K: Deserialize<'de> + PartialEq,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Vec::<(K, V)>::deserialize(deserializer).map(|pairs| pairs.into_iter().collect())
    }
}

impl<K: Serialize, V: Serialize> JsonFormat for Chain<K, V> {
    fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl<K: Serialize, V: Serialize> fmt::Display for Chain<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_json_string().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
