//! Ordered containers.
//!
//! [`Chain`] is the linked ordered map. [`GuardedMap`] and [`GuardedSet`] put
//! the same contract over a hash map and a vector, and consult their
//! [`Permissions`](crate::permissions::Permissions) before every operation.

mod chain;
mod keyed;
mod set;

pub use chain::{Chain, Iter as ChainIter, Node, NodeId};
pub use keyed::GuardedMap;
pub use set::GuardedSet;
