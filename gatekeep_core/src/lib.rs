//! Packed flag sets, read/write permissions and ordered collections guarded
//! by them.
//!
//! - [`Bits`] packs a fixed, sorted domain of named flags into one `u32`.
//! - [`Permissions`] is a `Bits` over `{read, write}`.
//! - [`Chain`] is an ordered map kept as a linked chain of nodes.
//! - [`GuardedMap`] and [`GuardedSet`] check their permissions before every
//!   read or write.

pub mod bits;
pub mod collections;
pub mod config;
pub mod error;
pub mod permissions;
pub mod traits;

pub use bits::Bits;
pub use collections::{Chain, GuardedMap, GuardedSet, Node, NodeId};
pub use config::GateConfig;
pub use error::{GateError, Result};
pub use permissions::{Access, PartialPerm, Perm, Permissions};
pub use traits::{Guarded, JsonFormat, Validatable};
