//! Read/write permissions for guarded containers.
//!
//! [`Permissions`] is a [`Bits`] over the fixed domain `{read, write}`. Every
//! guarded container owns one and calls [`Permissions::check`] before it
//! touches its backing store.


use std::fmt;
use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::bits::Bits;
use crate::error::{GateError, Result};

/// Access mode guarded by a permission flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    Read,
    Write,
}

impl Access {
    /// Both modes, in bit order
    pub const ALL: [Access; 2] = [Access::Read, Access::Write];

    pub fn as_str(self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete permission record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Perm {
    pub read: bool,
    pub write: bool,
}

impl Default for Perm {
    fn default() -> Self {
        Self {
            read: true,
            write: true,
        }
    }
}

/// Overrides merged over the allow-all default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartialPerm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write: Option<bool>,
}

impl PartialPerm {
    pub fn read(read: bool) -> Self {
        Self {
            read: Some(read),
            ..Self::default()
        }
    }

    pub fn write(write: bool) -> Self {
        Self {
            write: Some(write),
            ..Self::default()
        }
    }

    pub fn merge(self, base: Perm) -> Perm {
        Perm {
            read: self.read.unwrap_or(base.read),
            write: self.write.unwrap_or(base.write),
        }
    }
}

impl From<Perm> for PartialPerm {
    fn from(perm: Perm) -> Self {
        Self {
            read: Some(perm.read),
            write: Some(perm.write),
        }
    }
}

/// Read/write flags packed into a [`Bits<Access>`].
///
/// Dereferences to the underlying bits, so `enable`, `disable`, `toggle` and
/// friends work with [`Access`] keys. Containers clone their permissions when
/// they derive a new container; permissions are never shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permissions {
    bits: Bits<Access>,
}

impl Permissions {
    pub fn new(overrides: PartialPerm) -> Self {
        Self::from(overrides.merge(Perm::default()))
    }

    /// Reads allowed, writes denied
    pub fn read_only() -> Self {
        Self::new(PartialPerm::write(false))
    }

    /// Fail with [`GateError::PermissionDenied`] unless `access` is allowed.
    pub fn check(&self, access: Access) -> Result<&Self> {
        if self.allows(access) {
            Ok(self)
        } else {
            debug!(%access, "permission check failed");
            Err(GateError::PermissionDenied(access))
        }
    }

    pub fn allows(&self, access: Access) -> bool {
        self.bits.get(&access).unwrap_or(false)
    }

    pub fn data(&self) -> Perm {
        Perm {
            read: self.allows(Access::Read),
            write: self.allows(Access::Write),
        }
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self::new(PartialPerm::default())
    }
}

impl From<Perm> for Permissions {
    fn from(perm: Perm) -> Self {
        let raw = u32::from(perm.read) | u32::from(perm.write) << 1;
        Self {
            bits: Bits::from_sorted_parts(Access::ALL.to_vec(), raw),
        }
    }
}

impl From<PartialPerm> for Permissions {
    fn from(overrides: PartialPerm) -> Self {
        Self::new(overrides)
    }
}

impl Deref for Permissions {
    type Target = Bits<Access>;

    fn deref(&self) -> &Self::Target {
        &self.bits
    }
}

impl DerefMut for Permissions {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.bits
    }
}

impl Serialize for Permissions {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.data().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Permissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        PartialPerm::deserialize(deserializer).map(Self::new)
    }
}
