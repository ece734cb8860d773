use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bits::{Bits, MAX_FLAGS};
use crate::error::{GateError, Result};
use crate::permissions::{PartialPerm, Permissions};
use crate::traits::Validatable;

/// Defaults for building permissions and a named flag domain, read from TOML.
///
/// ```toml
/// [permissions]
/// write = false
///
/// [flags]
/// beta = true
/// audit = false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Overrides merged over the allow-all default
    #[serde(default)]
    pub permissions: PartialPerm,

    /// Initial state of each named flag
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
}

impl GateConfig {
    /// Parse and validate a config from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        debug!(
            flags = config.flags.len(),
            "loaded gate config"
        );
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| GateError::InvalidValue(e.to_string()))
    }

    pub fn permissions(&self) -> Permissions {
        Permissions::new(self.permissions)
    }

    /// The configured flags packed into a [`Bits`]
    pub fn flags(&self) -> Result<Bits<String>> {
        Bits::new(self.flags.iter().map(|(key, value)| (key.clone(), *value)))
    }
}

impl Validatable for GateConfig {
    type Error = GateError;

    fn validate(&self) -> std::result::Result<(), Self::Error> {
        if self.flags.len() > MAX_FLAGS {
            return Err(GateError::DomainTooLarge {
                len: self.flags.len(),
                max: MAX_FLAGS,
            });
        }
        Ok(())
    }
}
