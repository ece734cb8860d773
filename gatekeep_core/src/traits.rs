use serde_json::Value;

use crate::error::Result;
use crate::permissions::{Access, Permissions};

/// A container whose every operation is gated by its [`Permissions`]
pub trait Guarded {
    fn permissions(&self) -> &Permissions;

    fn can_read(&self) -> bool {
        self.permissions().allows(Access::Read)
    }

    fn can_write(&self) -> bool {
        self.permissions().allows(Access::Write)
    }
}

/// A trait for entities that can be converted to JSON
pub trait JsonFormat {
    fn to_json(&self) -> Result<Value>;

    fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json()?)?)
    }
}

/// A trait for entities that can be validated
pub trait Validatable {
    type Error;

    fn validate(&self) -> std::result::Result<(), Self::Error>;
}
