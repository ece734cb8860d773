use thiserror::Error;

use crate::permissions::Access;

pub type Result<T> = std::result::Result<T, GateError>;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Permission {0} is not set")]
    PermissionDenied(Access),

    #[error("Called `unwrap()` on an empty node")]
    EmptyNode,

    #[error("Called `forward()` on a node with no child")]
    NoChild,

    #[error("Called `backward()` on a node with no parent")]
    NoParent,

    #[error("Flag domain of {len} keys does not fit in a {max}-bit word")]
    DomainTooLarge { len: usize, max: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}
