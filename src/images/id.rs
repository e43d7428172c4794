//! Image identifier checks.

use serde::{Deserialize, Serialize};

/// Longest id accepted under [`IdPolicy::Strict`].
pub const MAX_ID_LEN: usize = 128;

/// How much an incoming id is trusted before it becomes part of a path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    /// Only `[A-Za-z0-9_-]`, 1 to [`MAX_ID_LEN`] characters. Rules out
    /// separators and `..`, so the path cannot leave the image directory.
    #[default]
    Strict,

    /// The id is used as given. Only NUL bytes are refused, since no
    /// filesystem path can carry one.
    Permissive,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("Invalid image id: must not be empty")]
    Empty,

    #[error("Invalid image id: longer than {MAX_ID_LEN} characters")]
    TooLong,

    #[error("Invalid image id: character {0:?} is not allowed")]
    InvalidChar(char),

    #[error("Invalid image id: contains a NUL byte")]
    NulByte,
}

impl IdPolicy {
    /// Check `id` against this policy before it is used in a path.
    pub fn check(self, id: &str) -> Result<(), IdError> {
        if id.contains('\0') {
            return Err(IdError::NulByte);
        }

        match self {
            IdPolicy::Permissive => Ok(()),
            IdPolicy::Strict => {
                if id.is_empty() {
                    return Err(IdError::Empty);
                }
                if id.chars().count() > MAX_ID_LEN {
                    return Err(IdError::TooLong);
                }
                match id
                    .chars()
                    .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
                {
                    Some(c) => Err(IdError::InvalidChar(c)),
                    None => Ok(()),
                }
            }
        }
    }
}
