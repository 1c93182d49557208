//! Image identifier module
//!
//! Identifiers double as URL path segments and file names, so they are
//! restricted to ASCII alphanumerics.

use serde::Deserialize;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Strategy used to mint new identifiers
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdScheme {
    /// Random 128-bit value as 32 lowercase hex digits
    #[default]
    Random,
    /// Nanoseconds since the Unix epoch as lowercase hex.
    /// Two uploads inside the same clock tick receive the same id.
    Clock,
}

/// Opaque identifier of one stored image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageId(String);

impl ImageId {
    /// Mint a fresh identifier
    ///
    /// # Examples
    /// ```
    /// use imghost::storage::{IdScheme, ImageId};
    /// let id = ImageId::generate(IdScheme::Random);
    /// assert_eq!(id.as_str().len(), 32);
    /// ```
    pub fn generate(scheme: IdScheme) -> Self {
        match scheme {
            IdScheme::Random => Self(uuid::Uuid::new_v4().simple().to_string()),
            IdScheme::Clock => {
                let nanos = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map_or(0, |d| d.as_nanos());
                Self(format!("{nanos:x}"))
            }
        }
    }

    /// Accept an identifier taken from user input.
    ///
    /// Only non-empty ASCII alphanumeric strings pass, which keeps path
    /// separators and dots out of file names built from it.
    pub fn parse(raw: &str) -> Option<Self> {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the record inside the storage root
    pub fn file_name(&self) -> String {
        format!("{}.png", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
