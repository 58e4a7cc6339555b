//! Fetched resource values.

use std::borrow::Cow;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// A successfully resolved resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    /// Optional URL not present; nothing was fetched.
    Absent,
    /// Raw body, for images, criteria pages and key files.
    Body {
        /// Declared `Content-Type`, parameters included.
        content_type: Option<String>,
        /// Body bytes.
        bytes: Vec<u8>,
    },
    /// Body parsed as JSON because the request asked for it.
    Json(Value),
}

impl Resource {
    /// Whether nothing was fetched.
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// The parsed JSON value, if this is a JSON resource.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Consume into the parsed JSON value.
    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Body bytes of a raw resource.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Body { bytes, .. } => Some(bytes),
            _ => None,
        }
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> Option<Cow<'_, str>> {
        self.bytes().map(String::from_utf8_lossy)
    }

    /// Declared content type of a raw resource.
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Body { content_type, .. } => content_type.as_deref(),
            _ => None,
        }
    }
}

/// Reports show JSON resources inline, raw bodies as their type and size,
/// and absent resources as `null`.
impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent => serializer.serialize_none(),
            Self::Json(v) => v.serialize(serializer),
            Self::Body { content_type, bytes } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("contentType", content_type)?;
                map.serialize_entry("size", &bytes.len())?;
                map.end()
            }
        }
    }
}
