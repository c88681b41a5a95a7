/*!
Service entity (technician) model.

The entity list is owned by an external store; the core only reads it to
compute territories and label them.
*/

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::codes::parse_codes;
use crate::error::{StructureError, StructureResult};

/// Opaque entity identifier
///
/// Stored rosters may carry numeric ids (millisecond timestamps); those are
/// kept as their decimal text so every id compares as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Generate a new time-ordered id
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
            Float(f64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Unsigned(n) => Self(n.to_string()),
            RawId::Signed(n) => Self(n.to_string()),
            RawId::Float(n) => Self(n.to_string()),
        })
    }
}

/// A service entity and the codes assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,

    /// Assigned codes in stored order; may include codes unknown to the catalog
    #[serde(default, alias = "zips")]
    pub codes: Vec<String>,
}

impl Entity {
    /// Validate operator input and create an entity with a fresh id
    ///
    /// # Errors
    ///
    /// * `StructureError::MissingName` - name is blank
    /// * `StructureError::NoValidCodes` - `codes_text` holds no 5-digit code
    pub fn new(name: &str, contact: &str, codes_text: &str) -> StructureResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StructureError::MissingName);
        }
        let codes = parse_codes(codes_text);
        if codes.is_empty() {
            return Err(StructureError::NoValidCodes);
        }
        let contact = contact.trim();

        Ok(Self {
            id: EntityId::new(),
            name: name.to_string(),
            contact: (!contact.is_empty()).then(|| contact.to_string()),
            codes: codes.into_iter().map(String::from).collect(),
        })
    }

    /// Build an entity from already-trusted parts (seed rosters, tests)
    pub fn with_codes<I, S>(id: impl Into<EntityId>, name: impl Into<String>, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: name.into(),
            contact: None,
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }
}
