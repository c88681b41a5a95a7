use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Cache identity of a union request
///
/// Format is `identity:code1|code2|...` with the codes sorted and
/// deduplicated. Entity unions use `entity/<id>` as identity; rectangle
/// selections use [`SourceKey::SELECTION_IDENTITY`], which never carries the
/// entity prefix, so no stored id can alias a selection. Editing an entity's
/// code list yields a new key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceKey(String);

impl SourceKey {
    pub const SELECTION_IDENTITY: &'static str = "selection";
    pub const ENTITY_PREFIX: &'static str = "entity/";

    pub fn new<I, S>(identity: &str, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = codes
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        let joined = unique.into_iter().collect::<Vec<_>>().join("|");
        Self(format!("{}:{}", identity, joined))
    }

    pub fn for_entity(entity: &crate::Entity) -> Self {
        let identity = format!("{}{}", Self::ENTITY_PREFIX, entity.id);
        Self::new(&identity, &entity.codes)
    }

    pub fn for_selection<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Self::SELECTION_IDENTITY, codes)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
