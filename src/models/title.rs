use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;

/// Identifier used to look a title up in the metadata catalog.
///
/// Artifacts built from dataframes carry numeric ids while hand-written ones
/// often use strings, so both are accepted when reading JSON. Binary
/// encodings always store the string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalId(String);

impl ExternalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for ExternalId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for ExternalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ExternalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Numeric(u64),
            Text(String),
        }

        if deserializer.is_human_readable() {
            match Raw::deserialize(deserializer)? {
                Raw::Numeric(id) => Ok(ExternalId::from(id)),
                Raw::Text(id) => Ok(ExternalId(id)),
            }
        } else {
            String::deserialize(deserializer).map(ExternalId)
        }
    }
}

/// One row of the titles table stored in the artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleRecord {
    pub title: String,
    #[serde(default)]
    pub external_id: Option<ExternalId>,
}

impl TitleRecord {
    pub fn new(title: impl Into<String>, external_id: Option<ExternalId>) -> Self {
        Self {
            title: title.into(),
            external_id,
        }
    }
}

/// A catalog title materialized from the registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Title {
    /// Position in the precomputed artifact
    pub row_index: usize,
    pub title: String,
    pub external_id: Option<ExternalId>,
}

/// A recommended title together with its similarity to the query
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScoredTitle {
    pub title: Title,
    pub score: f32,
}
