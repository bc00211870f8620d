use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::error::KeyError;
use crate::slug::slugify;

/// Longest allowed normalized key, in characters.
pub const MAX_KEY_LENGTH: usize = 50;

/// The normalized slug that uniquely identifies a nugget.
///
/// Construction runs the raw input through [`slugify`], so a `NuggetKey` can
/// never hold an unnormalized value. `Welcome Text` and `welcome-text` build
/// the same key. Deserialization goes through the same constructor.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct NuggetKey(String);

impl NuggetKey {
    /// Normalize `raw` and validate the result.
    ///
    /// Fails when nothing survives normalization or the slug runs past
    /// [`MAX_KEY_LENGTH`] characters.
    pub fn new(raw: &str) -> Result<Self, KeyError> {
        let slug = slugify(raw);
        if slug.is_empty() {
            return Err(KeyError::Empty);
        }
        let len = slug.chars().count();
        if len > MAX_KEY_LENGTH {
            return Err(KeyError::TooLong { len });
        }
        Ok(Self(slug))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NuggetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NuggetKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NuggetKey {
    type Error = KeyError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(&raw)
    }
}

impl PartialEq<str> for NuggetKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NuggetKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One content snippet: a normalized key plus free-form content fields.
///
/// Field values are JSON so callers can store whatever shape their templates
/// bind against. Serialization flattens the fields next to the key, which is
/// also the shape [`NuggetRecord::to_value`] hands to template contexts:
/// `{"key": "welcome-text", "title": "...", "body": "..."}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NuggetRecord {
    key: NuggetKey,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl NuggetRecord {
    /// Build an empty record under the normalized form of `key`.
    pub fn new(key: &str) -> Result<Self, KeyError> {
        Ok(Self {
            key: NuggetKey::new(key)?,
            fields: Map::new(),
        })
    }

    /// Add a content field, replacing any previous value under `name`.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn key(&self) -> &NuggetKey {
        &self.key
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The record as a flat JSON object, ready to bind into a render context.
    /// The `key` entry always reflects the record's key, even if a content
    /// field shares the name.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert(
            "key".to_string(),
            Value::String(self.key.as_str().to_string()),
        );
        Value::Object(object)
    }
}

impl fmt::Display for NuggetRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.key, f)
    }
}
