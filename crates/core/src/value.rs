//! Metadata values, before and after storage.

use crate::asset::AssetId;
use crate::asset_ref;
use serde_json::Value;

/// A proposed metadata value from a mutation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataValue {
    /// Free-form text (or the JSON text of a structured value).
    Text(String),
    /// Pointer at another asset.
    Reference(AssetId),
    /// Clear the key.
    Null,
}

impl MetadataValue {
    /// Classify a raw string: exact `asset:XXXXXXXX` strings become references.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        match asset_ref::decode(&text) {
            Some(target) => Self::Reference(target),
            None => Self::Text(text),
        }
    }

    /// Classify a JSON value from a whole-object write.
    ///
    /// Structured values (numbers, booleans, arrays, objects) are stored as
    /// their canonical JSON text and are never treated as references.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::String(s) => Self::from_text(s),
            other => Self::Text(other.to_string()),
        }
    }
}

/// The value held by a stored entry: text or a reference, never both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryValue {
    Text(String),
    Reference(AssetId),
}

impl EntryValue {
    /// Text column value.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Reference(_) => None,
        }
    }

    /// Reference column value.
    pub fn reference(&self) -> Option<AssetId> {
        match self {
            Self::Text(_) => None,
            Self::Reference(id) => Some(*id),
        }
    }

    /// External rendering: text as-is, references via the codec.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Reference(id) => asset_ref::encode(*id),
        }
    }
}

/// A stored metadata entry for one asset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataEntry {
    pub key: String,
    pub value: EntryValue,
}

impl MetadataEntry {
    pub fn text(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: EntryValue::Text(text.into()),
        }
    }

    pub fn reference(key: impl Into<String>, target: AssetId) -> Self {
        Self {
            key: key.into(),
            value: EntryValue::Reference(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_classification() {
        assert_eq!(MetadataValue::from_json(Value::Null), MetadataValue::Null);
        assert_eq!(
            MetadataValue::from_json(json!("hello")),
            MetadataValue::Text("hello".to_string())
        );
        assert_eq!(
            MetadataValue::from_json(json!("asset:0000000a")),
            MetadataValue::Reference(AssetId::new(10))
        );
        assert_eq!(
            MetadataValue::from_json(json!(12)),
            MetadataValue::Text("12".to_string())
        );
        assert_eq!(
            MetadataValue::from_json(json!({"b": [1, true]})),
            MetadataValue::Text(r#"{"b":[1,true]}"#.to_string())
        );
    }

    #[test]
    fn test_malformed_reference_stays_text() {
        assert_eq!(
            MetadataValue::from_text("asset:123"),
            MetadataValue::Text("asset:123".to_string())
        );
    }

    #[test]
    fn test_entry_render() {
        assert_eq!(
            MetadataEntry::reference("link", AssetId::new(2)).value.render(),
            "asset:00000002"
        );
        assert_eq!(MetadataEntry::text("a", "1").value.render(), "1");
    }
}
