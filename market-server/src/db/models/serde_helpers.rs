//! Serde helpers for SurrealDB record ids
//!
//! Record ids cross two boundaries with different shapes: API JSON carries
//! them as `"table:key"` strings, the database driver hands back the native
//! `RecordId` value. These helpers accept both on the way in and always emit
//! the string form on the way out.

use serde::{Deserialize, Deserializer, Serializer};
use surrealdb::RecordId;

/// Accepts either a `"table:key"` string or a native RecordId value
#[derive(Debug, Clone)]
struct FlexibleRecordId(RecordId);

impl<'de> Deserialize<'de> for FlexibleRecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de;
        use serde::de::value::{EnumAccessDeserializer, MapAccessDeserializer};

        // Dispatched by input shape rather than `#[serde(untagged)]`: the
        // database driver hands record ids over as enum-shaped input, which
        // serde's untagged buffering cannot represent.
        struct FlexibleVisitor;

        impl<'de> de::Visitor<'de> for FlexibleVisitor {
            type Value = FlexibleRecordId;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a `table:key` string or a native record id")
            }

            fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                s.parse::<RecordId>()
                    .map(FlexibleRecordId)
                    .map_err(|_| de::Error::custom(format!("invalid record id: {s}")))
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                RecordId::deserialize(MapAccessDeserializer::new(map)).map(FlexibleRecordId)
            }

            fn visit_enum<A>(self, data: A) -> Result<Self::Value, A::Error>
            where
                A: de::EnumAccess<'de>,
            {
                RecordId::deserialize(EnumAccessDeserializer::new(data)).map(FlexibleRecordId)
            }
        }

        deserializer.deserialize_any(FlexibleVisitor)
    }
}

/// `Option<RecordId>` field serialized as an optional `"table:key"` string
pub mod option_record_id {
    use super::*;

    pub fn serialize<S>(value: &Option<RecordId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(id) => serializer.serialize_some(&id.to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<FlexibleRecordId>::deserialize(deserializer)?;
        Ok(opt.map(|f| f.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Row {
        #[serde(default, with = "option_record_id")]
        id: Option<RecordId>,
    }

    #[test]
    fn round_trips_string_form() {
        let row: Row = serde_json::from_str(r#"{"id":"product:abc123"}"#).unwrap();
        assert_eq!(row.id.as_ref().map(|i| i.to_string()).as_deref(), Some("product:abc123"));
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"id":"product:abc123"}"#);
    }

    #[test]
    fn missing_id_is_none() {
        let row: Row = serde_json::from_str(r#"{}"#).unwrap();
        assert!(row.id.is_none());
    }
}
